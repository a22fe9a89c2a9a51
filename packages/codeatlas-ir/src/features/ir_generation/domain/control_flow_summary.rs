//! Advisory control-flow metrics per function

use serde::{Deserialize, Serialize};

/// Branch-count metrics attached to function-like nodes.
///
/// Advisory, not an invariant: consumers may use these for ranking and
/// display but must not depend on exact values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlFlowSummary {
    /// Branch count + 1
    pub cyclomatic_complexity: u32,
    pub has_loop: bool,
    pub has_try: bool,
    /// Short snippets of branch conditions, capped by the builder
    pub branch_conditions: Vec<String>,
}

impl ControlFlowSummary {
    pub fn new() -> Self {
        Self {
            cyclomatic_complexity: 1,
            ..Default::default()
        }
    }

    pub fn record_branch(&mut self, condition: Option<String>) {
        self.cyclomatic_complexity += 1;
        if let Some(cond) = condition {
            // Keep snippets short and bounded
            if self.branch_conditions.len() < 8 {
                let mut snippet = cond;
                if snippet.len() > 80 {
                    snippet.truncate(80);
                }
                self.branch_conditions.push(snippet);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_starts_at_one() {
        let summary = ControlFlowSummary::new();
        assert_eq!(summary.cyclomatic_complexity, 1);
    }

    #[test]
    fn test_branch_snippets_bounded() {
        let mut summary = ControlFlowSummary::new();
        for i in 0..20 {
            summary.record_branch(Some(format!("x > {}", i)));
        }
        assert_eq!(summary.cyclomatic_complexity, 21);
        assert_eq!(summary.branch_conditions.len(), 8);
    }
}
