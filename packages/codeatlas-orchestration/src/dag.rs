//! Stage DAG validation and ordering
//!
//! The topology is declared by `StageSpec`s; this module validates the
//! declarations (no unknown dependencies, no cycles) and yields the
//! execution order via topological sort.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{OrchestratorError, Result};
use crate::pipeline::{StageId, StageSpec};

/// Validated stage DAG
pub struct StageDag {
    stages: Vec<StageSpec>,
    order: Vec<StageId>,
}

impl StageDag {
    pub fn new(stages: Vec<StageSpec>) -> Result<Self> {
        let ids: HashSet<StageId> = stages.iter().map(|s| s.id).collect();
        if ids.len() != stages.len() {
            return Err(OrchestratorError::Config(
                "Duplicate stage declaration".to_string(),
            ));
        }
        for stage in &stages {
            for dep in stage.depends_on {
                if !ids.contains(dep) {
                    return Err(OrchestratorError::Config(format!(
                        "Stage {} depends on undeclared stage {}",
                        stage.id, dep
                    )));
                }
            }
        }

        let order = topological_order(&stages)?;
        Ok(Self { stages, order })
    }

    /// Execution order (dependencies first)
    pub fn order(&self) -> &[StageId] {
        &self.order
    }

    pub fn spec(&self, id: StageId) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Kahn's algorithm; an unprocessable remainder means a cycle.
fn topological_order(stages: &[StageSpec]) -> Result<Vec<StageId>> {
    let mut in_degree: HashMap<StageId, usize> =
        stages.iter().map(|s| (s.id, s.depends_on.len())).collect();
    // dependency → dependents
    let mut dependents: HashMap<StageId, Vec<StageId>> = HashMap::new();
    for stage in stages {
        for dep in stage.depends_on {
            dependents.entry(*dep).or_default().push(stage.id);
        }
    }

    // Declaration order breaks ties so the order is deterministic
    let mut queue: VecDeque<StageId> = stages
        .iter()
        .filter(|s| s.depends_on.is_empty())
        .map(|s| s.id)
        .collect();

    let mut order = Vec::with_capacity(stages.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        if let Some(next) = dependents.get(&id) {
            for dependent in next {
                let degree = in_degree.get_mut(dependent).expect("declared stage");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*dependent);
                }
            }
        }
    }

    if order.len() != stages.len() {
        return Err(OrchestratorError::Config(
            "Stage dependency cycle detected".to_string(),
        ));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{default_stages, FailPolicy};

    #[test]
    fn test_default_topology_orders() {
        let dag = StageDag::new(default_stages()).unwrap();
        let order = dag.order();

        let pos = |id: StageId| order.iter().position(|s| *s == id).unwrap();
        assert!(pos(StageId::Git) < pos(StageId::Discovery));
        assert!(pos(StageId::Discovery) < pos(StageId::Parsing));
        assert!(pos(StageId::Ir) < pos(StageId::SemanticIr));
        assert!(pos(StageId::Graph) < pos(StageId::Chunk));
        assert!(pos(StageId::Chunk) < pos(StageId::Indexing));
    }

    #[test]
    fn test_cycle_detected() {
        // Discovery ← Git and Git ← Discovery (by reusing the dependents
        // slice trick: declare Git depending on Indexing which depends on
        // everything back up to Git)
        let stages = vec![
            StageSpec {
                id: StageId::Git,
                depends_on: &[StageId::Discovery],
                fail_policy: FailPolicy::Fatal,
            },
            StageSpec {
                id: StageId::Discovery,
                depends_on: &[StageId::Git],
                fail_policy: FailPolicy::Fatal,
            },
        ];
        assert!(StageDag::new(stages).is_err());
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let stages = vec![StageSpec {
            id: StageId::Parsing,
            depends_on: &[StageId::Discovery],
            fail_policy: FailPolicy::SkipFile,
        }];
        assert!(StageDag::new(stages).is_err());
    }
}
