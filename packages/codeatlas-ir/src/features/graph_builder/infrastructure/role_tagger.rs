//! Heuristic role tagging
//!
//! Directory names, filename suffixes, and decorator imports set
//! `Node.role` where the IR left it unset. Rules are ordered; first hit
//! wins.

use crate::shared::models::NodeRole;

use super::super::domain::GraphDocument;

/// (path fragment, role) rules applied to the lowercased file path
const PATH_RULES: &[(&str, NodeRole)] = &[
    ("test", NodeRole::Test),
    ("controller", NodeRole::Controller),
    ("handler", NodeRole::Controller),
    ("routes", NodeRole::Controller),
    ("views", NodeRole::Controller),
    ("api", NodeRole::Controller),
    ("service", NodeRole::Service),
    ("usecase", NodeRole::Service),
    ("repository", NodeRole::Repository),
    ("repositories", NodeRole::Repository),
    ("dao", NodeRole::Repository),
    ("store", NodeRole::Repository),
    ("model", NodeRole::Model),
    ("schema", NodeRole::Model),
    ("entity", NodeRole::Model),
    ("entities", NodeRole::Model),
    ("domain", NodeRole::Model),
    ("config", NodeRole::Config),
    ("settings", NodeRole::Config),
    ("util", NodeRole::Util),
    ("helpers", NodeRole::Util),
    ("common", NodeRole::Util),
];

pub fn role_for_path(file_path: &str, is_test_file: bool) -> Option<NodeRole> {
    if is_test_file {
        return Some(NodeRole::Test);
    }
    let lower = file_path.to_lowercase();
    // Directory segments match singular or plural; the filename matches on
    // its underscore/dot-separated words
    let mut words: Vec<String> = Vec::new();
    for seg in lower.split('/') {
        for word in seg.split(['_', '.', '-']) {
            if !word.is_empty() {
                words.push(word.trim_end_matches('s').to_string());
            }
        }
    }
    for (fragment, role) in PATH_RULES {
        let target = fragment.trim_end_matches('s');
        if words.iter().any(|w| w == target) {
            return Some(*role);
        }
    }
    None
}

/// Fill `role` for every node that has none
pub fn tag_roles(graph: &mut GraphDocument) {
    for node in graph.nodes.values_mut() {
        if node.role.is_some() {
            continue;
        }
        node.role = role_for_path(&node.file_path, node.is_test_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_files_win() {
        assert_eq!(
            role_for_path("src/services/user.py", true),
            Some(NodeRole::Test)
        );
    }

    #[test]
    fn test_directory_rules() {
        assert_eq!(
            role_for_path("src/controllers/user.py", false),
            Some(NodeRole::Controller)
        );
        assert_eq!(
            role_for_path("app/services/billing.py", false),
            Some(NodeRole::Service)
        );
        assert_eq!(
            role_for_path("app/models/user.py", false),
            Some(NodeRole::Model)
        );
    }

    #[test]
    fn test_filename_suffix() {
        assert_eq!(
            role_for_path("app/user_repository.py", false),
            Some(NodeRole::Repository)
        );
    }

    #[test]
    fn test_no_rule_leaves_unset() {
        assert_eq!(role_for_path("src/main.py", false), None);
    }
}
