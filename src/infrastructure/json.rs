//! JSON text <-> rule tree

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::Node;
use crate::infrastructure::{InfraError, InfraResult};

/// Read all text from `path`, or from stdin when `path` is `-`.
#[instrument(level = "debug")]
pub fn read_input(path: &Path) -> InfraResult<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| InfraError::io("read stdin", e))?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|e| InfraError::io(format!("read {}", path.display()), e))
}

/// Parse a tree; blank text, `null` and `{}` mean "no tree yet".
pub fn parse_tree(text: &str) -> InfraResult<Option<Node>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| InfraError::json("parse input", e))?;
    let is_blank = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_blank {
        debug!("input holds no tree");
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| InfraError::json("decode rule tree", e))
}

pub fn read_tree(path: &Path) -> InfraResult<Option<Node>> {
    parse_tree(&read_input(path)?)
}

/// Pretty-printed JSON of `node`.
pub fn render_tree(node: &Node) -> InfraResult<String> {
    serde_json::to_string_pretty(node).map_err(|e| InfraError::json("encode rule tree", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("  \n")]
    #[case("null")]
    #[case("{}")]
    fn test_blank_input_means_no_tree(#[case] text: &str) {
        assert!(parse_tree(text).unwrap().is_none());
    }

    #[test]
    fn test_parse_tree_reads_tagged_record() {
        let tree = parse_tree(
            r#"{"_id": "a", "framework": "individual", "individual": {"field": 1}, "level": 0}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(tree.id().as_str(), "a");
    }

    #[test]
    fn test_parse_tree_rejects_unknown_framework() {
        let result = parse_tree(r#"{"_id": "a", "framework": "bogus"}"#);
        assert!(matches!(result, Err(InfraError::Json { .. })));
    }

    #[test]
    fn test_render_then_parse_keeps_tree() {
        let tree = Node::default();
        let text = render_tree(&tree).unwrap();
        assert_eq!(parse_tree(&text).unwrap(), Some(tree));
    }
}
