//! Tree Node Search
//!
//! A reduced query-string search over the generic fields of tree nodes.
//!
//! # Query Syntax
//!
//! - Terms are separated by whitespace and combined with OR
//! - `field:value` restricts a term to one field
//!   (`id`, `node_type`, `parent_id`, `training_id`, `sort_order`, `anchor`)
//! - `"quoted value"` keeps whitespace inside a single term
//! - `value*` matches any field value starting with `value`
//! - a bare `*` matches every document
//!
//! Matching is case-insensitive and compares whole field values.

use crate::db::SearchIndex;
use crate::models::{NodeId, TreeNode};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Fields a document exposes to `field:value` terms
pub const SEARCH_FIELDS: [&str; 6] = [
    "id",
    "node_type",
    "parent_id",
    "training_id",
    "sort_order",
    "anchor",
];

// Capture group 1: optional field name, group 2: quoted value, group 3: bare value
const TERM_PATTERN: &str = r#"(?:([A-Za-z_]+):)?(?:"([^"]*)"|(\S+))"#;

fn term_regex() -> &'static Regex {
    static TERM_REGEX: OnceLock<Regex> = OnceLock::new();
    TERM_REGEX.get_or_init(|| Regex::new(TERM_PATTERN).expect("valid term pattern"))
}

/// Searchable view of a tree node: field name to lowercased value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    fields: BTreeMap<&'static str, String>,
}

impl SearchDocument {
    pub fn from_node(node: &TreeNode) -> Self {
        let mut fields = BTreeMap::new();
        let mut put = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                fields.insert(name, value.to_lowercase());
            }
        };
        put("id", node.id.map(|v| v.to_string()));
        put("node_type", Some(node.node_type.to_string()));
        put("parent_id", node.parent_id.map(|v| v.to_string()));
        put("training_id", node.training_id.map(|v| v.to_string()));
        put("sort_order", node.sort_order.map(|v| v.to_string()));
        put("anchor", node.anchor.map(|v| v.to_string()));
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// One parsed query term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub field: Option<String>,
    pub value: String,
    pub prefix: bool,
}

impl SearchTerm {
    fn matches_value(&self, candidate: &str) -> bool {
        if self.prefix {
            candidate.starts_with(&self.value)
        } else {
            candidate == self.value
        }
    }

    pub fn matches(&self, doc: &SearchDocument) -> bool {
        match &self.field {
            Some(field) => doc
                .field(field)
                .map(|value| self.matches_value(value))
                .unwrap_or(false),
            None => doc.fields.values().any(|value| self.matches_value(value)),
        }
    }
}

/// Parsed query: a disjunction of terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<SearchTerm>,
}

impl SearchQuery {
    /// Parse a query string
    ///
    /// # Errors
    ///
    /// Returns an error for an empty query or an unknown field name.
    pub fn parse(query: &str) -> Result<Self> {
        let mut terms = Vec::new();

        for caps in term_regex().captures_iter(query) {
            let field = caps.get(1).map(|m| m.as_str().to_lowercase());
            if let Some(field) = &field {
                if !SEARCH_FIELDS.contains(&field.as_str()) {
                    anyhow::bail!("Unknown search field: {}", field);
                }
            }

            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default()
                .to_lowercase();

            let (value, prefix) = match raw.strip_suffix('*') {
                Some(stem) => (stem.to_string(), true),
                None => (raw, false),
            };

            terms.push(SearchTerm {
                field,
                value,
                prefix,
            });
        }

        if terms.is_empty() {
            anyhow::bail!("Search query must contain at least one term");
        }

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[SearchTerm] {
        &self.terms
    }

    pub fn matches(&self, doc: &SearchDocument) -> bool {
        self.terms.iter().any(|term| term.matches(doc))
    }

    /// Filter `nodes` down to the matching ones, ascending id
    pub fn filter<I>(&self, nodes: I) -> Vec<TreeNode>
    where
        I: IntoIterator<Item = TreeNode>,
    {
        let mut hits: Vec<TreeNode> = nodes
            .into_iter()
            .filter(|node| self.matches(&SearchDocument::from_node(node)))
            .collect();
        hits.sort_by_key(|node| node.id);
        hits
    }
}

/// In-memory search index
pub struct MemorySearchIndex {
    entries: Arc<Mutex<BTreeMap<NodeId, TreeNode>>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<NodeId, TreeNode>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire search index lock"))
    }
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index(&self, node: &TreeNode) -> Result<()> {
        let id = node
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot index a node without id"))?;
        self.lock()?.insert(id, node.clone());
        Ok(())
    }

    async fn delete(&self, id: NodeId) -> Result<()> {
        self.lock()?.remove(&id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<TreeNode>> {
        let query = SearchQuery::parse(query)?;
        let snapshot: Vec<TreeNode> = self.lock()?.values().cloned().collect();
        Ok(query.filter(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    fn node(id: NodeId, node_type: NodeType, parent: Option<NodeId>) -> TreeNode {
        TreeNode {
            id: Some(id),
            parent_id: parent,
            ..TreeNode::new(node_type)
        }
    }

    #[test]
    fn test_parse_field_quoted_and_prefix_terms() {
        let query = SearchQuery::parse(r#"node_type:BranchNode "Category Node" Req*"#).unwrap();
        let terms = query.terms();

        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].field.as_deref(), Some("node_type"));
        assert_eq!(terms[0].value, "branchnode");
        assert_eq!(terms[1].field, None);
        assert_eq!(terms[1].value, "category node");
        assert!(terms[2].prefix);
        assert_eq!(terms[2].value, "req");
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown_fields() {
        assert!(SearchQuery::parse("   ").is_err());
        assert!(SearchQuery::parse("name:foo").is_err());
    }

    #[test]
    fn test_terms_are_or_combined() {
        let query = SearchQuery::parse("CategoryNode BranchNode").unwrap();
        let hits = query.filter(vec![
            node(3, NodeType::BranchNode, Some(1)),
            node(1, NodeType::CategoryNode, None),
            node(2, NodeType::RequirementNode, Some(1)),
        ]);
        let ids: Vec<_> = hits.iter().filter_map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_field_term_only_checks_that_field() {
        let query = SearchQuery::parse("parent_id:1").unwrap();
        let hits = query.filter(vec![
            node(1, NodeType::CategoryNode, None),
            node(2, NodeType::BranchNode, Some(1)),
        ]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Some(2));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        let query = SearchQuery::parse("*").unwrap();
        let hits = query.filter(vec![
            node(1, NodeType::CategoryNode, None),
            node(2, NodeType::BranchNode, Some(1)),
        ]);
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_index_round_trip() {
        let index = MemorySearchIndex::new();
        index.index(&node(5, NodeType::GeneratedSlideNode, None)).await.unwrap();
        assert_eq!(index.len(), 1);

        let hits = index.search("generatedslidenode").await.unwrap();
        assert_eq!(hits.len(), 1);

        index.delete(5).await.unwrap();
        assert!(index.search("generatedslidenode").await.unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_memory_index_rejects_unsaved_node() {
        let index = MemorySearchIndex::new();
        let result = index.index(&TreeNode::new(NodeType::BranchNode)).await;
        assert!(result.is_err());
    }
}
