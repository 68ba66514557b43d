//! Drive search query builder.

use crate::fs::node::FOLDER_MIME_TYPE;

/// A `files.list` search expression.
///
/// Clauses are joined with ` and `, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeQuery {
    clauses: Vec<String>,
    /// Structured copy of the name clause, for in-memory evaluation
    name: Option<String>,
    parent: Option<String>,
    folders_only: bool,
}

impl NodeQuery {
    /// Start a query that excludes trashed nodes.
    pub fn new() -> Self {
        Self {
            clauses: vec!["trashed = false".to_string()],
            ..Self::default()
        }
    }

    /// Query for a non-trashed folder called `name`, under `parent` if given.
    ///
    /// Without a parent the search spans every folder visible to the session.
    pub fn folder_named(name: &str, parent: Option<&str>) -> Self {
        let mut query = Self::new().folders_only();
        if let Some(parent) = parent {
            query = query.in_parent(parent);
        }
        query.named(name)
    }

    pub fn folders_only(mut self) -> Self {
        self.clauses
            .insert(0, format!("mimeType = '{}'", FOLDER_MIME_TYPE));
        self.folders_only = true;
        self
    }

    pub fn in_parent(mut self, parent_id: &str) -> Self {
        self.clauses
            .push(format!("'{}' in parents", escape_literal(parent_id)));
        self.parent = Some(parent_id.to_string());
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.clauses.push(format!("name = '{}'", escape_literal(name)));
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_folders_only(&self) -> bool {
        self.folders_only
    }

    /// Render the expression for the `q` parameter.
    pub fn to_query_string(&self) -> String {
        self.clauses.join(" and ")
    }
}

impl std::fmt::Display for NodeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Escape a string literal for the Drive query language.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
