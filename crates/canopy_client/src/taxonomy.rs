//! Ordered article forest of a project wiki.
//!
//! # Responsibility
//! - Own the article tree exactly as the server serializes it.
//! - Search, detach, and re-parent nodes in document order.
//! - Keep server-owned node fields intact through every edit.
//!
//! # Invariants
//! - An article id appears at most once in the forest.
//! - Child order is display order; every insert appends at the end.
//! - A failed move leaves the forest exactly as it was before the call.
//!
//! # See also
//! - docs/architecture/wiki-taxonomy.md

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from structural edits of the article forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    /// The article to operate on is nowhere in the forest.
    ArticleNotFound(String),
    /// The requested parent is not in the forest once the moved subtree is
    /// taken out. Moving an article under its own descendant lands here.
    ParentNotFound(String),
}

impl Display for TaxonomyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArticleNotFound(article_id) => {
                write!(f, "article not found: {article_id}")
            }
            Self::ParentNotFound(parent_id) => {
                write!(
                    f,
                    "parent article not found (or is a descendant of the moved article): {parent_id}"
                )
            }
        }
    }
}

impl Error for TaxonomyError {}

/// One article node: an id, ordered children, and whatever else the server
/// stores on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleNode {
    /// Article id, unique across the forest.
    pub id: String,
    /// Ordered child nodes.
    #[serde(default)]
    pub children: Vec<ArticleNode>,
    /// Server-owned node fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArticleNode {
    /// Creates a leaf node with no extra fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// True when `article_id` is this node or anywhere in its subtree.
    pub fn contains(&self, article_id: &str) -> bool {
        self.id == article_id || find_in(&self.children, article_id).is_some()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ArticleNode::subtree_len)
            .sum::<usize>()
    }
}

/// The article forest: root nodes in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    /// Ordered root nodes.
    pub roots: Vec<ArticleNode>,
}

impl Taxonomy {
    /// Creates a forest from root nodes.
    pub fn new(roots: Vec<ArticleNode>) -> Self {
        Self { roots }
    }

    /// Finds a node by id, walking the forest in pre-order.
    pub fn find(&self, article_id: &str) -> Option<&ArticleNode> {
        find_in(&self.roots, article_id)
    }

    /// Finds a node by id for mutation, walking the forest in pre-order.
    pub fn find_mut(&mut self, article_id: &str) -> Option<&mut ArticleNode> {
        find_in_mut(&mut self.roots, article_id)
    }

    /// Removes a node, with its whole subtree, and returns it.
    ///
    /// The order of every remaining sibling list is untouched. Returns `None`
    /// when `article_id` is not in the forest, leaving it unchanged.
    pub fn detach(&mut self, article_id: &str) -> Option<ArticleNode> {
        detach_in(&mut self.roots, article_id)
    }

    /// Moves an article, with its whole subtree, under a new parent.
    ///
    /// With `new_parent_id` of `None` the article becomes the last root.
    /// Otherwise it is appended to the parent's children. Sibling order
    /// elsewhere never changes.
    ///
    /// # Errors
    /// - [`TaxonomyError::ArticleNotFound`] when `article_id` is not in the
    ///   forest.
    /// - [`TaxonomyError::ParentNotFound`] when the parent is absent, equals
    ///   the moved article, or sits inside the moved subtree.
    ///
    /// On any error the forest is restored to its exact pre-call state.
    pub fn move_article(
        &mut self,
        article_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        let snapshot = self.roots.clone();

        let node = match self.detach(article_id) {
            Some(node) => node,
            None => return Err(TaxonomyError::ArticleNotFound(article_id.to_string())),
        };

        let parent_id = match new_parent_id {
            Some(parent_id) => parent_id,
            None => {
                self.roots.push(node);
                return Ok(());
            }
        };

        // The detached subtree carries its descendants with it; a parent id
        // inside that subtree no longer exists in the forest.
        if node.contains(parent_id) {
            self.roots = snapshot;
            return Err(TaxonomyError::ParentNotFound(parent_id.to_string()));
        }

        match self.find_mut(parent_id) {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None => {
                self.roots = snapshot;
                Err(TaxonomyError::ParentNotFound(parent_id.to_string()))
            }
        }
    }

    /// Ids of every article in the forest, in pre-order.
    pub fn flatten(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.node_count());
        flatten_into(&self.roots, &mut ids);
        ids
    }

    /// Total number of nodes in the forest.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ArticleNode::subtree_len).sum()
    }

    /// First article id that appears more than once, in pre-order.
    pub fn first_duplicate_id(&self) -> Option<String> {
        let mut seen = HashSet::new();
        first_duplicate_in(&self.roots, &mut seen)
    }
}

fn find_in<'t>(nodes: &'t [ArticleNode], article_id: &str) -> Option<&'t ArticleNode> {
    for node in nodes {
        if node.id == article_id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, article_id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'t>(nodes: &'t mut [ArticleNode], article_id: &str) -> Option<&'t mut ArticleNode> {
    for node in nodes {
        if node.id == article_id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, article_id) {
            return Some(found);
        }
    }
    None
}

// Same node-then-children order as find_in, so find and detach agree on
// which node is the first match.
fn detach_in(nodes: &mut Vec<ArticleNode>, article_id: &str) -> Option<ArticleNode> {
    for index in 0..nodes.len() {
        if nodes[index].id == article_id {
            return Some(nodes.remove(index));
        }
        if let Some(found) = detach_in(&mut nodes[index].children, article_id) {
            return Some(found);
        }
    }
    None
}

fn flatten_into(nodes: &[ArticleNode], ids: &mut Vec<String>) {
    for node in nodes {
        ids.push(node.id.clone());
        flatten_into(&node.children, ids);
    }
}

fn first_duplicate_in(nodes: &[ArticleNode], seen: &mut HashSet<String>) -> Option<String> {
    for node in nodes {
        if !seen.insert(node.id.clone()) {
            return Some(node.id.clone());
        }
        if let Some(duplicate) = first_duplicate_in(&node.children, seen) {
            return Some(duplicate);
        }
    }
    None
}
