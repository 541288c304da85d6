//! Record category trees and field categories

use super::ids::{CategoryId, DirectoryId, FieldCategoryId};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category trees never grow past this many levels.
pub const MAX_CATEGORY_DEPTH: usize = 3;

/// Name of the system field category every directory starts with.
pub const GENERAL_FIELD_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Per-directory forest of categories, at most [`MAX_CATEGORY_DEPTH`] deep.
///
/// Paths are lists of node ids from the root down. When resolving a path a
/// segment may also name the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTree {
    #[serde(default)]
    pub roots: Vec<CategoryNode>,
}

impl CategoryTree {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a node and its depth (roots are depth 1).
    pub fn find(&self, id: &CategoryId) -> Option<(&CategoryNode, usize)> {
        find_in(&self.roots, id, 1)
    }

    /// Add a node under `parent`, or as a root. Returns the new node's id.
    pub fn add(&mut self, parent: Option<&CategoryId>, name: &str) -> Result<CategoryId> {
        let name = checked_name(name)?;
        let siblings = match parent {
            None => &mut self.roots,
            Some(parent_id) => {
                let (_, depth) = self
                    .find(parent_id)
                    .ok_or_else(|| EngineError::CategoryNotFound {
                        path: parent_id.to_string(),
                    })?;
                if depth >= MAX_CATEGORY_DEPTH {
                    return Err(EngineError::CategoryDepthExceeded {
                        max: MAX_CATEGORY_DEPTH,
                    });
                }
                match find_in_mut(&mut self.roots, parent_id) {
                    Some(node) => &mut node.children,
                    None => {
                        return Err(EngineError::CategoryNotFound {
                            path: parent_id.to_string(),
                        })
                    }
                }
            }
        };
        if siblings
            .iter()
            .any(|n| n.name.eq_ignore_ascii_case(&name))
        {
            return Err(EngineError::DuplicateKey { key: name });
        }
        let node = CategoryNode::new(name);
        let id = node.id.clone();
        siblings.push(node);
        Ok(id)
    }

    /// Rename a node. Sibling names stay unique, ignoring case.
    pub fn rename(&mut self, id: &CategoryId, name: &str) -> Result<()> {
        let name = checked_name(name)?;
        let siblings =
            siblings_of(&mut self.roots, id).ok_or_else(|| EngineError::CategoryNotFound {
                path: id.to_string(),
            })?;
        if siblings
            .iter()
            .any(|n| n.id != *id && n.name.eq_ignore_ascii_case(&name))
        {
            return Err(EngineError::DuplicateKey { key: name });
        }
        if let Some(node) = siblings.iter_mut().find(|n| n.id == *id) {
            node.name = name;
        }
        Ok(())
    }

    /// Remove a node with its whole subtree.
    pub fn remove(&mut self, id: &CategoryId) -> Result<CategoryNode> {
        remove_in(&mut self.roots, id).ok_or_else(|| EngineError::CategoryNotFound {
            path: id.to_string(),
        })
    }

    /// Walk a path, matching each segment by id or name. Interior nodes are fine.
    pub fn walk(&self, path: &[String]) -> Result<Vec<&CategoryNode>> {
        if path.len() > MAX_CATEGORY_DEPTH {
            return Err(EngineError::CategoryDepthExceeded {
                max: MAX_CATEGORY_DEPTH,
            });
        }
        let mut level = &self.roots;
        let mut nodes = Vec::with_capacity(path.len());
        for (i, segment) in path.iter().enumerate() {
            let node = level
                .iter()
                .find(|n| n.id.as_str() == segment)
                .or_else(|| level.iter().find(|n| n.name.eq_ignore_ascii_case(segment)))
                .ok_or_else(|| EngineError::CategoryNotFound {
                    path: path[..=i].join("/"),
                })?;
            nodes.push(node);
            level = &node.children;
        }
        Ok(nodes)
    }

    /// Resolve a record assignment to node ids. The path must end at a leaf.
    pub fn resolve(&self, path: &[String]) -> Result<Vec<CategoryId>> {
        let nodes = self.walk(path)?;
        if let Some(last) = nodes.last() {
            if !last.is_leaf() {
                return Err(EngineError::CategoryNotLeaf {
                    id: last.id.to_string(),
                });
            }
        }
        Ok(nodes.into_iter().map(|n| n.id.clone()).collect())
    }
}

fn checked_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::invalid_schema("name", "category name cannot be empty"));
    }
    Ok(name.to_string())
}

fn find_in<'a>(
    nodes: &'a [CategoryNode],
    id: &CategoryId,
    depth: usize,
) -> Option<(&'a CategoryNode, usize)> {
    for node in nodes {
        if node.id == *id {
            return Some((node, depth));
        }
        if let Some(found) = find_in(&node.children, id, depth + 1) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(nodes: &'a mut [CategoryNode], id: &CategoryId) -> Option<&'a mut CategoryNode> {
    for node in nodes.iter_mut() {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// The list of nodes that holds `id`
fn siblings_of<'a>(
    nodes: &'a mut Vec<CategoryNode>,
    id: &CategoryId,
) -> Option<&'a mut Vec<CategoryNode>> {
    if nodes.iter().any(|n| n.id == *id) {
        return Some(nodes);
    }
    nodes
        .iter_mut()
        .find_map(|n| siblings_of(&mut n.children, id))
}

fn remove_in(nodes: &mut Vec<CategoryNode>, id: &CategoryId) -> Option<CategoryNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == *id) {
        return Some(nodes.remove(pos));
    }
    nodes.iter_mut().find_map(|n| remove_in(&mut n.children, id))
}

/// Groups field definitions for editing. System categories are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCategory {
    pub id: FieldCategoryId,
    pub directory_id: DirectoryId,
    pub name: String,
    #[serde(default)]
    pub system: bool,
    /// ULIDs of the grouped field definitions
    #[serde(default)]
    pub field_ids: BTreeSet<String>,
    #[serde(default)]
    pub order: i32,
}

impl FieldCategory {
    pub fn new(directory_id: DirectoryId, name: impl Into<String>) -> Self {
        Self {
            id: FieldCategoryId::new(),
            directory_id,
            name: name.into(),
            system: false,
            field_ids: BTreeSet::new(),
            order: 0,
        }
    }

    /// The seeded, immutable "General" category.
    pub fn general(directory_id: DirectoryId) -> Self {
        Self {
            system: true,
            ..Self::new(directory_id, GENERAL_FIELD_CATEGORY)
        }
    }
}
