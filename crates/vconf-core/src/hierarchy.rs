//! Hierarchy builder: composes located instances into a category tree.
//!
//! Nodes sharing a path prefix are merged into shared interior nodes and every
//! sibling group is sorted by label (case-sensitive, stable). The builder also
//! produces the instance -> file side table consumed by the session.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::category::{CategoryNamer, CategoryPath};
use crate::instance::ConfigInstance;
use crate::kind::{ConfigKind, KindRegistry};
use crate::locator::InstanceLocator;

/// Reference to an instance discovered by one specific build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    generation: u64,
    index: usize,
}

impl InstanceHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    label: String,
    instance: Option<InstanceHandle>,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            instance: None,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instance(&self) -> Option<InstanceHandle> {
        self.instance
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.instance.is_some()
    }

    fn sort(&mut self) {
        self.children.sort_by(|a, b| a.label.cmp(&b.label));
        for child in &mut self.children {
            child.sort();
        }
    }
}

/// Category -> instance tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    roots: Vec<TreeNode>,
}

impl CategoryTree {
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Ensure every segment of `path` exists as a node.
    fn insert_interior<'a>(&'a mut self, segments: &[String]) -> &'a mut Vec<TreeNode> {
        let mut siblings = &mut self.roots;
        for segment in segments {
            let pos = match siblings
                .iter()
                .position(|n| n.label == *segment && n.instance.is_none())
            {
                Some(pos) => pos,
                None => {
                    siblings.push(TreeNode::new(segment));
                    siblings.len() - 1
                }
            };
            siblings = &mut siblings[pos].children;
        }
        siblings
    }

    /// Insert a leaf. Returns `false` when another leaf already occupies the
    /// same path; both are kept as separate siblings.
    fn insert_leaf(&mut self, path: &CategoryPath, handle: InstanceHandle) -> bool {
        let Some((last, interior)) = path.segments().split_last() else {
            return false;
        };
        let siblings = self.insert_interior(interior);

        let collided = siblings
            .iter()
            .any(|n| n.label == *last && n.instance.is_some());
        if !collided
            && let Some(node) = siblings
                .iter_mut()
                .find(|n| n.label == *last && n.instance.is_none())
        {
            node.instance = Some(handle);
            return true;
        }

        let mut node = TreeNode::new(last);
        node.instance = Some(handle);
        siblings.push(node);
        !collided
    }

    fn sort(&mut self) {
        self.roots.sort_by(|a, b| a.label.cmp(&b.label));
        for root in &mut self.roots {
            root.sort();
        }
    }

    /// First node at `path`.
    pub fn find(&self, path: &CategoryPath) -> Option<&TreeNode> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.roots.iter().find(|n| n.label == *first)?;
        for segment in rest {
            node = node.children.iter().find(|n| n.label == *segment)?;
        }
        Some(node)
    }

    /// Depth-first visit in display order.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&CategoryPath, &TreeNode),
    {
        fn walk_nodes<F>(nodes: &[TreeNode], path: &mut CategoryPath, visit: &mut F)
        where
            F: FnMut(&CategoryPath, &TreeNode),
        {
            for node in nodes {
                path.push(node.label.clone());
                visit(path, node);
                walk_nodes(&node.children, path, visit);
                path.pop();
            }
        }

        walk_nodes(&self.roots, &mut CategoryPath::default(), &mut visit);
    }

    /// Every leaf with its full path, in display order.
    pub fn leaves(&self) -> Vec<(CategoryPath, InstanceHandle)> {
        let mut leaves = Vec::new();
        self.walk(|path, node| {
            if let Some(handle) = node.instance {
                leaves.push((path.clone(), handle));
            }
        });
        leaves
    }

    /// Leaves whose path contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<(CategoryPath, InstanceHandle)> {
        let needle = term.to_lowercase();
        self.leaves()
            .into_iter()
            .filter(|(path, _)| path.to_string().to_lowercase().contains(&needle))
            .collect()
    }

    /// Indented labels, one per node; equal outlines mean equal structure.
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.walk(|path, node| {
            lines.push(format!("{}{}", "  ".repeat(path.len() - 1), node.label));
        });
        lines
    }
}

/// One discovered instance with its backing file and display path.
#[derive(Debug, Clone)]
pub struct HierarchyEntry {
    pub instance: ConfigInstance,
    pub path: PathBuf,
    pub category: CategoryPath,
    /// `Id` as read from disk, before any in-session edit.
    pub loaded_id: Option<String>,
}

/// Output of one build: the tree plus the side table it indexes into.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    generation: u64,
    pub tree: CategoryTree,
    pub entries: Vec<HierarchyEntry>,
    /// Paths occupied by more than one instance.
    pub collisions: Vec<CategoryPath>,
    /// Number of files skipped as malformed.
    pub skipped: usize,
}

impl Hierarchy {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&self, index: usize) -> Option<InstanceHandle> {
        (index < self.entries.len()).then_some(InstanceHandle {
            generation: self.generation,
            index,
        })
    }
}

pub struct HierarchyBuilder<'a> {
    registry: &'a KindRegistry,
    locator: &'a InstanceLocator,
    namer: &'a CategoryNamer,
    show_empty_kinds: bool,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(
        registry: &'a KindRegistry,
        locator: &'a InstanceLocator,
        namer: &'a CategoryNamer,
    ) -> Self {
        Self {
            registry,
            locator,
            namer,
            show_empty_kinds: false,
        }
    }

    /// Keep a category node for kinds without any stored instance.
    pub fn show_empty_kinds(mut self, show: bool) -> Self {
        self.show_empty_kinds = show;
        self
    }

    /// Build the tree for `kinds`, stamping handles with `generation`.
    pub fn build(&self, kinds: &[&ConfigKind], generation: u64) -> Hierarchy {
        let mut scan = self.locator.scan(self.registry);
        let mut hierarchy = Hierarchy {
            generation,
            skipped: scan.skipped.len(),
            ..Hierarchy::default()
        };
        let mut visited = HashSet::new();

        for kind in kinds {
            if !visited.insert(kind.id()) {
                continue;
            }

            let located = scan.take_instances_of(kind.id());
            if located.is_empty() && self.show_empty_kinds {
                hierarchy
                    .tree
                    .insert_interior(self.namer.kind_path(kind).segments());
            }

            for found in located {
                let category = self.namer.category_for(kind, Some(&found.instance));
                let handle = InstanceHandle {
                    generation,
                    index: hierarchy.entries.len(),
                };
                if !hierarchy.tree.insert_leaf(&category, handle) {
                    warn!(
                        category = %category,
                        path = %found.path.display(),
                        "Multiple configs share one category path"
                    );
                    hierarchy.collisions.push(category.clone());
                }
                hierarchy.entries.push(HierarchyEntry {
                    loaded_id: found.instance.id().map(str::to_string),
                    instance: found.instance,
                    path: found.path,
                    category,
                });
            }
        }

        hierarchy.tree.sort();
        debug!(
            generation,
            kinds = visited.len(),
            instances = hierarchy.entries.len(),
            "Config hierarchy built"
        );
        hierarchy
    }
}
