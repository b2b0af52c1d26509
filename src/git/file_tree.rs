//! File tree construction from flat path lists and tree listings.
//!
//! Paths may arrive in any order: missing parent directories are created on
//! demand. Within every directory, sub-directories are kept ahead of files,
//! and each group keeps its insertion order.

use super::error::TreeError;
use super::status::{Bucket, Classifier};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Index of a node inside a [`TreeAssembler`]
pub type NodeId = usize;

/// The invisible root directory, registered under the empty path
pub const ROOT: NodeId = 0;

/// Kind of object named by a tree listing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Tree,
    Blob,
    /// Submodule gitlink
    Commit,
}

impl ObjectKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(ObjectKind::Tree),
            "blob" => Some(ObjectKind::Blob),
            "commit" => Some(ObjectKind::Commit),
            _ => None,
        }
    }
}

/// One record of a tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: ObjectKind,
    pub path: String,
}

impl TreeEntry {
    pub fn new(kind: ObjectKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// A node in the file tree
#[derive(Debug, Clone, Serialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    pub children: Vec<FileTreeNode>,
    pub status: Option<Bucket>,
}

/// A node as stored by the assembler
#[derive(Debug, Clone)]
pub struct Node {
    path: String,
    is_folder: bool,
    children: Vec<NodeId>,
    // Number of leading children that are directories
    dir_count: usize,
    status: Option<Bucket>,
}

impl Node {
    fn new(path: &str, is_folder: bool) -> Self {
        Self {
            path: path.to_string(),
            is_folder,
            children: Vec::new(),
            dir_count: 0,
            status: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        basename(&self.path)
    }

    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn status(&self) -> Option<Bucket> {
        self.status
    }
}

/// Outcome of ingesting a whole tree listing
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: usize,
    pub skipped: usize,
    pub errors: Vec<TreeError>,
}

/// Incrementally builds a directories-first tree
#[derive(Debug, Clone)]
pub struct TreeAssembler {
    nodes: Vec<Node>,
    dirs: HashMap<String, NodeId>,
    files: HashSet<String>,
}

impl Default for TreeAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeAssembler {
    pub fn new() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(String::new(), ROOT);
        Self {
            nodes: vec![Node::new("", true)],
            dirs,
            files: HashSet::new(),
        }
    }

    /// Number of nodes, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    /// Find a registered directory by path
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.dirs.get(path).copied()
    }

    /// Add each path as a file, collecting the paths that were rejected
    pub fn add_files<S: AsRef<str>>(&mut self, paths: &[S]) -> Vec<TreeError> {
        let mut errors = Vec::new();
        for path in paths {
            if let Err(err) = self.add_file(path.as_ref()) {
                log::warn!("{}", err);
                errors.push(err);
            }
        }
        errors
    }

    /// Append a file node, creating its parent directories when needed
    pub fn add_file(&mut self, path: &str) -> Result<NodeId, TreeError> {
        validate_path(path)?;
        if self.dirs.contains_key(path) {
            return Err(file_and_directory(path));
        }

        let parent = self.materialize_ancestors(dirname(path))?;

        let id = self.push_node(path, false);
        self.nodes[parent].children.push(id);
        self.files.insert(path.to_string());
        Ok(id)
    }

    /// Insert a directory node after the existing directory children of
    /// `parent`, which must be the registered directory of the path's
    /// dirname. A directory that is already registered is returned as is.
    pub fn add_directory(&mut self, parent: NodeId, path: &str) -> Result<NodeId, TreeError> {
        validate_path(path)?;
        match self.lookup(dirname(path)) {
            Some(id) if id == parent => {}
            Some(_) => return Err(malformed(path, "parent does not match the path")),
            None => return Err(malformed(path, "parent directory is not registered")),
        }

        self.insert_directory(parent, path)
    }

    /// Resolve a directory path, creating every missing directory from the
    /// root down. Returns the deepest directory.
    pub fn materialize_ancestors(&mut self, path: &str) -> Result<NodeId, TreeError> {
        if let Some(id) = self.lookup(path) {
            return Ok(id);
        }
        validate_path(path)?;

        let mut parent = ROOT;
        let ends = path
            .match_indices('/')
            .map(|(index, _)| index)
            .chain(std::iter::once(path.len()));

        for end in ends {
            parent = self.insert_directory(parent, &path[..end])?;
        }

        Ok(parent)
    }

    // `parent` is trusted to be the directory node of `dirname(path)`
    fn insert_directory(&mut self, parent: NodeId, path: &str) -> Result<NodeId, TreeError> {
        if let Some(id) = self.lookup(path) {
            return Ok(id);
        }
        if self.files.contains(path) {
            return Err(file_and_directory(path));
        }

        let id = self.push_node(path, true);
        let parent = &mut self.nodes[parent];
        parent.children.insert(parent.dir_count, id);
        parent.dir_count += 1;
        self.dirs.insert(path.to_string(), id);
        Ok(id)
    }

    /// Place a single tree listing entry.
    ///
    /// Directory entries must find their parent already registered; file
    /// entries create missing parents. Submodule entries are skipped and
    /// yield `None`.
    pub fn ingest_entry(&mut self, entry: &TreeEntry) -> Result<Option<NodeId>, TreeError> {
        match entry.kind {
            ObjectKind::Tree => {
                validate_path(&entry.path)?;
                let parent = self
                    .lookup(dirname(&entry.path))
                    .ok_or_else(|| malformed(&entry.path, "parent directory has not been listed"))?;
                self.add_directory(parent, &entry.path).map(Some)
            }
            ObjectKind::Blob => self.add_file(&entry.path).map(Some),
            ObjectKind::Commit => {
                log::debug!("skipping submodule {}", entry.path);
                Ok(None)
            }
        }
    }

    /// Ingest a listing in order. Malformed entries are reported and
    /// skipped; the entries after them are still ingested.
    pub fn ingest_tree_listing(&mut self, entries: &[TreeEntry]) -> IngestReport {
        let mut report = IngestReport::default();

        for entry in entries {
            match self.ingest_entry(entry) {
                Ok(Some(_)) => report.ingested += 1,
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    log::warn!("{}", err);
                    report.skipped += 1;
                    report.errors.push(err);
                }
            }
        }

        log::debug!(
            "ingested {} of {} listing entries",
            report.ingested,
            entries.len()
        );
        report
    }

    /// Record the status bucket of every node
    pub fn annotate(&mut self, classifier: &Classifier) {
        for node in self.nodes.iter_mut().skip(1) {
            node.status = Some(classifier.classify(&node.path));
        }
    }

    /// Take an owned snapshot of the tree, starting at the root's children
    pub fn into_tree(self) -> Vec<FileTreeNode> {
        self.snapshot(ROOT).children
    }

    fn snapshot(&self, id: NodeId) -> FileTreeNode {
        let node = &self.nodes[id];
        FileTreeNode {
            name: node.name().to_string(),
            path: node.path.clone(),
            is_folder: node.is_folder,
            children: node.children.iter().map(|&c| self.snapshot(c)).collect(),
            status: node.status,
        }
    }

    fn push_node(&mut self, path: &str, is_folder: bool) -> NodeId {
        self.nodes.push(Node::new(path, is_folder));
        self.nodes.len() - 1
    }
}

fn validate_path(path: &str) -> Result<(), TreeError> {
    let reason = if path.is_empty() {
        "empty path"
    } else if path.split('/').any(str::is_empty) {
        "empty path component"
    } else {
        return Ok(());
    };

    Err(malformed(path, reason))
}

fn malformed(path: &str, reason: &'static str) -> TreeError {
    TreeError::MalformedEntry {
        path: path.to_string(),
        reason,
    }
}

fn file_and_directory(path: &str) -> TreeError {
    malformed(path, "path is both a file and a directory")
}

/// Parent directory of a path, `""` for top-level entries
fn dirname(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// First file in display order
pub fn first_file(nodes: &[FileTreeNode]) -> Option<&FileTreeNode> {
    nodes.iter().find_map(|node| {
        if node.is_folder {
            first_file(&node.children)
        } else {
            Some(node)
        }
    })
}

/// Flatten the file tree for line-oriented display.
///
/// Folders at `max_depth` or deeper are listed collapsed.
pub fn flatten_tree(
    nodes: &[FileTreeNode],
    depth: usize,
    max_depth: Option<usize>,
) -> Vec<FlatFileEntry> {
    let mut result = Vec::new();

    for node in nodes {
        let is_expanded = node.is_folder && max_depth.map_or(true, |max| depth < max);

        result.push(FlatFileEntry {
            name: node.name.clone(),
            path: node.path.clone(),
            depth,
            is_folder: node.is_folder,
            is_expanded,
            status: node.status,
        });

        if is_expanded {
            result.extend(flatten_tree(&node.children, depth + 1, max_depth));
        }
    }

    result
}

/// A flattened file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFileEntry {
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub is_folder: bool,
    pub is_expanded: bool,
    pub status: Option<Bucket>,
}
