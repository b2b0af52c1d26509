//! Status bucket classification for working tree paths.
//!
//! A directory counts as staged (or modified, unmerged, untracked) when any
//! path below it does, so every membership test runs against status sets
//! that have been expanded with their ancestor directories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The status bucket assigned to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Staged,
    Unmerged,
    Untracked,
    Modified,
    /// No status snapshot was applied (e.g. browsing a committed revision)
    Default,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Staged => "staged",
            Bucket::Unmerged => "unmerged",
            Bucket::Untracked => "untracked",
            Bucket::Modified => "modified",
            Bucket::Default => "default",
        }
    }

    /// Single-character marker shown next to a path
    pub fn marker(&self) -> Option<char> {
        match self {
            Bucket::Staged => Some('S'),
            Bucket::Unmerged => Some('U'),
            Bucket::Untracked => Some('?'),
            Bucket::Modified => Some('M'),
            Bucket::Default => None,
        }
    }
}

/// Snapshot of the working tree status, as reported by the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSets {
    pub staged: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub unmerged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
}

impl StatusSets {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.unmerged.is_empty()
            && self.untracked.is_empty()
    }
}

/// A path together with the bucket it was classified into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedPath {
    pub path: String,
    pub bucket: Bucket,
}

/// Subsets of a selection that actions operate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Selection {
    Staged,
    Modified,
    /// Modified or untracked
    Unstaged,
    /// Staged or modified, or anything that is not untracked
    Tracked,
}

/// A selection partitioned by bucket, preserving selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub staged: Vec<String>,
    pub unmerged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

/// Which path actions apply to a selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub history: bool,
    pub stage: bool,
    pub untrack: bool,
    pub difftool: bool,
    pub difftool_predecessor: bool,
    pub revert_unstaged: bool,
    pub revert_uncommitted: bool,
}

/// Add every parent directory of every path to the set of paths
pub fn expand_with_ancestors<I, S>(paths: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = BTreeSet::new();

    for path in paths {
        let path = path.as_ref();
        result.insert(path.to_string());

        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            // Every path already in the set has its ancestors in the set too
            if !result.insert(parent.to_string()) {
                break;
            }
            current = parent;
        }
    }

    result
}

/// Classify a single path against raw (unexpanded) status sets.
///
/// Priority is `unmerged > untracked > staged > modified`. A path found in
/// none of the sets is reported as staged.
pub fn classify(
    path: &str,
    staged: &BTreeSet<String>,
    unmerged: &BTreeSet<String>,
    modified: &BTreeSet<String>,
    untracked: &BTreeSet<String>,
) -> Bucket {
    let sets = StatusSets {
        staged: staged.clone(),
        modified: modified.clone(),
        unmerged: unmerged.clone(),
        untracked: untracked.clone(),
    };
    Classifier::new(&sets).classify(path)
}

/// Filter `paths` down to those matching `selection`, in input order
pub fn selected_by_bucket<S: AsRef<str>>(
    paths: &[S],
    sets: &StatusSets,
    selection: Selection,
) -> Vec<String> {
    Classifier::new(sets).selected_by_bucket(paths, selection)
}

/// Status sets expanded with ancestors, ready for repeated lookups
#[derive(Debug, Clone)]
pub struct Classifier {
    staged: BTreeSet<String>,
    modified: BTreeSet<String>,
    unmerged: BTreeSet<String>,
    untracked: BTreeSet<String>,
    fallback: Bucket,
}

impl Classifier {
    pub fn new(sets: &StatusSets) -> Self {
        Self {
            staged: expand_with_ancestors(&sets.staged),
            modified: expand_with_ancestors(&sets.modified),
            unmerged: expand_with_ancestors(&sets.unmerged),
            untracked: expand_with_ancestors(&sets.untracked),
            fallback: Bucket::Staged,
        }
    }

    /// Bucket reported for paths that match none of the status sets
    pub fn with_fallback(mut self, fallback: Bucket) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn classify(&self, path: &str) -> Bucket {
        if self.unmerged.contains(path) {
            Bucket::Unmerged
        } else if self.untracked.contains(path) {
            Bucket::Untracked
        } else if self.staged.contains(path) {
            Bucket::Staged
        } else if self.modified.contains(path) {
            Bucket::Modified
        } else {
            self.fallback
        }
    }

    pub fn classify_path(&self, path: &str) -> ClassifiedPath {
        ClassifiedPath {
            path: path.to_string(),
            bucket: self.classify(path),
        }
    }

    /// Partition an ordered selection into buckets
    pub fn classify_all<S: AsRef<str>>(&self, paths: &[S]) -> SelectionState {
        let mut state = SelectionState::default();

        for path in paths {
            let path = path.as_ref();
            let bucket = match self.classify(path) {
                Bucket::Unmerged => &mut state.unmerged,
                Bucket::Untracked => &mut state.untracked,
                Bucket::Modified => &mut state.modified,
                Bucket::Staged | Bucket::Default => &mut state.staged,
            };
            bucket.push(path.to_string());
        }

        state
    }

    pub fn matches(&self, path: &str, selection: Selection) -> bool {
        match selection {
            Selection::Staged => self.staged.contains(path),
            Selection::Modified => self.modified.contains(path),
            Selection::Unstaged => self.modified.contains(path) || self.untracked.contains(path),
            Selection::Tracked => {
                self.staged.contains(path)
                    || self.modified.contains(path)
                    || !self.untracked.contains(path)
            }
        }
    }

    pub fn selected_by_bucket<S: AsRef<str>>(&self, paths: &[S], selection: Selection) -> Vec<String> {
        let mut selected = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if self.matches(path, selection) {
                selected.push(path.to_string());
            }
        }
        selected
    }

    /// Work out which actions are available for the selected paths
    pub fn actions<S: AsRef<str>>(&self, paths: &[S]) -> ActionState {
        let any = |selection: Selection| !self.selected_by_bucket(paths, selection).is_empty();

        let staged = any(Selection::Staged);
        let modified = any(Selection::Modified);
        let unstaged = any(Selection::Unstaged);
        let tracked = any(Selection::Tracked);
        let revertable = staged || modified;

        ActionState {
            history: !paths.is_empty(),
            stage: staged || unstaged,
            untrack: tracked,
            difftool: staged || modified,
            difftool_predecessor: tracked,
            revert_unstaged: revertable,
            revert_uncommitted: revertable,
        }
    }
}
