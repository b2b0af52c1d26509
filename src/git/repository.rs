use super::file_tree::{ObjectKind, TreeEntry};
use super::status::StatusSets;
use anyhow::{anyhow, Context, Result};
use git2::{ObjectType, Oid, Repository as Git2Repo, Status, StatusOptions, TreeWalkMode, TreeWalkResult};
use std::path::Path;

pub struct Repository {
    repo: Git2Repo,
}

impl Repository {
    /// Open the repository containing `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path).context("Not a git repository")?;
        Ok(Self { repo })
    }

    /// Resolve a ref name to an OID
    pub fn resolve_ref(&self, ref_name: &str) -> Result<Oid> {
        if ref_name == "HEAD" {
            return self.head_commit();
        }

        // First try as a direct ref
        if let Ok(reference) = self.repo.find_reference(ref_name) {
            if let Some(oid) = reference.target() {
                return Ok(oid);
            }
        }

        // Try as a branch name
        if let Ok(branch) = self.repo.find_branch(ref_name, git2::BranchType::Local) {
            if let Some(oid) = branch.get().target() {
                return Ok(oid);
            }
        }

        // Try as a remote branch
        let remote_ref = format!("origin/{}", ref_name);
        if let Ok(branch) = self.repo.find_branch(&remote_ref, git2::BranchType::Remote) {
            if let Some(oid) = branch.get().target() {
                return Ok(oid);
            }
        }

        // Try revparse as last resort
        let obj = self
            .repo
            .revparse_single(ref_name)
            .context(format!("Could not resolve ref: {}", ref_name))?;

        Ok(obj.id())
    }

    /// Get the HEAD commit OID
    pub fn head_commit(&self) -> Result<Oid> {
        let head = self.repo.head().context("Failed to get HEAD")?;
        head.target().ok_or_else(|| anyhow!("HEAD has no target"))
    }

    /// Snapshot the working tree status into staged, modified, unmerged and
    /// untracked paths
    pub fn status_sets(&self) -> Result<StatusSets> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .context("Failed to read repository status")?;

        let staged_flags = Status::INDEX_NEW
            | Status::INDEX_MODIFIED
            | Status::INDEX_DELETED
            | Status::INDEX_RENAMED
            | Status::INDEX_TYPECHANGE;
        let modified_flags =
            Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_TYPECHANGE | Status::WT_RENAMED;

        let mut sets = StatusSets::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                log::warn!("skipping status entry with a non UTF-8 path");
                continue;
            };
            let status = entry.status();

            if status.is_conflicted() {
                sets.unmerged.insert(path.to_string());
                continue;
            }
            if status.intersects(staged_flags) {
                sets.staged.insert(path.to_string());
            }
            if status.intersects(modified_flags) {
                sets.modified.insert(path.to_string());
            }
            if status.contains(Status::WT_NEW) {
                sets.untracked.insert(path.to_string());
            }
        }

        log::debug!(
            "status: {} staged, {} modified, {} unmerged, {} untracked",
            sets.staged.len(),
            sets.modified.len(),
            sets.unmerged.len(),
            sets.untracked.len()
        );
        Ok(sets)
    }

    /// List every tree and blob reachable from `rev`, parents before
    /// children, like `git ls-tree --full-tree -r -t`
    pub fn tree_listing(&self, rev: &str) -> Result<Vec<TreeEntry>> {
        let oid = self.resolve_ref(rev)?;
        let tree = self
            .repo
            .find_object(oid, None)
            .and_then(|obj| obj.peel_to_tree())
            .context(format!("{} does not name a tree", rev))?;

        let mut entries = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            let Some(name) = entry.name() else {
                log::warn!("skipping non UTF-8 entry under {:?}", root);
                return TreeWalkResult::Skip;
            };
            let kind = match entry.kind() {
                Some(ObjectType::Tree) => ObjectKind::Tree,
                Some(ObjectType::Blob) => ObjectKind::Blob,
                Some(ObjectType::Commit) => ObjectKind::Commit,
                _ => return TreeWalkResult::Ok,
            };
            entries.push(TreeEntry::new(kind, format!("{}{}", root, name)));
            TreeWalkResult::Ok
        })
        .context("Failed to walk tree")?;

        Ok(entries)
    }

    /// Contents of the file at `path` in `rev`, like `git show rev:path`
    pub fn blob_contents(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        let oid = self.resolve_ref(rev)?;
        let tree = self
            .repo
            .find_object(oid, None)
            .and_then(|obj| obj.peel_to_tree())
            .context(format!("{} does not name a tree", rev))?;
        let entry = tree
            .get_path(Path::new(path))
            .context(format!("{} does not exist in {}", path, rev))?;
        let blob = entry
            .to_object(&self.repo)
            .and_then(|obj| obj.peel_to_blob())
            .context(format!("{} is not a file in {}", path, rev))?;

        Ok(blob.content().to_vec())
    }

    /// Paths in the index followed by untracked paths
    pub fn worktree_files(&self, status: &StatusSets) -> Result<Vec<String>> {
        let index = self.repo.index().context("Failed to read index")?;

        let mut files: Vec<String> = index
            .iter()
            .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
            .collect();
        // Conflicted paths have one entry per stage
        files.dedup();
        files.extend(status.untracked.iter().cloned());

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::status::{Bucket, Classifier};
    use git2::{IndexEntry, IndexTime};
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();

        fs::create_dir_all(dir.path().join("src/git")).unwrap();
        fs::write(dir.path().join("README.md"), "readme\n").unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("src/git/mod.rs"), "\n").unwrap();

        {
            let mut index = repo.index().unwrap();
            for path in ["README.md", "src/main.rs", "src/git/mod.rs"] {
                index.add_path(Path::new(path)).unwrap();
            }
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .unwrap();
        }

        (dir, Repository { repo })
    }

    #[test]
    fn test_open_discovers_from_subdirectory() {
        let (dir, _repo) = init_repo();
        assert!(Repository::discover(dir.path().join("src/git")).is_ok());
        assert!(Repository::discover(dir.path()).is_ok());
    }

    #[test]
    fn test_tree_listing() {
        let (_dir, repo) = init_repo();
        let entries = repo.tree_listing("HEAD").unwrap();
        assert_eq!(
            entries,
            vec![
                TreeEntry::new(ObjectKind::Blob, "README.md"),
                TreeEntry::new(ObjectKind::Tree, "src"),
                TreeEntry::new(ObjectKind::Tree, "src/git"),
                TreeEntry::new(ObjectKind::Blob, "src/git/mod.rs"),
                TreeEntry::new(ObjectKind::Blob, "src/main.rs"),
            ]
        );
    }

    #[test]
    fn test_head_commit() {
        let (_dir, repo) = init_repo();
        let head = repo.head_commit().unwrap();
        assert_eq!(repo.resolve_ref("HEAD").unwrap(), head);
    }

    #[test]
    fn test_unknown_rev() {
        let (_dir, repo) = init_repo();
        assert!(repo.tree_listing("no-such-branch").is_err());
    }

    #[test]
    fn test_status_sets() {
        let (dir, repo) = init_repo();

        fs::write(dir.path().join("src/main.rs"), "fn main() { }\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "todo\n").unwrap();
        fs::write(dir.path().join("src/new.rs"), "\n").unwrap();
        {
            let mut index = repo.repo.index().unwrap();
            index.add_path(Path::new("src/new.rs")).unwrap();
            index.write().unwrap();
        }

        let sets = repo.status_sets().unwrap();
        assert!(sets.modified.contains("src/main.rs"));
        assert!(sets.staged.contains("src/new.rs"));
        assert!(sets.untracked.contains("notes.txt"));
        assert!(sets.unmerged.is_empty());
        assert!(!sets.staged.contains("README.md"));

        let files = repo.worktree_files(&sets).unwrap();
        assert_eq!(
            files,
            vec![
                "README.md",
                "src/git/mod.rs",
                "src/main.rs",
                "src/new.rs",
                "notes.txt"
            ]
        );
    }

    #[test]
    fn test_blob_contents() {
        let (dir, repo) = init_repo();
        fs::write(dir.path().join("src/main.rs"), "changed\n").unwrap();

        assert_eq!(
            repo.blob_contents("HEAD", "src/main.rs").unwrap(),
            b"fn main() {}\n"
        );
        assert!(repo.blob_contents("HEAD", "src/git").is_err());
        assert!(repo.blob_contents("HEAD", "missing.txt").is_err());
    }

    #[test]
    fn test_conflicted_path_is_unmerged() {
        let (_dir, repo) = init_repo();

        {
            let entry = |content: &str, stage: u16| IndexEntry {
                ctime: IndexTime::new(0, 0),
                mtime: IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode: 0o100644,
                uid: 0,
                gid: 0,
                file_size: content.len() as u32,
                id: repo.repo.blob(content.as_bytes()).unwrap(),
                flags: stage << 12,
                flags_extended: 0,
                path: b"README.md".to_vec(),
            };

            let mut index = repo.repo.index().unwrap();
            // git2 has no conflict_add wrapper; mirror libgit2's
            // git_index_conflict_add: drop stage 0, insert stages 1-3.
            index.remove(Path::new("README.md"), 0).unwrap();
            index.add(&entry("base\n", 1)).unwrap();
            index.add(&entry("ours\n", 2)).unwrap();
            index.add(&entry("theirs\n", 3)).unwrap();
            index.write().unwrap();
        }

        let sets = repo.status_sets().unwrap();
        assert!(sets.unmerged.contains("README.md"));
        assert!(!sets.staged.contains("README.md"));
        assert!(!sets.modified.contains("README.md"));

        let classifier = Classifier::new(&sets);
        assert_eq!(classifier.classify("README.md"), Bucket::Unmerged);

        // One index entry per conflict stage, listed once
        let files = repo.worktree_files(&sets).unwrap();
        assert_eq!(files, vec!["README.md", "src/git/mod.rs", "src/main.rs"]);
    }
}
