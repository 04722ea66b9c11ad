//! The on-disk store for stacks.
//!
//! Every stack is a directory at `.git/stacked/<title>/`, holding one `<sha>.json` file per ref and optionally
//! a `BASE_BRANCH` file. The directory listing is the only index.

use crate::{
    constants::{BASE_BRANCH_FILE, GIT_DIR, REF_FILE_EXTENSION, STACK_DIR},
    errors::StResult,
    stack::{RefFile, RefId, Stack},
};
use std::{fs, path::PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// File-backed CRUD for the refs of every stack in a repository.
#[derive(Debug, Clone)]
pub struct RefStore {
    /// The root of the repository's working tree.
    root: PathBuf,
}

impl RefStore {
    /// Creates a new [RefStore] for the repository rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the directory holding all stacks.
    pub fn stacks_dir(&self) -> PathBuf {
        self.root.join(GIT_DIR).join(STACK_DIR)
    }

    /// Returns the directory of the stack `title`.
    pub fn stack_dir(&self, title: &str) -> PathBuf {
        self.stacks_dir().join(title)
    }

    /// Returns the path of the ref file for `sha` within the stack `title`.
    fn ref_path(&self, title: &str, sha: &str) -> PathBuf {
        self.stack_dir(title)
            .join(format!("{}.{}", sha, REF_FILE_EXTENSION))
    }

    /// Returns `true` if a directory exists for the stack `title`.
    pub fn stack_exists(&self, title: &str) -> bool {
        self.stack_dir(title).is_dir()
    }

    /// Creates the directory for the stack `title`, if it does not exist yet.
    pub fn add_stack_dir(&self, title: &str) -> StResult<PathBuf> {
        let dir = self.stack_dir(title);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes a new ref file, creating the stack directory if needed.
    pub fn add_ref_file(&self, title: &str, record: &RefFile) -> StResult<()> {
        self.add_stack_dir(title)?;
        self.write_ref_file(title, record)
    }

    /// Overwrites an existing ref file.
    pub fn update_ref_file(&self, title: &str, record: &RefFile) -> StResult<()> {
        self.write_ref_file(title, record)
    }

    /// Persists the current state of the ref `id` of `stack`.
    pub fn update_ref(&self, stack: &Stack, id: RefId) -> StResult<()> {
        self.update_ref_file(stack.title(), &stack.record(id))
    }

    fn write_ref_file(&self, title: &str, record: &RefFile) -> StResult<()> {
        let path = self.ref_path(title, &record.sha);
        fs::write(&path, serde_json::to_vec(record)?)?;
        debug!(path = %path.display(), "wrote ref file");
        Ok(())
    }

    /// Deletes the ref file for `sha` within the stack `title`.
    pub fn delete_ref_file(&self, title: &str, sha: &str) -> StResult<()> {
        let path = self.ref_path(title, sha);
        fs::remove_file(&path)?;
        debug!(path = %path.display(), "deleted ref file");
        Ok(())
    }

    /// Loads every ref of the stack `title` and validates the chain.
    ///
    /// ## Returns
    /// - `Ok(Stack)` - The validated stack. A stack without a directory is empty.
    /// - `Err(StError::CorruptedStack)` - If the refs on disk do not form a single chain.
    /// - `Err(_)` - If a ref file could not be read or parsed.
    pub fn gather_refs(&self, title: &str) -> StResult<Stack> {
        let dir = self.stack_dir(title);

        // There might not be any refs yet, this is ok.
        if !dir.is_dir() {
            return Ok(Stack::new(title));
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(REF_FILE_EXTENSION)
            {
                continue;
            }

            trace!(path = %path.display(), "reading ref file");
            let record: RefFile = serde_json::from_slice(&fs::read(path)?)?;
            records.push(record);
        }

        Stack::from_records(title, records)
    }

    /// Returns the titles of every stack in the repository, sorted.
    pub fn list_stacks(&self) -> StResult<Vec<String>> {
        let dir = self.stacks_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut titles = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_dir() => {
                    Some(Ok(e.file_name().to_string_lossy().into_owned()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        titles.sort();
        Ok(titles)
    }

    /// Returns the base branch recorded for the stack `title`, if any.
    pub fn base_branch(&self, title: &str) -> StResult<Option<String>> {
        let path = self.stack_dir(title).join(BASE_BRANCH_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let branch = fs::read_to_string(path)?.trim().to_string();
        Ok(Some(branch).filter(|b| !b.is_empty()))
    }

    /// Records `branch` as the base branch of the stack `title`.
    pub fn set_base_branch(&self, title: &str, branch: &str) -> StResult<()> {
        let dir = self.add_stack_dir(title)?;
        fs::write(dir.join(BASE_BRANCH_FILE), branch)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::RefStore;
    use crate::{errors::StError, stack::RefFile};
    use std::fs;
    use tempfile::tempdir;

    fn record(sha: &str, prev: &str, next: &str) -> RefFile {
        RefFile {
            sha: sha.to_string(),
            prev: prev.to_string(),
            next: next.to_string(),
            branch: format!("Branch{}", sha),
            ..Default::default()
        }
    }

    #[test]
    fn missing_stack_is_empty() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        assert!(store.gather_refs("nothing").unwrap().is_empty());
        assert!(store.list_stacks().unwrap().is_empty());
    }

    #[test]
    fn ref_files_use_the_documented_layout() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        store.add_ref_file("title", &record("abc", "", "")).unwrap();

        let path = dir.path().join(".git/stacked/title/abc.json");
        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(
            contents,
            r#"{"prev":"","branch":"Branchabc","sha":"abc","next":"","mr":"","description":""}"#
        );
    }

    #[test]
    fn gather_refs_assembles_chain_and_ignores_other_files() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        store.add_ref_file("title", &record("1", "", "2")).unwrap();
        store.add_ref_file("title", &record("2", "1", "")).unwrap();
        store.set_base_branch("title", "main").unwrap();

        let stack = store.gather_refs("title").unwrap();
        assert_eq!(stack.branches(), vec!["Branch1", "Branch2"]);
        assert_eq!(store.base_branch("title").unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn gather_refs_rejects_two_heads() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        store.add_ref_file("title", &record("1", "", "")).unwrap();
        store.add_ref_file("title", &record("2", "", "")).unwrap();

        let err = store.gather_refs("title").unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
        assert!(err.to_string().contains("Data might be corrupted"));
    }

    #[test]
    fn update_and_delete_ref_files() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        store.add_ref_file("title", &record("1", "", "")).unwrap();

        let mut updated = record("1", "", "");
        updated.mr = "https://gitlab.com/a/b/-/merge_requests/7".to_string();
        store.update_ref_file("title", &updated).unwrap();
        let stack = store.gather_refs("title").unwrap();
        assert_eq!(
            stack[stack.first().unwrap()].mr.as_deref(),
            Some("https://gitlab.com/a/b/-/merge_requests/7")
        );

        store.delete_ref_file("title", "1").unwrap();
        assert!(store.gather_refs("title").unwrap().is_empty());
    }

    #[test]
    fn list_stacks_returns_directories() {
        let dir = tempdir().unwrap();
        let store = RefStore::new(dir.path().to_path_buf());
        store.add_stack_dir("zeta").unwrap();
        store.add_stack_dir("alpha").unwrap();

        assert_eq!(store.list_stacks().unwrap(), vec!["alpha", "zeta"]);
        assert!(store.stack_exists("alpha"));
        assert!(!store.stack_exists("beta"));
    }
}
