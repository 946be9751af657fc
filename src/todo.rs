use crate::error::UserFacing;
use crate::models::TaskRecord;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid to-do list")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode to-do list")]
    Encode(#[source] serde_json::Error),
    #[error("task text is empty")]
    EmptyTask,
    #[error("no task at position {0}")]
    NoSuchTask(usize),
}

impl UserFacing for TodoError {
    fn user_message(&self) -> String {
        match self {
            TodoError::Io { .. } | TodoError::Encode(_) => "Could not save to-do list".to_string(),
            TodoError::Corrupt { path, .. } => {
                format!("To-do file {} is unreadable", path.display())
            }
            TodoError::EmptyTask => "Task text is empty".to_string(),
            TodoError::NoSuchTask(_) => "No such task".to_string(),
        }
    }
}

/// The file backing the to-do list. Every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct TodoStore {
    path: PathBuf,
}

impl TodoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty list. A file that exists but does not
    /// parse is an error and is left alone.
    pub fn load(&self) -> Result<Vec<TaskRecord>, TodoError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(TodoError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| TodoError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a sibling temp file and rename it over the target, so a
    /// reader never sees half a list.
    pub fn save(&self, tasks: &[TaskRecord]) -> Result<(), TodoError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        tasks.serialize(&mut serializer).map_err(TodoError::Encode)?;

        let io_err = |source| TodoError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        if let Err(e) = fs::write(&tmp_path, &buf).and_then(|_| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(e));
        }
        log::debug!("Saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

/// In-memory to-do list kept equal to its file: every mutation is saved
/// immediately and rolled back if the save fails.
#[derive(Debug)]
pub struct TodoList {
    store: TodoStore,
    tasks: Vec<TaskRecord>,
}

impl TodoList {
    pub fn open(store: TodoStore) -> Result<Self, TodoError> {
        let tasks = store.load()?;
        log::info!("Loaded {} tasks from {}", tasks.len(), store.path().display());
        Ok(Self { store, tasks })
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn add(&mut self, text: &str) -> Result<&TaskRecord, TodoError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TodoError::EmptyTask);
        }
        self.tasks.push(TaskRecord::new(text));
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks.pop();
            return Err(e);
        }
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn set_done(&mut self, index: usize, done: bool) -> Result<(), TodoError> {
        let task = self.tasks.get_mut(index).ok_or(TodoError::NoSuchTask(index))?;
        let previous = task.done;
        task.done = done;
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks[index].done = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Flip a task and return its new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool, TodoError> {
        let done = !self.tasks.get(index).ok_or(TodoError::NoSuchTask(index))?.done;
        self.set_done(index, done)?;
        Ok(done)
    }

    /// Exact text first, then the best fuzzy match.
    pub fn find(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(i) = self.tasks.iter().position(|t| t.text.eq_ignore_ascii_case(query)) {
            return Some(i);
        }

        let matcher = SkimMatcherV2::default();
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| matcher.fuzzy_match(&t.text, query).map(|score| (score, i)))
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|(_, i)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TodoStore {
        TodoStore::new(dir.path().join("todo.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let tasks = vec![TaskRecord::new("buy milk")];
        store.save(&tasks).unwrap();
        assert_eq!(store.load().unwrap(), tasks);
    }

    #[test]
    fn file_is_a_json_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&[TaskRecord {
                text: "water plants".to_string(),
                done: true,
            }])
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            raw,
            "[\n    {\n        \"text\": \"water plants\",\n        \"done\": true\n    }\n]"
        );
        assert!(!dir.path().join("todo.json.tmp").exists());
    }

    #[test]
    fn reads_files_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"[{"text": "a", "done": false}, {"text": "b", "done": true}]"#,
        )
        .unwrap();
        let tasks = store.load().unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[1].done);
    }

    #[test]
    fn corrupt_file_fails_and_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();

        let err = TodoList::open(store.clone()).unwrap_err();
        assert!(matches!(err, TodoError::Corrupt { .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn every_mutation_reaches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut list = TodoList::open(store.clone()).unwrap();

        list.add("  buy milk ").unwrap();
        list.add("call bank").unwrap();
        assert_eq!(store.load().unwrap(), list.tasks());
        assert_eq!(list.tasks()[0].text, "buy milk");

        assert!(list.toggle(1).unwrap());
        assert_eq!(store.load().unwrap(), list.tasks());
        assert!(store.load().unwrap()[1].done);

        list.set_done(1, false).unwrap();
        assert!(!store.load().unwrap()[1].done);
    }

    #[test]
    fn empty_task_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = TodoList::open(store_in(&dir)).unwrap();
        assert!(matches!(list.add("   "), Err(TodoError::EmptyTask)));
        assert!(list.is_empty());
        assert!(!dir.path().join("todo.json").exists());
    }

    #[test]
    fn out_of_range_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = TodoList::open(store_in(&dir)).unwrap();
        assert!(matches!(list.toggle(3), Err(TodoError::NoSuchTask(3))));
    }

    #[test]
    fn failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("todo.json");
        fs::create_dir(&path).unwrap();
        let mut list = TodoList {
            store: TodoStore::new(&path),
            tasks: Vec::new(),
        };

        let err = list.add("never saved").unwrap_err();
        assert!(matches!(err, TodoError::Io { .. }));
        assert!(list.is_empty());
        assert!(!dir.path().join("todo.json.tmp").exists());
    }

    #[test]
    fn find_prefers_exact_then_fuzzy() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = TodoList::open(store_in(&dir)).unwrap();
        list.add("buy milk").unwrap();
        list.add("book dentist").unwrap();
        list.add("milk the cow").unwrap();

        assert_eq!(list.find("Milk the cow"), Some(2));
        assert_eq!(list.find("dentst"), Some(1));
        assert_eq!(list.find("zzz"), None);
        assert_eq!(list.find(""), None);
    }
}
