//! The store — sole authority over persisted todo state.
//!
//! The whole list lives as one JSON array under one storage key, and every
//! mutation is read-all / modify / write-all. That full-collection rewrite
//! is the documented persistence contract: partial writes at the storage
//! level do not exist, only logical operations here do.
//!
//! Failure policy: storage trouble and malformed data degrade silently
//! (reads go empty, writes become no-ops) and are logged at warn. The one
//! failure a caller ever sees is `DuplicateTitle` on create.

use crate::changes::{ChangeHub, ChangeOrigin};
use crate::model::{NewTodo, Todo, TodoPatch};
use crate::storage::{RedbStorage, Storage, StorageError};
use chrono::{Days, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// The single storage key holding the serialized todo array.
pub const STORE_KEY: &str = "todos";

#[derive(Clone)]
pub struct TodoStore {
    storage: Arc<dyn Storage>,
    changes: ChangeHub,
}

impl TodoStore {
    /// Open a redb-backed store at the given path. Construct once per
    /// process; the handle is cheap to clone.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(TodoStore::with_storage(Arc::new(RedbStorage::open(path)?)))
    }

    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        TodoStore {
            storage,
            changes: ChangeHub::new(),
        }
    }

    /// The hub every view subscribes to. Fires after each successful write;
    /// storage-medium watchers feed their cross-context signal in here too.
    pub fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    // ── Reads ──────────────────────────────────────────────────

    /// The full list. Absent key, unusable storage, and malformed content
    /// all read as empty — never an error. Malformed content is left on
    /// disk untouched.
    pub fn read_all(&self) -> Vec<Todo> {
        let raw = match self.storage.get(STORE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "storage unreadable, treating as empty");
                return Vec::new();
            }
        };
        let Some(raw) = raw else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Todo>>(&raw) {
            Ok(todos) => todos,
            Err(e) => {
                warn!(error = %e, "stored todos are not a valid todo array, treating as empty");
                Vec::new()
            }
        }
    }

    // ── Writes ─────────────────────────────────────────────────

    /// Persist the full list verbatim — no validation, no dedupe; callers
    /// must have validated already. Notifies on success.
    pub fn write_all(&self, todos: &[Todo]) {
        let json = match serde_json::to_string(todos) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "todo list failed to serialize, write dropped");
                return;
            }
        };
        if let Err(e) = self.storage.set(STORE_KEY, &json) {
            warn!(error = %e, "storage write failed, change dropped");
            return;
        }
        self.changes.emit(STORE_KEY, ChangeOrigin::Local);
    }

    /// Append a new todo. Rejected when an existing record's trimmed,
    /// case-folded title matches — rejected, never merged.
    pub fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let mut todos = self.read_all();

        let wanted = normalized_title(&new.title);
        if todos.iter().any(|t| normalized_title(&t.title) == wanted) {
            return Err(StoreError::DuplicateTitle);
        }

        let todo = Todo {
            id: new.id,
            title: new.title,
            completed: false,
            created_at: Some(Utc::now()),
            due: new.due,
            priority: new.priority,
            notes: new.notes,
            tags: new.tags,
        };
        todos.push(todo.clone());
        self.write_all(&todos);
        Ok(todo)
    }

    /// Shallow-merge `patch` into the matching record. Returns whether a
    /// record matched; unknown ids write nothing and notify nothing.
    pub fn patch(&self, id: Uuid, patch: &TodoPatch) -> bool {
        let mut todos = self.read_all();
        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        patch.apply(todo);
        self.write_all(&todos);
        true
    }

    /// Remove the matching record if present. Writes (and notifies)
    /// unconditionally — deleting an unknown id is idempotent, not an error.
    pub fn delete(&self, id: Uuid) -> bool {
        let mut todos = self.read_all();
        let before = todos.len();
        todos.retain(|t| t.id != id);
        let removed = todos.len() != before;
        self.write_all(&todos);
        removed
    }

    /// Push the due date forward by one calendar day, preserving
    /// time-of-day. A record with no due date starts from now.
    pub fn snooze(&self, id: Uuid) -> bool {
        let mut todos = self.read_all();
        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        let base = todo.due.unwrap_or_else(Utc::now);
        todo.due = Some(base.checked_add_days(Days::new(1)).unwrap_or(base));
        self.write_all(&todos);
        true
    }

    // ── Bulk clears ────────────────────────────────────────────

    pub fn clear_completed(&self) {
        let todos: Vec<Todo> = self.read_all().into_iter().filter(|t| !t.completed).collect();
        self.write_all(&todos);
    }

    pub fn clear_active(&self) {
        let todos: Vec<Todo> = self.read_all().into_iter().filter(|t| t.completed).collect();
        self.write_all(&todos);
    }

    pub fn clear_all(&self) {
        self.write_all(&[]);
    }
}

fn normalized_title(title: &str) -> String {
    title.trim().to_lowercase()
}

// ── Errors ─────────────────────────────────────────────────────

/// The only store failure a caller ever sees. The message is meant for
/// direct display to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateTitle,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateTitle => write!(f, "A todo with that title already exists."),
        }
    }
}

impl std::error::Error for StoreError {}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::storage::MemoryStorage;
    use chrono::{DateTime, Duration};

    /// Storage that fails every operation, like a context with no
    /// persistence capability at all.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    fn memory_store() -> (TodoStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (TodoStore::with_storage(storage.clone()), storage)
    }

    fn draft(title: &str) -> NewTodo {
        NewTodo::titled(title)
    }

    #[test]
    fn creates_with_distinct_titles_all_stored() {
        let (store, _) = memory_store();

        let a = store.create(draft("Buy milk")).unwrap();
        let b = store
            .create(NewTodo {
                priority: Priority::High,
                notes: Some("before friday".into()),
                tags: vec!["work".into()],
                ..draft("Ship release")
            })
            .unwrap();

        let todos = store.read_all();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].id, a.id);
        assert_eq!(todos[1].id, b.id);
        assert_eq!(todos[1].priority, Priority::High);
        assert_eq!(todos[1].notes.as_deref(), Some("before friday"));
        assert_eq!(todos[1].tags, vec!["work".to_string()]);
        assert!(!todos[0].completed);
        assert!(todos[0].created_at.is_some());
    }

    #[test]
    fn duplicate_title_rejected_case_and_whitespace_insensitive() {
        let (store, _) = memory_store();

        store.create(draft("  buy milk ")).unwrap();
        let err = store.create(draft("Buy milk")).unwrap_err();

        assert_eq!(err, StoreError::DuplicateTitle);
        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn patch_sets_completed_and_nothing_else() {
        let (store, _) = memory_store();
        let todo = store
            .create(NewTodo {
                notes: Some("unchanged".into()),
                ..draft("Water plants")
            })
            .unwrap();

        assert!(store.patch(todo.id, &TodoPatch::completed(true)));

        let stored = store.read_all();
        assert!(stored[0].completed);
        assert_eq!(stored[0].title, "Water plants");
        assert_eq!(stored[0].notes.as_deref(), Some("unchanged"));
        assert_eq!(stored[0].created_at, todo.created_at);
    }

    #[test]
    fn patch_unknown_id_leaves_stored_bytes_unchanged() {
        let (store, storage) = memory_store();
        store.create(draft("Something")).unwrap();

        let before = storage.get(STORE_KEY).unwrap().unwrap();
        assert!(!store.patch(Uuid::new_v4(), &TodoPatch::completed(true)));
        let after = storage.get(STORE_KEY).unwrap().unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn snooze_advances_existing_due_by_one_day() {
        let (store, _) = memory_store();
        let due: DateTime<Utc> = "2024-01-01T10:00:00Z".parse().unwrap();
        let todo = store
            .create(NewTodo {
                due: Some(due),
                ..draft("Pay rent")
            })
            .unwrap();

        assert!(store.snooze(todo.id));

        let expected: DateTime<Utc> = "2024-01-02T10:00:00Z".parse().unwrap();
        assert_eq!(store.read_all()[0].due, Some(expected));
    }

    #[test]
    fn snooze_without_due_starts_from_now() {
        let (store, _) = memory_store();
        let todo = store.create(draft("Someday task")).unwrap();

        store.snooze(todo.id);

        let due = store.read_all()[0].due.unwrap();
        let expected = Utc::now() + Duration::days(1);
        assert!((due - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn snooze_unknown_id_is_noop() {
        let (store, storage) = memory_store();
        store.create(draft("Stable")).unwrap();

        let before = storage.get(STORE_KEY).unwrap().unwrap();
        assert!(!store.snooze(Uuid::new_v4()));
        assert_eq!(storage.get(STORE_KEY).unwrap().unwrap(), before);
    }

    #[test]
    fn write_read_round_trip_is_byte_stable() {
        let (store, storage) = memory_store();
        store
            .create(NewTodo {
                due: Some("2025-03-10T08:30:00Z".parse().unwrap()),
                notes: Some("round trip".into()),
                tags: vec!["a".into(), "b".into()],
                ..draft("Stable bytes")
            })
            .unwrap();

        let before = storage.get(STORE_KEY).unwrap().unwrap();
        store.write_all(&store.read_all());
        let after = storage.get(STORE_KEY).unwrap().unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn delete_removes_and_reports_match() {
        let (store, _) = memory_store();
        let keep = store.create(draft("Keep")).unwrap();
        let gone = store.create(draft("Gone")).unwrap();

        assert!(store.delete(gone.id));

        let todos = store.read_all();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, keep.id);
    }

    #[test]
    fn delete_unknown_id_still_notifies_but_changes_nothing() {
        let (store, storage) = memory_store();
        store.create(draft("Survivor")).unwrap();
        let before = storage.get(STORE_KEY).unwrap().unwrap();

        let mut rx = store.changes().subscribe();
        assert!(!store.delete(Uuid::new_v4()));

        let change = rx.try_recv().unwrap();
        assert_eq!(change.key, STORE_KEY);
        assert_eq!(change.origin, ChangeOrigin::Local);
        assert_eq!(storage.get(STORE_KEY).unwrap().unwrap(), before);
    }

    #[test]
    fn every_successful_write_notifies() {
        let (store, _) = memory_store();
        let mut rx = store.changes().subscribe();

        let todo = store.create(draft("Loud")).unwrap();
        store.patch(todo.id, &TodoPatch::completed(true));
        store.snooze(todo.id);
        store.clear_completed();

        for _ in 0..4 {
            assert!(rx.try_recv().is_ok());
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failed_patch_does_not_notify() {
        let (store, _) = memory_store();
        let mut rx = store.changes().subscribe();

        store.patch(Uuid::new_v4(), &TodoPatch::completed(true));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_content_reads_empty_and_stays_untouched() {
        let (store, storage) = memory_store();
        storage.set(STORE_KEY, "this is not json").unwrap();

        assert!(store.read_all().is_empty());
        // Not auto-repaired
        assert_eq!(
            storage.get(STORE_KEY).unwrap().as_deref(),
            Some("this is not json")
        );

        // Wrong shape degrades the same way
        storage.set(STORE_KEY, r#"{"not":"an array"}"#).unwrap();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn absent_key_reads_as_empty_list() {
        let (store, _) = memory_store();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn unavailable_storage_degrades_silently() {
        let store = TodoStore::with_storage(Arc::new(BrokenStorage));

        assert!(store.read_all().is_empty());
        // Writes no-op rather than raise; create still reports success
        // because the duplicate check is the only surfaced failure.
        assert!(store.create(draft("Into the void")).is_ok());
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn clears_partition_by_completion() {
        let (store, _) = memory_store();
        let a = store.create(draft("Done one")).unwrap();
        store.create(draft("Open one")).unwrap();
        store.patch(a.id, &TodoPatch::completed(true));

        store.clear_completed();
        let todos = store.read_all();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Open one");

        store.clear_active();
        assert!(store.read_all().is_empty());

        store.create(draft("Last")).unwrap();
        store.clear_all();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn dates_survive_a_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.redb");
        let due: DateTime<Utc> = "2026-08-24T18:45:00Z".parse().unwrap();

        let created = {
            let store = TodoStore::open(&path).unwrap();
            store
                .create(NewTodo {
                    due: Some(due),
                    ..NewTodo::titled("On disk")
                })
                .unwrap()
        };

        let store = TodoStore::open(&path).unwrap();
        let todos = store.read_all();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].due, Some(due));
        assert_eq!(todos[0].created_at, created.created_at);
    }
}
