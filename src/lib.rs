pub mod changes;
pub mod model;
pub mod storage;
pub mod store;
pub mod tags;
pub mod view;

pub use changes::{Change, ChangeHub, ChangeOrigin};
pub use model::{NewTodo, Priority, Todo, TodoPatch};
pub use storage::{MemoryStorage, RedbStorage, Storage, StorageError};
pub use store::{StoreError, TodoStore, STORE_KEY};
pub use view::{counts, visible, Counts, PriorityFilter, Query, StatusFilter};
