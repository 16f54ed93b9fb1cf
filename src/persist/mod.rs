//! Durable reading state: a key-value store, the record shapes written to
//! it, and the coordinator that debounces saves and replays restores.

pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod record;
pub mod store;

pub use coordinator::{CoordinatorState, PersistenceCoordinator, RestoredState};
pub use error::{PersistError, PersistResult};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
