pub mod snapshot_service;
pub mod snapshot_store;

pub use snapshot_service::SnapshotService;
pub use snapshot_store::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore};
