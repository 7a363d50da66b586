//! Client half: availability probing, backend calls, local mirror and the
//! facade that orchestrates them.

pub mod facade;
pub mod mirror;
pub mod prober;
pub mod remote;
pub mod storage;

pub use facade::SyncFacade;
pub use mirror::{LocalMirror, Session};
pub use prober::AvailabilityProber;
pub use remote::{RemoteBackend, RemoteError};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
