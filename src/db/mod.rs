//! Remote datastore layer.

pub mod firestore;
pub mod memory;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::models::RemoteRecord;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

/// Well-known record paths.
pub mod paths {
    /// Current-state record, overwritten on every upload.
    pub const MESSAGE: &str = "message";
}

/// Overwrite-only store of current-state records.
///
/// Returned futures own everything they need so they can be spawned
/// detached from the caller.
pub trait RecordStore: Send + Sync {
    /// Replace the record at `path` with `record`.
    fn put(&self, path: &str, record: &RemoteRecord) -> BoxFuture<'static, Result<()>>;

    /// Read the record at `path`.
    fn get(&self, path: &str) -> BoxFuture<'static, Result<Option<RemoteRecord>>>;
}
