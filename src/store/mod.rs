//! Storage handle for the persisted analysis record.
//!
//! The [`CacheStore`] trait is the only thing the engine knows about
//! persistence: read the whole record, or replace it. Backends:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`JsonFileStore`] | the CLI; atomic whole-file rewrite |
//! | [`MemoryStore`] | tests and embedding |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

/// Abstract single-record store.
///
/// One writer at a time is assumed. A [`write`](CacheStore::write) either
/// fully replaces the previous contents or leaves them untouched.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Current contents, or `None` when nothing has been stored yet.
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the stored contents.
    async fn write(&self, contents: &str) -> Result<()>;
}
