//! Key-value persistence behind the history and settings stores.
//!
//! Values are whole serialized documents; a `set` replaces the previous
//! value in one write.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

pub const HISTORY_KEY: &str = "codescan:history";
pub const SETTINGS_KEY: &str = "codescan:settings";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
