//! OAuth token sets, their store and the manager that guards their use.

pub mod encryption;
mod manager;
mod memory;
mod storage;
mod tokens;

pub use manager::Manager;
pub use memory::MemoryStorage;
pub use storage::Storage;
pub use tokens::{TokenResponse, TokenSet};
