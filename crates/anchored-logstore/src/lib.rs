// Main record-store trait
mod store_traits;
// The binary frame layout shared by every store implementation
pub mod wire;


// ================================
//  Store implementations
// ================================

pub mod memory_store;
pub mod std_store;


// ================================
//  Re-exports
// ================================

/// Module containing all the traits defined in this crate. May be used as a prelude.
pub mod traits {
    pub use crate::store_traits::{RecordStore, StoreError};
}

pub use self::store_traits::{RecordStore, StoreError};
pub use self::wire::{RecordOrigin, WireRevision};

pub use self::memory_store::MemoryStore;
pub use self::std_store::StdStore;
