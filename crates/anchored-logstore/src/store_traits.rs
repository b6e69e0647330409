use std::{error::Error as StdError, io::Read};

use crate::wire::WireRevision;


/// An append-only store of binary record streams, keyed by stream name.
///
/// A store holds one stream per registered name. Streams are only ever appended to during a
/// logging session; they are read back in full, strictly in append order, when a log target is
/// finalized. The store itself (not its callers) stamps each appended payload into a complete record
/// frame (see [`wire`]), so a stream read back via [`read_all`] is a sequence of frames matching
/// the store's [`WireRevision`].
///
/// Stream lifecycle cleanup after export is the store owner's responsibility; consumers of this
/// trait never delete a stream they have finished reading.
///
/// [`wire`]: crate::wire
/// [`read_all`]: RecordStore::read_all
pub trait RecordStore {
    /// A reader over the raw bytes of one stream, yielding every frame in append order.
    type RecordRead: Read;
    /// Error type for most operations. If possible, individual methods should document what
    /// errors the method may return.
    type Error:      StoreError;

    /// The record-frame layout revision this store writes. Constant for the store's lifetime;
    /// callers should probe once and cache the answer.
    fn wire_revision(&self) -> WireRevision;

    /// Set up the stream named `stream`, creating it if it does not exist. Registering an
    /// existing stream is permitted and leaves its contents unchanged.
    fn register(&mut self, stream: &str) -> Result<(), Self::Error>;

    /// Append one record with the given payload text to the named stream. The store frames the
    /// payload with its header and origin identifiers before writing.
    fn append(&mut self, stream: &str, payload: &str) -> Result<(), Self::Error>;

    /// Discard every record of the named stream, leaving it registered and empty.
    fn clear(&mut self, stream: &str) -> Result<(), Self::Error>;

    /// Open a reader over the full contents of the named stream, from its first record to its
    /// last. Records appended after this call are not guaranteed to be visible to the reader.
    fn read_all(&self, stream: &str) -> Result<Self::RecordRead, Self::Error>;
}

/// Basic interface for the [`RecordStore::Error`] associated type.
pub trait StoreError: StdError {
    /// Whether the error occurred because no stream was registered under a given name.
    fn is_not_found(&self) -> bool;
    /// Whether the error occurred because a mutex was poisoned.
    fn is_poison_error(&self) -> bool;
}
