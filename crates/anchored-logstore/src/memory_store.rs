use std::{error::Error as StdError, io::Cursor, sync::PoisonError};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use crate::store_traits::{RecordStore, StoreError};
use crate::wire::{self, RecordOrigin, WireRevision};


/// An in-memory [`RecordStore`]. Supports any number of independent streams.
///
/// The store is a cloneable handle; clones share the same streams, and any clone may be used
/// from any thread. Useful both for tests and for sessions whose log output need not survive
/// the process.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    streams:  Arc<Mutex<HashMap<String, Vec<u8>>>>,
    origin:   RecordOrigin,
    revision: WireRevision,
}

impl MemoryStore {
    /// Create an empty store writing [`WireRevision::Current`] frames.
    #[must_use]
    pub fn new() -> Self {
        Self::with_revision(WireRevision::Current)
    }

    /// Create an empty store writing frames of the given revision.
    #[must_use]
    pub fn with_revision(revision: WireRevision) -> Self {
        Self {
            streams: Arc::new(Mutex::new(HashMap::new())),
            origin:  RecordOrigin::local_process(),
            revision,
        }
    }

    /// Replace the origin identifiers stamped into every frame this store writes.
    #[must_use]
    pub fn with_origin(mut self, origin: RecordOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The number of raw bytes currently held by the named stream.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, and a
    /// `Poisoned` error if the internal mutex was poisoned.
    pub fn stream_len(&self, stream: &str) -> Result<usize, Error> {
        let streams = self.streams.lock()?;

        streams
            .get(stream)
            .map(Vec::len)
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))
    }

    /// Access the raw bytes of the named stream.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, and a
    /// `Poisoned` error if the internal mutex was poisoned.
    pub fn access_stream<T, F>(&self, stream: &str, callback: F) -> Result<T, Error>
    where
        F: FnOnce(&[u8]) -> T,
    {
        let streams = self.streams.lock()?;

        streams
            .get(stream)
            .map(|bytes| callback(bytes))
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))
    }
}

impl Default for MemoryStore {
    /// Create an empty store writing [`WireRevision::Current`] frames.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    type RecordRead = Cursor<Vec<u8>>;
    type Error      = Error;

    #[inline]
    fn wire_revision(&self) -> WireRevision {
        self.revision
    }

    /// Set up the stream named `stream`, creating it if it does not exist. Registering an
    /// existing stream leaves its contents unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `Poisoned` error if the internal mutex was poisoned.
    fn register(&mut self, stream: &str) -> Result<(), Self::Error> {
        let mut streams = self.streams.lock()?;

        if !streams.contains_key(stream) {
            streams.insert(stream.to_owned(), Vec::new());
        }
        Ok(())
    }

    /// Frame the payload and append the resulting record to the named stream.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, a `FieldTooLong`
    /// error if the payload cannot fit in a frame, and a `Poisoned` error if the internal mutex
    /// was poisoned.
    fn append(&mut self, stream: &str, payload: &str) -> Result<(), Self::Error> {
        let frame = wire::frame_record(self.revision, &self.origin, payload)?;

        let mut streams = self.streams.lock()?;

        let bytes = streams
            .get_mut(stream)
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))?;

        bytes.extend(frame);
        Ok(())
    }

    /// Discard every record of the named stream, leaving it registered and empty.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, and a
    /// `Poisoned` error if the internal mutex was poisoned.
    fn clear(&mut self, stream: &str) -> Result<(), Self::Error> {
        let mut streams = self.streams.lock()?;

        let bytes = streams
            .get_mut(stream)
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))?;

        bytes.clear();
        Ok(())
    }

    /// Open a reader over a snapshot of the named stream's current contents.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, and a
    /// `Poisoned` error if the internal mutex was poisoned.
    fn read_all(&self, stream: &str) -> Result<Self::RecordRead, Self::Error> {
        let streams = self.streams.lock()?;

        streams
            .get(stream)
            .map(|bytes| Cursor::new(bytes.clone()))
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No stream was registered under the given name.
    NotRegistered(String),
    /// A string was too long for its byte count to fit in a frame's length prefix.
    FieldTooLong(usize),
    /// The mutex guarding the streams was poisoned.
    Poisoned,
}

impl<T> From<PoisonError<T>> for Error {
    #[inline]
    fn from(_err: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

impl From<wire::FieldTooLong> for Error {
    #[inline]
    fn from(err: wire::FieldTooLong) -> Self {
        Self::FieldTooLong(err.0)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotRegistered(stream) => write!(
                f,
                "no stream is registered under the name {stream:?} in a MemoryStore",
            ),
            Self::FieldTooLong(len) => write!(
                f,
                "a string of {len} bytes cannot fit in a record frame's four-byte length prefix",
            ),
            Self::Poisoned => write!(
                f,
                "the mutex guarding a MemoryStore's streams was poisoned",
            ),
        }
    }
}

impl StdError for Error {}

impl StoreError for Error {
    #[inline]
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotRegistered(_))
    }

    #[inline]
    fn is_poison_error(&self) -> bool {
        matches!(self, Self::Poisoned)
    }
}


#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use crate::wire::RECORD_HEADER_SIZE;
    use super::*;


    #[test]
    fn register_is_idempotent() {
        let mut store = MemoryStore::new();

        store.register("stream").unwrap();
        store.append("stream", "one").unwrap();
        store.register("stream").unwrap();

        // The re-registration must not have wiped the stream.
        assert!(store.stream_len("stream").unwrap() > 0);
    }

    #[test]
    fn append_requires_registration() {
        let mut store = MemoryStore::new();

        let err = store.append("missing", "one").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn clear_empties_but_keeps_the_stream() {
        let mut store = MemoryStore::new();

        store.register("stream").unwrap();
        store.append("stream", "one").unwrap();
        store.clear("stream").unwrap();

        assert_eq!(store.stream_len("stream").unwrap(), 0);
        store.append("stream", "two").unwrap();
    }

    #[test]
    fn read_all_returns_appended_frames() {
        let mut store = MemoryStore::new();

        store.register("stream").unwrap();
        store.append("stream", "one").unwrap();
        store.append("stream", "two").unwrap();

        let mut bytes = Vec::new();
        store.read_all("stream").unwrap().read_to_end(&mut bytes).unwrap();

        assert_eq!(bytes.len(), store.stream_len("stream").unwrap());
        assert!(bytes.len() > 2 * RECORD_HEADER_SIZE);
    }

    #[test]
    fn clones_share_streams() {
        let mut store = MemoryStore::new();
        store.register("stream").unwrap();

        let mut clone = store.clone();
        clone.append("stream", "via clone").unwrap();

        assert!(store.stream_len("stream").unwrap() > 0);
    }
}
