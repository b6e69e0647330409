use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::Utc;


/// The opaque header of each record is 16 bytes long: a millisecond timestamp, a severity slot,
/// and the originating process handle.
///
/// Readers are expected to skip the header; none of its fields take part in log export.
pub const RECORD_HEADER_SIZE: usize = size_of::<i64>() + size_of::<u32>() + size_of::<u32>();

/// Each variable-length field of a record is prefixed by its length in bytes, big-endian.
pub const LENGTH_PREFIX_SIZE: usize = size_of::<u32>();


/// The record-frame layout version of a store.
///
/// A store reports its revision once, via [`RecordStore::wire_revision`]; consumers are expected
/// to cache the answer rather than re-probing per record. [`Current`] frames carry two identifier
/// strings that [`Legacy`] frames omit entirely.
///
/// [`RecordStore::wire_revision`]: crate::store_traits::RecordStore::wire_revision
/// [`Current`]: WireRevision::Current
/// [`Legacy`]: WireRevision::Legacy
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireRevision {
    /// Frames carry two identifier strings: originating endpoint, originating process.
    Legacy,
    /// Frames carry four identifier strings: originating endpoint, originating process,
    /// credential, trust endpoint.
    #[default]
    Current,
}

impl WireRevision {
    /// The number of length-prefixed identifier strings between a frame's header and its payload.
    #[inline]
    #[must_use]
    pub const fn identifier_count(self) -> usize {
        match self {
            Self::Legacy  => 2,
            Self::Current => 4,
        }
    }
}

/// The identifier strings stamped into every frame a store writes.
///
/// These identify where a record came from, not what it says; export skips over all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOrigin {
    /// The endpoint (machine) the record originated from.
    pub endpoint:       String,
    /// The process the record originated from.
    pub process:        String,
    /// The credential identifier of the originating process. Only written by
    /// [`WireRevision::Current`] stores.
    pub credential:     String,
    /// The trust endpoint the originating process authenticated against. Only written by
    /// [`WireRevision::Current`] stores.
    pub trust_endpoint: String,
}

impl RecordOrigin {
    /// An origin describing the current process on the local endpoint.
    #[must_use]
    pub fn local_process() -> Self {
        let process = format!("pid-{}", std::process::id());
        Self {
            endpoint:       "local".to_owned(),
            process,
            credential:     "anonymous".to_owned(),
            trust_endpoint: "local".to_owned(),
        }
    }
}

/// Append `value` to `buffer` as a big-endian four-byte byte count followed by the UTF-8 bytes
/// themselves. A length of zero (and no further bytes) encodes the empty string.
///
/// # Errors
///
/// Returns a [`FieldTooLong`] error if the string is 4 GiB or longer, as its byte count would
/// not fit in the length prefix.
pub fn append_length_prefixed(buffer: &mut Vec<u8>, value: &str) -> Result<(), FieldTooLong> {
    let byte_len = u32::try_from(value.len())
        .map_err(|_| FieldTooLong(value.len()))?;

    buffer.extend(byte_len.to_be_bytes());
    buffer.extend(value.as_bytes());
    Ok(())
}

/// Produce one complete record frame: the 16-byte opaque header, the origin identifier strings
/// dictated by `revision`, and finally the length-prefixed payload.
///
/// # Errors
///
/// Returns a [`FieldTooLong`] error if the payload or any origin string is 4 GiB or longer.
pub fn frame_record(
    revision: WireRevision,
    origin:   &RecordOrigin,
    payload:  &str,
) -> Result<Vec<u8>, FieldTooLong> {
    let mut frame = Vec::with_capacity(
        RECORD_HEADER_SIZE
            + (revision.identifier_count() + 1) * LENGTH_PREFIX_SIZE
            + payload.len(),
    );

    frame.extend(Utc::now().timestamp_millis().to_be_bytes());
    // The severity slot is unused by export, and a store has no severity to record.
    frame.extend(0_u32.to_be_bytes());
    frame.extend(std::process::id().to_be_bytes());

    append_length_prefixed(&mut frame, &origin.endpoint)?;
    append_length_prefixed(&mut frame, &origin.process)?;

    if revision == WireRevision::Current {
        append_length_prefixed(&mut frame, &origin.credential)?;
        append_length_prefixed(&mut frame, &origin.trust_endpoint)?;
    }

    append_length_prefixed(&mut frame, payload)?;

    Ok(frame)
}


/// A string was too long for its byte count to fit in a record frame's four-byte length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTooLong(pub usize);

impl Display for FieldTooLong {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "a string of {} bytes cannot fit in a record frame's four-byte length prefix",
            self.0,
        )
    }
}

impl StdError for FieldTooLong {}


#[cfg(test)]
mod tests {
    use super::*;


    fn test_origin() -> RecordOrigin {
        RecordOrigin {
            endpoint:       "endpoint-a".to_owned(),
            process:        "proc".to_owned(),
            credential:     "cred".to_owned(),
            trust_endpoint: "trust".to_owned(),
        }
    }

    #[test]
    fn length_prefix_is_a_byte_count() {
        let mut buffer = Vec::new();
        // Three characters, five bytes.
        append_length_prefixed(&mut buffer, "héé").unwrap();

        assert_eq!(&buffer[..4], &5_u32.to_be_bytes());
        assert_eq!(&buffer[4..], "héé".as_bytes());
    }

    #[test]
    fn empty_string_is_length_zero() {
        let mut buffer = Vec::new();
        append_length_prefixed(&mut buffer, "").unwrap();

        assert_eq!(buffer, 0_u32.to_be_bytes());
    }

    #[test]
    fn frame_field_count_follows_revision() {
        let origin = test_origin();

        let legacy  = frame_record(WireRevision::Legacy,  &origin, "message").unwrap();
        let current = frame_record(WireRevision::Current, &origin, "message").unwrap();

        // The two extra identifier strings are "cred" and "trust", each with a 4-byte prefix.
        let extra = 2 * LENGTH_PREFIX_SIZE + "cred".len() + "trust".len();
        assert_eq!(current.len(), legacy.len() + extra);
    }

    #[test]
    fn frame_starts_with_opaque_header() {
        let frame = frame_record(WireRevision::Current, &test_origin(), "m").unwrap();

        assert!(frame.len() > RECORD_HEADER_SIZE);
        // The first identifier's length prefix directly follows the header.
        let prefix: [u8; 4] = frame[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + 4]
            .try_into()
            .unwrap();
        assert_eq!(u32::from_be_bytes(prefix) as usize, "endpoint-a".len());
    }
}
