use std::{io::ErrorKind, string::FromUtf8Error};
use std::io::{Error as IoError, Read, Write};

use thiserror::Error;

use anchored_logstore::wire::{LENGTH_PREFIX_SIZE, RECORD_HEADER_SIZE, WireRevision};


/// The line terminator written after each exported record.
pub(crate) const LINE_TERMINATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Strings are skipped or read in chunks of at most this size, so a corrupted length prefix
/// cannot demand one enormous allocation up front.
const READ_CHUNK_SIZE: usize = 8 * 1024;


/// A decoder over one record stream read back from a store, yielding each record's message text
/// strictly in append order.
///
/// Every frame is laid out as:
///
/// 1. a 16-byte opaque header (timestamp, severity slot, handle), skipped;
/// 2. a length-prefixed originating-endpoint identifier, skipped;
/// 3. a length-prefixed originating-process identifier, skipped;
/// 4. under [`WireRevision::Current`] only: length-prefixed credential and trust-endpoint
///    identifiers, both skipped;
/// 5. the length-prefixed message text, which is what [`next_message`] yields.
///
/// Each length prefix is four raw bytes combined big-endian into an unsigned **byte** count
/// (never a character count), length zero meaning the empty string. Reaching end-of-stream while
/// skipping the header or the first identifier is the normal termination condition, not an
/// error; end-of-stream any later within a frame is a [`TruncatedRecord`] error.
///
/// [`next_message`]: RecordDecoder::next_message
/// [`TruncatedRecord`]: DecodeError::TruncatedRecord
#[derive(Debug)]
pub struct RecordDecoder<R> {
    stream:   R,
    revision: WireRevision,
    /// Scratch space reused across skipped strings.
    scratch:  Vec<u8>,
}

impl<R: Read> RecordDecoder<R> {
    /// Create a decoder over a stream of frames in the given revision's layout.
    ///
    /// The revision must be the one cached from the store which produced the stream; decoding a
    /// [`Current`] stream as [`Legacy`] (or vice versa) misparses every frame.
    ///
    /// [`Current`]: WireRevision::Current
    /// [`Legacy`]: WireRevision::Legacy
    #[must_use]
    pub fn new(stream: R, revision: WireRevision) -> Self {
        Self {
            stream,
            revision,
            scratch: Vec::new(),
        }
    }

    /// Decode the next record and return its message text, or `None` once the stream is
    /// exhausted.
    ///
    /// Records appear in exactly their append order, and each record is consumed exactly once.
    pub fn next_message(&mut self) -> Result<Option<String>, DecodeError> {
        // Steps 1 and 2: reaching end-of-stream here is how a fully-consumed stream normally
        // presents itself.
        let mut header = [0_u8; RECORD_HEADER_SIZE];
        match self.fill(&mut header)? {
            Filled::Complete => {}
            Filled::EndOfStream => return Ok(None),
        }

        match self.read_length_prefix()? {
            Some(endpoint_len) => {
                if !self.try_skip_bytes(endpoint_len)? {
                    return Ok(None);
                }
            }
            None => return Ok(None),
        }

        // From here on, end-of-stream means a frame was cut short.
        let process_len = self.require_length_prefix()?;
        self.skip_bytes(process_len)?;

        if self.revision == WireRevision::Current {
            let credential_len = self.require_length_prefix()?;
            self.skip_bytes(credential_len)?;

            let trust_len = self.require_length_prefix()?;
            self.skip_bytes(trust_len)?;
        }

        let message_len = self.require_length_prefix()?;
        let message = self.read_bytes(message_len)?;

        String::from_utf8(message)
            .map(Some)
            .map_err(DecodeError::from)
    }

    /// Read a four-byte big-endian length prefix, or `None` at a clean end-of-stream.
    fn read_length_prefix(&mut self) -> Result<Option<usize>, DecodeError> {
        let mut prefix = [0_u8; LENGTH_PREFIX_SIZE];
        match self.fill(&mut prefix)? {
            Filled::Complete    => Ok(Some(u32::from_be_bytes(prefix) as usize)),
            Filled::EndOfStream => Ok(None),
        }
    }

    /// Read a four-byte big-endian length prefix; end-of-stream is a truncation error here.
    fn require_length_prefix(&mut self) -> Result<usize, DecodeError> {
        self.read_length_prefix()?
            .ok_or(DecodeError::TruncatedRecord)
    }

    /// Discard exactly `len` bytes from the stream; end-of-stream is a truncation error.
    fn skip_bytes(&mut self, len: usize) -> Result<(), DecodeError> {
        if self.try_skip_bytes(len)? {
            Ok(())
        } else {
            Err(DecodeError::TruncatedRecord)
        }
    }

    /// Discard exactly `len` bytes from the stream, reporting `false` at an early end-of-stream.
    fn try_skip_bytes(&mut self, len: usize) -> Result<bool, DecodeError> {
        let mut remaining = len;

        while remaining > 0 {
            let chunk = remaining.min(READ_CHUNK_SIZE);
            self.scratch.resize(chunk, 0);

            match self.fill_scratch(chunk)? {
                Filled::Complete    => remaining -= chunk,
                Filled::EndOfStream => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Read exactly `len` bytes from the stream.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        let mut remaining = len;

        while remaining > 0 {
            let chunk = remaining.min(READ_CHUNK_SIZE);
            self.scratch.resize(chunk, 0);

            match self.fill_scratch(chunk)? {
                Filled::Complete => {
                    bytes.extend_from_slice(&self.scratch[..chunk]);
                    remaining -= chunk;
                }
                Filled::EndOfStream => return Err(DecodeError::TruncatedRecord),
            }
        }
        Ok(bytes)
    }

    fn fill_scratch(&mut self, chunk: usize) -> Result<Filled, DecodeError> {
        // Borrow dance: `fill` cannot take `&mut self.scratch` directly.
        let mut scratch = std::mem::take(&mut self.scratch);
        let result = self.fill(&mut scratch[..chunk]);
        self.scratch = scratch;
        result
    }

    /// Fill the whole buffer from the stream, retrying interrupted reads.
    ///
    /// An end-of-stream before the buffer is full (even partway through) reports
    /// [`Filled::EndOfStream`]; whether that is normal termination or truncation is the
    /// caller's call.
    fn fill(&mut self, buffer: &mut [u8]) -> Result<Filled, DecodeError> {
        let mut filled = 0_usize;

        while filled < buffer.len() {
            match self.stream.read(&mut buffer[filled..]) {
                Ok(0) => return Ok(Filled::EndOfStream),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(DecodeError::StreamRead(err)),
            }
        }
        Ok(Filled::Complete)
    }
}

#[derive(Debug, Clone, Copy)]
enum Filled {
    Complete,
    EndOfStream,
}


/// Drive `decoder` to exhaustion, writing each record's message text followed by a platform
/// line terminator into `out`. Returns the number of records exported.
///
/// Records are exported strictly in append order. On failure, `out` may have received a prefix
/// of the records (there is no rollback); the stream behind the decoder is never modified.
pub fn export_records<R: Read, W: Write>(
    decoder: &mut RecordDecoder<R>,
    out:     &mut W,
) -> Result<u64, ExportError> {
    let mut exported = 0_u64;

    while let Some(message) = decoder.next_message().map_err(ExportError::Decode)? {
        out.write_all(message.as_bytes()).map_err(ExportError::Write)?;
        out.write_all(LINE_TERMINATOR.as_bytes()).map_err(ExportError::Write)?;
        exported += 1;
    }

    Ok(exported)
}


/// The ways a record stream can fail to decode.
///
/// None of these are recoverable mid-stream: a frame boundary can no longer be trusted once a
/// frame fails to parse, so finalization reports the error rather than resynchronizing.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The stream ended past the point where ending is normal termination.
    #[error("a record stream ended in the middle of a record")]
    TruncatedRecord,
    /// A record's message text was not valid UTF-8. Identifier fields are skipped without
    /// validation, so only the message text can produce this.
    #[error("a record's message text was not valid UTF-8: {0}")]
    MessageNotUtf8(#[from] FromUtf8Error),
    /// A read on the underlying stream failed for a reason other than an interrupt.
    #[error("failed to read a record stream: {0}")]
    StreamRead(IoError),
}

/// A failure while exporting decoded records into a destination writer.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Decode(DecodeError),
    #[error("failed to write a destination log file: {0}")]
    Write(IoError),
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anchored_logstore::wire::{self, RecordOrigin};
    use super::*;


    fn origin() -> RecordOrigin {
        RecordOrigin {
            endpoint:       "endpoint".to_owned(),
            process:        "process".to_owned(),
            credential:     "credential".to_owned(),
            trust_endpoint: "trust".to_owned(),
        }
    }

    fn stream_of(revision: WireRevision, messages: &[&str]) -> Vec<u8> {
        let origin = origin();
        let mut stream = Vec::new();
        for message in messages {
            stream.extend(wire::frame_record(revision, &origin, message).unwrap());
        }
        stream
    }

    #[test]
    fn messages_round_trip_in_order() {
        for revision in [WireRevision::Legacy, WireRevision::Current] {
            let stream = stream_of(revision, &["first", "second", "third"]);
            let mut decoder = RecordDecoder::new(Cursor::new(stream), revision);

            assert_eq!(decoder.next_message().unwrap().as_deref(), Some("first"));
            assert_eq!(decoder.next_message().unwrap().as_deref(), Some("second"));
            assert_eq!(decoder.next_message().unwrap().as_deref(), Some("third"));
            assert_eq!(decoder.next_message().unwrap(), None);
            // Exhaustion is stable.
            assert_eq!(decoder.next_message().unwrap(), None);
        }
    }

    #[test]
    fn empty_and_multibyte_messages_round_trip() {
        // The length prefix is a byte count; multi-byte sequences must never be split.
        let messages = ["", "héllo wörld", "日本語テキスト", "🦀", ""];
        let stream = stream_of(WireRevision::Current, &messages);
        let mut decoder = RecordDecoder::new(Cursor::new(stream), WireRevision::Current);

        for expected in messages {
            assert_eq!(decoder.next_message().unwrap().as_deref(), Some(expected));
        }
        assert_eq!(decoder.next_message().unwrap(), None);
    }

    #[test]
    fn empty_stream_is_immediately_exhausted() {
        let mut decoder = RecordDecoder::new(Cursor::new(Vec::new()), WireRevision::Current);
        assert_eq!(decoder.next_message().unwrap(), None);
    }

    #[test]
    fn truncation_past_the_identifiers_is_an_error() {
        let stream = stream_of(WireRevision::Current, &["only message"]);
        // Drop the final byte, cutting the message text short.
        let truncated = &stream[..stream.len() - 1];

        let mut decoder = RecordDecoder::new(Cursor::new(truncated.to_vec()), WireRevision::Current);
        assert!(matches!(
            decoder.next_message(),
            Err(DecodeError::TruncatedRecord),
        ));
    }

    #[test]
    fn eof_within_the_header_terminates_normally() {
        let stream = stream_of(WireRevision::Current, &["message"]);
        let mut with_partial_header = stream.clone();
        // A second frame's header begins but the stream ends: normal termination.
        with_partial_header.extend([0_u8; RECORD_HEADER_SIZE / 2]);

        let mut decoder =
            RecordDecoder::new(Cursor::new(with_partial_header), WireRevision::Current);
        assert_eq!(decoder.next_message().unwrap().as_deref(), Some("message"));
        assert_eq!(decoder.next_message().unwrap(), None);
    }

    #[test]
    fn export_writes_one_line_per_record() {
        let stream = stream_of(WireRevision::Current, &["alpha", "beta"]);
        let mut decoder = RecordDecoder::new(Cursor::new(stream), WireRevision::Current);

        let mut out = Vec::new();
        let exported = export_records(&mut decoder, &mut out).unwrap();

        assert_eq!(exported, 2);
        let expected = format!("alpha{LINE_TERMINATOR}beta{LINE_TERMINATOR}");
        assert_eq!(out, expected.as_bytes());
    }
}
