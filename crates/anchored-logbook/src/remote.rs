use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::WorkerRequest;


/// One command forwarded to a facility hosted elsewhere.
///
/// A remote facility owns no file targets of its own; it converts each request into one of
/// these values and submits it through a [`RemotePeer`], which is expected to deliver it to a
/// same-shaped facility that performs the real writing. The value is serde-serializable so the
/// peer may put it on whatever wire it likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    /// Log one message in the named facility on the remote side.
    Log {
        facility:     String,
        message:      String,
        description:  Option<String>,
        message_type: u32,
    },
    /// Close the named facility on the remote side.
    Close {
        facility: String,
        cap_xml:  bool,
    },
}

impl RemoteCommand {
    #[must_use]
    pub(crate) fn log(facility: &str, request: &WorkerRequest) -> Self {
        Self::Log {
            facility:     facility.to_owned(),
            message:      request.message.clone(),
            description:  request.description.clone(),
            message_type: request.message_type,
        }
    }
}

/// The transport seam for remote facilities. Implementations deliver each command to the
/// facility's remote counterpart; how (and whether delivery is retried) is entirely theirs.
pub trait RemotePeer: Send {
    fn submit(&mut self, command: RemoteCommand) -> Result<(), RemoteSubmitError>;
}

/// A remote peer could not deliver a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("a remote peer could not deliver a log command: {0}")]
pub struct RemoteSubmitError(pub String);
