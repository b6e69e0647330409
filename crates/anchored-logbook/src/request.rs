/// What a queued request asks the worker thread to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Write one log message through the facility's write strategy.
    Log,
    /// Leave the worker loop. Enqueued exactly once, by a successful close.
    Exit,
}

/// One unit of work for a facility's worker thread. Immutable once enqueued.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub kind:         RequestKind,
    pub message:      String,
    pub description:  Option<String>,
    pub message_type: u32,
}

impl WorkerRequest {
    #[must_use]
    pub fn log(message: &str, description: Option<&str>, message_type: u32) -> Self {
        Self {
            kind:        RequestKind::Log,
            message:     message.to_owned(),
            description: description.map(str::to_owned),
            message_type,
        }
    }

    /// The sentinel which makes the worker leave its loop once everything before it has been
    /// processed.
    #[must_use]
    pub(crate) fn exit() -> Self {
        Self {
            kind:         RequestKind::Exit,
            message:      String::new(),
            description:  None,
            message_type: 0,
        }
    }
}
