use std::fmt::{Display, Formatter, Result as FmtResult};


/// The severity rank of a message type.
///
/// A facility only accepts messages whose type's severity is at or above the facility's
/// configured filter level; anything below the level is discarded before it reaches the queue.
///
/// A greater `Severity`, with respect to [`Ord`], indicates a more serious message.
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Diagnostic chatter, discarded by default.
    Debug   = 0,
    /// Ordinary progress messages.
    #[default]
    Info    = 1,
    /// Hazardous situations.
    Warning = 2,
    /// Serious errors.
    Error   = 3,
    /// Errors the logged-about session cannot recover from.
    Fatal   = 4,
}

impl Severity {
    /// Get the severity's rank as a `u8`. Inverse of [`from_rank`].
    ///
    /// [`from_rank`]: Severity::from_rank
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Create from a numeric rank, as carried by wire commands.
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Fatal),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug   => "Debug",
            Self::Info    => "Info",
            Self::Warning => "Warning",
            Self::Error   => "Error",
            Self::Fatal   => "Fatal",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}


/// How a message type is rendered by the XML target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlShape {
    /// A flat `<LOG_MESSAGE>` element wrapping the message and description.
    Message,
    /// The opening fragment of a nested status-report block.
    ReportBegin,
    /// One `<STATUS_ITEM>` fragment inside a status-report block.
    ReportItem,
    /// The closing fragment of a status-report block.
    ReportEnd,
}

/// One entry of the fixed message-type taxonomy: how messages of one numeric type code are
/// ranked and rendered.
#[derive(Debug, Clone, Copy)]
pub struct MessageTypeInfo {
    pub code:     u32,
    pub severity: Severity,
    /// The line prefix used by the plain-text target kind.
    pub prefix:   &'static str,
    pub shape:    XmlShape,
}

/// The well-known numeric type codes.
///
/// Status-report codes occupy the contiguous sub-range `100..=102`; their messages render as one
/// nested block in the XML target kind rather than as flat elements.
pub mod codes {
    /// An ordinary progress message. Its prefix is also used for description lines in the
    /// plain-text target kind.
    pub const GENERIC:      u32 = 1;
    pub const DEBUG:        u32 = 2;
    pub const WARNING:      u32 = 3;
    pub const ERROR:        u32 = 4;
    pub const FATAL:        u32 = 5;
    /// Opens a status-report block.
    pub const REPORT_BEGIN: u32 = 100;
    /// One item within a status-report block.
    pub const REPORT_ITEM:  u32 = 101;
    /// Closes a status-report block.
    pub const REPORT_END:   u32 = 102;
}

/// Type codes at or above this threshold have no taxonomy entry; they are reserved for a
/// facility's custom-logging collaborator, which may claim them (reply [`BYPASS_REPLY`]) or
/// leave them to be dropped.
///
/// [`BYPASS_REPLY`]: crate::custom::BYPASS_REPLY
pub const CUSTOM_TYPE_THRESHOLD: u32 = 1000;

const TYPE_TABLE: &[MessageTypeInfo] = &[
    MessageTypeInfo {
        code:     codes::GENERIC,
        severity: Severity::Info,
        prefix:   "Info    : ",
        shape:    XmlShape::Message,
    },
    MessageTypeInfo {
        code:     codes::DEBUG,
        severity: Severity::Debug,
        prefix:   "Debug   : ",
        shape:    XmlShape::Message,
    },
    MessageTypeInfo {
        code:     codes::WARNING,
        severity: Severity::Warning,
        prefix:   "Warning : ",
        shape:    XmlShape::Message,
    },
    MessageTypeInfo {
        code:     codes::ERROR,
        severity: Severity::Error,
        prefix:   "Error   : ",
        shape:    XmlShape::Message,
    },
    MessageTypeInfo {
        code:     codes::FATAL,
        severity: Severity::Fatal,
        prefix:   "Fatal   : ",
        shape:    XmlShape::Message,
    },
    MessageTypeInfo {
        code:     codes::REPORT_BEGIN,
        severity: Severity::Info,
        prefix:   "Status  : ",
        shape:    XmlShape::ReportBegin,
    },
    MessageTypeInfo {
        code:     codes::REPORT_ITEM,
        severity: Severity::Info,
        prefix:   "Status  : ",
        shape:    XmlShape::ReportItem,
    },
    MessageTypeInfo {
        code:     codes::REPORT_END,
        severity: Severity::Info,
        prefix:   "Status  : ",
        shape:    XmlShape::ReportEnd,
    },
];

/// Look up the taxonomy entry for a numeric type code.
///
/// Returns `None` both for codes in the custom range (at or above [`CUSTOM_TYPE_THRESHOLD`]) and
/// for unassigned codes below it.
#[must_use]
pub fn type_info(code: u32) -> Option<&'static MessageTypeInfo> {
    TYPE_TABLE.iter().find(|info| info.code == code)
}

/// The taxonomy entry whose prefix is used for description lines in the plain-text target kind.
#[must_use]
pub(crate) fn generic_info() -> &'static MessageTypeInfo {
    &TYPE_TABLE[0]
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn table_codes_are_unique() {
        for (i, info) in TYPE_TABLE.iter().enumerate() {
            for other in &TYPE_TABLE[i + 1..] {
                assert_ne!(info.code, other.code);
            }
        }
    }

    #[test]
    fn custom_range_has_no_entries() {
        assert!(TYPE_TABLE.iter().all(|info| info.code < CUSTOM_TYPE_THRESHOLD));
        assert!(type_info(CUSTOM_TYPE_THRESHOLD).is_none());
        assert!(type_info(CUSTOM_TYPE_THRESHOLD + 7).is_none());
    }

    #[test]
    fn status_report_codes_are_contiguous() {
        let begin = type_info(codes::REPORT_BEGIN).unwrap();
        let item  = type_info(codes::REPORT_ITEM).unwrap();
        let end   = type_info(codes::REPORT_END).unwrap();

        assert_eq!(begin.shape, XmlShape::ReportBegin);
        assert_eq!(item.shape,  XmlShape::ReportItem);
        assert_eq!(end.shape,   XmlShape::ReportEnd);
        assert_eq!(begin.code + 1, item.code);
        assert_eq!(item.code + 1,  end.code);
    }

    #[test]
    fn severity_ranks_round_trip() {
        for rank in 0..5 {
            assert_eq!(Severity::from_rank(rank).unwrap().rank(), rank);
        }
        assert!(Severity::from_rank(5).is_none());
    }

    #[test]
    fn generic_entry_is_the_description_prefix() {
        assert_eq!(generic_info().code, codes::GENERIC);
    }
}
