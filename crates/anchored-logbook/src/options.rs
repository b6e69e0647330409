use std::ops::BitOr;

use crate::error::InvalidValue;
use crate::message::Severity;


/// The set of target kinds enabled for a facility, as a small bit set.
///
/// The text and XML bits each enable one file-producing log target. The console bit echoes each
/// formatted text line to standard error as it is logged; it produces no file and takes no part
/// in finalization. The tool bit routes requests to the facility's custom-logging collaborator
/// even when no file target is enabled.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetModes(u8);

impl TargetModes {
    pub const NONE:    Self = Self(0);
    pub const TEXT:    Self = Self(1);
    pub const XML:     Self = Self(1 << 1);
    pub const CONSOLE: Self = Self(1 << 2);
    pub const TOOL:    Self = Self(1 << 3);

    const ALL_BITS: u8 = 0b1111;

    /// Reconstruct a mode set from its wire representation. Bits beyond the known modes are
    /// ignored.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// The wire representation of this mode set.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, mode: Self) -> bool {
        self.0 & mode.0 == mode.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TargetModes {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}


/// Configuration for a new facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityOptions {
    /// Which target kinds are enabled. Defaults to text only.
    pub modes:           TargetModes,
    /// The minimum severity a message type must have to be accepted into the queue.
    pub level:           Severity,
    /// The name of a facility this one is linked to, carried as metadata and reported by
    /// queries.
    pub linked_facility: Option<String>,
    /// Whether a pre-existing destination file is deleted at target setup. Without this flag,
    /// a pre-existing destination fails the facility instead.
    pub overwrite:       bool,
    /// When set, messages and descriptions longer than this many bytes are truncated (on a
    /// character boundary) before being appended.
    pub max_record_size: Option<usize>,
}

impl Default for FacilityOptions {
    fn default() -> Self {
        Self {
            modes:           TargetModes::TEXT,
            level:           Severity::Info,
            linked_facility: None,
            overwrite:       false,
            max_record_size: None,
        }
    }
}

impl FacilityOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn modes(mut self, modes: TargetModes) -> Self {
        self.modes = modes;
        self
    }

    #[must_use]
    pub fn level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn linked_facility(mut self, linked: &str) -> Self {
        self.linked_facility = Some(linked.to_owned());
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the truncation limit from a wire-carried numeric option.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] error if `max_record_size` is negative.
    pub fn truncate_at(mut self, max_record_size: i64) -> Result<Self, InvalidValue> {
        let max = usize::try_from(max_record_size).map_err(|_| {
            InvalidValue(format!("negative truncation length {max_record_size}"))
        })?;

        self.max_record_size = Some(max);
        Ok(self)
    }
}
