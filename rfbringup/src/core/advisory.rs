//! Non-fatal diagnostics accumulated during a run.

use super::{CalibrationMask, LinkId};
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a verification checkpoint inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// PLL lock status bits.
    PllLock,
    /// Multichip synchronization status bits.
    MultichipSync,
    /// Device framer status.
    FramerStatus,
    /// Device deframer status.
    DeframerStatus,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PllLock => write!(f, "pll_lock"),
            Self::MultichipSync => write!(f, "multichip_sync"),
            Self::FramerStatus => write!(f, "framer_status"),
            Self::DeframerStatus => write!(f, "deframer_status"),
        }
    }
}

/// Status of one SerDes lane as read from an FPGA link core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneInfo {
    /// Lane index within the link.
    pub lane: u8,
    /// Raw lane status word.
    pub status: u32,
    /// Lane error counter.
    pub errors: u32,
}

/// The values a checkpoint compared, captured at the time of the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatusSnapshot {
    /// Checkpoint name.
    pub checkpoint: String,
    /// What was inspected.
    pub kind: CheckKind,
    /// Expected bitmask.
    pub expected: u32,
    /// Observed bitmask.
    pub observed: u32,
    /// Per-lane detail of the associated FPGA link, when one applies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lanes: Vec<LaneInfo>,
}

impl LinkStatusSnapshot {
    /// Creates a snapshot without lane detail.
    #[must_use]
    pub fn new(checkpoint: impl Into<String>, kind: CheckKind, expected: u32, observed: u32) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            kind,
            expected,
            observed,
            lanes: Vec::new(),
        }
    }

    /// Attaches lane detail.
    #[must_use]
    pub fn with_lanes(mut self, lanes: Vec<LaneInfo>) -> Self {
        self.lanes = lanes;
        self
    }

    /// Bits expected but not observed.
    #[must_use]
    pub const fn missing_bits(&self) -> u32 {
        self.expected & !self.observed
    }
}

/// FPGA-side status of one link, read after the radio is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Link the report belongs to.
    pub link: LinkId,
    /// Raw link status word.
    pub status: u32,
    /// Per-lane detail.
    #[serde(default)]
    pub lanes: Vec<LaneInfo>,
}

/// A condition that was reported to the operator but did not halt the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    /// The clock source could not be fully programmed; an external
    /// reference may be absent.
    ClockProgramming {
        /// Driver message.
        message: String,
    },

    /// An advisory checkpoint observed a mismatching bitmask.
    CheckpointMismatch {
        /// The compared values.
        snapshot: LinkStatusSnapshot,
    },

    /// Calibrations did not complete; the abort that followed succeeded.
    CalibrationIncomplete {
        /// Calibrations requested.
        requested: CalibrationMask,
        /// Calibrations reported complete after the abort.
        completed: CalibrationMask,
        /// Error flag reported by the firmware.
        error_flag: u8,
        /// Error code reported by the firmware.
        error_code: u8,
        /// True if the wait ran out of time.
        timed_out: bool,
    },

    /// The firmware version could not be read back.
    FirmwareVersionUnavailable {
        /// Driver message.
        message: String,
    },

    /// A receive link's watchdog could not be armed; link loss after
    /// radio-on goes unnoticed.
    WatchdogUnavailable {
        /// Link whose watchdog failed.
        link: LinkId,
        /// Driver message.
        message: String,
    },
}

impl Advisory {
    /// Returns the taxonomy kind of this advisory.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ClockProgramming { .. } => ErrorKind::ResourceInitError,
            Self::CheckpointMismatch { snapshot } => match snapshot.kind {
                CheckKind::MultichipSync => ErrorKind::SyncMismatch,
                CheckKind::PllLock => ErrorKind::LockTimeoutError,
                CheckKind::FramerStatus | CheckKind::DeframerStatus => ErrorKind::StatusMismatch,
            },
            Self::CalibrationIncomplete { .. } => ErrorKind::CalibrationIncomplete,
            Self::FirmwareVersionUnavailable { .. } | Self::WatchdogUnavailable { .. } => {
                ErrorKind::DeviceError
            }
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockProgramming { message } => {
                write!(f, "clock source programming incomplete: {message}")
            }
            Self::CheckpointMismatch { snapshot } => write!(
                f,
                "{}: observed {:#04x}, expected {:#04x}",
                snapshot.checkpoint, snapshot.observed, snapshot.expected
            ),
            Self::CalibrationIncomplete {
                requested,
                completed,
                error_flag,
                error_code,
                timed_out,
            } => write!(
                f,
                "calibrations {requested} incomplete (completed {completed}, flag {error_flag}, code {error_code}{})",
                if *timed_out { ", timed out" } else { "" }
            ),
            Self::FirmwareVersionUnavailable { message } => {
                write!(f, "firmware version unavailable: {message}")
            }
            Self::WatchdogUnavailable { link, message } => {
                write!(f, "{link} link watchdog not armed: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_missing_bits() {
        let snapshot = LinkStatusSnapshot::new("multichip-sync", CheckKind::MultichipSync, 0x0B, 0x09);
        assert_eq!(snapshot.missing_bits(), 0x02);
    }

    #[test]
    fn test_advisory_kinds() {
        let mcs = Advisory::CheckpointMismatch {
            snapshot: LinkStatusSnapshot::new("multichip-sync", CheckKind::MultichipSync, 0x0B, 0x09),
        };
        assert_eq!(mcs.kind(), ErrorKind::SyncMismatch);
        assert_eq!(mcs.to_string(), "multichip-sync: observed 0x09, expected 0x0b");

        let framer = Advisory::CheckpointMismatch {
            snapshot: LinkStatusSnapshot::new("rx-framer", CheckKind::FramerStatus, 0x3E, 0x3A),
        };
        assert_eq!(framer.kind(), ErrorKind::StatusMismatch);
    }

    #[test]
    fn test_calibration_advisory_display() {
        let advisory = Advisory::CalibrationIncomplete {
            requested: CalibrationMask::from_bits(0x7DFF),
            completed: CalibrationMask::NONE,
            error_flag: 1,
            error_code: 5,
            timed_out: false,
        };
        assert_eq!(advisory.kind(), ErrorKind::CalibrationIncomplete);
        assert!(advisory.to_string().contains("flag 1, code 5"));
    }

    #[test]
    fn test_advisory_serialization() {
        let advisory = Advisory::ClockProgramming {
            message: "REF_CLK not connected".to_string(),
        };
        let json = serde_json::to_value(&advisory).unwrap();
        assert_eq!(json["type"], "clock_programming");
    }
}
