//! Verification checkpoints.
//!
//! One primitive compares an observed status bitmask against an expected
//! one for every lock, sync and link-status check of a run. Checkpoints
//! differ only in expected value, match rule and severity.

use crate::config::ExpectedStatus;
use crate::core::{Advisory, CheckKind, LinkStatusSnapshot};
use crate::errors::BringupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an observed bitmask is compared with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Every expected bit must be set; extra bits are ignored.
    AllSet,
    /// The observed value must equal the expected value.
    Exact,
}

/// What a mismatch does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A mismatch halts the run.
    Fatal,
    /// A mismatch is reported and the run continues.
    Advisory,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => write!(f, "fatal"),
            Self::Advisory => write!(f, "advisory"),
        }
    }
}

/// A named status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    name: String,
    kind: CheckKind,
    expected: u32,
    rule: MatchRule,
    severity: Severity,
}

impl Checkpoint {
    /// Creates a fatal all-bits-set checkpoint.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CheckKind, expected: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            expected,
            rule: MatchRule::AllSet,
            severity: Severity::Fatal,
        }
    }

    /// Sets the match rule.
    #[must_use]
    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Clock-generation PLL lock, checked before the firmware load.
    #[must_use]
    pub fn clkpll_lock(expected: &ExpectedStatus) -> Self {
        Self::new("clkpll-lock", CheckKind::PllLock, expected.clkpll_lock)
    }

    /// Lock of every RF PLL after frequency programming.
    #[must_use]
    pub fn rf_pll_lock(expected: &ExpectedStatus) -> Self {
        Self::new("rf-pll-lock", CheckKind::PllLock, expected.rf_pll_lock)
    }

    /// Multichip sync status.
    #[must_use]
    pub fn multichip_sync(expected: &ExpectedStatus) -> Self {
        Self::new("multichip-sync", CheckKind::MultichipSync, expected.multichip_sync)
            .with_severity(Severity::Advisory)
    }

    /// Receive framer steady state.
    #[must_use]
    pub fn rx_framer(expected: &ExpectedStatus) -> Self {
        Self::new("rx-framer-status", CheckKind::FramerStatus, expected.rx_framer)
            .with_rule(MatchRule::Exact)
            .with_severity(Severity::Advisory)
    }

    /// Observation framer steady state.
    #[must_use]
    pub fn orx_framer(expected: &ExpectedStatus) -> Self {
        Self::new("orx-framer-status", CheckKind::FramerStatus, expected.orx_framer)
            .with_rule(MatchRule::Exact)
            .with_severity(Severity::Advisory)
    }

    /// Deframer steady state.
    #[must_use]
    pub fn deframer(expected: &ExpectedStatus) -> Self {
        Self::new("deframer-status", CheckKind::DeframerStatus, expected.deframer)
            .with_rule(MatchRule::Exact)
            .with_severity(Severity::Advisory)
    }

    /// Checkpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected bitmask.
    #[must_use]
    pub const fn expected(&self) -> u32 {
        self.expected
    }

    /// Severity of a mismatch.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns true if `observed` satisfies the checkpoint.
    #[must_use]
    pub const fn matches(&self, observed: u32) -> bool {
        match self.rule {
            MatchRule::AllSet => observed & self.expected == self.expected,
            MatchRule::Exact => observed == self.expected,
        }
    }

    /// Compares `observed` with the expected value.
    #[must_use]
    pub fn check(&self, observed: u32) -> CheckOutcome {
        let snapshot = LinkStatusSnapshot::new(&self.name, self.kind, self.expected, observed);
        if self.matches(observed) {
            CheckOutcome::Passed(snapshot)
        } else {
            CheckOutcome::Mismatch {
                snapshot,
                severity: self.severity,
            }
        }
    }
}

/// Result of one checkpoint comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The observed value matched.
    Passed(LinkStatusSnapshot),
    /// The observed value did not match.
    Mismatch {
        /// The compared values.
        snapshot: LinkStatusSnapshot,
        /// What the mismatch does to the run.
        severity: Severity,
    },
}

impl CheckOutcome {
    /// Returns true if the observed value matched.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    /// Returns true if the run must halt.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Mismatch {
                severity: Severity::Fatal,
                ..
            }
        )
    }

    /// The compared values.
    #[must_use]
    pub const fn snapshot(&self) -> &LinkStatusSnapshot {
        match self {
            Self::Passed(snapshot) | Self::Mismatch { snapshot, .. } => snapshot,
        }
    }

    /// Attaches per-lane detail to the snapshot.
    #[must_use]
    pub fn with_lanes(self, lanes: Vec<crate::core::LaneInfo>) -> Self {
        match self {
            Self::Passed(snapshot) => Self::Passed(snapshot.with_lanes(lanes)),
            Self::Mismatch { snapshot, severity } => Self::Mismatch {
                snapshot: snapshot.with_lanes(lanes),
                severity,
            },
        }
    }

    /// Converts the outcome into the run's view of it: nothing on a pass,
    /// an advisory on an advisory mismatch, an error on a fatal one.
    pub fn into_result(self) -> Result<Option<Advisory>, BringupError> {
        match self {
            Self::Passed(_) => Ok(None),
            Self::Mismatch {
                snapshot,
                severity: Severity::Advisory,
            } => Ok(Some(Advisory::CheckpointMismatch { snapshot })),
            Self::Mismatch {
                snapshot,
                severity: Severity::Fatal,
            } => Err(BringupError::LockTimeout {
                checkpoint: snapshot.checkpoint,
                observed: snapshot.observed,
                expected: snapshot.expected,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_all_set_ignores_extra_bits() {
        let cp = Checkpoint::new("lock", CheckKind::PllLock, 0x0F);
        assert!(cp.matches(0x0F));
        assert!(cp.matches(0x1F));
        assert!(!cp.matches(0x07));
    }

    #[test]
    fn test_exact_requires_equality() {
        let cp = Checkpoint::deframer(&ExpectedStatus::default());
        assert!(cp.matches(0x28));
        assert!(!cp.matches(0x29));
        assert!(!cp.matches(0x20));
    }

    #[test]
    fn test_fatal_mismatch_is_lock_timeout() {
        let outcome = Checkpoint::rf_pll_lock(&ExpectedStatus::default()).check(0x07);
        assert!(outcome.is_fatal());

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockTimeoutError);
        assert!(err.to_string().starts_with("rf-pll-lock"));
    }

    #[test]
    fn test_advisory_mismatch_never_halts() {
        let outcome = Checkpoint::multichip_sync(&ExpectedStatus::default()).check(0x09);
        assert!(!outcome.is_pass());
        assert!(!outcome.is_fatal());

        let advisory = outcome.into_result().unwrap().unwrap();
        assert_eq!(advisory.kind(), ErrorKind::SyncMismatch);
    }

    #[test]
    fn test_pass_yields_nothing() {
        let outcome = Checkpoint::clkpll_lock(&ExpectedStatus::default()).check(0x01);
        assert!(outcome.is_pass());
        assert_eq!(outcome.snapshot().observed, 0x01);
        assert!(outcome.into_result().unwrap().is_none());
    }

    #[test]
    fn test_every_standard_checkpoint() {
        let expected = ExpectedStatus::default();
        let fatal = [Checkpoint::clkpll_lock(&expected), Checkpoint::rf_pll_lock(&expected)];
        let advisory = [
            Checkpoint::multichip_sync(&expected),
            Checkpoint::rx_framer(&expected),
            Checkpoint::orx_framer(&expected),
            Checkpoint::deframer(&expected),
        ];

        for cp in fatal {
            assert_eq!(cp.severity(), Severity::Fatal, "{}", cp.name());
            assert!(cp.check(0).is_fatal());
        }
        for cp in advisory {
            assert_eq!(cp.severity(), Severity::Advisory, "{}", cp.name());
            assert!(!cp.check(0).is_fatal());
            assert!(cp.check(cp.expected()).is_pass());
        }
    }
}
