//! Error types for the bring-up orchestrator.
//!
//! Fatal conditions are carried by [`BringupError`]; the complete taxonomy,
//! including the advisory kinds that never halt a run, is enumerated by
//! [`ErrorKind`].

use crate::core::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status reported by an external driver collaborator.
///
/// Every driver call reports either success or one of these discriminated
/// failures, each with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverError {
    /// The device or core reported a hardware-level error.
    #[error("hardware error {code}: {message}")]
    Hardware {
        /// Driver specific error code.
        code: i32,
        /// Human-readable description.
        message: String,
    },

    /// The device's GPIO subsystem reported an error.
    #[error("gpio error {code}: {message}")]
    Gpio {
        /// Driver specific error code.
        code: i32,
        /// Human-readable description.
        message: String,
    },

    /// The register/SPI transport could not carry the request.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable description.
        message: String,
    },
}

impl DriverError {
    /// Creates a hardware error.
    #[must_use]
    pub fn hardware(code: i32, message: impl Into<String>) -> Self {
        Self::Hardware {
            code,
            message: message.into(),
        }
    }

    /// Creates a GPIO subsystem error.
    #[must_use]
    pub fn gpio(code: i32, message: impl Into<String>) -> Self {
        Self::Gpio {
            code,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Hardware { message, .. }
            | Self::Gpio { message, .. }
            | Self::Transport { message } => message,
        }
    }

    /// Returns the driver error code, if the failure carries one.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Hardware { code, .. } | Self::Gpio { code, .. } => Some(*code),
            Self::Transport { .. } => None,
        }
    }
}

/// Shorthand for driver call results.
pub type DriverResult<T> = Result<T, DriverError>;

/// Classification of every failure the orchestrator can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The platform transport could not be opened.
    PlatformError,
    /// A named subsystem failed to initialize.
    ResourceInitError,
    /// A subsystem initialized but could not be rate-programmed.
    RateProgrammingError,
    /// A lock bitmask did not match on a fatal checkpoint.
    LockTimeoutError,
    /// Multichip-sync status mismatch (advisory).
    SyncMismatch,
    /// Framer or deframer status mismatch (advisory).
    StatusMismatch,
    /// Calibration did not complete cleanly.
    CalibrationIncomplete,
    /// Firmware could not be loaded.
    FirmwareLoadError,
    /// A control-pin or GPIO operation failed.
    GpioConfigError,
    /// Any other device operation failed.
    DeviceError,
    /// The data-path verification transfer failed.
    TransferError,
    /// The configuration is invalid.
    ConfigError,
    /// A stage referenced a resource that is not live.
    Internal,
}

impl ErrorKind {
    /// Returns true if this kind never halts a run.
    #[must_use]
    pub const fn is_advisory(self) -> bool {
        matches!(self, Self::SyncMismatch | Self::StatusMismatch)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlatformError => "platform_error",
            Self::ResourceInitError => "resource_init_error",
            Self::RateProgrammingError => "rate_programming_error",
            Self::LockTimeoutError => "lock_timeout_error",
            Self::SyncMismatch => "sync_mismatch",
            Self::StatusMismatch => "status_mismatch",
            Self::CalibrationIncomplete => "calibration_incomplete",
            Self::FirmwareLoadError => "firmware_load_error",
            Self::GpioConfigError => "gpio_config_error",
            Self::DeviceError => "device_error",
            Self::TransferError => "transfer_error",
            Self::ConfigError => "config_error",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// A fatal bring-up error.
///
/// Returning one of these from a stage halts forward progress and hands the
/// run over to teardown.
#[derive(Debug, Error)]
pub enum BringupError {
    /// The platform transport is unavailable.
    #[error("platform unavailable: {source}")]
    Platform {
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// A subsystem failed to initialize.
    #[error("{resource}: initialization failed: {source}")]
    ResourceInit {
        /// Subsystem name.
        resource: String,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// A subsystem initialized but rate programming failed.
    #[error("{resource}: programming {rate_hz} Hz failed: {source}")]
    RateProgramming {
        /// Subsystem name.
        resource: String,
        /// Requested rate.
        rate_hz: u64,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// A fatal lock checkpoint observed a mismatching bitmask.
    #[error("{checkpoint}: status 0x{observed:02x} does not match expected 0x{expected:02x}")]
    LockTimeout {
        /// Checkpoint name.
        checkpoint: String,
        /// Observed bitmask.
        observed: u32,
        /// Expected bitmask.
        expected: u32,
    },

    /// Calibration was incomplete and the abort that follows failed.
    #[error("calibration abort failed after incomplete calibration: {source}")]
    CalibrationAbort {
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// Firmware could not be loaded.
    #[error("firmware load failed: {reason}")]
    FirmwareLoad {
        /// Reason for the failure.
        reason: String,
    },

    /// A control-pin or GPIO operation failed.
    #[error("{operation}: {source}")]
    GpioConfig {
        /// The operation that failed.
        operation: String,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// A transceiver operation failed.
    #[error("{operation}: {source}")]
    Device {
        /// The operation that failed.
        operation: String,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// The data-path verification transfer failed.
    #[error("{resource}: transfer of {length} bytes failed: {source}")]
    Transfer {
        /// Data-movement channel name.
        resource: String,
        /// Requested length in bytes.
        length: u64,
        /// Driver failure.
        #[source]
        source: DriverError,
    },

    /// A stage referenced a resource that is not on the teardown stack.
    #[error("resource '{name}' is not live")]
    MissingResource {
        /// Resource name.
        name: String,
    },

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BringupError {
    /// Creates a resource initialization error.
    #[must_use]
    pub fn resource_init(resource: impl Into<String>, source: DriverError) -> Self {
        Self::ResourceInit {
            resource: resource.into(),
            source,
        }
    }

    /// Creates a rate programming error.
    #[must_use]
    pub fn rate_programming(resource: impl Into<String>, rate_hz: u64, source: DriverError) -> Self {
        Self::RateProgramming {
            resource: resource.into(),
            rate_hz,
            source,
        }
    }

    /// Creates a device operation error.
    #[must_use]
    pub fn device(operation: impl Into<String>, source: DriverError) -> Self {
        Self::Device {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a GPIO configuration error.
    #[must_use]
    pub fn gpio(operation: impl Into<String>, source: DriverError) -> Self {
        Self::GpioConfig {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a missing resource error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingResource { name: name.into() }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Platform { .. } => ErrorKind::PlatformError,
            Self::ResourceInit { .. } => ErrorKind::ResourceInitError,
            Self::RateProgramming { .. } => ErrorKind::RateProgrammingError,
            Self::LockTimeout { .. } => ErrorKind::LockTimeoutError,
            Self::CalibrationAbort { .. } => ErrorKind::CalibrationIncomplete,
            Self::FirmwareLoad { .. } => ErrorKind::FirmwareLoadError,
            Self::GpioConfig { .. } => ErrorKind::GpioConfigError,
            Self::Device { .. } => ErrorKind::DeviceError,
            Self::Transfer { .. } => ErrorKind::TransferError,
            Self::MissingResource { .. } => ErrorKind::Internal,
            Self::Config(_) => ErrorKind::ConfigError,
        }
    }
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value.
    #[error("invalid configuration field '{field}': {reason}")]
    Invalid {
        /// Field path.
        field: String,
        /// Why the value is rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised when a pipeline definition is rejected.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// A release operation that failed during teardown.
///
/// These never replace the primary error of a run; they are kept as
/// secondary diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFailure {
    /// Resource name.
    pub resource: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release of {} ({}) failed: {}", self.resource, self.kind, self.message)
    }
}
