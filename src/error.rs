//! Error types for the PPM and LLDP engines
//!
//! Errors are organized by domain for better diagnostics:
//! - [`CodecError`]: bounded-writer/reader overflow and truncation
//! - [`StateError`]: operations invoked against a PPM not in the required state
//! - [`RuntimeError`]: failures while a PPM instance is cyclically running
//!
//! The unified [`Error`] enum wraps all domain errors and is returned by most
//! engine methods. [`ClassifiedError`] is the `(err_cls, err_code)` pair this
//! core writes onto the AR on protocol violations (§7).

// =============================================================================
// Codec Errors
// =============================================================================

/// Bounded-writer / bounded-reader errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Write would exceed the fixed-capacity buffer.
    Overflow,
    /// Read ran past the end of the available bytes.
    Truncated,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CodecError {
    /// Returns a human-readable description of the error.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CodecError::Overflow => "buffer overflow",
            CodecError::Truncated => "truncated input",
        }
    }
}

// =============================================================================
// State Errors
// =============================================================================

/// Errors raised when an operation is invoked against a PPM instance that is
/// not in the state it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateError {
    /// `activate` called on a PPM already in `RUN`, or `set`/`get` called in `WAIT_START`.
    InvalidState,
    /// PPM entry point invoked on an IOCR kind other than `Input`/`MC-Provider`.
    WrongIocrType,
}

impl core::fmt::Display for StateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateError {
    /// Returns a human-readable description of the error.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StateError::InvalidState => "invalid PPM state for this operation",
            StateError::WrongIocrType => "operation not defined for this IOCR type",
        }
    }
}

// =============================================================================
// Runtime Errors
// =============================================================================

/// Errors raised while a PPM instance is cyclically running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RuntimeError {
    /// The Ethernet sender rejected a frame.
    SendFailed,
    /// The timer collaborator could not (re)arm the cyclic timer.
    TimerRearmFailed,
}

impl core::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RuntimeError {
    /// Returns a human-readable description of the error.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuntimeError::SendFailed => "ethernet send failed",
            RuntimeError::TimerRearmFailed => "timer re-arm failed",
        }
    }
}

// =============================================================================
// Unified Error
// =============================================================================

/// Unified error type returned by PPM and LLDP engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Codec error.
    Codec(CodecError),
    /// State-protection error.
    State(StateError),
    /// Cyclic-runtime error.
    Runtime(RuntimeError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Codec(e) => write!(f, "codec: {}", e.as_str()),
            Error::State(e) => write!(f, "state: {}", e.as_str()),
            Error::Runtime(e) => write!(f, "runtime: {}", e.as_str()),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::State(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

/// Result type alias for PPM/LLDP operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Classified error (written onto the AR, §3/§7)
// =============================================================================

/// Error class this core can classify onto an AR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorClass {
    /// Provider Protocol Machine.
    Ppm,
}

/// Error code within [`ErrorClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// `PPM/INVALID_STATE`.
    InvalidState,
    /// `PPM/INVALID`.
    Invalid,
}

/// The `(err_cls, err_code)` pair this core writes onto an AR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassifiedError {
    /// Error class.
    pub class: ErrorClass,
    /// Error code within the class.
    pub code: ErrorCode,
}

impl ClassifiedError {
    /// `PPM/INVALID_STATE`.
    pub const INVALID_STATE: Self = Self {
        class: ErrorClass::Ppm,
        code: ErrorCode::InvalidState,
    };

    /// `PPM/INVALID`.
    pub const INVALID: Self = Self {
        class: ErrorClass::Ppm,
        code: ErrorCode::Invalid,
    };
}

// =============================================================================
// Unit Tests
// =============================================================================
