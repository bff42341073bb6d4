use thiserror::Error;

/// Fault classes used for diagnostics aggregation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// A cursor read ran past the end of the image.
    Bounds,
    /// No handler in the dispatch tree accepted the byte sequence.
    Decode,
    /// A concrete value was required but only a symbolic one was available.
    Symbolic,
    /// The decode run could not be set up from the supplied inputs.
    Setup,
}

/// Stable fault taxonomy for a single decode step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeFault {
    /// A consuming read needed more bytes than remain in the buffer.
    #[error("read of {requested} byte(s) at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        /// Buffer offset the read started at.
        offset: usize,
        /// Number of bytes the read needed.
        requested: usize,
        /// Total buffer length, or the 64K address space when the offset
        /// itself has no address.
        len: usize,
    },
    /// No handler at any dispatch level recognised the opcode sequence.
    #[error("unrecognized opcode sequence at offset {offset}")]
    UnrecognizedOpcode {
        /// Buffer offset of the first byte of the instruction.
        offset: usize,
    },
    /// An explicit assertion found an unknown value where a concrete one is required.
    #[error("{what} is not a concrete value at {origin:04x}")]
    UnresolvedOperand {
        /// Name of the register or memory cell that was asserted.
        what: String,
        /// Program counter of the instruction making the assertion.
        origin: u16,
    },
    /// The requested start offset lies beyond the end of the image.
    #[error("start offset {start_offset} is beyond image length {len}")]
    StartOffsetOutOfRange {
        /// Requested start offset.
        start_offset: usize,
        /// Image length.
        len: usize,
    },
}

impl DecodeFault {
    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::OutOfBounds { .. } => FaultClass::Bounds,
            Self::UnrecognizedOpcode { .. } => FaultClass::Decode,
            Self::UnresolvedOperand { .. } => FaultClass::Symbolic,
            Self::StartOffsetOutOfRange { .. } => FaultClass::Setup,
        }
    }
}

/// Fatal decode failure surfaced by the driver with full diagnostic context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "cannot decode value at +{offset} ({address:04x}, from {entry_point:04x}) after {decoded} points ({bytes_parsed} bytes) mapped: {}",
    hex_dump(.dump)
)]
pub struct DecodeError {
    /// File-relative offset of the failing instruction.
    pub offset: usize,
    /// Absolute address of the failing instruction.
    pub address: u16,
    /// Entry point whose fallthrough reached the failing instruction.
    pub entry_point: u16,
    /// Raw bytes at the failure point, truncated at the end of the image.
    pub dump: Vec<u8>,
    /// Number of instructions decoded in the pass before the failure.
    pub decoded: usize,
    /// Number of bytes consumed by those instructions.
    pub bytes_parsed: usize,
    /// Trailing program-counter values, oldest first.
    pub trace: Vec<u16>,
    /// Underlying step fault.
    #[source]
    pub fault: DecodeFault,
}

impl DecodeError {
    /// Returns the diagnostics fault class of the underlying fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        self.fault.class()
    }
}

/// Formats bytes as space-separated two-digit lowercase hex.
#[must_use]
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
