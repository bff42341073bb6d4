//! Concrete-or-unknown values tracked for registers and memory cells.

use std::fmt;

use crate::fault::DecodeFault;

/// A register or memory value as far as static decoding can tell.
///
/// Every combinator is total: any `Unknown` operand makes the result
/// `Unknown`, carrying the provenance of the first unknown operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SymbolicValue {
    /// A concrete value.
    Known(i64),
    /// A value that cannot be determined statically.
    Unknown {
        /// Memory address the value was read from, when it came from memory.
        source: Option<u16>,
        /// Program counter of the instruction that produced it.
        origin: u16,
    },
}

impl SymbolicValue {
    /// An unknown value produced at `origin` with no memory provenance.
    #[must_use]
    pub const fn unknown(origin: u16) -> Self {
        Self::Unknown {
            source: None,
            origin,
        }
    }

    /// An unknown value read from memory at `address` by the instruction at `origin`.
    #[must_use]
    pub const fn unknown_from(address: u16, origin: u16) -> Self {
        Self::Unknown {
            source: Some(address),
            origin,
        }
    }

    /// Returns the concrete value, if any.
    #[must_use]
    pub const fn known(self) -> Option<i64> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns `true` for concrete values.
    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Returns the concrete value as a 16-bit address.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn address(self) -> Option<u16> {
        match self {
            Self::Known(v) => Some((v & 0xFFFF) as u16),
            Self::Unknown { .. } => None,
        }
    }

    /// Requires a concrete value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::UnresolvedOperand`] naming `what` when unknown.
    pub fn assert_known(self, what: &str, origin: u16) -> Result<i64, DecodeFault> {
        self.known().ok_or_else(|| DecodeFault::UnresolvedOperand {
            what: what.to_string(),
            origin,
        })
    }

    /// Applies `f` to a concrete value; unknowns pass through.
    #[must_use]
    pub fn map(self, f: impl FnOnce(i64) -> i64) -> Self {
        match self {
            Self::Known(v) => Self::Known(f(v)),
            unknown @ Self::Unknown { .. } => unknown,
        }
    }

    /// Applies a partial `f`; a `None` result becomes unknown at `origin`.
    #[must_use]
    pub fn and_then(self, origin: u16, f: impl FnOnce(i64) -> Option<i64>) -> Self {
        match self {
            Self::Known(v) => f(v).map_or(Self::unknown(origin), Self::Known),
            unknown @ Self::Unknown { .. } => unknown,
        }
    }

    /// Combines two values; unknown if either side is.
    #[must_use]
    pub fn combine(self, other: Self, f: impl FnOnce(i64, i64) -> i64) -> Self {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => Self::Known(f(a, b)),
            (unknown @ Self::Unknown { .. }, _) | (_, unknown @ Self::Unknown { .. }) => unknown,
        }
    }

    /// Adds a signed offset, wrapping at 16 bits.
    #[must_use]
    pub fn offset16(self, delta: i64) -> Self {
        self.map(|v| (v + delta) & 0xFFFF)
    }

    /// Truncates to the low byte.
    #[must_use]
    pub fn low_byte(self) -> Self {
        self.map(|v| v & 0xFF)
    }

    /// Extracts the high byte of a 16-bit value.
    #[must_use]
    pub fn high_byte(self) -> Self {
        self.map(|v| (v >> 8) & 0xFF)
    }

    /// Joins a high and a low byte into a 16-bit value.
    #[must_use]
    pub fn join(high: Self, low: Self) -> Self {
        high.combine(low, |h, l| ((h & 0xFF) << 8) | (l & 0xFF))
    }
}

impl From<u8> for SymbolicValue {
    fn from(v: u8) -> Self {
        Self::Known(i64::from(v))
    }
}

impl From<u16> for SymbolicValue {
    fn from(v: u16) -> Self {
        Self::Known(i64::from(v))
    }
}

impl fmt::Display for SymbolicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) if (0..=0xFF).contains(v) => write!(f, "{v:02x}"),
            Self::Known(v) => write!(f, "{v:04x}"),
            Self::Unknown {
                source: Some(address),
                origin,
            } => write!(f, "?({address:04x})@{origin:04x}"),
            Self::Unknown {
                source: None,
                origin,
            } => write!(f, "?@{origin:04x}"),
        }
    }
}
