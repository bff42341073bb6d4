/// Number of 8-bit cells stored directly (`A B C D E F I R`).
pub const NARROW_CELL_COUNT: usize = 8;
/// Number of natively 16-bit cells (`HL SP IX IY`).
pub const WIDE_CELL_COUNT: usize = 4;

/// 8-bit register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Register8 {
    A,
    B,
    C,
    D,
    E,
    F,
    H,
    L,
    I,
    R,
}

impl Register8 {
    /// Every 8-bit register in display order.
    pub const ALL: [Self; 10] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::H,
        Self::L,
        Self::I,
        Self::R,
    ];

    /// Assembly name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::H => "H",
            Self::L => "L",
            Self::I => "I",
            Self::R => "R",
        }
    }

    /// Index into the directly stored byte cells, or `None` for `H`/`L`,
    /// which are views over the fused `HL` cell.
    #[must_use]
    pub const fn narrow_index(self) -> Option<usize> {
        match self {
            Self::A => Some(0),
            Self::B => Some(1),
            Self::C => Some(2),
            Self::D => Some(3),
            Self::E => Some(4),
            Self::F => Some(5),
            Self::I => Some(6),
            Self::R => Some(7),
            Self::H | Self::L => None,
        }
    }
}

/// 16-bit register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Register16 {
    AF,
    BC,
    DE,
    HL,
    SP,
    IX,
    IY,
}

impl Register16 {
    /// Assembly name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AF => "AF",
            Self::BC => "BC",
            Self::DE => "DE",
            Self::HL => "HL",
            Self::SP => "SP",
            Self::IX => "IX",
            Self::IY => "IY",
        }
    }

    /// High and low halves for pairs composed of two byte registers.
    #[must_use]
    pub const fn halves(self) -> Option<(Register8, Register8)> {
        match self {
            Self::AF => Some((Register8::A, Register8::F)),
            Self::BC => Some((Register8::B, Register8::C)),
            Self::DE => Some((Register8::D, Register8::E)),
            Self::HL | Self::SP | Self::IX | Self::IY => None,
        }
    }

    /// Index into the natively 16-bit cells.
    #[must_use]
    pub const fn wide_index(self) -> Option<usize> {
        match self {
            Self::HL => Some(0),
            Self::SP => Some(1),
            Self::IX => Some(2),
            Self::IY => Some(3),
            Self::AF | Self::BC | Self::DE => None,
        }
    }

    /// Returns `true` when the register is a single 16-bit cell.
    #[must_use]
    pub const fn is_native(self) -> bool {
        self.wide_index().is_some()
    }
}
