//! Opcode bit-field decomposition and the fixed operand-selector tables.

use crate::state::{Register16, Register8};

/// Selector value that means "indirect via HL" in 3-bit register fields.
pub const HL_INDIRECT: u8 = 0b110;

/// Selector value for the HL pair in 2-bit register-pair fields.
pub const HL_PAIR: u8 = 0b10;

/// The six canonical sub-fields of one opcode byte.
///
/// ```text
/// pre  nn.. ....    a2   ..nn ....
/// a3   ..nn n...    b4   .... nnnn
/// b3   .... .nnn    rest ..nn nnnn
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeBits(u8);

impl OpcodeBits {
    /// Wraps a raw byte.
    #[must_use]
    pub const fn new(n: u8) -> Self {
        Self(n)
    }

    /// The raw byte.
    #[must_use]
    pub const fn n(self) -> u8 {
        self.0
    }

    /// Top two bits.
    #[must_use]
    pub const fn pre(self) -> u8 {
        self.0 >> 6
    }

    /// Bits 5..3.
    #[must_use]
    pub const fn a3(self) -> u8 {
        (self.0 >> 3) & 0b111
    }

    /// Bits 2..0.
    #[must_use]
    pub const fn b3(self) -> u8 {
        self.0 & 0b111
    }

    /// Bits 5..4.
    #[must_use]
    pub const fn a2(self) -> u8 {
        (self.0 >> 4) & 0b11
    }

    /// Bits 3..0.
    #[must_use]
    pub const fn b4(self) -> u8 {
        self.0 & 0b1111
    }

    /// Bits 5..0.
    #[must_use]
    pub const fn rest(self) -> u8 {
        self.0 & 0b11_1111
    }
}

/// An 8-bit operand selected by a 3-bit register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand8 {
    /// A plain register.
    Register(Register8),
    /// The memory byte addressed by HL.
    IndirectHl,
}

impl Operand8 {
    /// Decodes a 3-bit register field (`B C D E H L (HL) A`).
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Register(Register8::B),
            1 => Self::Register(Register8::C),
            2 => Self::Register(Register8::D),
            3 => Self::Register(Register8::E),
            4 => Self::Register(Register8::H),
            5 => Self::Register(Register8::L),
            HL_INDIRECT => Self::IndirectHl,
            _ => Self::Register(Register8::A),
        }
    }
}

/// Register pair selected by a 2-bit field in load/arithmetic opcodes.
#[must_use]
pub const fn pair_from_u2(bits: u8) -> Register16 {
    match bits & 0b11 {
        0 => Register16::BC,
        1 => Register16::DE,
        HL_PAIR => Register16::HL,
        _ => Register16::SP,
    }
}

/// Register pair selected by a 2-bit field in `PUSH`/`POP` opcodes.
#[must_use]
pub const fn stack_pair_from_u2(bits: u8) -> Register16 {
    match bits & 0b11 {
        0 => Register16::BC,
        1 => Register16::DE,
        HL_PAIR => Register16::HL,
        _ => Register16::AF,
    }
}

/// 8-bit arithmetic and logic operations, indexed by a 3-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    /// Decodes a 3-bit operation field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Add,
            1 => Self::Adc,
            2 => Self::Sub,
            3 => Self::Sbc,
            4 => Self::And,
            5 => Self::Xor,
            6 => Self::Or,
            _ => Self::Cp,
        }
    }

    /// Mnemonic text.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Adc => "ADC",
            Self::Sub => "SUB",
            Self::Sbc => "SBC",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Or => "OR",
            Self::Cp => "CP",
        }
    }

    /// Returns `true` when the assembly form names the accumulator
    /// explicitly (`ADD A, B` but `SUB B`).
    #[must_use]
    pub const fn takes_accumulator(self) -> bool {
        matches!(self, Self::Add | Self::Adc | Self::Sbc)
    }

    /// Computes the new accumulator from concrete operands.
    ///
    /// `None` means the result depends on the carry flag, which is never
    /// tracked, so the accumulator becomes unknown.
    #[must_use]
    pub const fn apply(self, a: i64, operand: i64) -> Option<i64> {
        match self {
            Self::Add => Some((a + operand) & 0xFF),
            Self::Sub => Some((a - operand) & 0xFF),
            Self::And => Some(a & operand),
            Self::Xor => Some(a ^ operand),
            Self::Or => Some(a | operand),
            Self::Cp => Some(a),
            Self::Adc | Self::Sbc => None,
        }
    }
}

/// Branch conditions, indexed by a 3-bit field.
#[must_use]
pub const fn condition_from_u3(bits: u8) -> &'static str {
    match bits & 0b111 {
        0 => "NZ",
        1 => "Z",
        2 => "NC",
        3 => "C",
        4 => "NP",
        5 => "P",
        6 => "NS",
        _ => "S",
    }
}

/// Rotate and shift operations in the bit-manipulation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RotateOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Srl,
}

impl RotateOp {
    /// Decodes a 3-bit operation field; `0b110` is reserved and never matches.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits & 0b111 {
            0 => Some(Self::Rlc),
            1 => Some(Self::Rrc),
            2 => Some(Self::Rl),
            3 => Some(Self::Rr),
            4 => Some(Self::Sla),
            5 => Some(Self::Sra),
            7 => Some(Self::Srl),
            _ => None,
        }
    }

    /// Mnemonic text.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Rlc => "RLC",
            Self::Rrc => "RRC",
            Self::Rl => "RL",
            Self::Rr => "RR",
            Self::Sla => "SLA",
            Self::Sra => "SRA",
            Self::Srl => "SRL",
        }
    }

    /// Computes the shifted byte; `None` when the carry flag feeds in.
    #[must_use]
    pub const fn apply(self, v: i64) -> Option<i64> {
        let v = v & 0xFF;
        match self {
            Self::Rlc => Some(((v << 1) | (v >> 7)) & 0xFF),
            Self::Rrc => Some(((v >> 1) | (v << 7)) & 0xFF),
            Self::Sla => Some((v << 1) & 0xFF),
            Self::Sra => Some((v >> 1) | (v & 0x80)),
            Self::Srl => Some(v >> 1),
            Self::Rl | Self::Rr => None,
        }
    }
}

/// Bit operations selected by the `pre` field of a bit-manipulation byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BitOp {
    Bit,
    Res,
    Set,
}

impl BitOp {
    /// Decodes the `pre` field; `0b00` selects the rotate table instead.
    #[must_use]
    pub const fn from_pre(pre: u8) -> Option<Self> {
        match pre {
            0b01 => Some(Self::Bit),
            0b10 => Some(Self::Res),
            0b11 => Some(Self::Set),
            _ => None,
        }
    }

    /// Mnemonic text.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Bit => "BIT",
            Self::Res => "RES",
            Self::Set => "SET",
        }
    }

    /// New byte value after the operation; `BIT` leaves it unchanged.
    #[must_use]
    pub const fn apply(self, v: i64, bit: u8) -> i64 {
        match self {
            Self::Bit => v,
            Self::Res => v & !(1 << bit),
            Self::Set => v | (1 << bit),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{
        condition_from_u3, pair_from_u2, stack_pair_from_u2, AluOp, BitOp, OpcodeBits, Operand8,
        RotateOp,
    };
    use crate::state::{Register16, Register8};

    #[test]
    fn fields_partition_every_byte() {
        for n in 0u8..=255 {
            let bits = OpcodeBits::new(n);
            let rebuilt = u16::from(bits.pre()) * 64 + u16::from(bits.a3()) * 8 + u16::from(bits.b3());
            assert_eq!(rebuilt, u16::from(n));
            assert_eq!(bits.a2(), bits.a3() >> 1);
            assert_eq!(bits.rest(), (bits.a3() << 3) | bits.b3());
            assert_eq!(bits.b4() & 0b111, bits.b3());
        }
    }

    #[rstest]
    #[case(0b000, Operand8::Register(Register8::B))]
    #[case(0b100, Operand8::Register(Register8::H))]
    #[case(0b110, Operand8::IndirectHl)]
    #[case(0b111, Operand8::Register(Register8::A))]
    fn register_field_selects_operand(#[case] bits: u8, #[case] expected: Operand8) {
        assert_eq!(Operand8::from_u3(bits), expected);
    }

    #[test]
    fn stack_table_swaps_sp_for_af() {
        assert_eq!(pair_from_u2(0b11), Register16::SP);
        assert_eq!(stack_pair_from_u2(0b11), Register16::AF);
        assert_eq!(stack_pair_from_u2(0b10), Register16::HL);
    }

    #[test]
    fn rotate_table_has_reserved_slot() {
        assert_eq!(RotateOp::from_u3(0b110), None);
        assert_eq!(RotateOp::from_u3(0b111), Some(RotateOp::Srl));
    }

    #[rstest]
    #[case(RotateOp::Rlc, 0x81, Some(0x03))]
    #[case(RotateOp::Rrc, 0x01, Some(0x80))]
    #[case(RotateOp::Sla, 0xc1, Some(0x82))]
    #[case(RotateOp::Sra, 0x82, Some(0xc1))]
    #[case(RotateOp::Srl, 0x82, Some(0x41))]
    #[case(RotateOp::Rl, 0x01, None)]
    fn rotate_results(#[case] op: RotateOp, #[case] input: i64, #[case] expected: Option<i64>) {
        assert_eq!(op.apply(input), expected);
    }

    #[test]
    fn alu_results_wrap_to_a_byte() {
        assert_eq!(AluOp::Add.apply(0xff, 2), Some(0x01));
        assert_eq!(AluOp::Sub.apply(0x00, 1), Some(0xff));
        assert_eq!(AluOp::Cp.apply(0x10, 0x20), Some(0x10));
        assert_eq!(AluOp::Adc.apply(1, 1), None);
    }

    #[test]
    fn bit_ops_touch_single_bit() {
        assert_eq!(BitOp::from_pre(0b00), None);
        assert_eq!(BitOp::Set.apply(0x00, 7), 0x80);
        assert_eq!(BitOp::Res.apply(0xff, 0), 0xfe);
        assert_eq!(BitOp::Bit.apply(0x5a, 3), 0x5a);
    }

    #[test]
    fn condition_table_order() {
        let names: Vec<_> = (0..8).map(condition_from_u3).collect();
        assert_eq!(names, ["NZ", "Z", "NC", "C", "NP", "P", "NS", "S"]);
    }

    proptest! {
        #[test]
        fn alu_results_stay_in_byte_range(a in 0i64..256, b in 0i64..256, op in 0u8..8) {
            if let Some(result) = AluOp::from_u3(op).apply(a, b) {
                prop_assert!((0..256).contains(&result));
            }
        }
    }
}
