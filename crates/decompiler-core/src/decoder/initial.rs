use crate::context::DecodeContext;
use crate::encoding::{
    condition_from_u3, pair_from_u2, stack_pair_from_u2, AluOp, OpcodeBits, HL_INDIRECT,
};
use crate::fault::DecodeFault;
use crate::state::{Register16, Register8};

use super::effects;
use super::handlers::{Handler, RegisterRef};
use super::operand::Location8;
use super::{DecodedInstruction, InstructionHandler};

/// Root of the decode tree: the unprefixed opcode table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Initial;

impl InstructionHandler for Initial {
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let bits = OpcodeBits::new(ctx.cursor_mut().uint8()?);
        match handler_for(bits) {
            Some(handler) => handler.try_decode(ctx),
            None => Ok(None),
        }
    }
}

/// Opcodes that do not follow the field-driven layout.
#[allow(clippy::match_same_arms)]
fn simple_opcode(n: u8) -> Option<Handler> {
    let handler = match n {
        0x00 => Handler::fixed("NOP"),
        0x02 => Handler::Move8 {
            to: Location8::Indirect(Register16::BC),
            from: Location8::Register(Register8::A),
        },
        0x07 => Handler::with_effect("RLCA", effects::rlca),
        0x08 => Handler::with_effect("EX AF, AF'", effects::exchange_af),
        0x0a => Handler::Move8 {
            to: Location8::Register(Register8::A),
            from: Location8::Indirect(Register16::BC),
        },
        0x0f => Handler::with_effect("RRCA", effects::rrca),
        0x10 => Handler::DecrementJump,
        0x12 => Handler::Move8 {
            to: Location8::Indirect(Register16::DE),
            from: Location8::Register(Register8::A),
        },
        0x17 => Handler::with_effect("RLA", effects::carry_rotate),
        0x18 => Handler::RelativeJump { condition: None },
        0x1a => Handler::Move8 {
            to: Location8::Register(Register8::A),
            from: Location8::Indirect(Register16::DE),
        },
        0x1f => Handler::with_effect("RRA", effects::carry_rotate),
        0x20 | 0x28 | 0x30 | 0x38 => Handler::RelativeJump {
            condition: Some(condition_from_u3(OpcodeBits::new(n).a3() & 0b11)),
        },
        0x22 => Handler::StoreAbsolute(RegisterRef::Word(Register16::HL)),
        0x27 => Handler::with_effect("DAA", effects::carry_rotate),
        0x2a => Handler::LoadAbsolute(RegisterRef::Word(Register16::HL)),
        0x2f => Handler::with_effect("CPL", effects::cpl),
        0x32 => Handler::StoreAbsolute(RegisterRef::Byte(Register8::A)),
        0x37 => Handler::with_effect("SCF", effects::clobber_flags),
        0x3a => Handler::LoadAbsolute(RegisterRef::Byte(Register8::A)),
        0x3f => Handler::with_effect("CCF", effects::clobber_flags),
        0x76 => Handler::fixed("HALT"),
        0xc3 => Handler::Jump { condition: None },
        0xc9 => Handler::Return { condition: None },
        0xcb => Handler::BitOps,
        0xcd => Handler::Call { condition: None },
        0xd3 => Handler::OutputImmediate,
        0xd9 => Handler::with_effect("EXX", effects::exchange_all),
        0xdb => Handler::InputImmediate,
        0xdd => Handler::Indexed(Register16::IX),
        0xe3 => Handler::ExchangeStack(Register16::HL),
        0xe9 => Handler::JumpIndirect(Register16::HL),
        0xeb => Handler::with_effect("EX DE, HL", effects::exchange_de_hl),
        0xed => Handler::Extended,
        0xf3 => Handler::fixed("DI"),
        0xf9 => Handler::Copy16 {
            to: Register16::SP,
            from: Register16::HL,
        },
        0xfb => Handler::fixed("EI"),
        0xfd => Handler::Indexed(Register16::IY),
        _ => return None,
    };
    Some(handler)
}

/// Field-driven decoding for the regular blocks of the table.
fn structural(bits: OpcodeBits) -> Option<Handler> {
    let handler = match bits.pre() {
        0b00 => match (bits.b3(), bits.b4()) {
            (_, 0b0001) => Handler::LoadImmediate16(pair_from_u2(bits.a2())),
            (_, 0b1001) => Handler::Add16 {
                target: Register16::HL,
                source: pair_from_u2(bits.a2()),
            },
            (_, 0b0011) => Handler::IncDec16 {
                register: pair_from_u2(bits.a2()),
                delta: 1,
            },
            (_, 0b1011) => Handler::IncDec16 {
                register: pair_from_u2(bits.a2()),
                delta: -1,
            },
            (0b100, _) => Handler::IncDec8 {
                location: Location8::from_u3(bits.a3()),
                delta: 1,
            },
            (0b101, _) => Handler::IncDec8 {
                location: Location8::from_u3(bits.a3()),
                delta: -1,
            },
            (HL_INDIRECT, _) => Handler::LoadImmediate8(Location8::from_u3(bits.a3())),
            _ => return None,
        },
        0b01 => Handler::Move8 {
            to: Location8::from_u3(bits.a3()),
            from: Location8::from_u3(bits.b3()),
        },
        0b10 => Handler::Alu {
            op: AluOp::from_u3(bits.a3()),
            source: Location8::from_u3(bits.b3()),
        },
        _ => match (bits.b3(), bits.b4()) {
            (0b000, _) => Handler::Return {
                condition: Some(condition_from_u3(bits.a3())),
            },
            (_, 0b0001) => Handler::Pop(stack_pair_from_u2(bits.a2())),
            (_, 0b0101) => Handler::Push(stack_pair_from_u2(bits.a2())),
            (0b010, _) => Handler::Jump {
                condition: Some(condition_from_u3(bits.a3())),
            },
            (0b100, _) => Handler::Call {
                condition: Some(condition_from_u3(bits.a3())),
            },
            (HL_INDIRECT, _) => Handler::AluImmediate(AluOp::from_u3(bits.a3())),
            (0b111, _) => Handler::Restart(bits.a3() << 3),
            _ => return None,
        },
    };
    Some(handler)
}

fn handler_for(bits: OpcodeBits) -> Option<Handler> {
    simple_opcode(bits.n()).or_else(|| structural(bits))
}
