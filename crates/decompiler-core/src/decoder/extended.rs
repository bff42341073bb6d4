use crate::context::DecodeContext;
use crate::encoding::{pair_from_u2, OpcodeBits};
use crate::fault::DecodeFault;
use crate::state::Register8;

use super::effects;
use super::handlers::{Handler, RegisterRef};
use super::operand::Location8;
use super::{DecodedInstruction, InstructionHandler};

/// `ED`-prefixed instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extended;

fn simple_opcode(n: u8) -> Option<Handler> {
    let handler = match n {
        0x44 => Handler::with_effect("NEG", effects::neg),
        0x45 => Handler::with_effect("RETN", effects::end_fallthrough),
        0x46 => Handler::fixed("IM 0"),
        0x47 => Handler::Move8 {
            to: Location8::Register(Register8::I),
            from: Location8::Register(Register8::A),
        },
        0x4d => Handler::with_effect("RETI", effects::end_fallthrough),
        0x4f => Handler::Move8 {
            to: Location8::Register(Register8::R),
            from: Location8::Register(Register8::A),
        },
        0x56 => Handler::fixed("IM 1"),
        0x57 => Handler::Move8 {
            to: Location8::Register(Register8::A),
            from: Location8::Register(Register8::I),
        },
        0x5e => Handler::fixed("IM 2"),
        0x5f => Handler::Move8 {
            to: Location8::Register(Register8::A),
            from: Location8::Register(Register8::R),
        },
        0x67 => Handler::with_effect("RRD", effects::rotate_digit),
        0x6f => Handler::with_effect("RLD", effects::rotate_digit),
        0xa0 => Handler::with_effect("LDI", effects::ldi),
        0xa1 => Handler::with_effect("CPI", effects::cpi),
        0xa8 => Handler::with_effect("LDD", effects::ldd),
        0xa9 => Handler::with_effect("CPD", effects::cpd),
        0xb0 => Handler::with_effect("LDIR", effects::ldir),
        0xb1 => Handler::with_effect("CPIR", effects::compare_repeat),
        0xb8 => Handler::with_effect("LDDR", effects::lddr),
        0xb9 => Handler::with_effect("CPDR", effects::compare_repeat),
        _ => return None,
    };
    Some(handler)
}

fn port_register(bits: u8) -> Option<Register8> {
    match Location8::from_u3(bits) {
        Location8::Register(register) => Some(register),
        Location8::Indirect(_) | Location8::Indexed(_) => None,
    }
}

fn structural(bits: OpcodeBits) -> Option<Handler> {
    if bits.pre() != 0b01 {
        return None;
    }
    match (bits.b3(), bits.b4()) {
        (0b000, _) => port_register(bits.a3()).map(Handler::InputC),
        (0b001, _) => port_register(bits.a3()).map(Handler::OutputC),
        (0b010, _) => Some(Handler::CarryArith16 {
            mnemonic: if bits.a3() & 1 == 1 { "ADC" } else { "SBC" },
            source: pair_from_u2(bits.a2()),
        }),
        (_, 0b0011) => Some(Handler::StoreAbsolute(RegisterRef::Word(pair_from_u2(
            bits.a2(),
        )))),
        (_, 0b1011) => Some(Handler::LoadAbsolute(RegisterRef::Word(pair_from_u2(
            bits.a2(),
        )))),
        _ => None,
    }
}

impl InstructionHandler for Extended {
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let bits = OpcodeBits::new(ctx.cursor_mut().uint8()?);
        match simple_opcode(bits.n()).or_else(|| structural(bits)) {
            Some(handler) => handler.try_decode(ctx),
            None => Ok(None),
        }
    }
}
