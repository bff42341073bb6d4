use crate::context::DecodeContext;
use crate::encoding::{pair_from_u2, AluOp, OpcodeBits, HL_INDIRECT, HL_PAIR};
use crate::fault::DecodeFault;
use crate::state::Register16;

use super::handlers::{Handler, RegisterRef};
use super::operand::Location8;
use super::{DecodedInstruction, InstructionHandler};

/// `DD`/`FD`-prefixed instructions: the `HL` forms rewritten to use `IX` or
/// `IY`, with `(HL)` becoming `(IX+d)`.
#[derive(Debug, Clone, Copy)]
pub struct Indexed {
    index: Register16,
}

impl Indexed {
    /// Creates the handler for one index register.
    #[must_use]
    pub const fn new(index: Register16) -> Self {
        Self { index }
    }

    fn handler_for(self, bits: OpcodeBits) -> Option<Handler> {
        let index = self.index;
        let indexed = Location8::Indexed(index);
        let handler = match bits.n() {
            0x21 => Handler::LoadImmediate16(index),
            0x22 => Handler::StoreAbsolute(RegisterRef::Word(index)),
            0x23 => Handler::IncDec16 {
                register: index,
                delta: 1,
            },
            0x2a => Handler::LoadAbsolute(RegisterRef::Word(index)),
            0x2b => Handler::IncDec16 {
                register: index,
                delta: -1,
            },
            0x34 => Handler::IncDec8 {
                location: indexed,
                delta: 1,
            },
            0x35 => Handler::IncDec8 {
                location: indexed,
                delta: -1,
            },
            0x36 => Handler::LoadImmediate8(indexed),
            0xcb => Handler::IndexedBitOps(index),
            0xe1 => Handler::Pop(index),
            0xe3 => Handler::ExchangeStack(index),
            0xe5 => Handler::Push(index),
            0xe9 => Handler::JumpIndirect(index),
            0xf9 => Handler::Copy16 {
                to: Register16::SP,
                from: index,
            },
            _ => return self.structural(bits),
        };
        Some(handler)
    }

    fn structural(self, bits: OpcodeBits) -> Option<Handler> {
        let indexed = Location8::Indexed(self.index);
        match bits.pre() {
            0b00 if bits.b4() == 0b1001 => Some(Handler::Add16 {
                target: self.index,
                source: if bits.a2() == HL_PAIR {
                    self.index
                } else {
                    pair_from_u2(bits.a2())
                },
            }),
            0b01 if bits.a3() == HL_INDIRECT && bits.b3() != HL_INDIRECT => Some(Handler::Move8 {
                to: indexed,
                from: Location8::from_u3(bits.b3()),
            }),
            0b01 if bits.b3() == HL_INDIRECT && bits.a3() != HL_INDIRECT => Some(Handler::Move8 {
                to: Location8::from_u3(bits.a3()),
                from: indexed,
            }),
            0b10 if bits.b3() == HL_INDIRECT => Some(Handler::Alu {
                op: AluOp::from_u3(bits.a3()),
                source: indexed,
            }),
            _ => None,
        }
    }
}

impl InstructionHandler for Indexed {
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let bits = OpcodeBits::new(ctx.cursor_mut().uint8()?);
        match self.handler_for(bits) {
            Some(handler) => handler.try_decode(ctx),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::DecodeContext;
    use crate::decoder::decode_instruction;
    use crate::state::{Register16, Register8};
    use crate::value::SymbolicValue;

    #[test]
    fn indexed_load_reads_displaced_cell() {
        let bytes = [0xfd, 0x46, 0x03];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        ctx.state_mut()
            .set_register16(Register16::IY, SymbolicValue::Known(0x8000));
        ctx.state_mut().set_memory8(0x8003, SymbolicValue::Known(0x5a));
        let decoded = decode_instruction(&mut ctx)
            .expect("decodes")
            .expect("recognised");
        assert_eq!(decoded.render(), "LD B, (IY+03)");
        assert_eq!(decoded.byte_length, 3);
        assert_eq!(ctx.state().register8(Register8::B), SymbolicValue::Known(0x5a));
        assert!(ctx.memory_locations().contains(&0x8003));
    }

    #[test]
    fn displacement_precedes_immediate() {
        let bytes = [0xdd, 0x36, 0x02, 0x7f];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        ctx.state_mut()
            .set_register16(Register16::IX, SymbolicValue::Known(0x9000));
        decode_instruction(&mut ctx).expect("decodes");
        assert_eq!(ctx.state().memory8(0x9002, 0), SymbolicValue::Known(0x7f));
    }

    #[test]
    fn index_register_leaves_hl_alone() {
        let bytes = [0xdd, 0x23];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        ctx.state_mut()
            .set_register16(Register16::IX, SymbolicValue::Known(0xffff));
        ctx.state_mut()
            .set_register16(Register16::HL, SymbolicValue::Known(1));
        decode_instruction(&mut ctx).expect("decodes");
        assert_eq!(ctx.state().register16(Register16::IX), SymbolicValue::Known(0));
        assert_eq!(ctx.state().register16(Register16::HL), SymbolicValue::Known(1));
    }
}
