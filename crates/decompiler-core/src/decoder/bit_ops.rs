use crate::context::DecodeContext;
use crate::encoding::{BitOp, OpcodeBits, RotateOp, HL_INDIRECT};
use crate::fault::DecodeFault;
use crate::state::Register16;

use super::effects::clobber_flags;
use super::handlers::Handler;
use super::operand::{Location8, Place};
use super::{DecodedInstruction, InstructionHandler};

/// `CB`-prefixed rotates, shifts and bit operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitOps;

fn shape(bits: OpcodeBits, location: Location8) -> Option<Handler> {
    match BitOp::from_pre(bits.pre()) {
        Some(op) => Some(Handler::Bit {
            op,
            bit: bits.a3(),
            location,
        }),
        None => RotateOp::from_u3(bits.a3()).map(|op| Handler::Rotate { op, location }),
    }
}

impl InstructionHandler for BitOps {
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let bits = OpcodeBits::new(ctx.cursor_mut().uint8()?);
        match shape(bits, Location8::from_u3(bits.b3())) {
            Some(handler) => handler.try_decode(ctx),
            None => Ok(None),
        }
    }
}

/// `DD CB d op` / `FD CB d op`.
///
/// The displacement sits between the prefix pair and the operation byte,
/// so it is consumed here rather than by the operand.
#[derive(Debug, Clone, Copy)]
pub struct IndexedBitOps {
    index: Register16,
}

impl IndexedBitOps {
    /// Creates the handler for one index register.
    #[must_use]
    pub const fn new(index: Register16) -> Self {
        Self { index }
    }
}

impl InstructionHandler for IndexedBitOps {
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let displacement = ctx.cursor_mut().int8()?;
        let bits = OpcodeBits::new(ctx.cursor_mut().uint8()?);
        if bits.b3() != HL_INDIRECT {
            return Ok(None);
        }
        let place = Place::indexed(ctx, self.index, displacement);
        let origin = ctx.origin();

        let template = match BitOp::from_pre(bits.pre()) {
            Some(BitOp::Bit) => {
                clobber_flags(ctx);
                format!("BIT {}, {}", bits.a3(), place.text())
            }
            Some(op) => {
                let value = place.load(ctx).map(|v| op.apply(v, bits.a3()));
                place.store(ctx, value);
                format!("{} {}, {}", op.mnemonic(), bits.a3(), place.text())
            }
            None => {
                let Some(op) = RotateOp::from_u3(bits.a3()) else {
                    return Ok(None);
                };
                let value = place.load(ctx).and_then(origin, |v| op.apply(v));
                place.store(ctx, value);
                clobber_flags(ctx);
                format!("{} {}", op.mnemonic(), place.text())
            }
        };
        Ok(Some(DecodedInstruction::new(template).with_operand(&place)))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::context::DecodeContext;
    use crate::decoder::decode_instruction;
    use crate::state::{Register16, Register8};
    use crate::value::SymbolicValue;

    #[rstest]
    #[case(0x3e, 0x81, Some(0x40))] // SRL (HL)
    #[case(0x06, 0x81, Some(0x03))] // RLC (HL)
    #[case(0xc6, 0x80, Some(0x81))] // SET 0, (HL)
    #[case(0xbe, 0x80, Some(0x00))] // RES 7, (HL)
    #[case(0x16, 0x80, None)] // RL (HL)
    fn indirect_bit_ops_update_memory(
        #[case] op: u8,
        #[case] before: i64,
        #[case] after: Option<i64>,
    ) {
        let bytes = [0xcb, op];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        ctx.state_mut()
            .set_register16(Register16::HL, SymbolicValue::Known(0x8000));
        ctx.state_mut()
            .set_memory8(0x8000, SymbolicValue::Known(before));
        decode_instruction(&mut ctx).expect("decodes");
        assert_eq!(ctx.state().memory8(0x8000, 0).known(), after);
    }

    #[test]
    fn bit_test_leaves_operand_alone() {
        let mut ctx = DecodeContext::new(&[0xcb, 0x47], 0x6000);
        ctx.state_mut()
            .set_register8(Register8::A, SymbolicValue::Known(0x11));
        decode_instruction(&mut ctx).expect("decodes");
        assert_eq!(ctx.state().register8(Register8::A), SymbolicValue::Known(0x11));
        assert!(!ctx.state().register8(Register8::F).is_known());
    }

    #[test]
    fn indexed_set_writes_through_displacement() {
        let bytes = [0xdd, 0xcb, 0xfe, 0xde];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        ctx.state_mut()
            .set_register16(Register16::IX, SymbolicValue::Known(0x8002));
        ctx.state_mut().set_memory8(0x8000, SymbolicValue::Known(0));
        let decoded = decode_instruction(&mut ctx)
            .expect("decodes")
            .expect("recognised");
        assert_eq!(decoded.render(), "SET 3, (IX-02)");
        assert_eq!(decoded.byte_length, 4);
        assert_eq!(ctx.state().memory8(0x8000, 0), SymbolicValue::Known(0x08));
    }
}
