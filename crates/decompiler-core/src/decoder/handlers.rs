//! Reusable handler variants shared by every opcode table.

use crate::context::{DecodeContext, TargetKind};
use crate::encoding::{AluOp, BitOp, RotateOp};
use crate::fault::DecodeFault;
use crate::state::{Register16, Register8};
use crate::value::SymbolicValue;

use super::effects::clobber_flags;
use super::operand::Location8;
use super::{
    Argument, BitOps, DecodedInstruction, Extended, Indexed, IndexedBitOps, InstructionHandler,
};

/// Side effect of a fixed-form instruction.
pub type Effect = fn(&mut DecodeContext<'_>);

/// A register of either width, for absolute loads and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterRef {
    /// An 8-bit register.
    Byte(Register8),
    /// A 16-bit register.
    Word(Register16),
}

impl RegisterRef {
    const fn name(self) -> &'static str {
        match self {
            Self::Byte(register) => register.name(),
            Self::Word(register) => register.name(),
        }
    }
}

/// Closed set of instruction shapes.
///
/// Opcode tables map bytes to variants; each variant knows which operand
/// bytes follow and what the instruction does to the symbolic state.
#[derive(Debug, Clone)]
pub enum Handler {
    /// No operand bytes, optional effect.
    Fixed {
        /// Assembly text.
        template: &'static str,
        /// State change, if any.
        effect: Option<Effect>,
    },
    /// `OUT (n), A`.
    OutputImmediate,
    /// `IN A, (n)`.
    InputImmediate,
    /// `IN r, (C)`.
    InputC(Register8),
    /// `OUT (C), r`.
    OutputC(Register8),
    /// `LD loc, n`.
    LoadImmediate8(Location8),
    /// `LD rr, nn`.
    LoadImmediate16(Register16),
    /// `LD to, from` between registers and memory.
    Move8 {
        /// Destination.
        to: Location8,
        /// Source.
        from: Location8,
    },
    /// `LD SP, rr`.
    Copy16 {
        /// Destination.
        to: Register16,
        /// Source.
        from: Register16,
    },
    /// `LD (nn), r`.
    StoreAbsolute(RegisterRef),
    /// `LD r, (nn)`.
    LoadAbsolute(RegisterRef),
    /// `INC loc` / `DEC loc`.
    IncDec8 {
        /// Operand.
        location: Location8,
        /// `1` or `-1`.
        delta: i64,
    },
    /// `INC rr` / `DEC rr`.
    IncDec16 {
        /// Operand.
        register: Register16,
        /// `1` or `-1`.
        delta: i64,
    },
    /// `ADD rr, rr`.
    Add16 {
        /// Accumulating register.
        target: Register16,
        /// Added register.
        source: Register16,
    },
    /// `ADC HL, rr` / `SBC HL, rr`; the carry is never known.
    CarryArith16 {
        /// `ADC` or `SBC`.
        mnemonic: &'static str,
        /// Added or subtracted register.
        source: Register16,
    },
    /// 8-bit arithmetic with the accumulator.
    Alu {
        /// Operation.
        op: AluOp,
        /// Second operand.
        source: Location8,
    },
    /// 8-bit arithmetic with an immediate byte.
    AluImmediate(AluOp),
    /// Rotate or shift of one operand.
    Rotate {
        /// Operation.
        op: RotateOp,
        /// Operand.
        location: Location8,
    },
    /// `BIT`, `RES` or `SET`.
    Bit {
        /// Operation.
        op: BitOp,
        /// Bit number.
        bit: u8,
        /// Operand.
        location: Location8,
    },
    /// `PUSH rr`.
    Push(Register16),
    /// `POP rr`.
    Pop(Register16),
    /// `EX (SP), rr`.
    ExchangeStack(Register16),
    /// `JR`/`JR cc`.
    RelativeJump {
        /// Branch condition, `None` when unconditional.
        condition: Option<&'static str>,
    },
    /// `DJNZ e`.
    DecrementJump,
    /// `JP a`/`JP cc, a`.
    Jump {
        /// Branch condition, `None` when unconditional.
        condition: Option<&'static str>,
    },
    /// `CALL a`/`CALL cc, a`.
    Call {
        /// Branch condition, `None` when unconditional.
        condition: Option<&'static str>,
    },
    /// `RET`/`RET cc`.
    Return {
        /// Branch condition, `None` when unconditional.
        condition: Option<&'static str>,
    },
    /// `RST p`.
    Restart(u8),
    /// `JP (rr)`.
    JumpIndirect(Register16),
    /// `CB` prefix.
    BitOps,
    /// `DD`/`FD` prefix.
    Indexed(Register16),
    /// `DD CB`/`FD CB` prefix pair.
    IndexedBitOps(Register16),
    /// `ED` prefix.
    Extended,
}

impl Handler {
    /// A fixed-form instruction without effects.
    #[must_use]
    pub const fn fixed(template: &'static str) -> Self {
        Self::Fixed {
            template,
            effect: None,
        }
    }

    /// A fixed-form instruction with an effect.
    #[must_use]
    pub const fn with_effect(template: &'static str, effect: Effect) -> Self {
        Self::Fixed {
            template,
            effect: Some(effect),
        }
    }
}

fn with_condition(mnemonic: &str, condition: Option<&str>, operand: &str) -> String {
    match (condition, operand.is_empty()) {
        (Some(condition), true) => format!("{mnemonic} {condition}"),
        (Some(condition), false) => format!("{mnemonic} {condition}, {operand}"),
        (None, true) => mnemonic.to_string(),
        (None, false) => format!("{mnemonic} {operand}"),
    }
}

fn alu_template(op: AluOp, operand: &str) -> String {
    if op.takes_accumulator() {
        format!("{} A, {operand}", op.mnemonic())
    } else {
        format!("{} {operand}", op.mnemonic())
    }
}

/// New accumulator after `op`. `CP` only sets flags, so A is returned as is.
fn alu_result(op: AluOp, a: SymbolicValue, operand: SymbolicValue, origin: u16) -> SymbolicValue {
    if op == AluOp::Cp {
        return a;
    }
    match (a.known(), operand.known()) {
        (Some(a), Some(operand)) => op
            .apply(a, operand)
            .map_or(SymbolicValue::unknown(origin), SymbolicValue::Known),
        _ => SymbolicValue::unknown(origin),
    }
}

fn relative_target(ctx: &mut DecodeContext<'_>) -> Result<u16, DecodeFault> {
    let e = ctx.cursor_mut().int8()?;
    Ok(ctx.next_address().wrapping_add_signed(i16::from(e)))
}

impl InstructionHandler for Handler {
    #[allow(clippy::too_many_lines)]
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault> {
        let origin = ctx.origin();
        let decoded = match *self {
            Self::Fixed { template, effect } => {
                if let Some(effect) = effect {
                    effect(ctx);
                }
                DecodedInstruction::new(template)
            }
            Self::OutputImmediate => {
                let port = ctx.cursor_mut().uint8()?;
                DecodedInstruction::new("OUT (n), A").with_arg(Argument::Byte(port))
            }
            Self::InputImmediate => {
                let port = ctx.cursor_mut().uint8()?;
                ctx.state_mut().clear_register8(Register8::A, origin);
                DecodedInstruction::new("IN A, (n)").with_arg(Argument::Byte(port))
            }
            Self::InputC(register) => {
                ctx.state_mut().clear_register8(register, origin);
                clobber_flags(ctx);
                DecodedInstruction::new(format!("IN {}, (C)", register.name()))
            }
            Self::OutputC(register) => {
                DecodedInstruction::new(format!("OUT (C), {}", register.name()))
            }
            Self::LoadImmediate8(location) => {
                let place = location.resolve(ctx)?;
                let n = ctx.cursor_mut().uint8()?;
                place.store(ctx, SymbolicValue::from(n));
                DecodedInstruction::new(format!("LD {}, n", place.text()))
                    .with_operand(&place)
                    .with_arg(Argument::Byte(n))
            }
            Self::LoadImmediate16(register) => {
                let nn = ctx.cursor_mut().uint16()?;
                ctx.state_mut()
                    .set_register16(register, SymbolicValue::from(nn));
                DecodedInstruction::new(format!("LD {}, nn", register.name()))
                    .with_arg(Argument::Word(nn))
            }
            Self::Move8 { to, from } => {
                let source = from.resolve(ctx)?;
                let destination = to.resolve(ctx)?;
                let value = source.load(ctx);
                destination.store(ctx, value);
                DecodedInstruction::new(format!("LD {}, {}", destination.text(), source.text()))
                    .with_operand(&destination)
                    .with_operand(&source)
            }
            Self::Copy16 { to, from } => {
                let value = ctx.state().register16(from);
                ctx.state_mut().set_register16(to, value);
                DecodedInstruction::new(format!("LD {}, {}", to.name(), from.name()))
            }
            Self::StoreAbsolute(register) => {
                let address = ctx.cursor_mut().uint16()?;
                ctx.add_memory_location(address);
                let state = ctx.state_mut();
                match register {
                    RegisterRef::Byte(r) => {
                        let value = state.register8(r);
                        state.set_memory8(address, value);
                    }
                    RegisterRef::Word(rr) => {
                        let value = state.register16(rr);
                        state.set_memory16(address, value);
                    }
                }
                DecodedInstruction::new(format!("LD (nn), {}", register.name()))
                    .with_arg(Argument::Word(address))
            }
            Self::LoadAbsolute(register) => {
                let address = ctx.cursor_mut().uint16()?;
                ctx.add_memory_location(address);
                let state = ctx.state_mut();
                match register {
                    RegisterRef::Byte(r) => {
                        let value = state.memory8(address, origin);
                        state.set_register8(r, value);
                    }
                    RegisterRef::Word(rr) => {
                        let value = state.memory16(address, origin);
                        state.set_register16(rr, value);
                    }
                }
                DecodedInstruction::new(format!("LD {}, (nn)", register.name()))
                    .with_arg(Argument::Word(address))
            }
            Self::IncDec8 { location, delta } => {
                let place = location.resolve(ctx)?;
                let value = place.load(ctx).map(|v| (v + delta) & 0xFF);
                place.store(ctx, value);
                clobber_flags(ctx);
                let mnemonic = if delta < 0 { "DEC" } else { "INC" };
                DecodedInstruction::new(format!("{mnemonic} {}", place.text()))
                    .with_operand(&place)
            }
            Self::IncDec16 { register, delta } => {
                let value = ctx.state().register16(register).offset16(delta);
                ctx.state_mut().set_register16(register, value);
                let mnemonic = if delta < 0 { "DEC" } else { "INC" };
                DecodedInstruction::new(format!("{mnemonic} {}", register.name()))
            }
            Self::Add16 { target, source } => {
                let state = ctx.state_mut();
                let sum = state
                    .register16(target)
                    .combine(state.register16(source), |a, b| (a + b) & 0xFFFF);
                state.set_register16(target, sum);
                clobber_flags(ctx);
                DecodedInstruction::new(format!("ADD {}, {}", target.name(), source.name()))
            }
            Self::CarryArith16 { mnemonic, source } => {
                ctx.state_mut().clear_register16(Register16::HL, origin);
                clobber_flags(ctx);
                DecodedInstruction::new(format!("{mnemonic} HL, {}", source.name()))
            }
            Self::Alu { op, source } => {
                let place = source.resolve(ctx)?;
                let operand = place.load(ctx);
                let a = ctx.state().register8(Register8::A);
                let self_cancelling = source == Location8::Register(Register8::A)
                    && matches!(op, AluOp::Xor | AluOp::Sub);
                let result = if self_cancelling {
                    SymbolicValue::Known(0)
                } else {
                    alu_result(op, a, operand, origin)
                };
                ctx.state_mut().set_register8(Register8::A, result);
                clobber_flags(ctx);
                DecodedInstruction::new(alu_template(op, &place.text()))
                    .with_operand(&place)
            }
            Self::AluImmediate(op) => {
                let n = ctx.cursor_mut().uint8()?;
                let a = ctx.state().register8(Register8::A);
                let result = alu_result(op, a, SymbolicValue::from(n), origin);
                ctx.state_mut().set_register8(Register8::A, result);
                clobber_flags(ctx);
                DecodedInstruction::new(alu_template(op, "n")).with_arg(Argument::Byte(n))
            }
            Self::Rotate { op, location } => {
                let place = location.resolve(ctx)?;
                let value = place.load(ctx).and_then(origin, |v| op.apply(v));
                place.store(ctx, value);
                clobber_flags(ctx);
                DecodedInstruction::new(format!("{} {}", op.mnemonic(), place.text()))
                    .with_operand(&place)
            }
            Self::Bit { op, bit, location } => {
                let place = location.resolve(ctx)?;
                match op {
                    BitOp::Bit => clobber_flags(ctx),
                    BitOp::Res | BitOp::Set => {
                        let value = place.load(ctx).map(|v| op.apply(v, bit));
                        place.store(ctx, value);
                    }
                }
                DecodedInstruction::new(format!("{} {bit}, {}", op.mnemonic(), place.text()))
                    .with_operand(&place)
            }
            Self::Push(register) => {
                let state = ctx.state_mut();
                let value = state.register16(register);
                let sp = state.register16(Register16::SP).offset16(-2);
                if let Some(top) = sp.address() {
                    state.set_memory16(top, value);
                }
                state.set_register16(Register16::SP, sp);
                DecodedInstruction::new(format!("PUSH {}", register.name()))
            }
            Self::Pop(register) => {
                let state = ctx.state_mut();
                let sp = state.register16(Register16::SP);
                let value = sp.address().map_or(SymbolicValue::unknown(origin), |top| {
                    state.memory16(top, origin)
                });
                state.set_register16(register, value);
                state.set_register16(Register16::SP, sp.offset16(2));
                DecodedInstruction::new(format!("POP {}", register.name()))
            }
            Self::ExchangeStack(register) => {
                let state = ctx.state_mut();
                let value = state.register16(register);
                match state.register16(Register16::SP).address() {
                    Some(top) => {
                        let stacked = state.memory16(top, origin);
                        state.set_memory16(top, value);
                        state.set_register16(register, stacked);
                    }
                    None => state.clear_register16(register, origin),
                }
                DecodedInstruction::new(format!("EX (SP), {}", register.name()))
            }
            Self::RelativeJump { condition } => {
                let target = relative_target(ctx)?;
                match condition {
                    Some(_) => ctx.add_target(target, TargetKind::Jump),
                    None => {
                        if ctx.offset_of(target).is_none() {
                            ctx.add_target(target, TargetKind::Jump);
                        }
                        ctx.continue_at(target);
                    }
                }
                DecodedInstruction::new(with_condition("JR", condition, "e"))
                    .with_arg(Argument::Word(target))
            }
            Self::DecrementJump => {
                let target = relative_target(ctx)?;
                ctx.add_target(target, TargetKind::Jump);
                ctx.state_mut().clear_register8(Register8::B, origin);
                DecodedInstruction::new("DJNZ e").with_arg(Argument::Word(target))
            }
            Self::Jump { condition } => {
                let target = ctx.cursor_mut().uint16()?;
                ctx.add_target(target, TargetKind::Jump);
                if condition.is_none() {
                    ctx.end_fallthrough();
                }
                DecodedInstruction::new(with_condition("JP", condition, "a"))
                    .with_arg(Argument::Word(target))
            }
            Self::Call { condition } => {
                let target = ctx.cursor_mut().uint16()?;
                ctx.add_target(target, TargetKind::Function);
                DecodedInstruction::new(with_condition("CALL", condition, "a"))
                    .with_arg(Argument::Word(target))
            }
            Self::Return { condition } => {
                if condition.is_none() {
                    ctx.end_fallthrough();
                }
                DecodedInstruction::new(with_condition("RET", condition, ""))
            }
            Self::Restart(vector) => {
                ctx.add_target(u16::from(vector), TargetKind::Function);
                DecodedInstruction::new(format!("RST {vector:02x}h"))
            }
            Self::JumpIndirect(register) => {
                let value = ctx.state().register16(register);
                if let Some(target) = value.address() {
                    ctx.add_target(target, TargetKind::Jump);
                }
                ctx.end_fallthrough();
                DecodedInstruction::new(format!("JP ({})", register.name()))
                    .with_note(register.name(), value)
            }
            Self::BitOps => return BitOps.try_decode(ctx),
            Self::Indexed(index) => return Indexed::new(index).try_decode(ctx),
            Self::IndexedBitOps(index) => return IndexedBitOps::new(index).try_decode(ctx),
            Self::Extended => return Extended.try_decode(ctx),
        };
        Ok(Some(decoded))
    }
}
