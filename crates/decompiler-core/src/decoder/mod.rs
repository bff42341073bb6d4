//! Instruction decode tree.
//!
//! Decoding starts at [`Initial`], which consumes the first opcode byte and
//! either handles it directly or delegates to a prefix handler (`CB`, `DD`,
//! `FD`, `ED`) that consumes further bytes. Each handler returns
//! `Ok(None)` when it does not recognise the bytes, which the context turns
//! into an unrecognised-opcode fault. Handlers apply their symbolic effects
//! to the context as they decode.

mod bit_ops;
mod effects;
mod extended;
mod handlers;
mod indexed;
mod initial;
mod operand;

pub use bit_ops::{BitOps, IndexedBitOps};
pub use extended::Extended;
pub use handlers::{Effect, Handler, RegisterRef};
pub use indexed::Indexed;
pub use initial::Initial;
pub use operand::Location8;

use crate::context::DecodeContext;
use crate::fault::DecodeFault;
use crate::value::SymbolicValue;

/// A node in the decode tree.
pub trait InstructionHandler {
    /// Consumes the bytes of one instruction at the cursor and applies its
    /// effects.
    ///
    /// # Errors
    ///
    /// Returns a fault when a read runs past the buffer or a required value
    /// is not concrete. `Ok(None)` means the bytes are not recognised.
    fn try_decode(
        &self,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<DecodedInstruction>, DecodeFault>;
}

/// Operand value substituted into an instruction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Argument {
    /// Immediate byte, rendered for `n`.
    Byte(u8),
    /// Immediate word or address, rendered for `nn`, `a` and `e`.
    Word(u16),
    /// Signed index displacement, rendered for `d`.
    Displacement(i8),
}

/// One decoded instruction.
///
/// `template` uses lowercase placeholders (`n`, `nn`, `d`, `e`, `a`) that
/// are replaced by `arguments` in order when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Assembly template, e.g. `LD HL, nn`.
    pub template: String,
    /// Operand values in template order.
    pub arguments: Vec<Argument>,
    /// Symbolic register values worth showing alongside the instruction.
    pub notes: Vec<(&'static str, SymbolicValue)>,
    /// Total bytes consumed, prefixes included.
    pub byte_length: usize,
}

impl DecodedInstruction {
    /// Creates an instruction with no arguments yet.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            arguments: Vec::new(),
            notes: Vec::new(),
            byte_length: 0,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_arg(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Appends all arguments from an iterator.
    #[must_use]
    pub fn with_args(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    /// Attaches a register value annotation.
    #[must_use]
    pub fn with_note(mut self, name: &'static str, value: SymbolicValue) -> Self {
        self.notes.push((name, value));
        self
    }
}

/// Decodes one instruction at the cursor through the full handler tree and
/// records how many bytes it consumed.
///
/// # Errors
///
/// Propagates faults from the handlers.
pub fn decode_instruction(
    ctx: &mut DecodeContext<'_>,
) -> Result<Option<DecodedInstruction>, DecodeFault> {
    let start = ctx.cursor().offset();
    let decoded = Initial.try_decode(ctx)?;
    let end = ctx.cursor().offset();
    Ok(decoded.map(|mut instruction| {
        instruction.byte_length = end - start;
        instruction
    }))
}
