use crate::context::DecodeContext;
use crate::encoding::Operand8;
use crate::fault::DecodeFault;
use crate::state::{Register16, Register8};
use crate::value::SymbolicValue;

use super::{Argument, DecodedInstruction};

/// Where an 8-bit operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location8 {
    /// A byte register.
    Register(Register8),
    /// Memory addressed by a register pair, e.g. `(HL)` or `(DE)`.
    Indirect(Register16),
    /// Memory addressed by an index register plus a displacement byte that
    /// follows the opcode.
    Indexed(Register16),
}

impl Location8 {
    /// Decodes a 3-bit register field (`B C D E H L (HL) A`).
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match Operand8::from_u3(bits) {
            Operand8::Register(register) => Self::Register(register),
            Operand8::IndirectHl => Self::Indirect(Register16::HL),
        }
    }

    /// Binds the operand for the current instruction, consuming the
    /// displacement byte of indexed forms.
    pub(super) fn resolve(self, ctx: &mut DecodeContext<'_>) -> Result<Place, DecodeFault> {
        match self {
            Self::Register(_) => Ok(Place {
                location: self,
                address: None,
                displacement: None,
            }),
            Self::Indirect(pair) => Ok(Place {
                location: self,
                address: Some(ctx.state().register16(pair)),
                displacement: None,
            }),
            Self::Indexed(index) => {
                let displacement = ctx.cursor_mut().int8()?;
                Ok(Place::indexed(ctx, index, displacement))
            }
        }
    }
}

/// An operand bound to the current instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Place {
    location: Location8,
    address: Option<SymbolicValue>,
    displacement: Option<i8>,
}

impl Place {
    /// Binds `(index+displacement)` with a displacement already consumed.
    pub(super) fn indexed(ctx: &DecodeContext<'_>, index: Register16, displacement: i8) -> Self {
        Self {
            location: Location8::Indexed(index),
            address: Some(
                ctx.state()
                    .register16(index)
                    .offset16(i64::from(displacement)),
            ),
            displacement: Some(displacement),
        }
    }

    /// Template text; indexed forms carry a `d` placeholder.
    pub(super) fn text(&self) -> String {
        match self.location {
            Location8::Register(register) => register.name().to_string(),
            Location8::Indirect(pair) => format!("({})", pair.name()),
            Location8::Indexed(index) => format!("({}+d)", index.name()),
        }
    }

    /// Arguments this operand contributes to the template.
    pub(super) fn arguments(&self) -> Option<Argument> {
        self.displacement.map(Argument::Displacement)
    }

    /// The register a memory operand is addressed through, paired with its
    /// value, when that value is unknown.
    pub(super) fn unresolved(&self) -> Option<(&'static str, SymbolicValue)> {
        let register = match self.location {
            Location8::Register(_) => return None,
            Location8::Indirect(pair) | Location8::Indexed(pair) => pair,
        };
        self.address
            .filter(|address| !address.is_known())
            .map(|address| (register.name(), address))
    }

    /// Reads the operand. Known memory addresses are recorded as
    /// discovered memory locations.
    pub(super) fn load(&self, ctx: &mut DecodeContext<'_>) -> SymbolicValue {
        let origin = ctx.origin();
        match (self.location, self.address) {
            (Location8::Register(register), _) => ctx.state().register8(register),
            (_, Some(address)) => {
                if let Some(known) = address.address() {
                    ctx.add_memory_location(known);
                }
                ctx.state().memory8_at(address, origin)
            }
            (_, None) => SymbolicValue::unknown(origin),
        }
    }

    /// Writes the operand. Stores through an unknown address are dropped.
    pub(super) fn store(&self, ctx: &mut DecodeContext<'_>, value: SymbolicValue) {
        match (self.location, self.address) {
            (Location8::Register(register), _) => ctx.state_mut().set_register8(register, value),
            (_, Some(address)) => {
                if let Some(known) = address.address() {
                    ctx.add_memory_location(known);
                }
                ctx.state_mut().store8_at(address, value);
            }
            (_, None) => {}
        }
    }
}

impl DecodedInstruction {
    /// Adds the operand's template arguments and, when it addresses memory
    /// through an unknown register, a note carrying that register's value.
    pub(super) fn with_operand(self, place: &Place) -> Self {
        let instruction = self.with_args(place.arguments());
        match place.unresolved() {
            Some((name, value)) => instruction.with_note(name, value),
            None => instruction,
        }
    }
}
