//! Listing text for decoded instructions.
//!
//! Templates are rendered by replacing each lowercase placeholder token with
//! the next argument. Bytes print as two lowercase hex digits, words and
//! addresses as four. A negative displacement written after `+` turns the
//! sign into `-`, so `(IX+d)` with `d = -2` renders as `(IX-02)`.

use std::fmt;

use crate::decoder::{Argument, DecodedInstruction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// The starting address of this instruction.
    pub addr_start: u16,
    /// Length in bytes, prefixes included.
    pub len_bytes: usize,
    /// Rendered assembly text.
    pub text: String,
}

impl DisassemblyRow {
    /// Renders one decoded instruction at `addr_start`.
    #[must_use]
    pub fn new(addr_start: u16, instruction: &DecodedInstruction) -> Self {
        Self {
            addr_start,
            len_bytes: instruction.byte_length,
            text: instruction.render(),
        }
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}", self.addr_start, self.text)
    }
}

fn is_placeholder(token: &str) -> bool {
    matches!(token, "n" | "nn" | "d" | "e" | "a")
}

fn push_argument(out: &mut String, argument: Argument) {
    match argument {
        Argument::Byte(v) => out.push_str(&format!("{v:02x}")),
        Argument::Word(v) => out.push_str(&format!("{v:04x}")),
        Argument::Displacement(d) => {
            if d < 0 && out.ends_with('+') {
                out.pop();
                out.push('-');
            }
            out.push_str(&format!("{:02x}", d.unsigned_abs()));
        }
    }
}

impl DecodedInstruction {
    /// Renders the template with its arguments and notes.
    #[must_use]
    pub fn render(&self) -> String {
        let template = self.template.as_str();
        let mut out = String::with_capacity(template.len() + 8);
        let mut arguments = self.arguments.iter().copied();
        let mut rest = template;

        while let Some(start) = rest.find(|c: char| c.is_ascii_alphanumeric()) {
            out.push_str(&rest[..start]);
            rest = &rest[start..];
            let end = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            let token = &rest[..end];
            let argument = if is_placeholder(token) {
                arguments.next()
            } else {
                None
            };
            match argument {
                Some(argument) => push_argument(&mut out, argument),
                None => out.push_str(token),
            }
            rest = &rest[end..];
        }
        out.push_str(rest);

        if !self.notes.is_empty() {
            let notes: Vec<String> = self
                .notes
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            out.push_str(" ; ");
            out.push_str(&notes.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::DisassemblyRow;
    use crate::decoder::{Argument, DecodedInstruction};
    use crate::value::SymbolicValue;

    #[test]
    fn render_word_argument() {
        let instruction =
            DecodedInstruction::new("LD HL, nn").with_arg(Argument::Word(0x1234));
        assert_eq!(instruction.render(), "LD HL, 1234");
    }

    #[test]
    fn render_positive_and_negative_displacements() {
        let positive = DecodedInstruction::new("LD (IX+d), n")
            .with_arg(Argument::Displacement(5))
            .with_arg(Argument::Byte(0x0a));
        assert_eq!(positive.render(), "LD (IX+05), 0a");

        let negative =
            DecodedInstruction::new("INC (IY+d)").with_arg(Argument::Displacement(-128));
        assert_eq!(negative.render(), "INC (IY-80)");
    }

    #[test]
    fn register_names_are_not_placeholders() {
        let instruction = DecodedInstruction::new("EX AF, AF'");
        assert_eq!(instruction.render(), "EX AF, AF'");
        let restart = DecodedInstruction::new("RST 38h");
        assert_eq!(restart.render(), "RST 38h");
    }

    #[test]
    fn notes_follow_semicolon() {
        let instruction = DecodedInstruction::new("JP (HL)")
            .with_note("HL", SymbolicValue::unknown_from(0x8000, 0x5e27));
        assert_eq!(instruction.render(), "JP (HL) ; HL=?(8000)@5e27");
    }

    #[test]
    fn row_prefixes_address() {
        let mut instruction = DecodedInstruction::new("NOP");
        instruction.byte_length = 1;
        let row = DisassemblyRow::new(0x5e27, &instruction);
        assert_eq!(row.to_string(), "5e27: NOP");
        assert_eq!(row.len_bytes, 1);
    }
}
