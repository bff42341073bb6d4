use std::collections::HashMap;

use super::registers::{Register16, Register8, NARROW_CELL_COUNT, WIDE_CELL_COUNT};
use crate::fault::DecodeFault;
use crate::value::SymbolicValue;

/// Symbolic register file plus sparse memory map.
///
/// `BC`, `DE` and `AF` are composed from their byte halves, so a read is
/// unknown when either half is. `HL`, `SP`, `IX` and `IY` are single 16-bit
/// cells; `H` and `L` are byte views over the fused `HL` cell. Memory holds
/// byte cells only; an absent address reads as unknown with that address as
/// its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    narrow: [SymbolicValue; NARROW_CELL_COUNT],
    wide: [SymbolicValue; WIDE_CELL_COUNT],
    memory: HashMap<u16, SymbolicValue>,
}

impl MachineState {
    /// Creates a state with every register unknown as of `origin` and empty memory.
    #[must_use]
    pub fn new(origin: u16) -> Self {
        Self {
            narrow: [SymbolicValue::unknown(origin); NARROW_CELL_COUNT],
            wide: [SymbolicValue::unknown(origin); WIDE_CELL_COUNT],
            memory: HashMap::new(),
        }
    }

    /// Seeds memory with concrete image bytes starting at `base`.
    pub fn load_image(&mut self, base: u16, bytes: &[u8]) {
        let mut address = base;
        for byte in bytes {
            self.memory.insert(address, SymbolicValue::from(*byte));
            address = address.wrapping_add(1);
        }
    }

    /// Reads an 8-bit register.
    #[must_use]
    pub fn register8(&self, register: Register8) -> SymbolicValue {
        match register {
            Register8::H => self.wide_cell(Register16::HL).high_byte(),
            Register8::L => self.wide_cell(Register16::HL).low_byte(),
            other => other
                .narrow_index()
                .map_or(SymbolicValue::unknown(0), |i| self.narrow[i]),
        }
    }

    /// Writes an 8-bit register; the value is truncated to a byte.
    pub fn set_register8(&mut self, register: Register8, value: SymbolicValue) {
        let value = value.low_byte();
        match register {
            Register8::H => {
                let hl = self.wide_cell(Register16::HL);
                self.set_wide_cell(
                    Register16::HL,
                    value.combine(hl, |h, hl| (h << 8) | (hl & 0xFF)),
                );
            }
            Register8::L => {
                let hl = self.wide_cell(Register16::HL);
                self.set_wide_cell(Register16::HL, hl.combine(value, |hl, l| (hl & 0xFF00) | l));
            }
            other => {
                if let Some(i) = other.narrow_index() {
                    self.narrow[i] = value;
                }
            }
        }
    }

    /// Marks an 8-bit register as unknown as of `origin`.
    pub fn clear_register8(&mut self, register: Register8, origin: u16) {
        self.set_register8(register, SymbolicValue::unknown(origin));
    }

    /// Requires an 8-bit register to be concrete.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::UnresolvedOperand`] when the register is unknown.
    pub fn assert_register8(&self, register: Register8, origin: u16) -> Result<i64, DecodeFault> {
        self.register8(register).assert_known(register.name(), origin)
    }

    /// Reads a 16-bit register.
    #[must_use]
    pub fn register16(&self, register: Register16) -> SymbolicValue {
        match register.halves() {
            Some((high, low)) => SymbolicValue::join(self.register8(high), self.register8(low)),
            None => self.wide_cell(register),
        }
    }

    /// Writes a 16-bit register; the value is truncated to 16 bits.
    pub fn set_register16(&mut self, register: Register16, value: SymbolicValue) {
        let value = value.map(|v| v & 0xFFFF);
        match register.halves() {
            Some((high, low)) => {
                self.set_register8(high, value.high_byte());
                self.set_register8(low, value.low_byte());
            }
            None => self.set_wide_cell(register, value),
        }
    }

    /// Marks a 16-bit register as unknown as of `origin`.
    pub fn clear_register16(&mut self, register: Register16, origin: u16) {
        self.set_register16(register, SymbolicValue::unknown(origin));
    }

    /// Requires a 16-bit register to be concrete.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::UnresolvedOperand`] when the register is unknown.
    pub fn assert_register16(
        &self,
        register: Register16,
        origin: u16,
    ) -> Result<i64, DecodeFault> {
        self.register16(register).assert_known(register.name(), origin)
    }

    fn wide_cell(&self, register: Register16) -> SymbolicValue {
        register
            .wide_index()
            .map_or(SymbolicValue::unknown(0), |i| self.wide[i])
    }

    fn set_wide_cell(&mut self, register: Register16, value: SymbolicValue) {
        if let Some(i) = register.wide_index() {
            self.wide[i] = value;
        }
    }

    /// Reads one memory byte; absent cells are unknown, sourced from `address`.
    #[must_use]
    pub fn memory8(&self, address: u16, origin: u16) -> SymbolicValue {
        self.memory
            .get(&address)
            .copied()
            .unwrap_or(SymbolicValue::unknown_from(address, origin))
    }

    /// Reads a little-endian 16-bit value from two memory bytes.
    ///
    /// When neither byte is known the result carries the provenance of the
    /// low byte, so an absent word reads as sourced from `address`.
    #[must_use]
    pub fn memory16(&self, address: u16, origin: u16) -> SymbolicValue {
        let low = self.memory8(address, origin);
        let high = self.memory8(address.wrapping_add(1), origin);
        if !low.is_known() && !high.is_known() {
            return low;
        }
        SymbolicValue::join(high, low)
    }

    /// Writes one memory byte.
    pub fn set_memory8(&mut self, address: u16, value: SymbolicValue) {
        self.memory.insert(address, value.low_byte());
    }

    /// Writes a little-endian 16-bit value as two memory bytes.
    pub fn set_memory16(&mut self, address: u16, value: SymbolicValue) {
        self.set_memory8(address, value.low_byte());
        self.set_memory8(address.wrapping_add(1), value.high_byte());
    }

    /// Requires a memory byte to be concrete.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::UnresolvedOperand`] when the cell is unknown.
    pub fn assert_memory8(&self, address: u16, origin: u16) -> Result<i64, DecodeFault> {
        self.memory8(address, origin)
            .assert_known(&format!("({address:04x})"), origin)
    }

    /// Reads a byte through a symbolic address; an unknown address yields an
    /// unknown value.
    #[must_use]
    pub fn memory8_at(&self, address: SymbolicValue, origin: u16) -> SymbolicValue {
        address
            .address()
            .map_or(SymbolicValue::unknown(origin), |a| self.memory8(a, origin))
    }

    /// Writes a byte through a symbolic address. Returns `false` and leaves
    /// memory untouched when the address is unknown.
    pub fn store8_at(&mut self, address: SymbolicValue, value: SymbolicValue) -> bool {
        match address.address() {
            Some(a) => {
                self.set_memory8(a, value);
                true
            }
            None => false,
        }
    }
}
