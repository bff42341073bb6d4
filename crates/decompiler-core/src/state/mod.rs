//! Symbolic machine state tracked while decoding.

/// Symbolic register file and sparse memory map.
pub mod machine;
/// Register identifiers and storage layout.
pub mod registers;
mod run_state;

pub use machine::MachineState;
pub use registers::{Register16, Register8};
pub use run_state::RunState;
