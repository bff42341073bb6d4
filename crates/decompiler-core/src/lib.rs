//! Static Z80 machine-code decompiler core.
//!
//! Decodes a contiguous code image into an assembly listing, following
//! control flow from an entry point and tracking register and memory
//! contents symbolically so computed jump targets and block copies can be
//! resolved where the image makes them concrete.

/// Bounds-checked sequential reader over the image.
pub mod cursor;
pub use cursor::{ByteCursor, INSPECT_WINDOW_BYTES};

/// Opcode bit fields and the register/operation tables they index.
pub mod encoding;
pub use encoding::{AluOp, BitOp, OpcodeBits, Operand8, RotateOp};

/// Concrete-or-unknown values.
pub mod value;
pub use value::SymbolicValue;

/// Symbolic register file and memory.
pub mod state;
pub use state::{MachineState, Register16, Register8, RunState};

/// Instruction decode tree.
pub mod decoder;
pub use decoder::{decode_instruction, Argument, DecodedInstruction, InstructionHandler};

/// Per-run decode state and work queue.
pub mod context;
pub use context::{DecodeContext, Discoveries, TargetKind, ADDRESS_SPACE_BYTES};

/// Multi-pass driver.
pub mod driver;
pub use driver::{Decompiler, PassOutcome};

/// Listing rows and template rendering.
pub mod disasm;
pub use disasm::DisassemblyRow;

/// Run configuration.
pub mod config;
pub use config::DecompilerConfig;

/// Fault taxonomy and the driver error surface.
pub mod fault;
pub use fault::{hex_dump, DecodeError, DecodeFault, FaultClass};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
