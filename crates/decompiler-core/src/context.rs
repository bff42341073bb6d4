//! Per-run decode bookkeeping: cursor, symbolic state, discovered targets and
//! the fallthrough/work-queue logic that decides what to decode next.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, trace};

use crate::cursor::ByteCursor;
use crate::decoder::decode_instruction;
use crate::disasm::DisassemblyRow;
use crate::fault::DecodeFault;
use crate::state::{MachineState, RunState};

/// Number of distinct Z80 addresses. Buffer offsets at or past this have no
/// address of their own.
pub const ADDRESS_SPACE_BYTES: usize = 0x1_0000;

/// How a discovered address is expected to be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TargetKind {
    /// Reached by a jump.
    Jump,
    /// Reached by a call or restart; a subroutine entry.
    Function,
}

/// Addresses discovered during a pass, handed back to the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Discoveries {
    /// Call and restart targets.
    pub functions: BTreeSet<u16>,
    /// Jump targets that were never called.
    pub jumps: BTreeSet<u16>,
    /// Memory referenced by loads and stores.
    pub memory_locations: BTreeSet<u16>,
}

impl Discoveries {
    /// Returns `true` when nothing was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.jumps.is_empty() && self.memory_locations.is_empty()
    }
}

/// What the instruction just decoded implies about the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Jump(u16),
    Stop,
}

/// Mutable state for decoding one contiguous buffer.
///
/// Entry points and memory locations only ever grow across passes.
#[derive(Debug, Clone)]
pub struct DecodeContext<'a> {
    cursor: ByteCursor<'a>,
    state: MachineState,
    load_point: u16,
    entry_point: u16,
    origin: u16,
    targets: BTreeMap<u16, TargetKind>,
    memory_locations: BTreeSet<u16>,
    pending: VecDeque<usize>,
    visited: BTreeSet<usize>,
    listing: BTreeMap<u16, DisassemblyRow>,
    run_state: RunState,
    last_byte_length: usize,
    flow: Flow,
}

impl<'a> DecodeContext<'a> {
    /// Creates a context whose buffer offset 0 maps to `load_point`.
    ///
    /// Memory is seeded with the buffer contents.
    #[must_use]
    pub fn new(buffer: &'a [u8], load_point: u16) -> Self {
        let mut state = MachineState::new(load_point);
        state.load_image(load_point, buffer);
        Self {
            cursor: ByteCursor::new(buffer),
            state,
            load_point,
            entry_point: load_point,
            origin: load_point,
            targets: BTreeMap::new(),
            memory_locations: BTreeSet::new(),
            pending: VecDeque::new(),
            visited: BTreeSet::new(),
            listing: BTreeMap::new(),
            run_state: RunState::Running,
            last_byte_length: 0,
            flow: Flow::Continue,
        }
    }

    /// Entry point whose fallthrough is currently being decoded.
    #[must_use]
    pub const fn entry_point(&self) -> u16 {
        self.entry_point
    }

    /// Address of the instruction currently being decoded.
    #[must_use]
    pub const fn origin(&self) -> u16 {
        self.origin
    }

    /// Read-only cursor access.
    #[must_use]
    pub const fn cursor(&self) -> &ByteCursor<'a> {
        &self.cursor
    }

    /// Cursor access for handlers consuming operand bytes.
    pub const fn cursor_mut(&mut self) -> &mut ByteCursor<'a> {
        &mut self.cursor
    }

    /// Symbolic machine state.
    #[must_use]
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// Mutable symbolic machine state.
    pub const fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    /// Current lifecycle state of the pass.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Returns `true` once no reachable instruction remains in this pass.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.run_state == RunState::Finished
    }

    /// Bytes consumed by the most recently decoded instruction.
    #[must_use]
    pub const fn last_byte_length(&self) -> usize {
        self.last_byte_length
    }

    /// Absolute address of a buffer offset, wrapping at the top of memory.
    ///
    /// Offsets past the address space are truncated; [`Self::decode`]
    /// refuses to decode at such offsets.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn address_of(&self, offset: usize) -> u16 {
        self.load_point.wrapping_add(offset as u16)
    }

    /// Absolute address of a buffer offset that must have one.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] for offsets past the 64K
    /// address space.
    pub fn checked_address_of(&self, offset: usize) -> Result<u16, DecodeFault> {
        u16::try_from(offset)
            .map(|offset| self.load_point.wrapping_add(offset))
            .map_err(|_| DecodeFault::OutOfBounds {
                offset,
                requested: 1,
                len: ADDRESS_SPACE_BYTES,
            })
    }

    /// Buffer offset of an absolute address, when it lies inside the buffer.
    #[must_use]
    pub fn offset_of(&self, address: u16) -> Option<usize> {
        let offset = usize::from(address.wrapping_sub(self.load_point));
        (offset < self.cursor.len()).then_some(offset)
    }

    /// Address just past the bytes consumed so far.
    #[must_use]
    pub const fn next_address(&self) -> u16 {
        self.address_of(self.cursor.offset())
    }

    /// Records a control-flow target. Targets inside the buffer that have
    /// not been decoded yet are queued for this pass.
    pub fn add_target(&mut self, address: u16, kind: TargetKind) {
        self.targets
            .entry(address)
            .and_modify(|existing| *existing = (*existing).max(kind))
            .or_insert(kind);
        if let Some(offset) = self.offset_of(address) {
            if !self.visited.contains(&offset) && !self.pending.contains(&offset) {
                self.pending.push_back(offset);
            }
        }
    }

    /// Records a referenced memory location.
    pub fn add_memory_location(&mut self, address: u16) {
        self.memory_locations.insert(address);
    }

    /// The current instruction has no statically known successor.
    pub const fn end_fallthrough(&mut self) {
        self.flow = Flow::Stop;
    }

    /// The current instruction transfers control directly to `address`.
    pub const fn continue_at(&mut self, address: u16) {
        self.flow = Flow::Jump(address);
    }

    /// Every control-flow target seen so far.
    #[must_use]
    pub const fn targets(&self) -> &BTreeMap<u16, TargetKind> {
        &self.targets
    }

    /// Every memory location referenced so far.
    #[must_use]
    pub const fn memory_locations(&self) -> &BTreeSet<u16> {
        &self.memory_locations
    }

    /// Number of distinct instruction starts decoded.
    #[must_use]
    pub fn decoded_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns `true` if an instruction was decoded at `address`.
    #[must_use]
    pub fn was_decoded(&self, address: u16) -> bool {
        self.offset_of(address)
            .is_some_and(|offset| self.visited.contains(&offset))
    }

    /// Everything discovered so far, split by kind.
    #[must_use]
    pub fn discoveries(&self) -> Discoveries {
        let mut discoveries = Discoveries {
            memory_locations: self.memory_locations.clone(),
            ..Discoveries::default()
        };
        for (address, kind) in &self.targets {
            match kind {
                TargetKind::Function => discoveries.functions.insert(*address),
                TargetKind::Jump => discoveries.jumps.insert(*address),
            };
        }
        discoveries
    }

    /// Targets that fall outside this buffer and so cannot be decoded here.
    #[must_use]
    pub fn out_of_range_discoveries(&self) -> Discoveries {
        let mut discoveries = self.discoveries();
        discoveries
            .functions
            .retain(|address| self.offset_of(*address).is_none());
        discoveries
            .jumps
            .retain(|address| self.offset_of(*address).is_none());
        discoveries
    }

    /// Decoded rows ordered by address.
    pub fn rows(&self) -> impl Iterator<Item = &DisassemblyRow> + '_ {
        self.listing.values()
    }

    /// Rendered listing lines ordered by address.
    #[must_use]
    pub fn dump(&self) -> Vec<String> {
        self.rows().map(ToString::to_string).collect()
    }

    /// Re-arms the context for a new pass.
    ///
    /// A pass that stopped at the step limit continues at the cursor. After
    /// a finished or failed pass decoding resumes at the next queued target.
    pub fn begin_pass(&mut self) {
        let offset = self.cursor.offset();
        let resume_here = self.run_state == RunState::Running
            && offset < self.cursor.len()
            && !self.visited.contains(&offset);
        self.run_state = RunState::Running;
        if !resume_here {
            self.resume_from_pending();
        }
        debug!(
            "pass starts at {:04x} with {} queued target(s)",
            self.entry_point,
            self.pending.len()
        );
    }

    /// Decodes one instruction and decides where the next one starts.
    ///
    /// # Errors
    ///
    /// Returns the step fault when the bytes at the cursor cannot be decoded.
    /// The cursor is restored to the start of the failing instruction and the
    /// pass is marked failed.
    pub fn decode(&mut self) -> Result<(), DecodeFault> {
        if self.run_state.is_terminal() {
            return Ok(());
        }

        let start = self.cursor.offset();
        self.flow = Flow::Continue;

        let outcome = self.checked_address_of(start).and_then(|origin| {
            self.origin = origin;
            decode_instruction(self)?.ok_or(DecodeFault::UnrecognizedOpcode { offset: start })
        });
        let instruction = match outcome {
            Ok(instruction) => instruction,
            Err(fault) => {
                self.cursor.seek(start)?;
                self.run_state = RunState::Failed(fault.class());
                return Err(fault);
            }
        };

        self.last_byte_length = instruction.byte_length;
        self.visited.insert(start);
        let row = DisassemblyRow::new(self.origin, &instruction);
        trace!("{row}");
        self.listing.insert(self.origin, row);

        let next = match self.flow {
            Flow::Continue => Some(self.cursor.offset()),
            Flow::Jump(address) => self.offset_of(address),
            Flow::Stop => None,
        };
        match next.filter(|offset| !self.visited.contains(offset)) {
            Some(offset) => self.cursor.seek(offset)?,
            None => self.resume_from_pending(),
        }
        Ok(())
    }

    fn resume_from_pending(&mut self) {
        while let Some(offset) = self.pending.pop_front() {
            if self.visited.contains(&offset) || self.cursor.seek(offset).is_err() {
                continue;
            }
            self.entry_point = self.address_of(offset);
            debug!("resuming at entry point {:04x}", self.entry_point);
            return;
        }
        debug!(
            "no queued targets remain after {} instruction(s); pass saturated",
            self.visited.len()
        );
        self.run_state = RunState::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeContext, TargetKind};
    use crate::fault::{DecodeFault, FaultClass};
    use crate::state::{Register16, RunState};
    use crate::value::SymbolicValue;

    fn run(ctx: &mut DecodeContext<'_>, limit: usize) -> Result<usize, DecodeFault> {
        ctx.begin_pass();
        for step in 0..limit {
            if ctx.is_finished() {
                return Ok(step);
            }
            ctx.decode()?;
        }
        Ok(limit)
    }

    #[test]
    fn offsets_and_addresses_map_through_load_point() {
        let bytes = [0u8; 4];
        let ctx = DecodeContext::new(&bytes, 0x5e27);
        assert_eq!(ctx.address_of(3), 0x5e2a);
        assert_eq!(ctx.offset_of(0x5e29), Some(2));
        assert_eq!(ctx.offset_of(0x5e2b), None);
        assert_eq!(ctx.offset_of(0x5e26), None);
    }

    #[test]
    fn memory_is_seeded_from_buffer() {
        let bytes = [0xaa, 0xbb];
        let ctx = DecodeContext::new(&bytes, 0x8000);
        assert_eq!(ctx.state().memory8(0x8001, 0), SymbolicValue::Known(0xbb));
    }

    #[test]
    fn self_loop_saturates_pass() {
        // NOP; JR -2 (to itself)
        let bytes = [0x00, 0x18, 0xfe];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        let steps = run(&mut ctx, 100).expect("decodes");
        assert!(ctx.is_finished());
        assert_eq!(steps, 2);
        assert_eq!(ctx.dump(), ["6000: NOP", "6001: JR 6001"]);
    }

    #[test]
    fn ret_followed_by_back_edge_finishes_without_error() {
        // NOP; JR +1; RET; JR -3 (back to RET)
        let bytes = [0x00, 0x18, 0x01, 0xc9, 0x18, 0xfd];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        run(&mut ctx, 100).expect("decodes");
        assert!(ctx.is_finished());
        assert_eq!(ctx.run_state(), RunState::Finished);
        assert!(ctx.was_decoded(0x6003));
        assert!(ctx.was_decoded(0x6004));
    }

    #[test]
    fn call_targets_in_range_are_decoded_in_the_same_pass() {
        // CALL 6004; RET; NOP(pad); LD HL,1234; RET
        let bytes = [0xcd, 0x04, 0x60, 0xc9, 0x21, 0x34, 0x12, 0xc9];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        run(&mut ctx, 100).expect("decodes");
        assert!(ctx.is_finished());
        assert!(ctx.was_decoded(0x6004));
        assert_eq!(ctx.targets().get(&0x6004), Some(&TargetKind::Function));
        assert_eq!(
            ctx.state().register16(Register16::HL),
            SymbolicValue::Known(0x1234)
        );
    }

    #[test]
    fn out_of_range_targets_are_reported_back() {
        // CALL 0010; JP 0038
        let bytes = [0xcd, 0x10, 0x00, 0xc3, 0x38, 0x00];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        run(&mut ctx, 100).expect("decodes");
        let found = ctx.out_of_range_discoveries();
        assert!(found.functions.contains(&0x0010));
        assert!(found.jumps.contains(&0x0038));
    }

    #[test]
    fn offsets_past_the_address_space_are_refused() {
        let bytes = vec![0u8; super::ADDRESS_SPACE_BYTES + 2];
        let mut ctx = DecodeContext::new(&bytes, 0x0000);
        ctx.cursor_mut()
            .seek(super::ADDRESS_SPACE_BYTES)
            .expect("inside buffer");
        let error = ctx.decode().expect_err("must refuse");
        assert_eq!(
            error,
            DecodeFault::OutOfBounds {
                offset: 0x1_0000,
                requested: 1,
                len: 0x1_0000
            }
        );
        assert_eq!(ctx.cursor().offset(), 0x1_0000);
        assert_eq!(ctx.run_state(), RunState::Failed(FaultClass::Bounds));
        assert!(!ctx.was_decoded(0x0000));
        assert_eq!(ctx.checked_address_of(0xffff), Ok(0xffff));
    }

    #[test]
    fn failure_restores_cursor_to_instruction_start() {
        // NOP; CB 30 (reserved rotate slot)
        let bytes = [0x00, 0xcb, 0x30];
        let mut ctx = DecodeContext::new(&bytes, 0x6000);
        let error = run(&mut ctx, 100).expect_err("must fail");
        assert_eq!(error, DecodeFault::UnrecognizedOpcode { offset: 1 });
        assert_eq!(ctx.cursor().offset(), 1);
        assert!(matches!(ctx.run_state(), RunState::Failed(_)));
    }

    #[test]
    fn function_kind_wins_over_jump() {
        let bytes = [0u8; 1];
        let mut ctx = DecodeContext::new(&bytes, 0);
        ctx.add_target(0x4000, TargetKind::Jump);
        ctx.add_target(0x4000, TargetKind::Function);
        ctx.add_target(0x4000, TargetKind::Jump);
        assert_eq!(ctx.targets().get(&0x4000), Some(&TargetKind::Function));
    }
}
