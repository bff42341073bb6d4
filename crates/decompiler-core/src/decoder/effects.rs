//! Symbolic effects of fixed-form instructions.

use log::trace;

use crate::context::DecodeContext;
use crate::encoding::RotateOp;
use crate::state::{Register16, Register8};
use crate::value::SymbolicValue;

/// Block transfers with `BC == 0` run for a full 64K bytes.
const FULL_BLOCK: i64 = 0x1_0000;

pub(super) fn clobber_flags(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    ctx.state_mut().clear_register8(Register8::F, origin);
}

fn rotate_accumulator(ctx: &mut DecodeContext<'_>, op: RotateOp) {
    let origin = ctx.origin();
    let a = ctx.state().register8(Register8::A);
    ctx.state_mut()
        .set_register8(Register8::A, a.and_then(origin, |v| op.apply(v)));
    clobber_flags(ctx);
}

fn clobber_accumulator(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    ctx.state_mut().clear_register8(Register8::A, origin);
    clobber_flags(ctx);
}

pub(super) fn rlca(ctx: &mut DecodeContext<'_>) {
    rotate_accumulator(ctx, RotateOp::Rlc);
}

pub(super) fn rrca(ctx: &mut DecodeContext<'_>) {
    rotate_accumulator(ctx, RotateOp::Rrc);
}

/// `RLA`, `RRA` and `DAA` depend on flags.
pub(super) fn carry_rotate(ctx: &mut DecodeContext<'_>) {
    clobber_accumulator(ctx);
}

pub(super) fn cpl(ctx: &mut DecodeContext<'_>) {
    let a = ctx.state().register8(Register8::A);
    ctx.state_mut()
        .set_register8(Register8::A, a.map(|v| !v & 0xFF));
}

pub(super) fn neg(ctx: &mut DecodeContext<'_>) {
    let a = ctx.state().register8(Register8::A);
    ctx.state_mut()
        .set_register8(Register8::A, a.map(|v| (-v) & 0xFF));
    clobber_flags(ctx);
}

pub(super) fn exchange_af(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    ctx.state_mut().clear_register16(Register16::AF, origin);
}

pub(super) fn exchange_all(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    let state = ctx.state_mut();
    for pair in [Register16::BC, Register16::DE, Register16::HL] {
        state.clear_register16(pair, origin);
    }
}

pub(super) fn exchange_de_hl(ctx: &mut DecodeContext<'_>) {
    let state = ctx.state_mut();
    let de = state.register16(Register16::DE);
    let hl = state.register16(Register16::HL);
    state.set_register16(Register16::DE, hl);
    state.set_register16(Register16::HL, de);
}

pub(super) fn end_fallthrough(ctx: &mut DecodeContext<'_>) {
    ctx.end_fallthrough();
}

/// `RLD` and `RRD` shuffle nibbles between `A` and `(HL)`.
pub(super) fn rotate_digit(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    if let Some(address) = ctx.state().register16(Register16::HL).address() {
        ctx.add_memory_location(address);
        ctx.state_mut()
            .set_memory8(address, SymbolicValue::unknown(origin));
    }
    clobber_accumulator(ctx);
}

pub(super) fn ldi(ctx: &mut DecodeContext<'_>) {
    block_transfer(ctx, 1, false);
}

pub(super) fn ldd(ctx: &mut DecodeContext<'_>) {
    block_transfer(ctx, -1, false);
}

pub(super) fn ldir(ctx: &mut DecodeContext<'_>) {
    block_transfer(ctx, 1, true);
}

pub(super) fn lddr(ctx: &mut DecodeContext<'_>) {
    block_transfer(ctx, -1, true);
}

/// Copies `(HL)` to `(DE)` stepping both pointers, once or `BC` times.
///
/// An unknown count leaves both pointers unknown. A known count advances
/// whichever pointers are known and copies bytes only when both are.
fn block_transfer(ctx: &mut DecodeContext<'_>, step: i64, repeat: bool) {
    let origin = ctx.origin();
    let bc = ctx.state().register16(Register16::BC);
    let count = if repeat {
        bc.map(|v| if v == 0 { FULL_BLOCK } else { v })
    } else {
        SymbolicValue::Known(1)
    };

    let Some(count) = count.known() else {
        let state = ctx.state_mut();
        state.clear_register16(Register16::HL, origin);
        state.clear_register16(Register16::DE, origin);
        clobber_flags(ctx);
        return;
    };

    let hl = ctx.state().register16(Register16::HL);
    let de = ctx.state().register16(Register16::DE);
    if let (Some(source), Some(destination)) = (hl.address(), de.address()) {
        ctx.add_memory_location(source);
        ctx.add_memory_location(destination);
        let mut from = source;
        let mut to = destination;
        for _ in 0..count {
            let byte = ctx.state().memory8(from, origin);
            ctx.state_mut().set_memory8(to, byte);
            from = step_address(from, step);
            to = step_address(to, step);
        }
        trace!("block copy of {count} byte(s) {source:04x} -> {destination:04x}");
    }

    let distance = count * step;
    let state = ctx.state_mut();
    state.set_register16(Register16::HL, hl.offset16(distance));
    state.set_register16(Register16::DE, de.offset16(distance));
    let remaining = if repeat {
        SymbolicValue::Known(0)
    } else {
        bc.offset16(-1)
    };
    state.set_register16(Register16::BC, remaining);
    clobber_flags(ctx);
}

const fn step_address(address: u16, step: i64) -> u16 {
    if step < 0 {
        address.wrapping_sub(1)
    } else {
        address.wrapping_add(1)
    }
}

/// `CPI`/`CPD`: one compare, pointer moves, count drops.
fn compare_step(ctx: &mut DecodeContext<'_>, step: i64) {
    let state = ctx.state_mut();
    let hl = state.register16(Register16::HL);
    let bc = state.register16(Register16::BC);
    state.set_register16(Register16::HL, hl.offset16(step));
    state.set_register16(Register16::BC, bc.offset16(-1));
    clobber_flags(ctx);
}

pub(super) fn cpi(ctx: &mut DecodeContext<'_>) {
    compare_step(ctx, 1);
}

pub(super) fn cpd(ctx: &mut DecodeContext<'_>) {
    compare_step(ctx, -1);
}

/// `CPIR`/`CPDR` stop at a data-dependent point.
pub(super) fn compare_repeat(ctx: &mut DecodeContext<'_>) {
    let origin = ctx.origin();
    let state = ctx.state_mut();
    state.clear_register16(Register16::HL, origin);
    state.clear_register16(Register16::BC, origin);
    clobber_flags(ctx);
}
