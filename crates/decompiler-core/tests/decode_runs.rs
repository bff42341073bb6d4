//! Whole-run decoding scenarios through the public driver API.

#![allow(clippy::pedantic, clippy::nursery)]

use std::collections::BTreeSet;

use decompiler_core::{
    DecodeFault, Decompiler, DecompilerConfig, FaultClass, PassOutcome, Register16, Register8,
    SymbolicValue, TargetKind,
};
use log as _;
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const LOAD_POINT: u16 = 0x5e27;

fn run(image: &[u8]) -> (Decompiler<'_>, Result<PassOutcome, decompiler_core::DecodeError>) {
    let mut decompiler =
        Decompiler::new(image, LOAD_POINT, 0, DecompilerConfig::default()).expect("setup");
    let mut entries = BTreeSet::new();
    let mut memory = BTreeSet::new();
    let outcome = decompiler.decode_to_fixpoint(&mut entries, &mut memory);
    (decompiler, outcome)
}

#[test]
fn loader_with_call_table_decodes_every_reachable_routine() {
    let image = [
        0x31, 0x00, 0xff, // 5e27 LD SP, ff00
        0xcd, 0x30, 0x5e, // 5e2a CALL 5e30
        0xc3, 0x35, 0x5e, // 5e2d JP 5e35
        0x21, 0x00, 0x40, // 5e30 LD HL, 4000
        0xc9, // 5e33 RET
        0x00, // 5e34 (data, never decoded)
        0x3e, 0x01, // 5e35 LD A, 01
        0x18, 0xfe, // 5e37 JR 5e37
    ];
    let (decompiler, outcome) = run(&image);
    assert!(outcome.expect("decodes").is_finished());
    assert_eq!(
        decompiler.listing(),
        [
            "5e27: LD SP, ff00",
            "5e2a: CALL 5e30",
            "5e2d: JP 5e35",
            "5e30: LD HL, 4000",
            "5e33: RET",
            "5e35: LD A, 01",
            "5e37: JR 5e37",
        ]
    );
    assert!(!decompiler.context().was_decoded(0x5e34));
    assert_eq!(
        decompiler.context().targets().get(&0x5e30),
        Some(&TargetKind::Function)
    );
}

#[test]
fn block_copy_routine_renders_full_listing() {
    let image = [
        0x21, 0x39, 0x5e, // 5e27 LD HL, 5e39
        0x11, 0x00, 0x90, // 5e2a LD DE, 9000
        0x01, 0x03, 0x00, // 5e2d LD BC, 0003
        0xed, 0xb0, // 5e30 LDIR
        0x3a, 0x01, 0x90, // 5e32 LD A, (9001)
        0xfd, 0xbe, 0x00, // 5e35 CP (IY+00)
        0xc9, // 5e38 RET
        0x01, 0x02, 0x03, // 5e39 copied block
    ];
    let (decompiler, outcome) = run(&image);
    assert!(outcome.expect("decodes").is_finished());
    assert_eq!(
        decompiler.listing(),
        [
            "5e27: LD HL, 5e39",
            "5e2a: LD DE, 9000",
            "5e2d: LD BC, 0003",
            "5e30: LDIR",
            "5e32: LD A, (9001)",
            "5e35: CP (IY+00) ; IY=?@5e27",
            "5e38: RET",
        ]
    );

    let state = decompiler.context().state();
    assert_eq!(state.register16(Register16::HL), SymbolicValue::Known(0x5e3c));
    assert_eq!(state.register16(Register16::DE), SymbolicValue::Known(0x9003));
    assert_eq!(state.register16(Register16::BC), SymbolicValue::Known(0));
    assert_eq!(state.register8(Register8::A), SymbolicValue::Known(2));
    for (offset, expected) in (0..).zip([1, 2, 3]) {
        assert_eq!(state.memory8(0x9000 + offset, 0), SymbolicValue::Known(expected));
        assert_eq!(state.memory8(0x5e39 + offset, 0), SymbolicValue::Known(expected));
    }
    assert!(!decompiler.context().was_decoded(0x5e39));
}

#[test]
fn computed_jump_through_pointer_table_resolves() {
    // LD HL,(5e2b); JP (HL); dw 5e2e; NOP; RET
    let image = [0x2a, 0x2b, 0x5e, 0xe9, 0x2e, 0x5e, 0x00, 0xc9];
    let (decompiler, outcome) = run(&image);
    assert!(outcome.expect("decodes").is_finished());
    assert_eq!(
        decompiler.context().state().register16(Register16::HL),
        SymbolicValue::Known(0x5e2e)
    );
    assert!(decompiler.context().was_decoded(0x5e2e));
    assert!(decompiler.listing().contains(&"5e2a: JP (HL) ; HL=5e2e".to_string()));
}

#[test]
fn ret_then_back_edge_finishes_cleanly() {
    // JR +1; RET; JR -3
    let image = [0x18, 0x01, 0xc9, 0x18, 0xfd];
    let (decompiler, outcome) = run(&image);
    assert!(outcome.is_ok());
    assert!(decompiler.is_finished());
}

#[test]
fn unrecognised_opcode_reports_offset_of_instruction_start() {
    // NOP; NOP; ED 00
    let image = [0x00, 0x00, 0xed, 0x00];
    let (decompiler, outcome) = run(&image);
    let error = outcome.expect_err("must fail");
    assert_eq!(error.offset, 2);
    assert_eq!(error.address, LOAD_POINT + 2);
    assert_eq!(error.class(), FaultClass::Decode);
    assert_eq!(error.fault, DecodeFault::UnrecognizedOpcode { offset: 2 });
    assert_eq!(decompiler.context().cursor().offset(), 2);
    assert_eq!(decompiler.listing().len(), 2);
    assert!(error.to_string().contains("ed 00"));
}

#[test]
fn running_off_the_end_is_out_of_bounds() {
    let image = [0x00, 0x21, 0x34];
    let (_, outcome) = run(&image);
    let error = outcome.expect_err("must fail");
    assert_eq!(error.class(), FaultClass::Bounds);
    assert_eq!(error.offset, 1);
}

#[rstest]
#[case(&[0xc9], 1)]
#[case(&[0x00, 0x00, 0xc9], 3)]
#[case(&[0x20, 0x01, 0xc9, 0xc9], 3)]
#[case(&[0x10, 0xfe, 0xc9], 2)]
fn finished_runs_count_instructions(#[case] image: &[u8], #[case] decoded: usize) {
    let (decompiler, outcome) = run(image);
    assert!(outcome.expect("decodes").is_finished());
    assert_eq!(decompiler.context().decoded_count(), decoded);
}

#[test]
fn block_copy_feeds_later_loads() {
    let image = [
        0x21, 0x37, 0x5e, // LD HL, 5e37
        0x11, 0x00, 0x80, // LD DE, 8000
        0x01, 0x02, 0x00, // LD BC, 0002
        0xed, 0xb0, // LDIR
        0x2a, 0x00, 0x80, // LD HL, (8000)
        0xe9, // JP (HL)
        0x00, // pad
        0x39, 0x5e, // dw 5e39 at 5e37
        0xc9, // 5e39 RET
    ];
    let (decompiler, outcome) = run(&image);
    assert!(outcome.expect("decodes").is_finished());
    assert!(decompiler.context().was_decoded(0x5e39));
}

proptest! {
    #[test]
    fn arbitrary_images_never_panic(image in proptest::collection::vec(any::<u8>(), 0..64)) {
        let (decompiler, outcome) = run(&image);
        match outcome {
            Ok(_) => prop_assert!(decompiler.listing().len() <= image.len()),
            Err(error) => prop_assert!(error.offset <= image.len()),
        }
    }
}
