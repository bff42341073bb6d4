#![no_main]

use std::collections::BTreeSet;

use decompiler_core::{ByteCursor, Decompiler, DecompilerConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let load_point = u16::from_be_bytes([data[0], data[1]]);
    let start_offset = usize::from(data[2] & 0x0f);
    let image = &data[3..];

    let mut cursor = ByteCursor::new(image);
    let _ = cursor.uint16();
    let _ = cursor.inspect_here();

    let config = DecompilerConfig::default().with_step_limit(4096);
    let Ok(mut decompiler) = Decompiler::new(image, load_point, start_offset, config) else {
        return;
    };
    let mut entries = BTreeSet::new();
    let mut memory = BTreeSet::new();
    if let Err(error) = decompiler.decode_to_fixpoint(&mut entries, &mut memory) {
        assert!(error.offset <= image.len());
        let _ = error.to_string();
    }
    let _ = decompiler.listing();
});
