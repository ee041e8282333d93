#![no_main]

use libfuzzer_sys::fuzz_target;
use shsl_rs::script::highlight_text;
use shsl_rs::{DecompileOptions, OpcodeLengthTable, Pak, Script};

fuzz_target!(|data: &[u8]| {
    // Scripts are stored inside paks, so the same bytes exercise both decoders
    if let Ok(pak) = Pak::decode(data) {
        assert!(pak.iter().all(|entry| !entry.is_empty()));
        assert!(pak.iter().map(<[u8]>::len).sum::<usize>() <= data.len());
    }

    let script = match Script::decode(data, &OpcodeLengthTable::STANDARD) {
        Ok(script) => script,
        Err(_) => return,
    };

    // Decoded instructions never overlap and stay inside the input
    let mut next = 0;
    for instruction in &script.instructions {
        assert!(instruction.offset >= next);
        next = instruction.offset + instruction.size();
    }
    assert!(next <= data.len());

    // Rendering never fails and its output highlights cleanly
    let text = script.decompile(&DecompileOptions::default());
    let _ = highlight_text(&text);
});
