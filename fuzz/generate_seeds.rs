//! Generate seed corpora for fuzzing

use shsl_rs::ArchiveWriter;
use std::fs;

fn utf16z(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16().chain([0]) {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Type 2 script with the given bytecode and strings
fn script(code: &[u8], strings: &[&str]) -> Vec<u8> {
    let strings_offset = 12 + code.len();
    let mut out = Vec::new();
    for value in [2u32, 12, strings_offset as u32] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(code);
    out.extend_from_slice(&(strings.len() as u32).to_le_bytes());

    let encoded: Vec<Vec<u8>> = strings.iter().map(|s| utf16z(s)).collect();
    let mut offset = 4 + 4 * strings.len();
    for s in &encoded {
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += s.len();
    }
    for s in &encoded {
        out.extend_from_slice(s);
    }
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let archive_dir = "fuzz/corpus/fuzz_archive_parse";
    let script_dir = "fuzz/corpus/fuzz_script_decode";
    fs::create_dir_all(archive_dir)?;
    fs::create_dir_all(script_dir)?;

    println!("Generating seed corpus...");

    // Archive seeds
    {
        let path = format!("{}/seed_empty.wad", archive_dir);
        ArchiveWriter::create(&path)?.finalize()?;
        println!("✓ Generated: {}", path);
    }

    {
        let path = format!("{}/seed_nested.wad", archive_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_file("Dr2/data/us/script/e00_001_000.lin", &script(&[0x70, 0x4B], &[]))?;
        writer.add_file("Dr2/data/all/bin/title.tga", &[0u8; 18])?;
        writer.add_file("readme.txt", b"Hello, World!")?;
        writer.finalize()?;
        println!("✓ Generated: {}", path);
    }

    {
        let path = format!("{}/seed_zero_length.wad", archive_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_file("empty.bin", b"")?;
        writer.finalize()?;
        println!("✓ Generated: {}", path);
    }

    // Script seeds
    let scripts: [(&str, Vec<u8>); 3] = [
        ("seed_text.lin", script(&[0x70, 0x00, 0x01, 0x00, 0x70, 0x02, 0x00, 0x00, 0x70, 0x4B], &["Hello"])),
        ("seed_change_ui.lin", script(&[0x70, 0x25, 0x10, 0x01, 0x70, 0x1A, 0x70, 0x99], &[])),
        ("seed_type_one.lin", {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&8u32.to_le_bytes());
            bytes.extend_from_slice(&[0x70, 0x03, 0x04, 0x70, 0x4C]);
            bytes
        }),
    ];
    for (name, bytes) in &scripts {
        let path = format!("{}/{}", script_dir, name);
        fs::write(&path, bytes)?;
        println!("✓ Generated: {}", path);
    }

    println!("\nGenerated {} seed files", 3 + scripts.len());
    Ok(())
}
