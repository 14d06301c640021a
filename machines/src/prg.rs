//! Commodore-style `.prg` program images.
//!
//! The first two bytes are the little-endian load address; the rest is the
//! program. A BASIC program also needs the start-of-variables and
//! start-of-arrays pointers moved past its end.

use std::path::{Path, PathBuf};

use scanline_core::core::bus::Bus;
use thiserror::Error;

/// BASIC start-of-variables pointer.
pub const VARTAB: u32 = 0x002d;
/// BASIC start-of-arrays pointer.
pub const ARYTAB: u32 = 0x002f;

#[derive(Debug, Error)]
pub enum PrgError {
    #[error("invalid prg file: {0}")]
    Invalid(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where a program landed: load address and one past its last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    pub start: u32,
    pub end: u32,
}

/// `name` with `.prg` appended unless it already ends in it.
pub fn prg_path(name: &str) -> PathBuf {
    if name.ends_with(".prg") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.prg"))
    }
}

/// Write the image through `bus`. With `basic`, point both BASIC storage
/// pointers at the first byte after the program.
pub fn load(bus: &mut dyn Bus, data: &[u8], basic: bool, name: &str) -> Result<Loaded, PrgError> {
    let [lo, hi, body @ ..] = data else {
        return Err(PrgError::Invalid(name.to_string()));
    };
    let start = u16::from_le_bytes([*lo, *hi]) as u32;
    if start as usize + body.len() > 0x10000 {
        return Err(PrgError::Invalid(format!(
            "{name} runs past $ffff ({} bytes at ${start:04x})",
            body.len()
        )));
    }
    for (addr, &byte) in (start..).zip(body) {
        bus.write(addr, byte);
    }
    let end = start + body.len() as u32;
    if basic {
        // An image ending at $ffff leaves the pointers wrapped to $0000.
        let pointer = (end & 0xffff) as u16;
        bus.write_le16(VARTAB, pointer);
        bus.write_le16(ARYTAB, pointer);
    }
    tracing::info!("loaded {name} at ${start:04x}-${end:04x}");
    Ok(Loaded { start, end })
}

pub fn load_file(bus: &mut dyn Bus, path: &Path, basic: bool) -> Result<Loaded, PrgError> {
    let name = path.display().to_string();
    let data = std::fs::read(path).map_err(|source| PrgError::Io {
        path: name.clone(),
        source,
    })?;
    load(bus, &data, basic, &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::core::memory::AddressSpace;

    fn ram() -> AddressSpace {
        let mut mem = AddressSpace::new(0x10000);
        mem.map_ram(0, vec![0; 0x10000]);
        mem
    }

    #[test]
    fn test_prg_path_suffix() {
        assert_eq!(prg_path("hello"), PathBuf::from("hello.prg"));
        assert_eq!(prg_path("hello.prg"), PathBuf::from("hello.prg"));
    }

    #[test]
    fn test_load_basic_patches_pointers() {
        let mut mem = ram();
        let loaded = load(&mut mem, &[0x01, 0x08, 0xaa, 0xbb, 0xcc], true, "t").unwrap();
        assert_eq!(loaded, Loaded { start: 0x0801, end: 0x0804 });
        assert_eq!(mem.read(0x0801), 0xaa);
        assert_eq!(mem.read(0x0803), 0xcc);
        assert_eq!(mem.read_le16(VARTAB), 0x0804);
        assert_eq!(mem.read_le16(ARYTAB), 0x0804);
    }

    #[test]
    fn test_load_machine_code_leaves_pointers() {
        let mut mem = ram();
        load(&mut mem, &[0x00, 0xc0, 0x60], false, "t").unwrap();
        assert_eq!(mem.read(0xc000), 0x60);
        assert_eq!(mem.read_le16(VARTAB), 0);
    }

    #[test]
    fn test_short_file_is_invalid() {
        let mut mem = ram();
        let err = load(&mut mem, &[0x01], true, "short.prg").unwrap_err();
        assert_eq!(err.to_string(), "invalid prg file: short.prg");
    }

    #[test]
    fn test_image_past_end_is_rejected() {
        let mut mem = ram();
        let err = load(&mut mem, &[0xfe, 0xff, 0x11, 0x22, 0x33], true, "big.prg").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid prg file: big.prg runs past $ffff (3 bytes at $fffe)"
        );
        assert_eq!(mem.read(0xfffe), 0);
        assert_eq!(mem.read_le16(VARTAB), 0);
    }

    #[test]
    fn test_image_ending_at_top_of_memory() {
        let mut mem = ram();
        let loaded = load(&mut mem, &[0xfe, 0xff, 0x11, 0x22], true, "top.prg").unwrap();
        assert_eq!(loaded.end, 0x10000);
        assert_eq!(mem.read(0xffff), 0x22);
        assert_eq!(mem.read_le16(VARTAB), 0x0000);
    }
}
