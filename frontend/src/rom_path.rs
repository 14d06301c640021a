//! ROM path resolution: loads a [`RomSet`] from a rompath holding one
//! directory per machine, or from a directory of loose ROM files.

use std::path::Path;

use scanline_machines::rom_loader::{RomLoadError, RomSet};

/// Resolve a ROM path and load all ROM files into a [`RomSet`].
///
/// Resolution order:
/// 1. If `path` contains a `{machine_name}` directory, load that.
/// 2. If `path` is a directory, load its loose files.
pub fn load_rom_set(machine_name: &str, path: &Path) -> Result<RomSet, RomLoadError> {
    if path.is_dir() {
        let nested = path.join(machine_name);
        if nested.is_dir() {
            return RomSet::from_directory(&nested);
        }
        return RomSet::from_directory(path);
    }

    Err(RomLoadError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("ROM path not found: {}", path.display()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_machine_directory() {
        let dir = std::env::temp_dir().join("scanline_rompath_test_nested");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("sandbox")).unwrap();
        std::fs::write(dir.join("sandbox").join("sandbox.rom"), [0xBB; 8]).unwrap();
        std::fs::write(dir.join("other.rom"), [0xCC; 4]).unwrap();

        let rom_set = load_rom_set("sandbox", &dir).unwrap();
        assert_eq!(rom_set.get("sandbox.rom"), Some(&[0xBB; 8][..]));
        assert_eq!(rom_set.get("other.rom"), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_loose_directory_fallback() {
        let dir = std::env::temp_dir().join("scanline_rompath_test_loose");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(dir.join("test.rom"), [0xCC; 4]).unwrap();

        let rom_set = load_rom_set("sandbox", &dir).unwrap();
        assert_eq!(rom_set.get("test.rom"), Some(&[0xCC; 4][..]));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_path() {
        let dir = std::env::temp_dir().join("scanline_rompath_test_missing");
        let _ = std::fs::remove_dir_all(&dir);
        let err = load_rom_set("sandbox", &dir).unwrap_err();
        assert!(err.to_string().contains("ROM path not found"));
    }
}
