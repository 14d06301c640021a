//! ROM images for machines that boot from them.
//!
//! A [`RomSet`] is a bag of named files read from a directory (or handed
//! over as byte slices in tests). A [`RomRegion`] describes how those files
//! are laid out in one contiguous image and validates them while building
//! it.

use std::collections::HashMap;
use std::path::Path;

/// Errors that can occur when loading a ROM set.
#[derive(Debug)]
pub enum RomLoadError {
    Io(std::io::Error),

    /// A required file is not in the set.
    MissingFile(String),

    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingFile(name) => write!(f, "missing ROM file: {name}"),
            Self::SizeMismatch {
                file,
                expected,
                actual,
            } => write!(f, "ROM {file}: expected {expected} bytes, got {actual}"),
            Self::ChecksumMismatch {
                file,
                expected,
                actual,
            } => write!(
                f,
                "ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}"
            ),
        }
    }
}

impl std::error::Error for RomLoadError {}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Bitwise CRC-32 (IEEE, reflected). ROM images are small and loaded once.
fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

#[derive(Debug, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read every regular file in `path` (non-recursive), keyed by file
    /// name.
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name() else {
                continue;
            };
            let name = name.to_string_lossy().into_owned();
            tracing::debug!(file = %name, "ROM file found");
            files.insert(name, std::fs::read(&file_path)?);
        }
        Ok(Self { files })
    }

    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let files = entries
            .iter()
            .map(|(name, data)| (name.to_string(), data.to_vec()))
            .collect();
        Self { files }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// One file of a [`RomRegion`].
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    /// Where the file starts inside the region.
    pub offset: usize,
    /// Accepted checksums. Empty accepts anything.
    pub crc32: &'static [u32],
}

pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    /// Assemble the region image. Bytes no entry covers are `$ff`, like an
    /// erased EPROM.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        let mut image = vec![0xff; self.size];
        for entry in self.entries {
            let data = rom_set.require(entry.name)?;
            if data.len() != entry.size || entry.offset + entry.size > self.size {
                return Err(RomLoadError::SizeMismatch {
                    file: entry.name.to_string(),
                    expected: entry.size,
                    actual: data.len(),
                });
            }
            if let Some(&expected) = entry.crc32.first() {
                let actual = crc32(data);
                if !entry.crc32.contains(&actual) {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        expected,
                        actual,
                    });
                }
            }
            image[entry.offset..entry.offset + entry.size].copy_from_slice(data);
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REGION: RomRegion = RomRegion {
        size: 8,
        entries: &[
            RomEntry {
                name: "lo.bin",
                size: 2,
                offset: 0,
                crc32: &[],
            },
            RomEntry {
                name: "hi.bin",
                size: 2,
                offset: 6,
                crc32: &[0xcbf4_3926],
            },
        ],
    };

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xcbf4_3926);
    }

    #[test]
    fn test_region_layout() {
        let set = RomSet::from_slices(&[("lo.bin", &[1u8, 2][..]), ("hi.bin", &b"12"[..])]);
        let err = REGION.load(&set).unwrap_err();
        assert!(matches!(err, RomLoadError::ChecksumMismatch { .. }));

        static PLAIN: RomRegion = RomRegion {
            size: 4,
            entries: &[RomEntry {
                name: "lo.bin",
                size: 2,
                offset: 1,
                crc32: &[],
            }],
        };
        assert_eq!(PLAIN.load(&set).unwrap(), [0xff, 1, 2, 0xff]);
    }

    #[test]
    fn test_missing_and_wrong_size() {
        let set = RomSet::from_slices(&[("lo.bin", &[1u8, 2, 3][..])]);
        let err = REGION.load(&set).unwrap_err();
        assert_eq!(err.to_string(), "ROM lo.bin: expected 2 bytes, got 3");

        let err = REGION.load(&RomSet::empty()).unwrap_err();
        assert_eq!(err.to_string(), "missing ROM file: lo.bin");
    }
}
