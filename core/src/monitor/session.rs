use super::encoding;

pub const DEFAULT_LINES: usize = 16;

/// Per-session monitor state. Lives from monitor start until `quit`.
#[derive(Debug, Clone)]
pub struct Session {
    /// Where an argument-less `d` continues from.
    pub dasm_cursor: u32,
    /// Where an argument-less `m` continues from.
    pub mem_cursor: u32,
    pub dasm_lines: usize,
    /// Rows of 16 bytes per `m` page.
    pub mem_lines: usize,
    pub encoding: String,
    /// Command an empty input line repeats.
    pub(crate) repeat: Option<&'static str>,
}

impl Session {
    pub fn new(pc: u32) -> Self {
        Self {
            dasm_cursor: pc,
            mem_cursor: 0,
            dasm_lines: DEFAULT_LINES,
            mem_lines: DEFAULT_LINES,
            encoding: encoding::ASCII.name.to_string(),
            repeat: None,
        }
    }
}
