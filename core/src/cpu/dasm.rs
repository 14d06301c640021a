//! Disassembler contract and the byte cursor it decodes from.

use std::fmt;

use crate::core::bus::Bus;

/// Sequential reader over a bus that remembers every byte it fetched.
pub struct ByteCursor<'a> {
    bus: &'a mut dyn Bus,
    start: u32,
    pos: u32,
    bytes: Vec<u8>,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bus: &'a mut dyn Bus, addr: u32) -> Self {
        Self {
            bus,
            start: addr,
            pos: addr,
            bytes: Vec::new(),
        }
    }

    pub fn fetch(&mut self) -> u8 {
        let value = self.bus.read(self.pos);
        self.pos = self.pos.wrapping_add(1);
        self.bytes.push(value);
        value
    }

    pub fn fetch_le16(&mut self) -> u16 {
        let lo = self.fetch() as u16;
        let hi = self.fetch() as u16;
        lo | (hi << 8)
    }

    /// Address of the next byte to fetch.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    fn finish(self, text: String) -> Statement {
        Statement {
            addr: self.start,
            bytes: self.bytes,
            text,
        }
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub addr: u32,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl Statement {
    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address of the instruction that follows this one.
    pub fn next(&self) -> u32 {
        self.addr.wrapping_add(self.len().max(1))
    }

    /// Render as `$addr:  bytes  text`, padding the byte column to hold
    /// `max_len` bytes.
    pub fn render(&self, max_len: usize) -> String {
        let bytes: Vec<String> = self.bytes.iter().map(|b| format!("{b:02x}")).collect();
        let width = (max_len * 3).saturating_sub(1);
        format!(
            "${:04x}:  {:<width$}  {}",
            self.addr,
            bytes.join(" "),
            self.text
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.bytes.len()))
    }
}

/// Decodes instructions for one instruction set.
pub trait Disassembler: Send {
    /// Decode one instruction from the cursor and return its text. The
    /// instruction length is however many bytes were fetched.
    fn decode(&self, cursor: &mut ByteCursor<'_>) -> String;

    /// Longest instruction in bytes; sizes the byte column.
    fn max_len(&self) -> usize;

    fn disassemble(&self, bus: &mut dyn Bus, addr: u32) -> Statement {
        let mut cursor = ByteCursor::new(bus, addr);
        let text = self.decode(&mut cursor);
        if cursor.bytes.is_empty() {
            cursor.fetch();
        }
        cursor.finish(text)
    }
}
