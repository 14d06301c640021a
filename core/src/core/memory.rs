//! Memory-mapped address space with per-address watchpoints.
//!
//! Every address resolves to one slot. Mapping is per address and the last
//! mapping registered for an address wins, so a machine can blanket a
//! register window with [`AddressSpace::map_unmapped`] and then lay the
//! real registers over it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use super::bus::Bus;
use super::output::Output;

/// A single byte shared between the address space and the hardware that
/// owns it (input latches, output registers, ...).
pub type Cell = Arc<AtomicU8>;

/// Create a fresh [`Cell`] holding `value`.
pub fn cell(value: u8) -> Cell {
    Arc::new(AtomicU8::new(value))
}

/// Value returned by reads from unmapped hardware lines.
pub const FILL: u8 = 0x00;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    Ram,
    Rom,
    Direct(DirectMode),
    Unmapped,
}

/// Handle to a RAM or ROM buffer owned by an [`AddressSpace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// A watched access, reported to the event sink as it happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryEvent {
    pub address: u32,
    pub access: Access,
    pub value: u8,
}

impl fmt::Display for MemoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Access::Read => write!(f, "${:02x} <= read(${:04x})", self.value, self.address),
            Access::Write => write!(f, "write(${:04x}) => ${:02x}", self.address, self.value),
        }
    }
}

/// Which directions of access are observed on an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Watch {
    pub read: bool,
    pub write: bool,
}

impl fmt::Display for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("r")?;
        }
        if self.write {
            f.write_str("w")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Unset,
    Block { block: usize, offset: usize },
    Direct { cell: usize, mode: DirectMode },
    Unmapped,
}

struct Block {
    data: Vec<u8>,
    writable: bool,
}

pub struct AddressSpace {
    slots: Vec<Slot>,
    blocks: Vec<Block>,
    cells: Vec<Cell>,
    watches: BTreeMap<u32, Watch>,
    events: Option<Output>,
}

impl AddressSpace {
    /// Create an address space covering `0..size`, with nothing mapped.
    pub fn new(size: u32) -> Self {
        Self {
            slots: vec![Slot::Unset; size as usize],
            blocks: Vec::new(),
            cells: Vec::new(),
            watches: BTreeMap::new(),
            events: None,
        }
    }

    pub fn size(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Route watch events to `output`. Without a sink, events are logged.
    pub fn set_event_sink(&mut self, output: Output) {
        self.events = Some(output);
    }

    // -----------------------------------------------------------------------
    // Mapping
    // -----------------------------------------------------------------------

    pub fn map_ram(&mut self, base: u32, data: Vec<u8>) -> BlockId {
        self.map_block(base, data, true)
    }

    pub fn map_rom(&mut self, base: u32, data: Vec<u8>) -> BlockId {
        self.map_block(base, data, false)
    }

    /// Map an already registered block again at `base` (address line
    /// mirroring). Both views share the same bytes.
    pub fn mirror(&mut self, base: u32, block: BlockId) {
        let len = self.blocks[block.0].data.len();
        self.check_range(base, len);
        for offset in 0..len {
            self.slots[base as usize + offset] = Slot::Block {
                block: block.0,
                offset,
            };
        }
    }

    pub fn map_direct(&mut self, addr: u32, cell: &Cell, mode: DirectMode) {
        self.check_range(addr, 1);
        let index = match self.cells.iter().position(|c| Arc::ptr_eq(c, cell)) {
            Some(i) => i,
            None => {
                self.cells.push(Arc::clone(cell));
                self.cells.len() - 1
            }
        };
        self.slots[addr as usize] = Slot::Direct { cell: index, mode };
    }

    /// Mark `addr` as intentionally absent: reads return [`FILL`], writes
    /// are dropped, and neither is logged.
    pub fn map_unmapped(&mut self, addr: u32) {
        self.check_range(addr, 1);
        self.slots[addr as usize] = Slot::Unmapped;
    }

    pub fn region(&self, addr: u32) -> Option<RegionKind> {
        match self.slots.get(addr as usize)? {
            Slot::Unset => None,
            Slot::Block { block, .. } if self.blocks[*block].writable => Some(RegionKind::Ram),
            Slot::Block { .. } => Some(RegionKind::Rom),
            Slot::Direct { mode, .. } => Some(RegionKind::Direct(*mode)),
            Slot::Unmapped => Some(RegionKind::Unmapped),
        }
    }

    fn map_block(&mut self, base: u32, data: Vec<u8>, writable: bool) -> BlockId {
        self.blocks.push(Block { data, writable });
        let id = BlockId(self.blocks.len() - 1);
        self.mirror(base, id);
        id
    }

    fn check_range(&self, base: u32, len: usize) {
        assert!(
            base as usize + len <= self.slots.len(),
            "mapping ${base:04x}+{len} exceeds address space of {} bytes",
            self.slots.len()
        );
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn read(&mut self, addr: u32) -> u8 {
        let value = self.load(addr);
        if self.watches.get(&addr).is_some_and(|w| w.read) {
            self.emit(MemoryEvent {
                address: addr,
                access: Access::Read,
                value,
            });
        }
        value
    }

    pub fn write(&mut self, addr: u32, value: u8) {
        if self.watches.get(&addr).is_some_and(|w| w.write) {
            self.emit(MemoryEvent {
                address: addr,
                access: Access::Write,
                value,
            });
        }
        self.store(addr, value);
    }

    fn load(&self, addr: u32) -> u8 {
        match self.slots.get(addr as usize) {
            Some(Slot::Block { block, offset }) => self.blocks[*block].data[*offset],
            Some(Slot::Direct { cell, mode }) => match mode {
                DirectMode::WriteOnly => FILL,
                _ => self.cells[*cell].load(Ordering::Relaxed),
            },
            Some(Slot::Unmapped) => FILL,
            Some(Slot::Unset) | None => {
                tracing::warn!("unmapped read at ${addr:04x}");
                FILL
            }
        }
    }

    fn store(&mut self, addr: u32, value: u8) {
        match self.slots.get(addr as usize) {
            Some(Slot::Block { block, offset }) => {
                let block = &mut self.blocks[*block];
                if block.writable {
                    block.data[*offset] = value;
                }
            }
            Some(Slot::Direct { cell, mode }) => {
                if *mode != DirectMode::ReadOnly {
                    self.cells[*cell].store(value, Ordering::Relaxed);
                }
            }
            Some(Slot::Unmapped) => {}
            Some(Slot::Unset) | None => {
                tracing::warn!("unmapped write at ${addr:04x} => ${value:02x}");
            }
        }
    }

    fn emit(&self, event: MemoryEvent) {
        match &self.events {
            Some(out) => out.line(event),
            None => tracing::info!("{event}"),
        }
    }

    // -----------------------------------------------------------------------
    // Watches
    // -----------------------------------------------------------------------

    pub fn watch_set(&mut self, addr: u32, read: bool, write: bool) {
        self.watches.insert(addr, Watch { read, write });
    }

    pub fn watch_clear(&mut self, addr: u32) {
        self.watches.remove(&addr);
    }

    pub fn watch_clear_all(&mut self) {
        self.watches.clear();
    }

    /// Active watches, sorted by address.
    pub fn watch_list(&self) -> Vec<(u32, Watch)> {
        self.watches.iter().map(|(a, w)| (*a, *w)).collect()
    }
}

impl Bus for AddressSpace {
    fn read(&mut self, addr: u32) -> u8 {
        AddressSpace::read(self, addr)
    }

    fn write(&mut self, addr: u32, data: u8) {
        AddressSpace::write(self, addr, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::Output;

    fn ram64k() -> AddressSpace {
        let mut mem = AddressSpace::new(0x10000);
        mem.map_ram(0, vec![0; 0x10000]);
        mem
    }

    #[test]
    fn test_ram_read_write() {
        let mut mem = ram64k();
        assert_eq!(mem.read(0x1234), 0);
        mem.write(0x1234, 0xab);
        assert_eq!(mem.read(0x1234), 0xab);
        assert_eq!(mem.region(0x1234), Some(RegionKind::Ram));
    }

    #[test]
    fn test_rom_ignores_writes() {
        let mut mem = ram64k();
        mem.map_rom(0x8000, vec![0x11, 0x22]);
        mem.write(0x8000, 0xff);
        assert_eq!(mem.read(0x8000), 0x11);
        assert_eq!(mem.read(0x8001), 0x22);
        assert_eq!(mem.region(0x8001), Some(RegionKind::Rom));
        // Outside the ROM the RAM underneath is still visible
        assert_eq!(mem.region(0x8002), Some(RegionKind::Ram));
    }

    #[test]
    fn test_unmapped_reads_fill_and_drops_writes() {
        let mut mem = AddressSpace::new(0x100);
        mem.map_unmapped(0x10);
        mem.write(0x10, 0x55);
        assert_eq!(mem.read(0x10), FILL);
        assert_eq!(mem.region(0x10), Some(RegionKind::Unmapped));
        assert_eq!(mem.region(0x11), None);
        assert_eq!(mem.read(0x11), FILL);
    }

    #[test]
    fn test_direct_modes() {
        let mut mem = AddressSpace::new(0x100);
        let input = cell(0x5a);
        let output = cell(0);
        let latch = cell(0);
        mem.map_direct(0x00, &input, DirectMode::ReadOnly);
        mem.map_direct(0x01, &output, DirectMode::WriteOnly);
        mem.map_direct(0x02, &latch, DirectMode::ReadWrite);

        mem.write(0x00, 0xff);
        assert_eq!(mem.read(0x00), 0x5a);
        assert_eq!(input.load(Ordering::Relaxed), 0x5a);

        mem.write(0x01, 0x42);
        assert_eq!(output.load(Ordering::Relaxed), 0x42);
        assert_eq!(mem.read(0x01), FILL);

        mem.write(0x02, 0x77);
        assert_eq!(mem.read(0x02), 0x77);
        latch.store(0x99, Ordering::Relaxed);
        assert_eq!(mem.read(0x02), 0x99);
    }

    #[test]
    fn test_last_mapping_wins() {
        let mut mem = AddressSpace::new(0x100);
        let reg = cell(0x12);
        for addr in 0x40..0x50 {
            mem.map_unmapped(addr);
        }
        mem.map_direct(0x44, &reg, DirectMode::ReadOnly);
        assert_eq!(mem.read(0x44), 0x12);
        assert_eq!(mem.region(0x43), Some(RegionKind::Unmapped));
        mem.map_unmapped(0x44);
        assert_eq!(mem.read(0x44), FILL);
    }

    #[test]
    fn test_mirror_shares_bytes() {
        let mut mem = AddressSpace::new(0x10000);
        let video = mem.map_ram(0x4000, vec![0; 0x400]);
        mem.mirror(0xc000, video);
        mem.write(0xc010, 0x33);
        assert_eq!(mem.read(0x4010), 0x33);
        mem.write(0x4011, 0x44);
        assert_eq!(mem.read(0xc011), 0x44);
    }

    #[test]
    fn test_le16_helpers() {
        let mut mem = ram64k();
        mem.write_le16(0x2d, 0x0812);
        assert_eq!(mem.read(0x2d), 0x12);
        assert_eq!(mem.read(0x2e), 0x08);
        assert_eq!(mem.read_le16(0x2d), 0x0812);
    }

    #[test]
    #[should_panic(expected = "exceeds address space")]
    fn test_mapping_past_end_panics() {
        let mut mem = AddressSpace::new(0x100);
        mem.map_ram(0xf0, vec![0; 0x20]);
    }

    #[test]
    fn test_watch_events() {
        let (out, capture) = Output::capture();
        let mut mem = ram64k();
        mem.set_event_sink(out);

        mem.watch_set(0x10, true, true);
        mem.write(0x10, 0x22);
        mem.read(0x10);
        mem.read(0x11);
        assert_eq!(
            capture.contents(),
            "write($0010) => $22\n$22 <= read($0010)\n"
        );

        capture.clear();
        mem.watch_set(0x10, false, true);
        mem.read(0x10);
        mem.write(0x10, 0x23);
        assert_eq!(capture.contents(), "write($0010) => $23\n");

        capture.clear();
        mem.watch_clear(0x10);
        mem.write(0x10, 0x24);
        mem.read(0x10);
        assert_eq!(capture.contents(), "");
    }

    #[test]
    fn test_watch_on_rom_reports_attempted_write() {
        let (out, capture) = Output::capture();
        let mut mem = AddressSpace::new(0x100);
        mem.set_event_sink(out);
        mem.map_rom(0, vec![0x01; 0x100]);
        mem.watch_set(0x20, false, true);
        mem.write(0x20, 0xee);
        assert_eq!(mem.read(0x20), 0x01);
        assert_eq!(capture.contents(), "write($0020) => $ee\n");
    }

    #[test]
    fn test_watch_list_sorted() {
        let mut mem = ram64k();
        mem.watch_set(0x300, true, false);
        mem.watch_set(0x100, false, true);
        mem.watch_set(0x200, true, true);
        let list: Vec<String> = mem
            .watch_list()
            .iter()
            .map(|(a, w)| format!("{a:04x} {w}"))
            .collect();
        assert_eq!(list, ["0100 w", "0200 rw", "0300 r"]);
        mem.watch_clear_all();
        assert!(mem.watch_list().is_empty());
    }
}
