/// Byte-wide memory bus seen by an attached processor.
///
/// Addresses are plain `u32` regardless of the processor's native width;
/// a 16-bit machine simply never produces anything above `0xFFFF`.
pub trait Bus {
    fn read(&mut self, addr: u32) -> u8;
    fn write(&mut self, addr: u32, data: u8);

    /// Read a little-endian 16-bit word (pointer fields, vectors).
    fn read_le16(&mut self, addr: u32) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        lo | (hi << 8)
    }

    /// Write a little-endian 16-bit word.
    fn write_le16(&mut self, addr: u32, value: u16) {
        self.write(addr, value as u8);
        self.write(addr.wrapping_add(1), (value >> 8) as u8);
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct InterruptState {
    pub nmi: bool,
    pub irq: bool,
}
