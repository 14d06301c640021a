//! Toy processor for exercising the monitor.
//!
//! Every opcode is a no-op. The high nibble gives the operand size:
//! `0x` has none, `1x` one byte, `2x` a little-endian word; anything else
//! is one byte long. `$ff` is illegal. An optional halt opcode stops the
//! processor for good.

use scanline_core::core::bus::{Bus, InterruptState};
use scanline_core::core::machine::{Machine, Setup};
use scanline_core::core::memory::AddressSpace;
use scanline_core::cpu::{ByteCursor, Disassembler, Processor, RegisterValue, StateError};

use crate::registry::MachineEntry;
use crate::rom_loader::{RomLoadError, RomSet};

pub const ILLEGAL: u8 = 0xff;

const REGISTERS: &[&str] = &["pc", "a", "b"];
const FLAGS: &[&str] = &["q", "z"];

fn operand_len(opcode: u8) -> u32 {
    match opcode >> 4 {
        1 => 1,
        2 => 2,
        _ => 0,
    }
}

#[derive(Debug, Default)]
pub struct MockProcessor {
    /// Address of the next instruction.
    addr: u16,
    pub a: u8,
    pub b: u8,
    pub q: bool,
    pub z: bool,
    fetch_offset: i32,
    halt_opcode: Option<u8>,
    halted: bool,
    /// Last lines raised through `signal_interrupt`.
    pub interrupts: InterruptState,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the program counter `offset` bytes ahead of the instruction.
    pub fn with_fetch_offset(mut self, offset: i32) -> Self {
        self.fetch_offset = offset;
        self
    }

    pub fn with_halt_opcode(mut self, opcode: u8) -> Self {
        self.halt_opcode = Some(opcode);
        self
    }
}

impl Processor for MockProcessor {
    fn pc(&self) -> u32 {
        (self.addr as u32).wrapping_add(self.fetch_offset as u32) & 0xffff
    }

    fn set_pc(&mut self, pc: u32) {
        self.addr = pc.wrapping_sub(self.fetch_offset as u32) as u16;
    }

    fn step(&mut self, bus: &mut dyn Bus) -> bool {
        if self.halted {
            return true;
        }
        let opcode = bus.read(self.addr as u32);
        let len = 1 + operand_len(opcode);
        for i in 1..len {
            bus.read(self.addr.wrapping_add(i as u16) as u32);
        }
        self.addr = self.addr.wrapping_add(len as u16);
        if Some(opcode) == self.halt_opcode {
            self.halted = true;
        }
        opcode != ILLEGAL
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn registers(&self) -> &'static [&'static str] {
        REGISTERS
    }

    fn register(&self, name: &str) -> Result<RegisterValue, StateError> {
        match name {
            "pc" => Ok(RegisterValue::U16(self.pc() as u16)),
            "a" => Ok(RegisterValue::U8(self.a)),
            "b" => Ok(RegisterValue::U8(self.b)),
            _ => Err(StateError::UnknownRegister(name.to_string())),
        }
    }

    fn set_register(&mut self, name: &str, value: u32) -> Result<(), StateError> {
        match name {
            "pc" => self.set_pc(value & 0xffff),
            "a" => self.a = value as u8,
            "b" => self.b = value as u8,
            _ => return Err(StateError::UnknownRegister(name.to_string())),
        }
        Ok(())
    }

    fn flags(&self) -> &'static [&'static str] {
        FLAGS
    }

    fn flag(&self, name: &str) -> Result<bool, StateError> {
        match name {
            "q" => Ok(self.q),
            "z" => Ok(self.z),
            _ => Err(StateError::UnknownFlag(name.to_string())),
        }
    }

    fn set_flag(&mut self, name: &str, value: bool) -> Result<(), StateError> {
        match name {
            "q" => self.q = value,
            "z" => self.z = value,
            _ => return Err(StateError::UnknownFlag(name.to_string())),
        }
        Ok(())
    }

    fn signal_interrupt(&mut self, int: InterruptState) {
        self.interrupts = int;
    }

    fn fetch_offset(&self) -> i32 {
        self.fetch_offset
    }
}

/// Renders opcodes as `iNN` with their operand: `i19 $ab`, `i29 $abcd`.
#[derive(Debug, Default)]
pub struct MockDisassembler;

impl Disassembler for MockDisassembler {
    fn decode(&self, cursor: &mut ByteCursor<'_>) -> String {
        let opcode = cursor.fetch();
        match operand_len(opcode) {
            1 => format!("i{opcode:02x} ${:02x}", cursor.fetch()),
            2 => format!("i{opcode:02x} ${:04x}", cursor.fetch_le16()),
            _ => format!("i{opcode:02x}"),
        }
    }

    fn max_len(&self) -> usize {
        3
    }
}

/// 64K of zeroed RAM driven by `cpu`.
pub fn machine_with(cpu: MockProcessor) -> Machine {
    let mut mem = AddressSpace::new(0x10000);
    mem.map_ram(0x0000, vec![0; 0x10000]);
    Machine::new(Box::new(cpu), mem, Box::new(MockDisassembler))
}

pub fn machine() -> Machine {
    machine_with(MockProcessor::new())
}

fn create_machine(_rom_set: &RomSet) -> Result<Setup, RomLoadError> {
    Ok(Setup::new(machine()))
}

inventory::submit! {
    MachineEntry::new("mock", "64K RAM test processor", create_machine)
}
