//! Contracts an emulated processor implements to be driven by the
//! coordinator and inspected by the monitor.

use crate::core::bus::{Bus, InterruptState};

pub mod dasm;
pub mod state;

pub use dasm::{ByteCursor, Disassembler, Statement};
pub use state::{RegisterValue, StateError};

/// Generic processor interface.
///
/// Register and flag names are lower case. `registers()` must include
/// `"pc"`; the remaining names are whatever the instruction set calls its
/// registers (shadow banks and index halves included).
pub trait Processor: Send {
    fn pc(&self) -> u32;
    fn set_pc(&mut self, pc: u32);

    /// Execute exactly one instruction. Returns `false` when the opcode was
    /// not recognised; the fetch still happens but nothing else changes.
    fn step(&mut self, bus: &mut dyn Bus) -> bool;

    /// Halted by an instruction (HALT, STOP, ...). Halting is terminal for
    /// the run loop.
    fn is_halted(&self) -> bool {
        false
    }

    fn registers(&self) -> &'static [&'static str];
    fn register(&self, name: &str) -> Result<RegisterValue, StateError>;
    fn set_register(&mut self, name: &str, value: u32) -> Result<(), StateError>;

    fn flags(&self) -> &'static [&'static str];
    fn flag(&self, name: &str) -> Result<bool, StateError>;
    fn set_flag(&mut self, name: &str, value: bool) -> Result<(), StateError>;

    /// Signal interrupt lines. Processors without interrupt support ignore it.
    fn signal_interrupt(&mut self, _int: InterruptState) {}

    /// Amount the reported program counter runs ahead of the address of the
    /// instruction it belongs to. Breakpoints are compared against
    /// `pc() - fetch_offset()`.
    fn fetch_offset(&self) -> i32 {
        0
    }

    /// Address of the current instruction as breakpoints see it.
    fn breakpoint_pc(&self) -> u32 {
        self.pc().wrapping_sub(self.fetch_offset() as u32)
    }
}
