pub mod core;
pub mod cpu;
pub mod monitor;

pub mod prelude {
    pub use crate::core::memory::{DirectMode, cell};
    pub use crate::core::{AddressSpace, Bus, InterruptState, Machine, Output, Setup};
    pub use crate::cpu::{ByteCursor, Disassembler, Processor, RegisterValue, StateError};
    pub use crate::monitor::{Completion, Encoding, Module, ModuleContext, Monitor, MonitorError};
}
