use crate::cpu::{Disassembler, Processor, Statement};
use crate::monitor::encoding::Encoding;
use crate::monitor::module::Module;

use super::memory::AddressSpace;

/// One processor, the address space it executes from, and the disassembler
/// for its instruction set.
///
/// While the coordinator is running, the run loop is the only code that
/// touches a `Machine`; otherwise the monitor owns it one command at a time.
pub struct Machine {
    pub cpu: Box<dyn Processor>,
    pub mem: AddressSpace,
    pub dasm: Box<dyn Disassembler>,
}

impl Machine {
    pub fn new(
        cpu: Box<dyn Processor>,
        mem: AddressSpace,
        dasm: Box<dyn Disassembler>,
    ) -> Self {
        Self { cpu, mem, dasm }
    }

    pub fn disassemble(&mut self, addr: u32) -> Statement {
        self.dasm.disassemble(&mut self.mem, addr)
    }

    /// Step one instruction. Illegal opcodes are logged and skipped.
    pub fn step(&mut self) -> bool {
        let here = self.cpu.breakpoint_pc();
        let ok = self.cpu.step(&mut self.mem);
        if !ok {
            tracing::warn!("illegal instruction at ${here:04x}");
        }
        ok
    }

    /// One-line register/flag summary: `pc` first (at its breakpoint
    /// address), then the other registers and the flags in name order.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("pc:{:04x}", self.cpu.breakpoint_pc())];
        let mut names: Vec<&str> = self.cpu.registers().to_vec();
        names.sort_unstable();
        for name in names.into_iter().filter(|n| *n != "pc") {
            if let Ok(value) = self.cpu.register(name) {
                parts.push(format!(
                    "{name}:{:0width$x}",
                    value.get(),
                    width = value.hex_digits()
                ));
            }
        }
        let mut flags: Vec<&str> = self.cpu.flags().to_vec();
        flags.sort_unstable();
        for name in flags {
            if let Ok(value) = self.cpu.flag(name) {
                parts.push(format!("{name}:{value}"));
            }
        }
        parts.join(" ")
    }
}

/// Everything a machine factory hands to the monitor: the machine itself
/// plus the command modules and text encodings it contributes.
pub struct Setup {
    pub machine: Machine,
    pub modules: Vec<Box<dyn Module>>,
    pub encodings: Vec<Encoding>,
}

impl Setup {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            modules: Vec::new(),
            encodings: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encodings.push(encoding);
        self
    }
}
