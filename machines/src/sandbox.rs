//! A small board around the mock processor with a realistic memory map.
//!
//! ```text
//! $0000-$07ff  work RAM, mirrored four times up to $1fff
//! $2000-$cfff  program RAM
//! $d000-$d0ff  I/O window (unused lines read as zero)
//!   $d000      input latch   (read only)
//!   $d001      output latch  (write only)
//!   $d002      control       (read/write)
//! $d100-$dfff  nothing
//! $e000-$ffff  ROM (sandbox.rom if present, otherwise erased)
//! ```

use scanline_core::core::machine::{Machine, Setup};
use scanline_core::core::memory::{AddressSpace, Cell, DirectMode, cell};
use scanline_core::monitor::numeral::{format_byte, parse_bool, parse_byte};
use scanline_core::monitor::{Completion, Module, ModuleContext, MonitorError};

use crate::mock::{MockDisassembler, MockProcessor};
use crate::prg;
use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

pub const IO_IN: u32 = 0xd000;
pub const IO_OUT: u32 = 0xd001;
pub const IO_CTL: u32 = 0xd002;

const WORK_RAM: usize = 0x0800;
const ROM_BASE: u32 = 0xe000;

static SANDBOX_ROM: RomRegion = RomRegion {
    size: 0x2000,
    entries: &[RomEntry {
        name: "sandbox.rom",
        size: 0x2000,
        offset: 0,
        crc32: &[],
    }],
};

/// The board's I/O latches, shared between the address space and the
/// `sandbox` module.
#[derive(Clone, Debug)]
pub struct Latches {
    pub input: Cell,
    pub output: Cell,
    pub control: Cell,
}

impl Latches {
    fn new() -> Self {
        Self {
            input: cell(0),
            output: cell(0),
            control: cell(0),
        }
    }
}

/// Build the board. `rom` fills $e000-$ffff when given.
pub fn build(rom: Option<Vec<u8>>) -> (Machine, Latches) {
    let latches = Latches::new();
    let mut mem = AddressSpace::new(0x10000);

    let work = mem.map_ram(0x0000, vec![0; WORK_RAM]);
    for mirror in 1..4 {
        mem.mirror((mirror * WORK_RAM) as u32, work);
    }
    mem.map_ram(0x2000, vec![0; 0xb000]);

    for addr in 0xd000..0xe000 {
        mem.map_unmapped(addr);
    }
    mem.map_direct(IO_IN, &latches.input, DirectMode::ReadOnly);
    mem.map_direct(IO_OUT, &latches.output, DirectMode::WriteOnly);
    mem.map_direct(IO_CTL, &latches.control, DirectMode::ReadWrite);

    let rom = rom.unwrap_or_else(|| vec![0xff; SANDBOX_ROM.size]);
    mem.map_rom(ROM_BASE, rom);

    let machine = Machine::new(
        Box::new(MockProcessor::new()),
        mem,
        Box::new(MockDisassembler),
    );
    (machine, latches)
}

fn create_machine(rom_set: &RomSet) -> Result<Setup, RomLoadError> {
    let rom = if rom_set.get("sandbox.rom").is_some() {
        Some(SANDBOX_ROM.load(rom_set)?)
    } else {
        tracing::info!("sandbox.rom not found, ROM area left erased");
        None
    };
    let (machine, latches) = build(rom);
    Ok(Setup::new(machine).with_module(SandboxModule::new(latches)))
}

inventory::submit! {
    MachineEntry::new("sandbox", "mock processor with RAM, ROM and I/O latches", create_machine)
}

// ---------------------------------------------------------------------------
// Monitor module
// ---------------------------------------------------------------------------

/// `sandbox io` shows the latches, `sandbox in <byte>` drives the input
/// latch, `sandbox watch-io on|off` watches the I/O window, and
/// `sandbox load-prg <file> [1]` loads a program image.
pub struct SandboxModule {
    latches: Latches,
}

impl SandboxModule {
    pub fn new(latches: Latches) -> Self {
        Self { latches }
    }

    fn load_prg(&self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError> {
        let basic = match args {
            [_] => true,
            [_, "1"] => false,
            [_, other] => return Err(MonitorError::InvalidArgument(other.to_string())),
            _ => return Err(MonitorError::ArgumentCount),
        };
        let path = prg::prg_path(args[0]);
        prg::load_file(&mut ctx.machine.mem, &path, basic)
            .map_err(|e| MonitorError::Failed(e.to_string()))?;
        Ok(())
    }
}

impl Module for SandboxModule {
    fn name(&self) -> &str {
        "sandbox"
    }

    fn command(&mut self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError> {
        use std::sync::atomic::Ordering::Relaxed;

        let Some((&sub, rest)) = args.split_first() else {
            return Err(MonitorError::ArgumentCount);
        };
        match (sub, rest) {
            ("io", []) => ctx.out.line(format!(
                "in:${:02x} out:${:02x} ctl:${:02x}",
                self.latches.input.load(Relaxed),
                self.latches.output.load(Relaxed),
                self.latches.control.load(Relaxed),
            )),
            ("in", []) => ctx.out.line(format_byte(self.latches.input.load(Relaxed))),
            ("in", [value]) => self.latches.input.store(parse_byte(value)?, Relaxed),
            ("out", []) => ctx.out.line(format_byte(self.latches.output.load(Relaxed))),
            ("watch-io", [on]) => {
                let on = parse_bool(on)?;
                let mem = &mut ctx.machine.mem;
                for (addr, read, write) in [
                    (IO_IN, true, false),
                    (IO_OUT, false, true),
                    (IO_CTL, true, true),
                ] {
                    if on {
                        mem.watch_set(addr, read, write);
                    } else {
                        mem.watch_clear(addr);
                    }
                }
            }
            ("load-prg", _) => self.load_prg(ctx, rest)?,
            ("io" | "in" | "out" | "watch-io", _) => return Err(MonitorError::ArgumentCount),
            (other, _) => return Err(MonitorError::UnknownCommand(other.to_string())),
        }
        Ok(())
    }

    fn autocomplete(&self) -> Vec<Completion> {
        vec![
            Completion::leaf("io"),
            Completion::leaf("in"),
            Completion::leaf("out"),
            Completion::node(
                "watch-io",
                vec![Completion::leaf("on"), Completion::leaf("off")],
            ),
            Completion::leaf("load-prg"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::core::memory::RegionKind;

    #[test]
    fn test_memory_map() {
        let (mut m, _) = build(None);
        m.mem.write(0x0010, 0x42);
        assert_eq!(m.mem.read(0x0810), 0x42);
        assert_eq!(m.mem.read(0x1810), 0x42);
        assert_eq!(m.mem.region(0x2000), Some(RegionKind::Ram));
        assert_eq!(m.mem.region(0xd080), Some(RegionKind::Unmapped));
        assert_eq!(m.mem.region(0xe000), Some(RegionKind::Rom));
        assert_eq!(m.mem.read(0xffff), 0xff);
    }

    #[test]
    fn test_latch_directions() {
        let (mut m, latches) = build(None);
        latches.input.store(0x5a, std::sync::atomic::Ordering::Relaxed);
        assert_eq!(m.mem.read(IO_IN), 0x5a);
        m.mem.write(IO_IN, 0x00);
        assert_eq!(m.mem.read(IO_IN), 0x5a);

        m.mem.write(IO_OUT, 0x33);
        assert_eq!(m.mem.read(IO_OUT), 0x00);
        assert_eq!(latches.output.load(std::sync::atomic::Ordering::Relaxed), 0x33);
    }

    #[test]
    fn test_rom_from_set() {
        let image = vec![0xea; 0x2000];
        let set = RomSet::from_slices(&[("sandbox.rom", image.as_slice())]);
        let setup = create_machine(&set).unwrap();
        let mut machine = setup.machine;
        assert_eq!(machine.mem.read(0xe000), 0xea);
        machine.mem.write(0xe000, 0);
        assert_eq!(machine.mem.read(0xe000), 0xea);
        assert_eq!(setup.modules.len(), 1);
    }
}
