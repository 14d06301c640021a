//! Command modules contributed by attached components.
//!
//! The monitor forwards any first token it does not handle itself to the
//! module registered under that name, e.g. `cpu reg a $10`.

use crate::core::bus::InterruptState;
use crate::core::machine::Machine;
use crate::core::output::Output;

use super::error::{MonitorError, check_len};
use super::numeral::{format_register, parse_bool, parse_number};

/// What a module may touch while handling a command.
pub struct ModuleContext<'a> {
    pub machine: &'a mut Machine,
    pub out: &'a Output,
}

pub trait Module {
    /// Name the module is dispatched under.
    fn name(&self) -> &str;

    /// Handle `args` (the tokens after the module name).
    fn command(&mut self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError>;

    /// Valid next tokens after the module name.
    fn autocomplete(&self) -> Vec<Completion> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Completion tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub word: String,
    pub next: Vec<Completion>,
}

impl Completion {
    pub fn leaf(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            next: Vec::new(),
        }
    }

    pub fn node(word: impl Into<String>, next: Vec<Completion>) -> Self {
        Self {
            word: word.into(),
            next,
        }
    }
}

/// Candidates for `partial` after the already complete `words`, walking
/// the tree one word at a time. Sorted, without duplicates.
pub fn complete(tree: &[Completion], words: &[&str], partial: &str) -> Vec<String> {
    let mut level = tree;
    for word in words {
        match level.iter().find(|c| c.word == *word) {
            Some(c) => level = &c.next,
            None => return Vec::new(),
        }
    }
    let mut found: Vec<String> = level
        .iter()
        .filter(|c| c.word.starts_with(partial))
        .map(|c| c.word.clone())
        .collect();
    found.sort();
    found.dedup();
    found
}

// ---------------------------------------------------------------------------
// Generic processor module
// ---------------------------------------------------------------------------

/// Register, flag and interrupt access implemented once against the
/// [`Processor`](crate::cpu::Processor) contract, so every attached
/// processor gets it for free.
pub struct ProcessorModule {
    name: String,
}

impl ProcessorModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn reg(&self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError> {
        let cpu = &mut ctx.machine.cpu;
        match args {
            [] => {
                let mut names = cpu.registers().to_vec();
                names.sort_unstable();
                ctx.out.lines(names);
            }
            [name] => ctx.out.line(format_register(cpu.register(name)?)),
            [name, value] => {
                // Look the name up first so an unknown register wins over a
                // bad value.
                cpu.register(name)?;
                cpu.set_register(name, parse_number(value)?)?;
            }
            _ => return Err(MonitorError::ArgumentCount),
        }
        Ok(())
    }

    fn flag(&self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError> {
        let cpu = &mut ctx.machine.cpu;
        match args {
            [] => {
                let mut names = cpu.flags().to_vec();
                names.sort_unstable();
                ctx.out.lines(names);
            }
            [name] => ctx.out.line(cpu.flag(name)?),
            [name, value] => {
                cpu.flag(name)?;
                cpu.set_flag(name, parse_bool(value)?)?;
            }
            _ => return Err(MonitorError::ArgumentCount),
        }
        Ok(())
    }
}

impl Module for ProcessorModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn command(&mut self, ctx: &mut ModuleContext<'_>, args: &[&str]) -> Result<(), MonitorError> {
        check_len(args, 1, usize::MAX)?;
        let rest = &args[1..];
        match args[0] {
            "reg" => self.reg(ctx, rest),
            "flag" => self.flag(ctx, rest),
            "irq" | "nmi" => {
                check_len(rest, 0, 0)?;
                let int = InterruptState {
                    nmi: args[0] == "nmi",
                    irq: args[0] == "irq",
                };
                ctx.machine.cpu.signal_interrupt(int);
                Ok(())
            }
            other => Err(MonitorError::UnknownCommand(other.to_string())),
        }
    }

    fn autocomplete(&self) -> Vec<Completion> {
        vec![
            Completion::leaf("reg"),
            Completion::leaf("flag"),
            Completion::leaf("irq"),
            Completion::leaf("nmi"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Completion> {
        vec![
            Completion::node(
                "break",
                vec![
                    Completion::leaf("set"),
                    Completion::leaf("clear"),
                    Completion::leaf("clear-all"),
                ],
            ),
            Completion::leaf("bye"),
            Completion::leaf("d"),
        ]
    }

    #[test]
    fn test_complete_top_level() {
        assert_eq!(complete(&tree(), &[], "b"), ["break", "bye"]);
        assert_eq!(complete(&tree(), &[], ""), ["break", "bye", "d"]);
    }

    #[test]
    fn test_complete_nested() {
        assert_eq!(complete(&tree(), &["break"], "cl"), ["clear", "clear-all"]);
        assert!(complete(&tree(), &["nope"], "").is_empty());
        assert!(complete(&tree(), &["d"], "").is_empty());
    }
}
