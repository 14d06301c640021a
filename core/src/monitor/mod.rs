//! Line-oriented debugger over a [`Coordinator`].
//!
//! Each input line is split on whitespace; the first token picks a command
//! (or a registered [`Module`]) and the rest are its arguments. Command
//! errors are printed and never end the session.

pub mod dump;
pub mod encoding;
pub mod error;
pub mod input;
pub mod module;
pub mod numeral;
pub mod session;

use std::collections::BTreeMap;

use crate::core::coordinator::{Coordinator, RunState};
use crate::core::machine::Setup;
use crate::core::output::Output;

pub use dump::dump;
pub use encoding::Encoding;
pub use error::MonitorError;
pub use input::{LineSource, ScriptSource};
pub use module::{Completion, Module, ModuleContext, ProcessorModule};
pub use session::Session;

use error::check_len;
use numeral::{
    format_address, format_byte, format_conversions, parse_address, parse_bool, parse_byte,
    parse_number,
};

pub const PROMPT: &str = "scanline> ";

const HELP: &[&str] = &[
    "break [set|clear <addr>] [clear-all] [list]   (b)",
    "d [from [to]]                                 disassemble",
    "dasm lines [n]",
    "go                                            (g, run)",
    "m [from [to]]                                 dump memory",
    "mem lines [n] | encoding [name] | fill <from> <to> <byte>",
    "peek <addr>",
    "poke <addr> <byte>...",
    "r                                             registers",
    "step                                          (s, n, next)",
    "trace [on|off]                                (t)",
    "watch [set <addr> r|w|rw] [clear <addr>] [clear-all] [list]   (w)",
    "quit                                          (q)",
];

/// What the command loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Monitor {
    coord: Coordinator,
    out: Output,
    modules: BTreeMap<String, Box<dyn Module>>,
    encodings: BTreeMap<&'static str, Encoding>,
    session: Session,
}

impl Monitor {
    /// Attach to the machine in `setup` and register its modules and
    /// encodings next to the built-in `cpu` module.
    pub fn new(setup: Setup, out: Output) -> Self {
        let Setup {
            machine,
            modules,
            encodings,
        } = setup;
        let session = Session::new(machine.cpu.breakpoint_pc());
        let mut monitor = Self {
            coord: Coordinator::new(machine, out.clone()),
            out,
            modules: BTreeMap::new(),
            encodings: BTreeMap::new(),
            session,
        };
        monitor.register(Box::new(ProcessorModule::new("cpu")));
        for module in modules {
            monitor.register(module);
        }
        for enc in encoding::builtin().into_iter().chain(encodings) {
            monitor.encodings.insert(enc.name, enc);
        }
        monitor
    }

    pub fn register(&mut self, module: Box<dyn Module>) {
        let name = module.name().to_string();
        tracing::debug!(module = %name, "monitor module registered");
        if self.modules.insert(name.clone(), module).is_some() {
            tracing::warn!("monitor module {name} replaced");
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coord
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn set_encoding(&mut self, name: &str) -> Result<(), MonitorError> {
        if !self.encodings.contains_key(name) {
            return Err(MonitorError::UnknownEncoding(name.to_string()));
        }
        self.session.encoding = name.to_string();
        Ok(())
    }

    /// Read and execute lines until `quit` or end of input. A failed read
    /// ends the session like `quit`.
    pub fn run(&mut self, input: &mut dyn LineSource) {
        loop {
            let line = match input.read_line(PROMPT) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("monitor input failed: {e}");
                    break;
                }
            };
            match self.exec(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => self.out.line(e),
            }
        }
        tracing::debug!("monitor session ended");
    }

    /// Execute one command line. An empty line repeats the last paging or
    /// stepping command.
    pub fn exec(&mut self, line: &str) -> Result<Flow, MonitorError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&first, args)) = tokens.split_first() else {
            return match self.session.repeat.take() {
                Some(command) => self.exec(command),
                None => Ok(Flow::Continue),
            };
        };
        self.session.repeat = None;

        match first {
            "b" | "break" => self.breakpoints(args)?,
            "d" => self.disassemble(args)?,
            "dasm" => self.dasm(args)?,
            "g" | "go" | "run" => self.go(args)?,
            "s" | "step" | "n" | "next" => self.step(args)?,
            "m" => self.memory(args)?,
            "mem" => self.mem(args)?,
            "peek" => self.peek(args)?,
            "poke" => self.poke(args)?,
            "r" => self.registers(args)?,
            "t" | "trace" => self.trace(args)?,
            "w" | "watch" => self.watch(args)?,
            "help" | "?" => self.help(),
            "q" | "quit" => return Ok(Flow::Quit),
            _ => self.fallback(first, args)?,
        }
        Ok(Flow::Continue)
    }

    /// Tree of valid words for interactive completion.
    pub fn completions(&self) -> Vec<Completion> {
        use module::Completion as C;
        let subs = |words: &[&str]| words.iter().map(|w| C::leaf(*w)).collect::<Vec<_>>();
        let encodings = self.encodings.keys().map(|n| C::leaf(*n)).collect();

        let mut tree = vec![
            C::node("break", subs(&["set", "clear", "clear-all", "list"])),
            C::leaf("d"),
            C::node("dasm", subs(&["lines"])),
            C::leaf("go"),
            C::leaf("help"),
            C::leaf("m"),
            C::node(
                "mem",
                vec![
                    C::leaf("lines"),
                    C::node("encoding", encodings),
                    C::leaf("fill"),
                ],
            ),
            C::leaf("next"),
            C::leaf("peek"),
            C::leaf("poke"),
            C::leaf("quit"),
            C::leaf("r"),
            C::leaf("run"),
            C::leaf("step"),
            C::node("trace", subs(&["on", "off"])),
            C::node("watch", subs(&["set", "clear", "clear-all", "list"])),
        ];
        for (name, module) in &self.modules {
            tree.push(C::node(name.clone(), module.autocomplete()));
        }
        tree
    }

    // -----------------------------------------------------------------------
    // Breakpoints and run control
    // -----------------------------------------------------------------------

    fn breakpoints(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        match args {
            [] | ["list"] => {
                let list = self.coord.breakpoint_list();
                self.out.lines(list.into_iter().map(format_address));
            }
            ["set", addr] => self.coord.set_breakpoint(parse_number(addr)?)?,
            ["clear", addr] => {
                self.coord.clear_breakpoint(parse_number(addr)?);
            }
            ["clear-all"] => self.coord.clear_breakpoints(),
            [sub, ..] => return Err(bad_subcommand("break", sub)),
        }
        Ok(())
    }

    fn go(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        check_len(args, 0, 0)?;
        let transition = self.coord.run();
        let summary = self.coord.machine().summary();
        self.out.lines([transition.tag().to_string(), summary]);
        self.session.dasm_cursor = transition.pc();
        Ok(())
    }

    /// Execute one instruction and show the one that comes next.
    fn step(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        check_len(args, 0, 0)?;
        let pc = self.coord.step_once();
        let (statement, max_len) = {
            let mut machine = self.coord.machine();
            (machine.disassemble(pc), machine.dasm.max_len())
        };
        self.out.line(statement.render(max_len));
        self.session.dasm_cursor = statement.next();
        self.session.repeat = Some("step");
        Ok(())
    }

    fn registers(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        check_len(args, 0, 0)?;
        let tag = match self.coord.state() {
            RunState::Halted => "[halt]",
            _ => "[pause]",
        };
        let summary = self.coord.machine().summary();
        self.out.lines([tag.to_string(), summary]);
        Ok(())
    }

    fn trace(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        let on = match args {
            [] => !self.coord.trace(),
            [value] => parse_bool(value)?,
            _ => return Err(MonitorError::ArgumentCount),
        };
        self.coord.set_trace(on);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Disassembly
    // -----------------------------------------------------------------------

    fn dasm(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        match args {
            ["lines"] => self.out.line(self.session.dasm_lines),
            ["lines", n] => self.session.dasm_lines = parse_lines(n)?,
            ["lines", ..] => return Err(MonitorError::ArgumentCount),
            _ => self.disassemble(args)?,
        }
        Ok(())
    }

    /// `d` continues at the cursor, `d from` lists a page, `d from to`
    /// lists every instruction that starts inside the range.
    fn disassemble(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        let mut machine = self.coord.machine();
        let size = machine.mem.size();
        let max_len = machine.dasm.max_len();

        let (mut addr, end) = match args {
            [] => (self.session.dasm_cursor, None),
            [from] => (parse_address(from, size)?, None),
            [from, to] => (parse_address(from, size)?, Some(parse_address(to, size)?)),
            _ => return Err(MonitorError::ArgumentCount),
        };

        match end {
            None => {
                for _ in 0..self.session.dasm_lines {
                    let statement = machine.disassemble(addr);
                    self.out.line(statement.render(max_len));
                    addr = statement.next() % size;
                }
            }
            Some(end) => {
                while addr <= end {
                    let statement = machine.disassemble(addr);
                    self.out.line(statement.render(max_len));
                    let next = statement.next();
                    if next >= size || next <= addr {
                        addr = next % size;
                        break;
                    }
                    addr = next;
                }
            }
        }
        self.session.dasm_cursor = addr;
        self.session.repeat = Some("d");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Memory
    // -----------------------------------------------------------------------

    fn peek(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        let [addr] = args else {
            return Err(MonitorError::ArgumentCount);
        };
        let value = {
            let mut machine = self.coord.machine();
            let addr = parse_address(addr, machine.mem.size())?;
            machine.mem.read(addr)
        };
        self.out.line(format_byte(value));
        Ok(())
    }

    fn poke(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        check_len(args, 2, usize::MAX)?;
        let mut machine = self.coord.machine();
        let size = machine.mem.size();
        let addr = parse_address(args[0], size)?;
        let values = args[1..]
            .iter()
            .map(|v| parse_byte(v))
            .collect::<Result<Vec<_>, _>>()?;
        let last = addr as u64 + values.len() as u64 - 1;
        if last >= size as u64 {
            return Err(MonitorError::InvalidAddress(format_address(last as u32)));
        }
        for (offset, value) in (0..).zip(values) {
            machine.mem.write(addr + offset, value);
        }
        Ok(())
    }

    fn mem(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        match args {
            ["lines"] => self.out.line(self.session.mem_lines),
            ["lines", n] => self.session.mem_lines = parse_lines(n)?,
            ["encoding"] => {
                let active = self.session.encoding.as_str();
                self.out.lines(self.encodings.keys().map(|name| {
                    let mark = if *name == active { '*' } else { ' ' };
                    format!("{mark} {name}")
                }));
            }
            ["encoding", name] => self.set_encoding(name)?,
            ["fill", from, to, value] => self.fill(from, to, value)?,
            [sub, ..] if matches!(*sub, "lines" | "encoding" | "fill") => {
                return Err(MonitorError::ArgumentCount);
            }
            _ => self.memory(args)?,
        }
        Ok(())
    }

    /// Fill an inclusive range; the bounds may come in either order.
    fn fill(&mut self, from: &str, to: &str, value: &str) -> Result<(), MonitorError> {
        let mut machine = self.coord.machine();
        let size = machine.mem.size();
        let a = parse_address(from, size)?;
        let b = parse_address(to, size)?;
        let value = parse_byte(value)?;
        for addr in a.min(b)..=a.max(b) {
            machine.mem.write(addr, value);
        }
        Ok(())
    }

    /// `m` continues at the cursor, `m from` shows a page, `m from to`
    /// shows the whole inclusive range.
    fn memory(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        let mut machine = self.coord.machine();
        let size = machine.mem.size();
        let page = |start: u32| {
            let end = start as u64 + self.session.mem_lines as u64 * 16 - 1;
            (start, end.min(size as u64 - 1) as u32)
        };
        let (from, to) = match args {
            [] => page(self.session.mem_cursor),
            [from] => page(parse_address(from, size)?),
            [from, to] => {
                let a = parse_address(from, size)?;
                let b = parse_address(to, size)?;
                (a.min(b), a.max(b))
            }
            _ => return Err(MonitorError::ArgumentCount),
        };

        let encoding = self
            .encodings
            .get(self.session.encoding.as_str())
            .copied()
            .unwrap_or(encoding::ASCII);
        let rows = dump(&mut machine.mem, from, to, &encoding);
        drop(machine);
        self.out.lines(rows);

        self.session.mem_cursor = if to + 1 >= size { 0 } else { to + 1 };
        self.session.repeat = Some("m");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Watchpoints
    // -----------------------------------------------------------------------

    fn watch(&mut self, args: &[&str]) -> Result<(), MonitorError> {
        let mut machine = self.coord.machine();
        let size = machine.mem.size();
        match args {
            [] | ["list"] => {
                let list = machine.mem.watch_list();
                drop(machine);
                self.out.lines(
                    list.into_iter()
                        .map(|(addr, watch)| format!("{} {watch}", format_address(addr))),
                );
            }
            ["set", addr, mode] => {
                let addr = parse_address(addr, size)?;
                let (read, write) = match *mode {
                    "r" => (true, false),
                    "w" => (false, true),
                    "rw" | "wr" => (true, true),
                    other => return Err(MonitorError::InvalidArgument(other.to_string())),
                };
                machine.mem.watch_set(addr, read, write);
            }
            ["clear", addr] => machine.mem.watch_clear(parse_address(addr, size)?),
            ["clear-all"] => machine.mem.watch_clear_all(),
            [sub, ..] => return Err(bad_subcommand("watch", sub)),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Everything else
    // -----------------------------------------------------------------------

    fn help(&self) {
        self.out.lines(HELP.iter());
        if !self.modules.is_empty() {
            let names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
            self.out.line(format!("modules: {}", names.join(" ")));
        }
    }

    /// Module dispatch, then numeric conversion, then give up.
    fn fallback(&mut self, first: &str, args: &[&str]) -> Result<(), MonitorError> {
        if let Some(module) = self.modules.get_mut(first) {
            let mut machine = self.coord.machine();
            let mut ctx = ModuleContext {
                machine: &mut *machine,
                out: &self.out,
            };
            return module.command(&mut ctx, args);
        }
        if let Ok(value) = parse_number(first) {
            check_len(args, 0, 0)?;
            self.out.line(format_conversions(value));
            return Ok(());
        }
        Err(MonitorError::UnknownCommand(first.to_string()))
    }
}

fn parse_lines(token: &str) -> Result<usize, MonitorError> {
    match parse_number(token)? {
        0 => Err(MonitorError::InvalidArgument(token.to_string())),
        n => Ok(n as usize),
    }
}

/// Wrong arity for a known subcommand, otherwise an unknown one.
fn bad_subcommand(command: &str, sub: &str) -> MonitorError {
    match sub {
        "set" | "clear" | "clear-all" | "list" => MonitorError::ArgumentCount,
        _ => MonitorError::UnknownCommand(format!("{command} {sub}")),
    }
}
