//! Execution coordinator: owns the machine, runs it on a worker thread and
//! hands control back to the caller on breakpoint, halt or stop request.
//!
//! `run` sends a request to the worker and blocks until the worker answers
//! with exactly one [`Transition`]. The worker checks the stop flag before
//! every instruction, so a stop request takes effect within one
//! instruction.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

use super::machine::Machine;
use super::output::Output;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
    /// The processor halted itself. Terminal.
    Halted,
}

/// Why the run loop handed control back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Break { pc: u32 },
    Halt { pc: u32 },
    Stop { pc: u32 },
}

impl Transition {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Break { .. } => "[break]",
            Self::Halt { .. } => "[halt]",
            Self::Stop { .. } => "[pause]",
        }
    }

    pub fn pc(&self) -> u32 {
        match *self {
            Self::Break { pc } | Self::Halt { pc } | Self::Stop { pc } => pc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid address: ${0:04x}")]
pub struct OutOfRange(pub u32);

/// Requests a stop of the run loop from any thread.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Idempotent. Takes effect before the next instruction executes.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

enum Control {
    Run,
    Shutdown,
}

struct Shared {
    machine: Mutex<Machine>,
    breakpoints: Mutex<BTreeSet<u32>>,
    state: Mutex<RunState>,
    changed: Condvar,
    stop: Arc<AtomicBool>,
    trace: AtomicBool,
    out: Output,
    /// Holds the worker between receiving a run request and its first stop
    /// check. Two messages release it.
    #[cfg(test)]
    run_gate: Option<Receiver<()>>,
}

impl Shared {
    fn new(machine: Machine, out: Output) -> Self {
        let halted = machine.cpu.is_halted();
        Self {
            machine: Mutex::new(machine),
            breakpoints: Mutex::new(BTreeSet::new()),
            state: Mutex::new(if halted {
                RunState::Halted
            } else {
                RunState::Paused
            }),
            changed: Condvar::new(),
            stop: Arc::new(AtomicBool::new(false)),
            trace: AtomicBool::new(false),
            out,
            #[cfg(test)]
            run_gate: None,
        }
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: RunState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "run state");
            *state = next;
        }
        self.changed.notify_all();
    }

    /// Trace (if enabled) and execute one instruction. Returns the
    /// breakpoint address of the next instruction and whether the
    /// processor halted.
    fn step(&self) -> (u32, bool) {
        let mut machine = self.machine();
        if self.trace.load(Ordering::SeqCst) {
            let pc = machine.cpu.breakpoint_pc();
            let statement = machine.disassemble(pc);
            self.out.line(statement.render(machine.dasm.max_len()));
        }
        machine.step();
        (machine.cpu.breakpoint_pc(), machine.cpu.is_halted())
    }

    fn serve(&self, control: Receiver<Control>, events: Sender<Transition>) {
        for request in control.iter() {
            match request {
                Control::Run => {
                    #[cfg(test)]
                    if let Some(gate) = &self.run_gate {
                        let _ = gate.recv();
                        let _ = gate.recv();
                    }
                    let transition = self.run_loop();
                    if events.send(transition).is_err() {
                        break;
                    }
                }
                Control::Shutdown => break,
            }
        }
        tracing::debug!("run loop worker exiting");
    }

    fn run_loop(&self) -> Transition {
        // Breakpoints only change while paused, so a snapshot is exact.
        let breakpoints = self
            .breakpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.set_state(RunState::Running);

        loop {
            if self.stop.swap(false, Ordering::SeqCst) {
                let pc = self.machine().cpu.breakpoint_pc();
                self.set_state(RunState::Paused);
                return Transition::Stop { pc };
            }
            let (pc, halted) = self.step();
            if halted {
                self.set_state(RunState::Halted);
                return Transition::Halt { pc };
            }
            if breakpoints.contains(&pc) {
                tracing::info!("breakpoint hit at ${pc:04x}");
                self.set_state(RunState::Paused);
                return Transition::Break { pc };
            }
        }
    }
}

pub struct Coordinator {
    shared: Arc<Shared>,
    control: Sender<Control>,
    events: Receiver<Transition>,
    worker: Option<JoinHandle<()>>,
}

impl Coordinator {
    /// Take ownership of `machine` and start the (idle) run loop worker.
    /// Watch events and trace lines are written to `out`.
    pub fn new(mut machine: Machine, out: Output) -> Self {
        machine.mem.set_event_sink(out.clone());
        Self::spawn(Shared::new(machine, out))
    }

    fn spawn(shared: Shared) -> Self {
        let shared = Arc::new(shared);
        let (control_tx, control_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_shared.serve(control_rx, event_tx));

        Self {
            shared,
            control: control_tx,
            events: event_rx,
            worker: Some(worker),
        }
    }

    pub fn state(&self) -> RunState {
        self.shared.state()
    }

    /// Block until the run loop reaches `want`. Lets tests observe the
    /// worker deterministically instead of sleeping.
    pub fn wait_for(&self, want: RunState) {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *state != want {
            state = self
                .shared
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Exclusive access to the machine. Only meaningful while not running.
    pub fn machine(&self) -> MutexGuard<'_, Machine> {
        self.shared.machine()
    }

    /// Execute one instruction and return the new breakpoint-relative
    /// program counter. Does nothing once halted.
    pub fn step_once(&self) -> u32 {
        if self.state() == RunState::Halted {
            return self.machine().cpu.breakpoint_pc();
        }
        let (pc, halted) = self.shared.step();
        if halted {
            self.shared.set_state(RunState::Halted);
        }
        pc
    }

    /// Run until a breakpoint, a halt, or a stop request. Blocks the caller
    /// for the whole run; there is no timeout.
    pub fn run(&self) -> Transition {
        if self.state() == RunState::Halted {
            return Transition::Halt {
                pc: self.machine().cpu.breakpoint_pc(),
            };
        }
        // Only requests older than this run are dropped.
        self.shared.stop.store(false, Ordering::SeqCst);
        let transition = match self.control.send(Control::Run) {
            Ok(()) => self.events.recv().ok(),
            Err(_) => None,
        };
        transition.unwrap_or_else(|| {
            tracing::error!("run loop worker is gone");
            Transition::Stop {
                pc: self.machine().cpu.breakpoint_pc(),
            }
        })
    }

    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.shared.stop))
    }

    pub fn trace(&self) -> bool {
        self.shared.trace.load(Ordering::SeqCst)
    }

    pub fn set_trace(&self, on: bool) {
        self.shared.trace.store(on, Ordering::SeqCst);
    }

    // -----------------------------------------------------------------------
    // Breakpoints
    // -----------------------------------------------------------------------

    /// Insert a breakpoint. Addresses the processor cannot reach are
    /// rejected and leave the set unchanged.
    pub fn set_breakpoint(&self, addr: u32) -> Result<(), OutOfRange> {
        {
            let machine = self.machine();
            let raw = addr as i64 + machine.cpu.fetch_offset() as i64;
            let size = machine.mem.size() as i64;
            if addr as i64 >= size || raw < 0 || raw >= size {
                return Err(OutOfRange(addr));
            }
        }
        self.breakpoints().insert(addr);
        Ok(())
    }

    pub fn clear_breakpoint(&self, addr: u32) -> bool {
        self.breakpoints().remove(&addr)
    }

    pub fn clear_breakpoints(&self) {
        self.breakpoints().clear();
    }

    /// Breakpoints in ascending address order.
    pub fn breakpoint_list(&self) -> Vec<u32> {
        self.breakpoints().iter().copied().collect()
    }

    fn breakpoints(&self) -> MutexGuard<'_, BTreeSet<u32>> {
        self.shared
            .breakpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.request_stop();
        let _ = self.control.send(Control::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::Bus;
    use crate::core::memory::AddressSpace;
    use crate::cpu::{ByteCursor, Disassembler, Processor, RegisterValue, StateError};

    /// Executes one-byte no-ops forever.
    struct Spin {
        pc: u32,
    }

    impl Processor for Spin {
        fn pc(&self) -> u32 {
            self.pc
        }
        fn set_pc(&mut self, pc: u32) {
            self.pc = pc;
        }
        fn step(&mut self, bus: &mut dyn Bus) -> bool {
            bus.read(self.pc);
            self.pc = (self.pc + 1) & 0xff;
            true
        }
        fn registers(&self) -> &'static [&'static str] {
            &["pc"]
        }
        fn register(&self, name: &str) -> Result<RegisterValue, StateError> {
            match name {
                "pc" => Ok(RegisterValue::U8(self.pc as u8)),
                _ => Err(StateError::UnknownRegister(name.to_string())),
            }
        }
        fn set_register(&mut self, name: &str, value: u32) -> Result<(), StateError> {
            match name {
                "pc" => {
                    self.pc = value & 0xff;
                    Ok(())
                }
                _ => Err(StateError::UnknownRegister(name.to_string())),
            }
        }
        fn flags(&self) -> &'static [&'static str] {
            &[]
        }
        fn flag(&self, name: &str) -> Result<bool, StateError> {
            Err(StateError::UnknownFlag(name.to_string()))
        }
        fn set_flag(&mut self, name: &str, _value: bool) -> Result<(), StateError> {
            Err(StateError::UnknownFlag(name.to_string()))
        }
    }

    struct Nop;

    impl Disassembler for Nop {
        fn decode(&self, cursor: &mut ByteCursor<'_>) -> String {
            cursor.fetch();
            "nop".to_string()
        }
        fn max_len(&self) -> usize {
            1
        }
    }

    fn spin_machine() -> Machine {
        let mut mem = AddressSpace::new(0x100);
        mem.map_ram(0, vec![0; 0x100]);
        Machine::new(Box::new(Spin { pc: 0 }), mem, Box::new(Nop))
    }

    #[test]
    fn test_stop_between_request_and_first_check() {
        let (out, _) = Output::capture();
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(0);
        let mut shared = Shared::new(spin_machine(), out);
        shared.run_gate = Some(gate_rx);
        let coord = Coordinator::spawn(shared);

        thread::scope(|s| {
            let run = s.spawn(|| coord.run());
            // The worker has taken the run request and waits at the gate.
            gate_tx.send(()).unwrap();
            coord.request_stop();
            gate_tx.send(()).unwrap();
            assert_eq!(run.join().unwrap(), Transition::Stop { pc: 0 });
        });
        assert_eq!(coord.state(), RunState::Paused);
    }
}
