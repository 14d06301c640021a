use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use scanline_core::core::{Output, StopHandle};
use scanline_core::monitor::{Flow, Monitor, ScriptSource};
use scanline_machines::registry;
use scanline_machines::rom_loader::RomSet;
use tracing_subscriber::EnvFilter;

mod config;
mod editor;
mod rom_path;

use config::MonitorConfig;
use editor::EditorSource;

const DEFAULT_MACHINE: &str = "sandbox";

#[derive(Parser, Debug)]
#[command(name = "scanline", about = "Interactive machine-code monitor")]
struct Args {
    /// Machine to attach to (see --list)
    machine: Option<String>,

    /// Directory holding ROM files, or one directory per machine
    #[arg(long, value_name = "DIR")]
    roms: Option<PathBuf>,

    /// Config file instead of the per-user monitor.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read commands from a file instead of the terminal
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the available machines and exit
    #[arg(long)]
    list: bool,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Ctrl-C outside the line editor pauses a running machine instead of
/// ending the process.
fn interrupt_handler(stop: StopHandle) -> impl Fn() + Send + 'static {
    move || {
        tracing::debug!("interrupt, stopping run loop");
        stop.request_stop();
    }
}

fn load_config(args: &Args) -> Result<MonitorConfig, config::ConfigError> {
    match &args.config {
        Some(path) => MonitorConfig::load(path, true),
        None => match MonitorConfig::default_path() {
            Some(path) => MonitorConfig::load(&path, false),
            None => Ok(MonitorConfig::default()),
        },
    }
}

/// Apply session settings and run the startup commands. Returns
/// [`Flow::Quit`] if one of them quit.
fn apply_config(monitor: &mut Monitor, config: &MonitorConfig) -> Flow {
    if let Some(lines) = config.dasm_lines {
        monitor.session_mut().dasm_lines = lines.max(1);
    }
    if let Some(lines) = config.mem_lines {
        monitor.session_mut().mem_lines = lines.max(1);
    }
    if let Some(name) = &config.encoding
        && let Err(e) = monitor.set_encoding(name)
    {
        eprintln!("config: {e}");
    }
    monitor.coordinator().set_trace(config.trace);
    for addr in &config.breakpoints {
        if let Err(e) = monitor.exec(&format!("break set {addr}")) {
            eprintln!("config: {e}");
        }
    }
    for command in &config.startup {
        match monitor.exec(command) {
            Ok(Flow::Quit) => return Flow::Quit,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("{command}: {e}"),
        }
    }
    Flow::Continue
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.list {
        for entry in registry::all() {
            println!("{:<10} {}", entry.name, entry.description);
        }
        return Ok(());
    }

    let config = load_config(&args)?;
    let machine_name = args
        .machine
        .as_deref()
        .or(config.machine.as_deref())
        .unwrap_or(DEFAULT_MACHINE);
    let Some(entry) = registry::find(machine_name) else {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        return Err(format!(
            "unknown machine: {machine_name} (available: {})",
            names.join(", ")
        )
        .into());
    };

    let rom_set = match args.roms.as_ref().or(config.roms.as_ref()) {
        Some(path) => rom_path::load_rom_set(entry.name, path)?,
        None => RomSet::empty(),
    };
    let setup = (entry.create)(&rom_set)?;
    tracing::info!(machine = entry.name, "machine created");

    let mut monitor = Monitor::new(setup, Output::stdout());
    if let Err(e) = ctrlc::set_handler(interrupt_handler(monitor.coordinator().stop_handle())) {
        tracing::warn!("Ctrl-C will not pause the machine: {e}");
    }
    if apply_config(&mut monitor, &config) == Flow::Quit {
        return Ok(());
    }

    match &args.script {
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
            monitor.run(&mut ScriptSource::new(BufReader::new(file)));
        }
        None => {
            let mut source = EditorSource::new(monitor.completions(), config.history_path())?;
            monitor.run(&mut source);
            source.save_history();
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("scanline: {e}");
            ExitCode::FAILURE
        }
    }
}
