use std::path::PathBuf;

use scanline_core::core::{Capture, Output};
use scanline_core::monitor::module::complete;
use scanline_core::monitor::{Monitor, ScriptSource};
use scanline_machines::registry;
use scanline_machines::rom_loader::RomSet;

fn sandbox() -> (Monitor, Capture) {
    let entry = registry::find("sandbox").unwrap();
    let setup = (entry.create)(&RomSet::empty()).unwrap();
    let (out, capture) = Output::capture();
    (Monitor::new(setup, out), capture)
}

fn run(input: &[&str]) -> String {
    let (mut monitor, capture) = sandbox();
    let script = input.join("\n");
    monitor.run(&mut ScriptSource::new(script.as_bytes()));
    capture.contents()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_io_latches() {
    let out = run(&[
        "sandbox io",
        "sandbox in $5a",
        "peek $d000",
        "poke $d001 $33",
        "peek $d001",
        "sandbox out",
        "sandbox in",
        "q",
    ]);
    assert_eq!(
        out,
        "in:$00 out:$00 ctl:$00\n$5a +90\n$00 +0\n$33 +51\n$5a +90\n"
    );
}

#[test]
fn test_watch_io() {
    let out = run(&[
        "sandbox watch-io on",
        "watch",
        "poke $d002 1",
        "sandbox watch-io off",
        "poke $d002 2",
        "watch",
        "q",
    ]);
    assert_eq!(
        out,
        "$d000 r\n$d001 w\n$d002 rw\nwrite($d002) => $01\n"
    );
}

#[test]
fn test_unmapped_window_and_mirrors() {
    let out = run(&["poke $d080 $12", "peek $d080", "poke $10 $77", "peek $1810", "q"]);
    assert_eq!(out, "$00 +0\n$77 +119\n");
}

#[test]
fn test_module_errors() {
    let out = run(&[
        "sandbox",
        "sandbox frob",
        "sandbox io now",
        "sandbox in $100",
        "sandbox load-prg x 2",
        "q",
    ]);
    assert_eq!(
        out,
        [
            "invalid number of arguments",
            "no such command: frob",
            "invalid number of arguments",
            "invalid argument: $100",
            "invalid argument: 2",
        ]
        .join("\n")
            + "\n"
    );
}

#[test]
fn test_load_prg_basic() {
    let dir = temp_dir("scanline_prg_test_basic");
    std::fs::write(dir.join("hello.prg"), [0x01, 0x08, 0xaa, 0xbb]).unwrap();
    let stem = dir.join("hello");
    let load = format!("sandbox load-prg {}", stem.display());

    let out = run(&[load.as_str(), "peek $0801", "peek $0802", "peek $2d", "peek $2f", "q"]);
    assert_eq!(out, "$aa +170\n$bb +187\n$03 +3\n$03 +3\n");
}

#[test]
fn test_load_prg_machine_code() {
    let dir = temp_dir("scanline_prg_test_code");
    let path = dir.join("code.prg");
    std::fs::write(&path, [0x00, 0x30, 0x60]).unwrap();
    let load = format!("sandbox load-prg {} 1", path.display());

    let out = run(&[load.as_str(), "peek $3000", "peek $2d", "q"]);
    assert_eq!(out, "$60 +96\n$00 +0\n");
}

#[test]
fn test_load_prg_failures() {
    let dir = temp_dir("scanline_prg_test_bad");
    std::fs::write(dir.join("short.prg"), [0x01]).unwrap();
    let short = format!("sandbox load-prg {}", dir.join("short").display());
    let missing = format!("sandbox load-prg {}", dir.join("missing").display());

    let out = run(&[short.as_str(), missing.as_str(), "q"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        format!("invalid prg file: {}", dir.join("short.prg").display())
    );
    assert!(lines[1].starts_with(&dir.join("missing.prg").display().to_string()));
}

#[test]
fn test_completion_includes_module() {
    let (monitor, _) = sandbox();
    let tree = monitor.completions();
    assert_eq!(complete(&tree, &["sandbox"], "w"), ["watch-io"]);
    assert_eq!(complete(&tree, &["sandbox", "watch-io"], "o"), ["off", "on"]);
    assert_eq!(complete(&tree, &[], "sa"), ["sandbox"]);
}
