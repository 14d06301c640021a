pub mod mock;
pub mod prg;
pub mod registry;
pub mod rom_loader;
pub mod sandbox;

pub use mock::{MockDisassembler, MockProcessor};
pub use sandbox::SandboxModule;
