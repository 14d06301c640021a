pub mod bus;
pub mod coordinator;
pub mod machine;
pub mod memory;
pub mod output;

pub use bus::{Bus, InterruptState};
pub use coordinator::{Coordinator, RunState, StopHandle, Transition};
pub use machine::{Machine, Setup};
pub use memory::{AddressSpace, Cell, DirectMode, MemoryEvent, RegionKind, Watch};
pub use output::{Capture, Output};
