//! Machine registry for front-end discovery.
//!
//! Each machine self-registers with [`inventory::submit!`] and a
//! [`MachineEntry`]; the front end lists and builds them without a central
//! table.

use scanline_core::core::machine::Setup;

use crate::rom_loader::{RomLoadError, RomSet};

pub struct MachineEntry {
    /// Name used to select the machine on the command line.
    pub name: &'static str,
    pub description: &'static str,
    /// Build the machine, its monitor modules and encodings.
    pub create: fn(&RomSet) -> Result<Setup, RomLoadError>,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        create: fn(&RomSet) -> Result<Setup, RomLoadError>,
    ) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// All registered machines, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
