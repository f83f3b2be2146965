//! In-memory snapshot of every table the join engine reads.

use super::activity::StatusLog;
use super::asset::{Cutter, Mold, MoldCutterLink};
use super::reference::{Company, Employee, MoldDesign, Rack, RackLayer};

/// Raw tables as loaded from CSV or SQLite, before denormalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTables {
    pub molds: Vec<Mold>,
    pub cutters: Vec<Cutter>,
    pub designs: Vec<MoldDesign>,
    pub racks: Vec<Rack>,
    pub rack_layers: Vec<RackLayer>,
    pub companies: Vec<Company>,
    pub employees: Vec<Employee>,
    pub mold_cutters: Vec<MoldCutterLink>,
    pub status_logs: Vec<StatusLog>,
}

impl RawTables {
    pub fn is_empty(&self) -> bool {
        self.molds.is_empty() && self.cutters.is_empty()
    }

    /// Row counts per table, in a stable order for logging.
    pub fn row_counts(&self) -> [(&'static str, usize); 9] {
        [
            ("molds", self.molds.len()),
            ("cutters", self.cutters.len()),
            ("designs", self.designs.len()),
            ("racks", self.racks.len()),
            ("rack_layers", self.rack_layers.len()),
            ("companies", self.companies.len()),
            ("employees", self.employees.len()),
            ("mold_cutters", self.mold_cutters.len()),
            ("status_logs", self.status_logs.len()),
        ]
    }
}
