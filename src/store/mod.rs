pub mod floor;
pub mod ledger;

pub use floor::FloorState;
pub use ledger::{DefectEntry, DefectLedger};
