// Loading group data from files: JSON snapshots and expense CSVs.

pub mod import;

pub use import::*;
