//! Input tables.

pub mod loader;

pub use loader::{DataPaths, PlanTable, SiteDirectory, VendorDirectory};
