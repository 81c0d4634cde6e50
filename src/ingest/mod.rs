//! Data Loader
//!
//! - `columns`: header folding, header -> neutral id mapping, display labels
//! - `loader`: CSV parsing into a `Dataset`

pub mod columns;
pub mod loader;

pub use columns::{display_label, zone_label, HeaderMapper};
pub use loader::{load_csv, parse_csv, IngestError, IngestReport};
