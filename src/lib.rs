//! Allied Health Professional workforce report pipelines.
//!
//! NWFS extract files and the PWR vacancy/contract query are normalised
//! through a role lookup table, aggregated, and written out as the series
//! behind each report chart.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod output;
pub mod pipeline;
pub mod pwr;
pub mod reconcile;
pub mod reports;
pub mod table;
pub mod types;
pub mod util;
