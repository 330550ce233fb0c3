//! Hotel booking dashboard: load a bookings table, filter it by hotel,
//! country and arrival month, summarise the result and export it to a
//! spreadsheet.
//!
//! ```text
//!   data::loader ─► data::filter ─► report::summarize ─► chart / export
//!                        ▲
//!                     session (selection + config)
//! ```

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod report;
pub mod session;
