//! License expiry tracking: load a roster, classify each license by days
//! until expiry, summarise, filter and export a follow-up report.
//!
//! The egui front end in `main.rs` only wires these pieces to widgets.

pub mod color;
pub mod data;
pub mod state;
