//! Suffcal application library.
//!
//! Wires the tracker, the extraction pipeline and the calendar together
//! behind a small command-line interface.

pub mod cli;
pub mod commands;
pub mod error;
pub mod forward;

pub use error::{AppError, Result};
pub use forward::{calendar_entry, CalendarForwarder, Skip};
