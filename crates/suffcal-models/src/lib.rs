//! Core data models for Suffcal.
//!
//! This crate provides the plain data types shared by every Suffcal crate:
//! downloaded photos and their ids, posts as reported by the media network,
//! and the calendar events extracted from photo text.

pub mod event;
pub mod ids;
pub mod photo;

// Re-export main types
pub use event::{Event, EventDate};
pub use ids::PhotoId;
pub use photo::{MediaType, Photo, Post};
