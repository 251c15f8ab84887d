//! Event extraction for Suffcal.
//!
//! Turns a photo into calendar events in three steps:
//!
//! 1. the OCR collaborator reads the text on the photo
//! 2. the language model describes the event(s) in that text as JSON
//! 3. the answer is parsed, repaired if necessary, and normalized
//!
//! Language models are unreliable JSON writers, so step 3 never fails:
//! [`recovery`] repairs the usual breakage (prose around the document,
//! single quotes, trailing commas, truncation) and anything beyond repair
//! yields a single text-only event.
//!
//! # Modules
//!
//! - **extractor**: the pipeline itself
//! - **recovery**: staged JSON repair
//! - **dates**: date and time-of-day normalization
//! - **prompt**: the instruction template sent to the model

pub mod dates;
pub mod error;
pub mod extractor;
pub mod prompt;
pub mod recovery;

pub use dates::{parse_date_text, parse_time_of_day, resolve_date, RawDate};
pub use error::{ExtractError, Result};
pub use extractor::{Clock, Extractor};
pub use recovery::{recover_json, RecoveryError};
