//! quizclips Catalog Model
//!
//! Defines the data contracts shared by the loader, the excerpt engine and
//! the catalog writer:
//! - **Records:** One typed row of the source spreadsheet
//! - **Slugs:** Deterministic excerpt filenames derived from a record identity
//! - **URLs:** Canonical video URL form used by every downstream stage
//! - **Catalog:** The JSON document consumed by the quiz page

pub mod loader;
pub mod record;
pub mod slug;
pub mod url;
pub mod writer;

pub use loader::*;
pub use record::*;
pub use slug::*;
pub use url::*;
pub use writer::*;
