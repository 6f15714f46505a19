//! Survey data access for Surveyor.
//!
//! - [`SurveyStore`]: the CSV table of survey questions
//! - [`CrossSurveyLookup`]: exact/partial variable-name lookup across surveys
//! - [`EmbeddedIndex`]: semantic search over an offline-built embedding index

pub mod index;
pub mod lookup;
pub mod store;

pub use index::{EmbeddedIndex, IndexEntry, cosine_similarity};
pub use lookup::{CrossSurveyLookup, LookupOutcome, MISSING_DATA_MESSAGE};
pub use store::{StoreError, SurveyRecord, SurveyStore};
