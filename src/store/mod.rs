//! Flat-file JSON persistence.
//!
//! Every collection lives in one JSON document under the data directory and is
//! rewritten as a whole on each mutation:
//!
//! ```text
//! {data_dir}/users.json              → [User, ...]
//! {data_dir}/otps.json               → { email: OtpRecord }
//! {data_dir}/assignment_scores.json  → { "{email}-{courseId}-{moduleId}": AssignmentScore }
//! {data_dir}/assignments.json        → { courseId: { moduleId: <questions> } }
//! ```
//!
//! Plain reads are fail-soft: missing or corrupt documents fall back to a
//! default. Mutations read strictly, so a document that exists but cannot be
//! parsed is left alone rather than replaced. Writes go through a temp file and
//! a rename so readers never observe a partially written document.

mod collection;
mod json_file;

pub use collection::{Change, Collection};
pub use json_file::{JsonStore, StoreError};
