//! The import pipeline: preview (parse → validate → resolve) and apply.
//!
//! A preview is built against a roster snapshot and carries the snapshot's
//! generation; the applier refuses to commit once the roster has moved on.

pub mod applier;
pub mod pipeline;
pub mod resolver;

pub use applier::{apply, ApplyOutcome};
pub use pipeline::{preview_bytes, preview_parsed, preview_text};
pub use resolver::RosterSnapshot;
