//! Application layer - the reconciliation and tagging workflows.

pub mod listing;
pub mod reconcile;
pub mod resolve;
pub mod tag;

pub use listing::{TagGroup, VersionTags, full_match_regex, tags_by_name, versions_with_tags};
pub use reconcile::{Action, ActionReport, ReconcileOptions, Reconciler};
pub use resolve::{Resolution, SourceResolver};
pub use tag::{TagBatchReport, Tagger, locate_project};
