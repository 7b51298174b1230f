//! Attribute design-system component usage to the owners listed in a
//! CODEOWNERS-style ownership manifest.
//!
//! The two entry points are [`build_index`], which reads and parses the
//! manifest, and [`aggregate`], which counts a scanner's usage report per
//! component and owner.
//!
//! ```
//! use codeowners_usage::{aggregate, build_index, UsageReport};
//!
//! let index = build_index("design-system/ @ds-team\nsrc/components/ @app-team\n")?;
//! let report = UsageReport::from_json_str(
//!     r#"{"Button": {"instances": [{"location": {"file": "src/components/Nav.jsx"}}]}}"#,
//! )?;
//!
//! let table = aggregate(&report, &index);
//! assert_eq!(table.count("Button", "@app-team"), 1);
//! # Ok::<(), codeowners_usage::Error>(())
//! ```

pub mod aggregate;
mod error;
pub mod index;
pub mod manifest;
pub mod parser;
pub mod pattern;
pub mod report;
mod source;

pub use aggregate::{
    aggregate, Aggregation, Aggregator, ResultTable, Unattributed, UnattributedReason,
};
pub use error::{Error, Result};
pub use index::{IndexCell, IndexOptions, OwnershipIndex};
pub use manifest::{Manifest, Owner, Rule};
pub use pattern::{MatchMode, Matcher};
pub use report::{UsageInstance, UsageReport};
pub use source::{ManifestFile, ManifestSource};

/// Build an [`OwnershipIndex`] from a manifest using substring matching.
pub fn build_index(source: impl ManifestSource) -> Result<OwnershipIndex> {
    OwnershipIndex::build(&source, IndexOptions::default())
}
