//! Build context creation for scanflow
//!
//! Walks a context directory, filters it through hierarchical ignore rules,
//! and streams what remains into a compressed tar archive spooled on disk,
//! ready for a single sequential upload.

pub mod archive;
pub mod error;
pub mod ignore;

pub use archive::{ContextArchive, ContextArchiver, ContextStats, format_size};
pub use error::{ContextError, Result};
pub use ignore::IgnoreRuleSet;
