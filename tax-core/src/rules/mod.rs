//! Storage and lookup of jurisdiction rule sets.

mod repository;
mod source;

pub use repository::{RuleSetIndex, RuleSetRepository};
pub use source::{RuleSetSource, RuleSetSourceError, StaticSource};
