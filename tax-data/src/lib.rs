//! Loading jurisdiction rule sets from TOML manifests and CSV bracket tables.

mod loader;
mod manifest;

pub use loader::{
    BRACKETS_FILE, BracketRecord, DirectorySource, RuleSetLoader, RuleSetLoaderError, ScheduleKind,
};
pub use manifest::{IncomeTaxManifest, RuleSetManifest, StampDutyManifest};
