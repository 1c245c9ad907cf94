use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    BracketSchedule, IncomeTaxRules, JurisdictionRuleSet, RuleSetError, RuleSetRepository,
    RuleSetSource, RuleSetSourceError, StampDutyRules, TaxBracket,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::manifest::RuleSetManifest;

/// File name of the bracket table inside a data directory.
pub const BRACKETS_FILE: &str = "brackets.csv";

/// Errors that can occur when loading rule-set data.
#[derive(Debug, Error)]
pub enum RuleSetLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{jurisdiction} from {effective_from} is missing its {schedule} brackets")]
    MissingSchedule {
        jurisdiction: String,
        effective_from: NaiveDate,
        schedule: ScheduleKind,
    },

    #[error("{schedule} brackets for {jurisdiction} from {effective_from} have no manifest section")]
    OrphanBrackets {
        jurisdiction: String,
        effective_from: NaiveDate,
        schedule: ScheduleKind,
    },

    #[error("invalid {schedule} brackets for {jurisdiction} from {effective_from}: {source}")]
    InvalidSchedule {
        jurisdiction: String,
        effective_from: NaiveDate,
        schedule: ScheduleKind,
        #[source]
        source: RuleSetError,
    },

    #[error("invalid rule set: {0}")]
    RuleSet(#[from] RuleSetError),
}

impl From<csv::Error> for RuleSetLoaderError {
    fn from(err: csv::Error) -> Self {
        RuleSetLoaderError::CsvParse(err.to_string())
    }
}

/// Which schedule of a rule set a bracket row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    IncomeSingle,
    IncomeMarried,
    StampDutyGeneral,
    StampDutyFirstTimeBuyer,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeSingle => "income_single",
            Self::IncomeMarried => "income_married",
            Self::StampDutyGeneral => "stamp_duty_general",
            Self::StampDutyFirstTimeBuyer => "stamp_duty_first_time_buyer",
        }
    }
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record from the bracket CSV file.
///
/// - `jurisdiction`: jurisdiction code (e.g., MT)
/// - `effective_from`: first day of the rule-set version (YYYY-MM-DD)
/// - `schedule`: which schedule the row belongs to
/// - `lower_bound`: inclusive lower bound of the bracket
/// - `upper_bound`: exclusive upper bound (empty for unbounded)
/// - `rate`: the marginal rate as a decimal (e.g., 0.15 for 15%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub jurisdiction: String,
    pub effective_from: NaiveDate,
    pub schedule: ScheduleKind,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

type ScheduleKey = (String, NaiveDate, ScheduleKind);

/// Loader for rule sets from TOML manifests and a CSV bracket table.
///
/// A data directory holds one `*.toml` manifest per rule-set version and a
/// shared [`BRACKETS_FILE`]. The loader joins them into validated
/// [`JurisdictionRuleSet`]s.
pub struct RuleSetLoader;

impl RuleSetLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, RuleSetLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse one TOML manifest. `path` is only used in error messages.
    pub fn parse_manifest(
        text: &str,
        path: &Path,
    ) -> Result<RuleSetManifest, RuleSetLoaderError> {
        toml::from_str(text).map_err(|err| RuleSetLoaderError::Manifest {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Join manifests with their bracket schedules.
    ///
    /// Every bracket row must belong to a manifest section that uses it,
    /// and every section that needs a schedule must find one. Rows of one
    /// schedule may appear in any order.
    pub fn assemble(
        manifests: Vec<RuleSetManifest>,
        records: &[BracketRecord],
    ) -> Result<Vec<JurisdictionRuleSet>, RuleSetLoaderError> {
        let mut schedules = Self::group_brackets(records)?;
        let mut rule_sets = Vec::with_capacity(manifests.len());

        for manifest in manifests {
            let code = JurisdictionRuleSet::normalize_code(&manifest.jurisdiction)?;
            let from = manifest.effective_from;
            let mut take = |kind: ScheduleKind| schedules.remove(&(code.clone(), from, kind));

            let income_tax = match manifest.income_tax {
                Some(income) => {
                    let single = take(ScheduleKind::IncomeSingle).ok_or_else(|| {
                        RuleSetLoaderError::MissingSchedule {
                            jurisdiction: code.clone(),
                            effective_from: from,
                            schedule: ScheduleKind::IncomeSingle,
                        }
                    })?;
                    Some(IncomeTaxRules {
                        single,
                        married: take(ScheduleKind::IncomeMarried),
                        allowances: income.allowances,
                        adjustment: income.adjustment,
                    })
                }
                None => None,
            };

            let stamp_duty = match manifest.stamp_duty {
                Some(_) => {
                    let general = take(ScheduleKind::StampDutyGeneral).ok_or_else(|| {
                        RuleSetLoaderError::MissingSchedule {
                            jurisdiction: code.clone(),
                            effective_from: from,
                            schedule: ScheduleKind::StampDutyGeneral,
                        }
                    })?;
                    Some(StampDutyRules {
                        general,
                        first_time_buyer: take(ScheduleKind::StampDutyFirstTimeBuyer),
                    })
                }
                None => None,
            };

            let rule_set = JurisdictionRuleSet {
                jurisdiction_code: code,
                effective_from: from,
                effective_to: manifest.effective_to,
                currency: manifest.currency,
                income_tax,
                corporate_tax: manifest.corporate_tax,
                vat: manifest.vat,
                social_security: manifest.social_security,
                stamp_duty,
                capital_gains: manifest.capital_gains,
            };
            rule_set.validate()?;
            debug!(
                jurisdiction = %rule_set.jurisdiction_code,
                effective_from = %rule_set.effective_from,
                "assembled rule set"
            );
            rule_sets.push(rule_set);
        }

        if let Some((jurisdiction, effective_from, schedule)) = schedules.into_keys().next() {
            return Err(RuleSetLoaderError::OrphanBrackets {
                jurisdiction,
                effective_from,
                schedule,
            });
        }

        Ok(rule_sets)
    }

    /// Read every manifest in `dir` plus its bracket table.
    ///
    /// Manifests are read in file-name order. A missing bracket table is
    /// treated as empty.
    pub fn load_dir(dir: &Path) -> Result<Vec<JurisdictionRuleSet>, RuleSetLoaderError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| RuleSetLoaderError::Io { path, source }
        };

        let entries = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .map(|entry| entry.map(|entry| entry.path()));
        let manifest_paths = Self::manifest_paths(dir, entries)?;

        let mut manifests = Vec::with_capacity(manifest_paths.len());
        for path in &manifest_paths {
            let text = fs::read_to_string(path).map_err(io_error(path))?;
            manifests.push(Self::parse_manifest(&text, path)?);
        }

        let brackets_path = dir.join(BRACKETS_FILE);
        let records = if brackets_path.exists() {
            let file = fs::File::open(&brackets_path).map_err(io_error(&brackets_path))?;
            Self::parse_brackets(file)?
        } else {
            Vec::new()
        };

        info!(
            dir = %dir.display(),
            manifests = manifests.len(),
            brackets = records.len(),
            "read rule-set data"
        );
        Self::assemble(manifests, &records)
    }

    /// The `*.toml` paths among `entries`, sorted by name.
    ///
    /// A directory entry that cannot be read fails the whole listing.
    fn manifest_paths(
        dir: &Path,
        entries: impl IntoIterator<Item = io::Result<PathBuf>>,
    ) -> Result<Vec<PathBuf>, RuleSetLoaderError> {
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| RuleSetLoaderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Replace the contents of `repository` with the rule sets in `dir`.
    ///
    /// Nothing is replaced when any rule set fails to load or validate.
    pub fn load_into(
        repository: &RuleSetRepository,
        dir: &Path,
    ) -> Result<usize, RuleSetLoaderError> {
        let rule_sets = Self::load_dir(dir)?;
        Ok(repository.replace_all(rule_sets)?)
    }

    fn group_brackets(
        records: &[BracketRecord]
    ) -> Result<BTreeMap<ScheduleKey, BracketSchedule>, RuleSetLoaderError> {
        let mut groups: BTreeMap<ScheduleKey, Vec<TaxBracket>> = BTreeMap::new();
        for record in records {
            let code = JurisdictionRuleSet::normalize_code(&record.jurisdiction)?;
            groups
                .entry((code, record.effective_from, record.schedule))
                .or_default()
                .push(TaxBracket::new(record.lower_bound, record.upper_bound, record.rate));
        }

        groups
            .into_iter()
            .map(|((jurisdiction, effective_from, schedule), mut brackets)| {
                brackets.sort_by_key(|bracket| bracket.lower_bound);
                match BracketSchedule::new(brackets) {
                    Ok(built) => Ok(((jurisdiction, effective_from, schedule), built)),
                    Err(source) => Err(RuleSetLoaderError::InvalidSchedule {
                        jurisdiction,
                        effective_from,
                        schedule,
                        source,
                    }),
                }
            })
            .collect()
    }
}

/// A data directory as a [`RuleSetSource`].
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RuleSetSource for DirectorySource {
    fn name(&self) -> String {
        self.dir.display().to_string()
    }

    fn load(&self) -> Result<Vec<JurisdictionRuleSet>, RuleSetSourceError> {
        RuleSetLoader::load_dir(&self.dir).map_err(|err| match err {
            RuleSetLoaderError::RuleSet(invalid) => RuleSetSourceError::Invalid(invalid),
            other => RuleSetSourceError::Load {
                source_name: self.name(),
                error: Box::new(other),
            },
        })
    }
}
