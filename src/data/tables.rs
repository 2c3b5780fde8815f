//! Reward-table configuration: the breath (token/composite) event and the starlight ladder.
//! Loaded once at start-up from YAML or JSON; the built-in set is `data/tables.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::validate::{validate_tables, ValidationReport, ValidationSeverity};
use crate::gacha::allocator::{CompositeRequirements, TokenInventory};
use crate::gacha::pool::StageGraph;

const BUILTIN_TABLES_YAML: &str = include_str!("../../data/tables.yaml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reward tables failed validation with {} error(s): {}", .0.error_count(), .0)]
    Invalid(ValidationReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTables {
    pub breath: BreathEvent,
    pub starlight: LadderEvent,
}

/// Flat token table plus the composites those tokens fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathEvent {
    /// Points per draw.
    pub cost_per_draw: f64,
    pub token_rates: Vec<TokenRate>,
    pub composites: Vec<Composite>,
    /// Composite names, highest value first.
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRate {
    pub name: String,
    /// Percentage, 0-100.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderEvent {
    /// Points per stage-1 draw.
    pub cost_per_draw: f64,
    pub graph: StageGraph,
}

impl BreathEvent {
    pub fn requirements(&self) -> CompositeRequirements {
        self.composites
            .iter()
            .map(|composite| (composite.name.clone(), composite.requires.clone()))
            .collect()
    }

    pub fn composite(&self, name: &str) -> Option<&Composite> {
        self.composites.iter().find(|composite| composite.name == name)
    }

    /// Expected quantity of every token after `draw_count` draws.
    pub fn expected_tokens(&self, draw_count: f64) -> TokenInventory {
        self.token_rates
            .iter()
            .map(|token| (token.name.clone(), draw_count * token.rate / 100.0))
            .collect()
    }
}

impl EventTables {
    /// Built-in tables, validated.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse_builtin()?.into_validated("built-in tables")
    }

    /// Built-in tables without validation.
    pub fn parse_builtin() -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(BUILTIN_TABLES_YAML)?)
    }

    /// Read and validate a table file. `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let tables = Self::parse_file(path)?;
        tables.into_validated(&path.display().to_string())
    }

    /// Read a table file without validating it.
    pub fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(serde_yaml::from_str(&raw)?)
        }
    }

    /// Built-in tables when `path` is `None`, else the file at `path`.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    fn into_validated(self, source: &str) -> Result<Self, ConfigError> {
        let report = validate_tables(&self);
        for diagnostic in &report.diagnostics {
            match diagnostic.severity {
                ValidationSeverity::Error => {
                    log::error!("{source}: {}: {}", diagnostic.context, diagnostic.message)
                }
                ValidationSeverity::Warning => {
                    log::warn!("{source}: {}: {}", diagnostic.context, diagnostic.message)
                }
            }
        }
        if report.has_errors() {
            return Err(ConfigError::Invalid(report));
        }
        log::info!(
            "loaded reward tables from {source}: {} tokens, {} composites, {} ladder stages",
            self.breath.token_rates.len(),
            self.breath.composites.len(),
            self.starlight.graph.final_stage()
        );
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse_and_validate() {
        let tables = EventTables::builtin().expect("built-in tables are valid");
        assert_eq!(tables.breath.cost_per_draw, 27.0);
        assert_eq!(tables.breath.token_rates.len(), 12);
        assert_eq!(tables.breath.priority, ["super", "large", "medium", "small"]);
        assert_eq!(tables.starlight.cost_per_draw, 45.0);
        assert_eq!(tables.starlight.graph.final_stage(), 5);
        assert_eq!(tables.starlight.graph.seed_per_entry(), 4.0);
    }

    #[test]
    fn expected_tokens_scale_with_draw_count() {
        let tables = EventTables::builtin().expect("built-in tables");
        let tokens = tables.breath.expected_tokens(100.0);
        assert!((tokens.get("Rabbit") - 29.2).abs() < 1e-9);
        assert!((tokens.get("Horse") - 0.15).abs() < 1e-9);
    }

    #[test]
    fn invalid_file_names_the_failing_rule() {
        let path = std::env::temp_dir().join(format!(
            "gacha-ev-tables-{}-bad-sum.yaml",
            std::process::id()
        ));
        let broken = BUILTIN_TABLES_YAML
            .replace("{ name: Horse, rate: 0.15 }", "{ name: Horse, rate: 5.15 }");
        fs::write(&path, broken).expect("write temp tables");

        let err = EventTables::load(&path).expect_err("sum is off");
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Invalid(_)));
        let message = err.to_string();
        assert!(message.contains("1 error(s)"), "{message}");
        assert!(message.contains("breath.token_rates"), "{message}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EventTables::load(Path::new("does/not/exist.yaml")).expect_err("missing");
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
