use anyhow::{anyhow, bail, Context, Result};
use modview_graph::{AggregationPolicy, LayoutConfig};
use modview_indexer::{DiscoveryOptions, ParseErrorPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file picked up from the working directory when no `--config` is given
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Run configuration, read once and turned into per-stage values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory names pruned during discovery
    pub skip_analyze: BTreeSet<String>,

    /// Prefix -> extra depth kept below it
    pub levels: BTreeMap<String, usize>,

    /// Drop modules matching no prefix of `levels`
    pub only_aggregates: bool,

    /// Uniform truncation depth; exclusive with `levels`
    pub depth: Option<usize>,

    pub respect_gitignore: bool,
    pub skip_unparsable: bool,
    pub layout: LayoutConfig,
}

impl Settings {
    /// Load `path`, or `settings.json` in the working directory when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::from_file(&default)
                } else {
                    log::debug!("No {DEFAULT_SETTINGS_FILE} found; using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let settings = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        };
        let settings =
            settings.with_context(|| format!("Invalid settings file {}", path.display()))?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| anyhow!("JSON settings error: {err}"))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("TOML settings error: {err}"))
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            skip_analyze: self.skip_analyze.clone(),
            respect_gitignore: self.respect_gitignore,
        }
    }

    pub fn parse_error_policy(&self) -> ParseErrorPolicy {
        if self.skip_unparsable {
            ParseErrorPolicy::Skip
        } else {
            ParseErrorPolicy::Fail
        }
    }

    pub fn aggregation_policy(&self) -> Result<AggregationPolicy> {
        let policy = match self.depth {
            Some(_) if !self.levels.is_empty() => {
                bail!("`depth` and `levels` are mutually exclusive")
            }
            Some(depth) => AggregationPolicy::Uniform(depth),
            None if self.levels.is_empty() && !self.only_aggregates => AggregationPolicy::Identity,
            None => AggregationPolicy::prefixes(self.levels.clone(), self.only_aggregates),
        };

        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn empty_document_is_all_defaults() {
        let settings = Settings::from_json("{}").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.layout, LayoutConfig::default());
        assert_eq!(settings.aggregation_policy().unwrap(), AggregationPolicy::Identity);
        assert_eq!(settings.parse_error_policy(), ParseErrorPolicy::Fail);
    }

    #[test]
    fn reads_the_classic_settings_shape() {
        let settings = Settings::from_json(
            r#"{
                "skip_analyze": ["tests", "venv"],
                "levels": {"app": 1, "app.core": 2},
                "only_aggregates": true
            }"#,
        )
        .unwrap();

        assert!(settings.discovery_options().skip_analyze.contains("venv"));
        assert_eq!(
            settings.aggregation_policy().unwrap(),
            AggregationPolicy::prefixes(
                BTreeMap::from([("app".to_string(), 1), ("app.core".to_string(), 2)]),
                true
            )
        );
    }

    #[test]
    fn rejects_unknown_keys_and_conflicting_policies() {
        assert!(Settings::from_json(r#"{"skip": []}"#).is_err());
        assert!(Settings::from_json(r#"{"layout": {"gravity": -10, "bounce": 1}}"#).is_err());

        let both = Settings::from_json(r#"{"depth": 2, "levels": {"app": 1}}"#).unwrap();
        assert!(both.aggregation_policy().is_err());

        let zero = Settings::from_json(r#"{"depth": 0}"#).unwrap();
        assert!(zero.aggregation_policy().is_err());
    }

    #[test]
    fn toml_files_are_parsed_as_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modview.toml");
        fs::write(
            &path,
            "depth = 2\nskip_unparsable = true\n\n[layout]\nspring_length = 90.0\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.aggregation_policy().unwrap(), AggregationPolicy::Uniform(2));
        assert_eq!(settings.parse_error_policy(), ParseErrorPolicy::Skip);
        assert_eq!(settings.layout.spring_length, 90.0);
        assert_eq!(settings.layout.damping, 0.4);
    }

    #[test]
    fn missing_explicit_file_names_the_path() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.json"))).unwrap_err();

        assert!(format!("{err:#}").contains("/nonexistent/settings.json"));
    }
}
