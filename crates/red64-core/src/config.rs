use crate::error::{Red64Error, Result};
use crate::paths;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";
pub const DEFAULT_MAX_TOKENS: u32 = 3000;
pub const DEFAULT_STANDARDS_PRIORITY: f64 = 3.0;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// OverflowBehavior
// ---------------------------------------------------------------------------

/// What the budget allocator may do with items that do not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowBehavior {
    #[serde(default = "default_true")]
    pub truncate: bool,
    #[serde(default = "default_true")]
    pub exclude: bool,
    #[serde(default = "default_true")]
    pub summary: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OverflowBehavior {
    fn default() -> Self {
        Self {
            truncate: true,
            exclude: true,
            summary: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TokenBudget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBudget {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub overflow_behavior: OverflowBehavior,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overflow_behavior: OverflowBehavior::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContextLoaderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLoaderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub task_detection: bool,
    #[serde(default = "default_true")]
    pub file_type_detection: bool,
}

impl Default for ContextLoaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            task_detection: true,
            file_type_detection: true,
        }
    }
}

// ---------------------------------------------------------------------------
// StandardsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsConfig {
    /// Enabled standard identifiers, highest precedence first.
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default = "default_standards_priority")]
    pub token_budget_priority: f64,
}

fn default_standards_priority() -> f64 {
    DEFAULT_STANDARDS_PRIORITY
}

impl Default for StandardsConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            token_budget_priority: default_standards_priority(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version", deserialize_with = "deserialize_version")]
    pub version: String,
    #[serde(default)]
    pub token_budget: TokenBudget,
    #[serde(default)]
    pub context_loader: ContextLoaderConfig,
    #[serde(default)]
    pub standards: StandardsConfig,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// `version: 1.0` is a YAML float; accept it as well as the quoted form.
fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "version must be a string or number, got {other:?}"
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            token_budget: TokenBudget::default(),
            context_loader: ContextLoaderConfig::default(),
            standards: StandardsConfig::default(),
        }
    }
}

impl Config {
    /// Load `.red64/config.yaml` under `root`.
    ///
    /// An absent file is [`Red64Error::ConfigNotFound`]. An empty file, a
    /// document that is not a mapping, invalid YAML, or a zero token budget
    /// is [`Red64Error::ConfigMalformed`].
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.is_file() {
            return Err(Red64Error::ConfigNotFound);
        }
        let data = std::fs::read_to_string(&path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Err(Red64Error::ConfigMalformed("config file is empty".into()));
        }
        let value: serde_yaml::Value = serde_yaml::from_str(data)
            .map_err(|e| Red64Error::ConfigMalformed(format!("invalid YAML: {e}")))?;
        if !value.is_mapping() {
            return Err(Red64Error::ConfigMalformed(
                "config file must contain a YAML mapping".into(),
            ));
        }
        let cfg: Config = serde_yaml::from_value(value)
            .map_err(|e| Red64Error::ConfigMalformed(e.to_string()))?;
        if cfg.token_budget.max_tokens == 0 {
            return Err(Red64Error::ConfigMalformed(
                "token_budget.max_tokens must be greater than 0".into(),
            ));
        }
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != SCHEMA_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "config version '{}' differs from supported version '{}'",
                    self.version, SCHEMA_VERSION
                ),
            });
        }

        if self.token_budget.max_tokens == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "token_budget.max_tokens must be greater than 0".into(),
            });
        }

        let overflow = self.token_budget.overflow_behavior;
        if !overflow.truncate && !overflow.exclude {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "overflow_behavior disables both truncate and exclude; \
                          oversized items will be force-truncated"
                    .into(),
            });
        }

        let mut seen = HashSet::new();
        for id in &self.standards.enabled {
            if id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "standards.enabled contains an empty identifier".into(),
                });
            } else if !seen.insert(id.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("standard '{id}' is enabled more than once"),
                });
            }
        }

        if !self.standards.token_budget_priority.is_finite() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "standards.token_budget_priority must be a finite number".into(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
