//! Configuration types and parsing for restrepo.yml

use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntityMetadata, MetadataRegistry};
use crate::sql_utils::is_valid_ident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main project configuration from restrepo.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Entity type definitions
    #[serde(default)]
    pub entities: Vec<EntityMetadata>,

    /// Repository declarations keyed by entity name
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the DuckDB database file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

/// Per-entity repository declaration: which input keys are applied on
/// writes and how criteria keys are rewritten on reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Identifying field used by `get(id)`; defaults to the entity's id field
    #[serde(default)]
    pub id_column: Option<String>,

    /// Scalar fields applied by `update`
    #[serde(default)]
    pub local_attributes: Vec<String>,

    /// Scalar fields applied by `create`; falls back to `local_attributes`
    #[serde(default)]
    pub local_create_attributes: Option<Vec<String>>,

    /// Associations applied by `update`
    #[serde(default)]
    pub foreign_attributes: Vec<String>,

    /// Associations applied by `create`; falls back to `foreign_attributes`
    #[serde(default)]
    pub foreign_create_attributes: Option<Vec<String>>,

    /// Virtual criteria keys that expand into joins
    #[serde(default)]
    pub foreign_criteria: BTreeMap<String, ForeignCriterionRule>,

    /// Incoming criteria keys to rename; `null` drops the key
    #[serde(default)]
    pub criteria_aliases: BTreeMap<String, Option<String>>,
}

impl RepositoryConfig {
    pub fn create_local_attributes(&self) -> &[String] {
        self.local_create_attributes
            .as_deref()
            .unwrap_or(&self.local_attributes)
    }

    pub fn create_foreign_attributes(&self) -> &[String] {
        self.foreign_create_attributes
            .as_deref()
            .unwrap_or(&self.foreign_attributes)
    }
}

/// Expansion of a virtual criteria key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignCriterionRule {
    /// Real field path the criterion applies to (e.g. `t.name`)
    pub field: String,

    /// Extra select expressions
    #[serde(default)]
    pub select: Vec<String>,

    /// Joins the field path depends on
    #[serde(default)]
    pub joins: Vec<JoinClause>,
}

/// A join contributed by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinClause {
    #[serde(default)]
    pub kind: JoinKind,

    pub table: String,

    pub alias: String,

    /// Join condition, e.g. `t.id = e.team_id`
    pub on: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a project directory
    /// Looks for restrepo.yml or restrepo.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("restrepo.yml");
        let yaml_path = dir.join("restrepo.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the metadata registry for the declared entities.
    pub fn metadata(&self) -> CoreResult<MetadataRegistry> {
        MetadataRegistry::from_entities(self.entities.iter().cloned())
    }

    /// Repository declaration for an entity, empty if none is configured.
    pub fn repository(&self, entity: &str) -> RepositoryConfig {
        self.repositories.get(entity).cloned().unwrap_or_default()
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        for (entity, repo) in &self.repositories {
            if !self.entities.iter().any(|e| e.name == entity.as_str()) {
                return Err(CoreError::UnknownEntity {
                    name: entity.clone(),
                });
            }
            for (key, rule) in &repo.foreign_criteria {
                for join in &rule.joins {
                    if !is_valid_ident(&join.alias) || !is_valid_ident(&join.table) {
                        return Err(CoreError::ConfigInvalid {
                            message: format!(
                                "repository '{}': join for criteria key '{}' needs identifier table and alias",
                                entity, key
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
