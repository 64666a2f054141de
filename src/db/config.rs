use crate::config::Secret;
use crate::error::ResqError;
use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;
use std::fmt;
use std::path::Path;

/// Connection parameters for the MySQL database, as declared in the database
/// YAML (rename the checked-in `database.yaml.example` and fill in real
/// values):
///
/// ```yaml
/// host: 192.168.1.94
/// port: 3306
/// user: jorge
/// password: "..."
/// schema: home_data_extraction
/// tables:
///   - home_data_extraction.home_processed_extraction
///   - home_data_extraction.barrio_provincia
/// ```
///
/// `tables` limits which tables enter the model's schema context; leave it
/// empty to expose every table in the schema.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub schema: String,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl DatabaseConfig {
    pub fn from_path(path: &Path) -> Result<Self, ResqError> {
        if !path.exists() {
            return Err(ResqError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|source| ResqError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ResqError> {
        serde_yaml::from_str(contents).map_err(|source| ResqError::ConfigParse {
            path: "<inline>".into(),
            source,
        })
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose())
            .database(&self.schema)
    }

    /// True when `name` (qualified `schema.table`) or its bare table part is
    /// allow-listed, or when no allow-list is configured.
    pub fn table_included(&self, qualified: &str) -> bool {
        if self.tables.is_empty() {
            return true;
        }
        let bare = qualified.rsplit('.').next().unwrap_or(qualified);
        self.tables.iter().any(|t| t == qualified || t == bare)
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DatabaseConfig(host={}, port={}, schema={}, tables={:?})",
            self.host, self.port, self.schema, self.tables
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "host: 127.0.0.1\nport: 3306\nuser: resq\npassword: \"s3cret\"\nschema: home_data_extraction\ntables:\n  - home_data_extraction.home_processed_extraction\n";

    #[test]
    fn parses_database_yaml() {
        let cfg = DatabaseConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3306);
        assert_eq!(cfg.schema, "home_data_extraction");
        assert_eq!(cfg.tables.len(), 1);
    }

    #[test]
    fn display_and_debug_omit_password() {
        let cfg = DatabaseConfig::from_yaml_str(SAMPLE).unwrap();
        let shown = format!("{cfg} {cfg:?}");
        assert!(!shown.contains("s3cret"));
    }

    #[test]
    fn allow_list_matches_qualified_and_bare_names() {
        let cfg = DatabaseConfig::from_yaml_str(SAMPLE).unwrap();
        assert!(cfg.table_included("home_data_extraction.home_processed_extraction"));
        assert!(!cfg.table_included("home_data_extraction.other_table"));

        let open = DatabaseConfig::from_yaml_str(
            "host: h\nport: 1\nuser: u\npassword: p\nschema: s\n",
        )
        .unwrap();
        assert!(open.table_included("s.anything"));
    }
}
