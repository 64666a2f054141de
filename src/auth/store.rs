use crate::config::Secret;
use crate::error::ResqError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Accepted web-UI users, as declared in the login YAML:
///
/// ```yaml
/// users:
///   - RESQ
/// passwords:
///   RESQ: RESQ
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginConfig {
    pub users: Vec<String>,
    pub passwords: HashMap<String, Secret>,
}

/// Shared, read-only view of the login configuration.
#[derive(Debug, Clone)]
pub struct LoginStore {
    config: Arc<LoginConfig>,
}

// Compared against when the username has no password entry, so that unknown
// users cost the same as a wrong password.
const DUMMY_PASSWORD: &str = "\u{0}resq-no-such-user\u{0}";

impl LoginStore {
    pub fn from_path(path: &Path) -> Result<Self, ResqError> {
        if !path.exists() {
            return Err(ResqError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let store = Self::from_yaml_str(&contents).map_err(|e| match e {
            ResqError::ConfigParse { source, .. } => ResqError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(store)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ResqError> {
        let config: LoginConfig =
            serde_yaml::from_str(contents).map_err(|source| ResqError::ConfigParse {
                path: "<inline>".into(),
                source,
            })?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// True only when `username` is listed and the stored password matches.
    /// The password comparison runs in constant time and is performed even
    /// for unknown users.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let listed = self.config.users.iter().any(|u| u == username);
        let entry = self.config.passwords.get(username);
        let expected = entry.map(|s| s.expose()).unwrap_or(DUMMY_PASSWORD);
        let matches = bool::from(expected.as_bytes().ct_eq(password.as_bytes()));
        listed && entry.is_some() && matches
    }

    pub fn user_count(&self) -> usize {
        self.config.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "users:\n  - RESQ\n  - jorge\npasswords:\n  RESQ: RESQ\n  jorge: m6o-secret\n";

    #[test]
    fn parses_login_yaml_shape() {
        let store = LoginStore::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(store.user_count(), 2);
    }

    #[test]
    fn accepts_valid_credentials() {
        let store = LoginStore::from_yaml_str(SAMPLE).unwrap();
        assert!(store.verify("RESQ", "RESQ"));
        assert!(store.verify("jorge", "m6o-secret"));
    }

    #[test]
    fn rejects_wrong_password_and_unknown_user() {
        let store = LoginStore::from_yaml_str(SAMPLE).unwrap();
        assert!(!store.verify("RESQ", "resq"));
        assert!(!store.verify("nobody", "RESQ"));
        assert!(!store.verify("", ""));
    }

    #[test]
    fn rejects_listed_user_without_password_entry() {
        let store =
            LoginStore::from_yaml_str("users:\n  - ghost\npasswords:\n  RESQ: RESQ\n").unwrap();
        assert!(!store.verify("ghost", DUMMY_PASSWORD));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = LoginStore::from_path(Path::new("/no/such/login.yaml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/login.yaml"));
    }
}
