use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Basic-auth credentials for the target application.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading credentials file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing credentials file {}", path.display()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"username": "admin", "password": "s3cret"}}"#).unwrap();

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.password, "s3cret");
    }

    #[test]
    fn missing_password_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"username": "admin"}}"#).unwrap();

        assert!(Credentials::load(file.path()).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let credentials = Credentials {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("admin"));
        assert!(!printed.contains("s3cret"));
    }
}
