//! CLI configuration resolution
//!
//! The database path comes from the flag, the environment, or the platform
//! data directory. Service credentials are read from the environment and
//! handed to the client as an explicit object.

use std::env;
use std::path::PathBuf;

use vibenotes_core::remote::ApiCredentials;

use crate::error::CliError;

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("VIBENOTES_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vibenotes")
        .join("vibenotes.db")
}

/// Build remote service credentials from the environment
pub fn credentials_from_env() -> Result<ApiCredentials, CliError> {
    let url = env::var("VIBENOTES_API_URL").unwrap_or_default();
    let token = env::var("VIBENOTES_API_TOKEN").unwrap_or_default();

    if url.trim().is_empty() || token.trim().is_empty() {
        return Err(CliError::SyncNotConfigured);
    }

    Ok(ApiCredentials::new(url, token)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_db_path_wins() {
        let explicit = PathBuf::from("/tmp/elsewhere.db");
        assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
    }

    #[test]
    fn default_db_path_ends_with_app_file() {
        let path = default_db_path();
        assert!(path.ends_with("vibenotes/vibenotes.db"));
    }
}
