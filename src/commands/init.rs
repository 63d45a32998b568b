//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::IndexStore;
use std::path::PathBuf;
use tracing::info;

/// Initialize sitesearch configuration and database
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    // Check if already initialized
    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.base_dir.display().to_string(),
        ));
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    IndexStore::connect(&config).await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_config_and_database() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("sitesearch");

        let config = cmd_init(Some(base.clone()), false).await.unwrap();
        assert!(config.paths.config_file.exists());
        assert!(config.paths.db_file.exists());

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert!(loaded.sites.is_empty());

        assert!(matches!(
            cmd_init(Some(base.clone()), false).await,
            Err(Error::AlreadyInitialized(_))
        ));
        assert!(cmd_init(Some(base), true).await.is_ok());
    }
}
