use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "rolodex.db";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_STATIC_DIR: &str = "webapp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RolodexConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
}

impl RolodexConfig {
    /// Config written by `rolodex init`
    pub fn with_defaults() -> Self {
        Self {
            database: Some(DEFAULT_DATABASE.to_string()),
            port: Some(DEFAULT_PORT),
            static_dir: Some(DEFAULT_STATIC_DIR.to_string()),
        }
    }
}

/// Effective server settings after merging CLI flags over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSettings {
    pub database: PathBuf,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl ServeSettings {
    /// CLI values win over the file, the file wins over defaults.
    pub fn resolve(
        config: Option<&RolodexConfig>,
        database: Option<PathBuf>,
        port: Option<u16>,
        static_dir: Option<PathBuf>,
    ) -> Self {
        let file = config.cloned().unwrap_or_default();
        Self {
            database: database
                .or_else(|| file.database.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            static_dir: static_dir
                .or_else(|| file.static_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("rolodex.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RolodexConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RolodexConfig = toml::from_str(&contents)
        .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RolodexConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("rolodex.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolodex.toml");

        write_config(&path, &RolodexConfig::with_defaults(), false).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, Some(RolodexConfig::with_defaults()));

        assert!(write_config(&path, &RolodexConfig::default(), false).is_err());
        write_config(&path, &RolodexConfig::default(), true).unwrap();
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolodex.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_resolve_precedence() {
        let file = RolodexConfig {
            database: Some("from-file.db".to_string()),
            port: Some(8080),
            static_dir: None,
        };

        let settings = ServeSettings::resolve(Some(&file), None, Some(9000), None);
        assert_eq!(settings.database, PathBuf::from("from-file.db"));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));

        let defaults = ServeSettings::resolve(None, None, None, None);
        assert_eq!(defaults.database, PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(defaults.port, DEFAULT_PORT);
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("rolodex.db");
        ensure_db_dir(&db_path).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
