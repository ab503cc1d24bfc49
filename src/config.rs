use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub interval_secs: u64,
    pub threshold_secs: u64,
    pub beep_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: 120,
            threshold_secs: 60,
            beep_enabled: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            anyhow::bail!("interval must be at least 1 second");
        }
        Ok(())
    }
}

pub fn get_base_dir() -> Result<PathBuf> {
    let mut path =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    path.push(".perk");
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    let path = get_base_dir()?.join("config.json");
    load_from(&path)
}

fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");

        let config = load_from(&path)?;
        assert_eq!(config.interval_secs, 120);
        assert_eq!(config.threshold_secs, 60);
        assert!(!config.beep_enabled);
        assert!(path.exists());

        Ok(())
    }

    #[test]
    fn test_load_existing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interval_secs": 30, "threshold_secs": 0, "beep_enabled": true }"#,
        )?;

        let config = load_from(&path)?;
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.threshold_secs, 0);
        assert!(config.beep_enabled);

        Ok(())
    }

    #[test]
    fn test_zero_interval_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "interval_secs": 0, "threshold_secs": 60, "beep_enabled": false }"#,
        )?;

        assert!(load_from(&path).is_err());

        Ok(())
    }
}
