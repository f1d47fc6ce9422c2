#[cfg(test)]
#[path = "settings_store_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Settings;

#[async_trait]
pub trait SettingsStore {
    /// Returns the saved settings, or defaults when nothing was saved.
    async fn load(&self) -> Result<Settings>;

    /// Replaces whatever was saved before.
    async fn save(&self, settings: &Settings) -> Result<()>;

    async fn reset(&self) -> Result<()>;

    /// Human readable location, shown by `parlor settings path`.
    fn location(&self) -> String;
}

pub type SettingsStoreBox = Box<dyn SettingsStore + Send + Sync>;

#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    #[allow(clippy::implicit_return)]
    async fn load(&self) -> Result<Settings> {
        return Ok(self.settings.lock().await.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().await = settings.clone();
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn reset(&self) -> Result<()> {
        *self.settings.lock().await = Settings::default();
        return Ok(());
    }

    fn location(&self) -> String {
        return "memory".to_string();
    }
}

/// Settings kept in a single JSON file. Attachments stay in memory only.
pub struct FileSettingsStore {
    pub file_path: path::PathBuf,
}

impl FileSettingsStore {
    pub fn new(file_path: path::PathBuf) -> FileSettingsStore {
        return FileSettingsStore { file_path };
    }

    fn temp_path(&self) -> path::PathBuf {
        let mut file_name = self
            .file_path
            .file_name()
            .map(|name| return name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");

        return self.file_path.with_file_name(file_name);
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    #[allow(clippy::implicit_return)]
    async fn load(&self) -> Result<Settings> {
        if !self.file_path.exists() {
            return Ok(Settings::default());
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        let settings: Settings = match serde_json::from_str(&payload) {
            Ok(settings) => settings,
            Err(err) => {
                bail!(format!(
                    "Settings file {} is not valid: {err}",
                    self.file_path.display()
                ));
            }
        };

        return Ok(settings);
    }

    #[allow(clippy::implicit_return)]
    async fn save(&self, settings: &Settings) -> Result<()> {
        let payload = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.file_path).await?;

        tracing::debug!(
            file = self.file_path.display().to_string(),
            "Saved settings"
        );

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn reset(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).await?;
        }

        return Ok(());
    }

    fn location(&self) -> String {
        return self.file_path.display().to_string();
    }
}

pub struct SettingsStoreManager {}

impl SettingsStoreManager {
    pub fn get(name: &str) -> Result<SettingsStoreBox> {
        if name == "memory" {
            return Ok(Box::<MemorySettingsStore>::default());
        }

        if name == "file" {
            let file_path = path::PathBuf::from(Config::get(ConfigKey::SettingsFile));
            return Ok(Box::new(FileSettingsStore::new(file_path)));
        }

        bail!(format!("No settings store implemented for {name}"))
    }
}
