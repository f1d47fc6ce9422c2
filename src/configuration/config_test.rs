use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>();
    assert!(doc.is_ok());

    assert!(res.contains("claude-url = \"https://api.anthropic.com\""));
    assert!(res.contains("backend-health-check-timeout = 1000"));
    assert!(res.contains("# embedding-token = \"\""));
    assert!(res.contains("[possible values: attach, index]"));
    assert!(!res.contains("config-file"));
}

#[test]
fn it_defaults_settings_next_to_config() {
    let config_file = Config::default(ConfigKey::ConfigFile);
    let settings_file = Config::default(ConfigKey::SettingsFile);

    assert!(config_file.ends_with("config.toml"));
    assert!(settings_file.ends_with("settings.json"));
    assert_eq!(
        config_file.trim_end_matches("config.toml"),
        settings_file.trim_end_matches("settings.json")
    );
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["parlor", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["parlor", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    assert!(res
        .unwrap_err()
        .to_string()
        .contains("invalid value for key 'document-mode'"));
    return Ok(());
}
