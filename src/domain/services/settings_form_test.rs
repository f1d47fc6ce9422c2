use anyhow::Result;
use tui_textarea::Input;
use tui_textarea::Key;

use super::SettingsField;
use super::SettingsForm;
use crate::domain::models::Attachment;
use crate::domain::models::ModelName;
use crate::domain::models::Settings;
use crate::domain::models::DEFAULT_SYSTEM_PROMPT;

fn key(key: Key) -> Input {
    return Input {
        key,
        ..Input::default()
    };
}

fn type_text(form: &mut SettingsForm, text: &str) {
    for char in text.chars() {
        form.handle_input(key(Key::Char(char)));
    }
}

#[test]
fn it_prefills_from_settings() {
    let settings = Settings {
        api_key: "sk-1234".to_string(),
        selected_model: ModelName::Gemini15Pro,
        ..Settings::default()
    };
    let form = SettingsForm::new(&settings, "/tmp/notes.txt");

    assert_eq!(form.api_key(), "sk-1234");
    assert_eq!(form.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    assert_eq!(form.document_path(), "/tmp/notes.txt");
    assert_eq!(form.model, ModelName::Gemini15Pro);
    assert_eq!(form.focus, SettingsField::ApiKey);
}

#[test]
fn it_cycles_focus() {
    let mut form = SettingsForm::new(&Settings::default(), "");

    form.focus_next();
    assert_eq!(form.focus, SettingsField::SystemPrompt);
    form.handle_enter();
    assert_eq!(form.focus, SettingsField::SystemPrompt);
    form.focus_next();
    form.focus_next();
    assert_eq!(form.focus, SettingsField::DocumentPath);
    form.focus_next();
    assert_eq!(form.focus, SettingsField::ApiKey);
    form.focus_prev();
    assert_eq!(form.focus, SettingsField::DocumentPath);
}

#[test]
fn it_moves_between_system_prompt_lines() {
    let settings = Settings {
        system_prompt: "first line".to_string(),
        ..Settings::default()
    };
    let mut form = SettingsForm::new(&settings, "");
    form.focus = SettingsField::SystemPrompt;

    form.handle_enter();
    type_text(&mut form, "two");
    form.move_cursor(true);
    type_text(&mut form, "!");
    form.move_cursor(false);
    type_text(&mut form, "?");

    assert_eq!(form.system_prompt(), "fir!st line\ntwo?");
}

#[test]
fn it_ignores_cursor_moves_outside_system_prompt() {
    let mut form = SettingsForm::new(&Settings::default(), "");
    type_text(&mut form, "sk-1");
    form.move_cursor(true);
    type_text(&mut form, "2");

    assert_eq!(form.api_key(), "sk-12");
    assert_eq!(form.system_prompt(), DEFAULT_SYSTEM_PROMPT);
}

#[test]
fn it_steps_models() {
    let mut form = SettingsForm::new(&Settings::default(), "");
    form.focus = SettingsField::Model;

    form.handle_input(key(Key::Right));
    assert_eq!(form.model, ModelName::Claude35Haiku);
    form.handle_input(key(Key::Left));
    form.handle_input(key(Key::Left));
    assert_eq!(form.model, ModelName::Gemini15Flash);
}

#[tokio::test]
async fn it_requires_api_key() {
    let mut form = SettingsForm::new(&Settings::default(), "");
    type_text(&mut form, "   ");

    let res = form.build().await;
    assert_eq!(res.unwrap_err().to_string(), "Please enter an API key.");
}

#[tokio::test]
async fn it_builds_settings() -> Result<()> {
    let mut form = SettingsForm::new(&Settings::default(), "");
    type_text(&mut form, "sk-abcd");
    form.focus = SettingsField::Model;
    form.handle_input(key(Key::Right));

    let res = form.build().await?;
    assert_eq!(
        res,
        Settings {
            api_key: "sk-abcd".to_string(),
            selected_model: ModelName::Claude35Haiku,
            ..Settings::default()
        }
    );
    return Ok(());
}

#[tokio::test]
async fn it_reads_attachment() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("notes.md");
    std::fs::write(&file_path, "# Notes")?;

    let settings = Settings {
        api_key: "sk-abcd".to_string(),
        ..Settings::default()
    };
    let form = SettingsForm::new(&settings, &file_path.display().to_string());

    let res = form.build().await?;
    assert_eq!(res.attachment.file_name(), Some("notes.md"));
    assert!(matches!(res.attachment, Attachment::Document(_)));
    return Ok(());
}

#[tokio::test]
async fn it_rejects_missing_and_unsupported_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = Settings {
        api_key: "sk-abcd".to_string(),
        ..Settings::default()
    };

    let missing = dir.path().join("missing.txt").display().to_string();
    assert!(SettingsForm::new(&settings, &missing).build().await.is_err());

    let unsupported = dir.path().join("song.mp3");
    std::fs::write(&unsupported, "la la")?;
    let form = SettingsForm::new(&settings, &unsupported.display().to_string());
    assert!(form.build().await.is_err());

    return Ok(());
}
