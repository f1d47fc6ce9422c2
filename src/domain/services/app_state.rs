#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::BubbleItem;
use super::BubbleList;
use super::ChatSession;
use super::Scroll;
use super::SettingsForm;
use super::SettingsStoreBox;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::BackendError;
use crate::domain::models::DocumentIndex;
use crate::domain::models::ModelName;
use crate::domain::models::Notice;
use crate::domain::models::Settings;
use crate::domain::models::SlashCommand;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /modellist (/ml) - Lists all supported models.
- /model (/m) [MODEL_NAME,MODEL_INDEX] - Switches to the specified model. You can pass either the model name, or the index from /modellist.
- /clear (/cl) - Clears the chat history. Settings are kept.
- /reset - Resets your settings and goes back to the settings screen.
- /quit /exit (/q) - Exit Parlor.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+L - Clear the chat history.
- CTRL+S - Edit settings.
- CTRL+R - Reset settings.
- CTRL+C - Exit.
        "#;

    return text.trim().to_string();
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Settings,
    Chat,
}

pub struct AppState<'a> {
    pub bubble_list: BubbleList,
    pub index_documents: bool,
    pub index_generation: u64,
    pub indexing: bool,
    pub last_known_height: usize,
    pub last_known_width: usize,
    pub notices: Vec<Notice>,
    pub screen: Screen,
    pub scroll: Scroll,
    pub session: ChatSession,
    pub settings: Settings,
    pub settings_form: SettingsForm<'a>,
    pub store: SettingsStoreBox,
    document_path: String,
}

impl<'a> AppState<'a> {
    pub async fn new(store: SettingsStoreBox) -> Result<AppState<'a>> {
        let settings = store.load().await?;
        let mut screen = Screen::Settings;
        if settings.is_ready() {
            screen = Screen::Chat;
        }

        let mut app_state = AppState {
            bubble_list: BubbleList::default(),
            index_documents: Config::get(ConfigKey::DocumentMode) == "index",
            index_generation: 0,
            indexing: false,
            last_known_height: 0,
            last_known_width: 0,
            notices: vec![],
            screen,
            scroll: Scroll::default(),
            session: ChatSession::default(),
            settings_form: SettingsForm::new(&settings, ""),
            settings,
            store,
            document_path: "".to_string(),
        };

        app_state.add_notice(Notice::info(
            "Hey there! What can I do for you? Type /help to see what else I can do.",
        ));

        return Ok(app_state);
    }

    /// True while a reply or an index build is outstanding.
    pub fn is_busy(&self) -> bool {
        return self.session.is_waiting() || self.indexing;
    }

    pub fn model_name(&self) -> String {
        return self.settings.selected_model.to_string();
    }

    pub fn add_notice(&mut self, mut notice: Notice) {
        notice.after_turn = self.session.transcript().len();
        self.notices.push(notice);
        self.sync_dependants();
        self.scroll.last();
    }

    /// Handles text submitted from the chat input. Returns true when the app
    /// should exit.
    pub async fn submit_prompt(
        &mut self,
        text: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        let (should_break, should_continue) = self.handle_slash_commands(text, tx).await?;
        if should_break {
            return Ok(true);
        }
        if should_continue {
            return Ok(false);
        }

        match self.session.begin(&self.settings, text).await {
            Ok(prompt) => {
                tx.send(Action::BackendRequest(prompt, self.settings.api_key.to_string()))?;
            }
            Err(err) => {
                self.add_notice(Notice::error(&err.to_string()));
            }
        }

        self.sync_dependants();
        self.scroll.last();

        return Ok(false);
    }

    pub fn handle_backend_response(&mut self, res: Result<String, BackendError>) {
        if let Err(err) = self.session.finish(res) {
            self.add_notice(Notice::error(&err.to_string()));
        }

        self.sync_dependants();
        self.scroll.last();
    }

    /// Installs the result of an index build. Results from a build that was
    /// superseded by a later save or a reset are dropped.
    pub fn handle_documents_indexed(&mut self, generation: u64, res: Result<DocumentIndex>) {
        if !self.indexing || generation != self.index_generation {
            tracing::debug!(
                generation = generation,
                current = self.index_generation,
                "Dropping stale document index"
            );
            return;
        }

        self.indexing = false;
        let file_name = self
            .settings
            .attachment
            .file_name()
            .unwrap_or_default()
            .to_string();

        match res {
            Ok(index) => {
                let chunks = index.len();
                self.session.set_index(Some(index));
                self.add_notice(Notice::info(&format!(
                    "I've read {file_name} ({chunks} sections). Ask me anything about it."
                )));
            }
            Err(err) => {
                self.session.set_index(None);
                self.add_notice(Notice::error(&format!(
                    "I couldn't index {file_name}, so it will be sent along with each question instead.\n\nError: {err}"
                )));
            }
        }
    }

    /// Validates and persists the settings form, then switches to the chat.
    pub async fn save_settings(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        let settings = match self.settings_form.build().await {
            Ok(settings) => settings,
            Err(err) => {
                self.settings_form.error = Some(err.to_string());
                return Ok(());
            }
        };

        if let Err(err) = self.store.save(&settings).await {
            self.settings_form.error = Some(format!("Failed to save settings: {err}"));
            return Ok(());
        }

        self.settings_form.error = None;
        self.document_path = self.settings_form.document_path();
        self.settings = settings;
        self.session.set_index(None);
        self.indexing = false;
        self.index_generation += 1;
        self.screen = Screen::Chat;

        tracing::info!(
            model = self.model_name(),
            store = self.store.location(),
            "Saved settings"
        );

        tx.send(Action::BackendHealthCheck(
            self.settings.backend(),
            self.settings.api_key.to_string(),
        ))?;

        let document = self.settings.attachment.document().cloned();
        if let Some(upload) = document {
            if self.index_documents {
                let token = self.settings.embedding_token();
                if token.is_empty() {
                    self.add_notice(Notice::error(
                        "Indexing documents needs a Gemini API key. Set embedding-token in your config, until then the document is sent along with each question.",
                    ));
                } else {
                    self.indexing = true;
                    tx.send(Action::IndexDocuments(
                        vec![upload],
                        token,
                        self.index_generation,
                    ))?;
                }
            }
        }

        self.sync_dependants();
        return Ok(());
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.notices.clear();
        self.sync_dependants();
        self.scroll.last();
    }

    /// Drops saved settings, the chat, and any document index, then returns
    /// to the settings screen.
    pub async fn reset(&mut self) -> Result<()> {
        self.store.reset().await?;
        self.settings = Settings::default();
        self.session = ChatSession::default();
        self.notices.clear();
        self.indexing = false;
        self.index_generation += 1;
        self.document_path = "".to_string();
        self.settings_form = SettingsForm::new(&self.settings, "");
        self.screen = Screen::Settings;
        self.sync_dependants();

        return Ok(());
    }

    pub fn open_settings(&mut self) {
        self.settings_form = SettingsForm::new(&self.settings, &self.document_path);
        self.screen = Screen::Settings;
    }

    /// Returns `(should_break, should_continue)`.
    pub async fn handle_slash_commands(
        &mut self,
        text: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(text) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_help() {
            self.add_notice(Notice::info(&help_text()));
        } else if command.is_clear() {
            self.clear();
        } else if command.is_reset() {
            self.reset().await?;
        } else if command.is_model_list() {
            self.add_notice(Notice::info(&self.model_list()));
        } else if command.is_model_set() {
            self.model_set(&command.args, tx).await?;
        }

        return Ok((false, true));
    }

    fn model_list(&self) -> String {
        return ModelName::list()
            .iter()
            .enumerate()
            .map(|(idx, model)| {
                let n = idx + 1;
                if *model == self.settings.selected_model {
                    return format!("- ({n}) {model} (active)");
                }
                return format!("- ({n}) {model}");
            })
            .collect::<Vec<String>>()
            .join("\n");
    }

    async fn model_set(&mut self, args: &[String], tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        let model_text = match args.first() {
            Some(text) => text,
            None => {
                self.add_notice(Notice::error(
                    "You must specify a model name with `/model` or `/m`. Run `/help` for more details.",
                ));
                return Ok(());
            }
        };

        let models = ModelName::list();
        let model = match model_text.parse::<usize>() {
            Ok(idx) => {
                if idx < 1 || idx > models.len() {
                    self.add_notice(Notice::error(&format!(
                        "{idx} is not a valid index from the model list."
                    )));
                    return Ok(());
                }
                models[idx - 1]
            }
            Err(_) => match ModelName::parse(model_text) {
                Some(model) => model,
                None => {
                    self.add_notice(Notice::error(&format!(
                        "No model named {model_text} found. Run `/modellist` to see the supported models."
                    )));
                    return Ok(());
                }
            },
        };

        let previous_backend = self.settings.backend();
        self.settings.selected_model = model;
        self.store.save(&self.settings).await?;

        if model.backend() != previous_backend {
            tx.send(Action::BackendHealthCheck(
                model.backend(),
                self.settings.api_key.to_string(),
            ))?;
        }

        self.add_notice(Notice::info(&format!("{model} has entered the chat.")));

        return Ok(());
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width.into();
        self.last_known_height = rect.height.into();
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        let items = BubbleItem::merge(
            self.session.transcript().turns(),
            &self.notices,
            &self.model_name(),
        );
        self.bubble_list.set_items(&items, self.last_known_width);

        self.scroll
            .set_state(self.bubble_list.len(), self.last_known_height);

        if self.session.is_waiting() {
            self.scroll.last();
        }
    }
}
