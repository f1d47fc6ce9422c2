#[cfg(test)]
#[path = "settings_form_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use ratatui::prelude::Constraint;
use ratatui::prelude::Direction;
use ratatui::prelude::Layout;
use ratatui::prelude::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use tui_textarea::CursorMove;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Attachment;
use crate::domain::models::ModelName;
use crate::domain::models::Settings;
use crate::domain::models::TextArea;
use crate::domain::models::DEFAULT_SYSTEM_PROMPT;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    SystemPrompt,
    Model,
    DocumentPath,
}

const FIELDS: [SettingsField; 4] = [
    SettingsField::ApiKey,
    SettingsField::SystemPrompt,
    SettingsField::Model,
    SettingsField::DocumentPath,
];

/// Editable copy of the settings shown before chatting.
pub struct SettingsForm<'a> {
    api_key: tui_textarea::TextArea<'a>,
    system_prompt: tui_textarea::TextArea<'a>,
    document_path: tui_textarea::TextArea<'a>,
    pub model: ModelName,
    pub focus: SettingsField,
    pub error: Option<String>,
}

fn textarea_text(textarea: &tui_textarea::TextArea) -> String {
    return textarea.lines().join("\n");
}

impl<'a> SettingsForm<'a> {
    pub fn new(settings: &Settings, document_path: &str) -> SettingsForm<'a> {
        let mut api_key = TextArea::with_title("API key");
        api_key.set_mask_char('•');
        api_key.insert_str(&settings.api_key);

        let mut system_prompt = TextArea::with_title("System prompt");
        system_prompt.insert_str(&settings.system_prompt);

        let mut document_path_input = TextArea::with_title("Document or image path (optional)");
        document_path_input.insert_str(document_path);

        let mut form = SettingsForm {
            api_key,
            system_prompt,
            document_path: document_path_input,
            model: settings.selected_model,
            focus: SettingsField::ApiKey,
            error: None,
        };
        form.sync_focus();

        return form;
    }

    pub fn api_key(&self) -> String {
        return textarea_text(&self.api_key).trim().to_string();
    }

    pub fn system_prompt(&self) -> String {
        return textarea_text(&self.system_prompt);
    }

    pub fn document_path(&self) -> String {
        return textarea_text(&self.document_path).trim().to_string();
    }

    pub fn focus_next(&mut self) {
        let idx = FIELDS.iter().position(|e| return *e == self.focus).unwrap_or(0);
        self.focus = FIELDS[(idx + 1) % FIELDS.len()];
        self.sync_focus();
    }

    pub fn focus_prev(&mut self) {
        let idx = FIELDS.iter().position(|e| return *e == self.focus).unwrap_or(0);
        self.focus = FIELDS[(idx + FIELDS.len() - 1) % FIELDS.len()];
        self.sync_focus();
    }

    /// Enter adds a line to the system prompt and moves on from every other
    /// field.
    pub fn handle_enter(&mut self) {
        if self.focus == SettingsField::SystemPrompt {
            self.system_prompt.insert_newline();
            return;
        }

        self.focus_next();
    }

    pub fn handle_input(&mut self, input: Input) {
        match self.focus {
            SettingsField::ApiKey => {
                self.api_key.input(input);
            }
            SettingsField::SystemPrompt => {
                self.system_prompt.input(input);
            }
            SettingsField::DocumentPath => {
                self.document_path.input(input);
            }
            SettingsField::Model => match input.key {
                Key::Right | Key::Char(' ') => self.model = self.model.step(true),
                Key::Left => self.model = self.model.step(false),
                _ => {}
            },
        }
    }

    /// Up and down move between lines of the system prompt.
    pub fn move_cursor(&mut self, up: bool) {
        if self.focus != SettingsField::SystemPrompt {
            return;
        }

        if up {
            self.system_prompt.move_cursor(CursorMove::Up);
        } else {
            self.system_prompt.move_cursor(CursorMove::Down);
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        match self.focus {
            SettingsField::ApiKey => {
                self.api_key.insert_str(text.trim());
            }
            SettingsField::SystemPrompt => {
                self.system_prompt.insert_str(text);
            }
            SettingsField::DocumentPath => {
                self.document_path.insert_str(text.trim());
            }
            SettingsField::Model => {}
        }
    }

    /// Validates the form. The attachment is read from disk here so a bad
    /// path is reported before anything is saved.
    pub async fn build(&self) -> Result<Settings> {
        let api_key = self.api_key();
        if api_key.is_empty() {
            bail!("Please enter an API key.");
        }

        let mut system_prompt = self.system_prompt();
        if system_prompt.trim().is_empty() {
            system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
        }

        let mut attachment = Attachment::None;
        let document_path = self.document_path();
        if !document_path.is_empty() {
            attachment = Attachment::from_path(&document_path).await?;
        }

        return Ok(Settings {
            api_key,
            system_prompt,
            selected_model: self.model,
            attachment,
        });
    }

    fn sync_focus(&mut self) {
        let focus = self.focus;
        let fields = [
            (&mut self.api_key, SettingsField::ApiKey, "API key"),
            (&mut self.system_prompt, SettingsField::SystemPrompt, "System prompt"),
            (
                &mut self.document_path,
                SettingsField::DocumentPath,
                "Document or image path (optional)",
            ),
        ];

        for (textarea, field, title) in fields {
            let focused = focus == field;
            textarea.set_block(TextArea::block(title, focused));
            if focused {
                textarea.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
            } else {
                textarea.set_cursor_style(Style::default());
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, rect: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(rect);

        frame.render_widget(self.api_key.widget(), layout[0]);
        frame.render_widget(self.system_prompt.widget(), layout[1]);

        let models = ModelName::list()
            .iter()
            .map(|model| {
                if *model == self.model {
                    return format!("[{model}]");
                }
                return model.to_string();
            })
            .collect::<Vec<String>>()
            .join("  ");
        frame.render_widget(
            Paragraph::new(models).block(TextArea::block(
                "Model (←/→)",
                self.focus == SettingsField::Model,
            )),
            layout[2],
        );

        frame.render_widget(self.document_path.widget(), layout[3]);

        let mut footer = Paragraph::new(
            "TAB next field • SHIFT+TAB previous field • CTRL+S save and chat • CTRL+C quit",
        )
        .wrap(Wrap { trim: true });
        if let Some(error) = &self.error {
            footer = Paragraph::new(error.to_string())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
        }
        frame.render_widget(footer, layout[4]);
    }
}
