use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;
use crate::domain::services::Screen;
use crate::domain::services::SettingsStoreManager;

fn render_chat(frame: &mut Frame, app_state: &mut AppState, textarea: &tui_textarea::TextArea) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(1), Constraint::Max(4)])
        .split(frame.size());

    let width: usize = layout[0].width.into();
    let height: usize = layout[0].height.into();
    if width != app_state.last_known_width || height != app_state.last_known_height {
        app_state.set_rect(layout[0]);
    }

    app_state
        .bubble_list
        .render(frame, layout[0], app_state.scroll.position);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        layout[0].inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut app_state.scroll.scrollbar_state,
    );

    if app_state.session.is_waiting() {
        Loading::default().render(
            frame,
            layout[1],
            &format!("Waiting for {}...", app_state.model_name()),
        );
    } else if app_state.indexing {
        Loading::default().render(frame, layout[1], "Reading your document...");
    } else {
        frame.render_widget(textarea.widget(), layout[1]);
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<'_>,
    tx: mpsc::UnboundedSender<Action>,
    mut events: EventsService,
) -> Result<()> {
    let mut textarea = TextArea::default();

    if app_state.screen == Screen::Chat {
        tx.send(Action::BackendHealthCheck(
            app_state.settings.backend(),
            app_state.settings.api_key.to_string(),
        ))?;
    }

    loop {
        terminal.draw(|frame| {
            if app_state.screen == Screen::Settings {
                let area = frame.size();
                app_state.settings_form.render(frame, area);
            } else {
                render_chat(frame, app_state, &textarea);
            }
        })?;

        match events.next().await? {
            Event::BackendNotice(notice) => {
                app_state.add_notice(notice);
            }
            Event::BackendPromptResponse(res) => {
                app_state.handle_backend_response(res);
            }
            Event::DocumentsIndexed(generation, res) => {
                app_state.handle_documents_indexed(generation, res);
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::UITick() | Event::UIResize() => {
                continue;
            }
            event => match app_state.screen {
                Screen::Settings => match event {
                    Event::KeyboardCTRLS() => {
                        app_state.save_settings(&tx).await?;
                    }
                    Event::KeyboardTab() => {
                        app_state.settings_form.focus_next();
                    }
                    Event::KeyboardBackTab() => {
                        app_state.settings_form.focus_prev();
                    }
                    Event::UIScrollUp() => {
                        app_state.settings_form.move_cursor(true);
                    }
                    Event::UIScrollDown() => {
                        app_state.settings_form.move_cursor(false);
                    }
                    Event::KeyboardEnter() => {
                        app_state.settings_form.handle_enter();
                    }
                    Event::KeyboardPaste(text) => {
                        app_state.settings_form.handle_paste(&text);
                    }
                    Event::KeyboardCharInput(input) => {
                        app_state.settings_form.handle_input(input);
                    }
                    _ => (),
                },
                Screen::Chat => match event {
                    Event::UIScrollDown() => {
                        app_state.scroll.down();
                    }
                    Event::UIScrollUp() => {
                        app_state.scroll.up();
                    }
                    Event::UIScrollPageDown() => {
                        app_state.scroll.down_page();
                    }
                    Event::UIScrollPageUp() => {
                        app_state.scroll.up_page();
                    }
                    Event::KeyboardCTRLL() => {
                        app_state.clear();
                    }
                    Event::KeyboardCTRLR() => {
                        app_state.reset().await?;
                        textarea = TextArea::default();
                    }
                    Event::KeyboardCTRLS() => {
                        app_state.open_settings();
                    }
                    Event::KeyboardEnter() => {
                        if app_state.is_busy() {
                            continue;
                        }

                        let input_str = textarea.lines().join("\n");
                        if input_str.trim().is_empty() {
                            continue;
                        }

                        textarea = TextArea::default();
                        if app_state.submit_prompt(&input_str, &tx).await? {
                            break;
                        }
                    }
                    Event::KeyboardPaste(text) => {
                        textarea.insert_str(text);
                    }
                    Event::KeyboardCharInput(input) => {
                        if !app_state.is_busy() {
                            textarea.input(input);
                        }
                    }
                    _ => (),
                },
            },
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let store = SettingsStoreManager::get(&Config::get(ConfigKey::SettingsStore))?;
    let mut app_state = AppState::new(store).await?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = start_loop(&mut terminal, &mut app_state, tx, EventsService::new(rx)).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return res;
}
