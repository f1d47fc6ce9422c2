mod action;
mod attachment;
mod backend;
mod chat_turn;
mod document_index;
mod embedder;
mod event;
mod loading;
mod notice;
mod role;
mod settings;
mod slash_commands;
mod textarea;

pub use action::*;
pub use attachment::*;
pub use backend::*;
pub use chat_turn::*;
pub use document_index::*;
pub use embedder::*;
pub use event::*;
pub use loading::*;
pub use notice::*;
pub use role::*;
pub use settings::*;
pub use slash_commands::*;
pub use textarea::*;
