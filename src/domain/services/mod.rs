pub mod actions;
mod app_state;
mod bubble;
mod bubble_list;
mod chat_session;
mod documents;
pub mod events;
mod scroll;
mod settings_form;
mod settings_store;

pub use app_state::*;
pub use bubble::*;
pub use bubble_list::*;
pub use chat_session::*;
pub use documents::*;
pub use scroll::*;
pub use settings_form::*;
pub use settings_store::*;
