use tui_textarea::Input;

use super::BackendError;
use super::DocumentIndex;
use super::Notice;

pub enum Event {
    BackendNotice(Notice),
    BackendPromptResponse(Result<String, BackendError>),
    DocumentsIndexed(u64, anyhow::Result<DocumentIndex>),
    KeyboardBackTab(),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLL(),
    KeyboardCTRLR(),
    KeyboardCTRLS(),
    KeyboardEnter(),
    KeyboardPaste(String),
    KeyboardTab(),
    UIResize(),
    UIScrollDown(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UIScrollUp(),
    UITick(),
}
