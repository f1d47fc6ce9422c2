#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A line from Parlor itself shown in the chat feed. Notices are never part of
/// the transcript and are never sent to a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    /// Transcript length when the notice was posted, used to render it in
    /// position between turns.
    pub after_turn: usize,
}

impl Notice {
    pub fn info(text: &str) -> Notice {
        return Notice {
            kind: NoticeKind::Info,
            text: text.replace('\t', "  "),
            after_turn: 0,
        };
    }

    pub fn error(text: &str) -> Notice {
        return Notice {
            kind: NoticeKind::Error,
            text: text.replace('\t', "  "),
            after_turn: 0,
        };
    }
}
