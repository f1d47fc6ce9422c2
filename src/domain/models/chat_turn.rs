#[cfg(test)]
#[path = "chat_turn_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

/// A single entry of the transcript. Turns are never edited once appended, so
/// the fields are only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: Role,
    content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: &str) -> ChatTurn {
        return ChatTurn {
            role,
            content: content.replace('\t', "  "),
        };
    }

    pub fn user(content: &str) -> ChatTurn {
        return ChatTurn::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> ChatTurn {
        return ChatTurn::new(Role::Assistant, content);
    }

    pub fn role(&self) -> Role {
        return self.role;
    }

    pub fn content(&self) -> &str {
        return &self.content;
    }
}

/// Ordered, append-only history of the current chat. The only way to remove
/// turns is to clear the whole transcript.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn turns(&self) -> &[ChatTurn] {
        return &self.turns;
    }

    pub fn len(&self) -> usize {
        return self.turns.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.turns.is_empty();
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        return self.turns.last();
    }

    pub(crate) fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
