use std::collections::HashMap;

use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use super::BubbleAlignment;
use super::BubbleKind;
use crate::domain::models::ChatTurn;
use crate::domain::models::Notice;
use crate::domain::models::NoticeKind;
use crate::domain::models::Role;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

pub const NOTICE_LABEL: &str = "Parlor";

/// One rendered entry of the chat feed, either a transcript turn or a notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleItem {
    pub label: String,
    pub text: String,
    pub alignment: BubbleAlignment,
    pub kind: BubbleKind,
}

impl BubbleItem {
    pub fn from_turn(turn: &ChatTurn, model_name: &str) -> BubbleItem {
        let mut alignment = BubbleAlignment::Left;
        if turn.role() == Role::User {
            alignment = BubbleAlignment::Right;
        }

        return BubbleItem {
            label: turn.role().display_name(model_name),
            text: turn.content().to_string(),
            alignment,
            kind: BubbleKind::Turn,
        };
    }

    pub fn from_notice(notice: &Notice) -> BubbleItem {
        let mut kind = BubbleKind::Notice;
        if notice.kind == NoticeKind::Error {
            kind = BubbleKind::Error;
        }

        return BubbleItem {
            label: NOTICE_LABEL.to_string(),
            text: notice.text.to_string(),
            alignment: BubbleAlignment::Left,
            kind,
        };
    }

    /// Interleaves notices with the transcript at the position they were
    /// posted.
    pub fn merge(turns: &[ChatTurn], notices: &[Notice], model_name: &str) -> Vec<BubbleItem> {
        let mut items = vec![];
        for idx in 0..=turns.len() {
            items.extend(
                notices
                    .iter()
                    .filter(|notice| return notice.after_turn == idx)
                    .map(BubbleItem::from_notice),
            );

            if let Some(turn) = turns.get(idx) {
                items.push(BubbleItem::from_turn(turn, model_name));
            }
        }

        // Notices posted against a transcript that was cleared since.
        items.extend(
            notices
                .iter()
                .filter(|notice| return notice.after_turn > turns.len())
                .map(BubbleItem::from_notice),
        );

        return items;
    }
}

struct BubbleCacheEntry {
    item: BubbleItem,
    lines: Vec<Line<'static>>,
}

pub struct BubbleList {
    cache: HashMap<usize, BubbleCacheEntry>,
    line_width: usize,
    lines_len: usize,
}

impl Default for BubbleList {
    fn default() -> BubbleList {
        return BubbleList {
            cache: HashMap::new(),
            line_width: 0,
            lines_len: 0,
        };
    }
}

impl BubbleList {
    pub fn set_items(&mut self, items: &[BubbleItem], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }

        self.cache.retain(|idx, _| return *idx < items.len());

        self.lines_len = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if let Some(entry) = self.cache.get(&idx) {
                    if entry.item == *item {
                        return entry.lines.len();
                    }
                }

                let lines = Bubble::new(&item.label, &item.text, item.alignment, item.kind, line_width)
                    .as_lines();
                let lines_len = lines.len();

                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        item: item.clone(),
                        lines,
                    },
                );

                return lines_len;
            })
            .sum();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render(&self, frame: &mut Frame, rect: Rect, scroll: usize) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line> = indexes
            .iter()
            .filter_map(|idx| return self.cache.get(idx))
            .flat_map(|entry| return entry.lines.to_owned())
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
            rect,
        );
    }
}
