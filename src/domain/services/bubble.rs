#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

/// Colour scheme of a bubble.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BubbleKind {
    Turn,
    Notice,
    Error,
}

pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    kind: BubbleKind,
    label: &'a str,
    text: &'a str,
    window_max_width: usize,
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
}

fn repeat_from_subtractions(text: &str, subtractions: Vec<usize>) -> String {
    let mut values = subtractions.into_iter();
    let first = values.next().unwrap_or(0);
    let count = values.fold(first, |acc, e| return acc.saturating_sub(e));

    return text.repeat(count);
}

impl<'a> Bubble<'a> {
    pub fn new(
        label: &'a str,
        text: &'a str,
        alignment: BubbleAlignment,
        kind: BubbleKind,
        window_max_width: usize,
    ) -> Bubble<'a> {
        return Bubble {
            alignment,
            kind,
            label,
            text,
            window_max_width,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // Unicode character border + padding.
            bubble_padding: 8,
            // left border + left padding + (text, not counted) + right padding + right border +
            // scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
        };
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = vec![];
        let max_line_length = self.get_max_line_length();

        for line in self.text.lines() {
            let mut word_set: Vec<&str> = vec![];
            let mut line_char_count = 0;

            for word in line.split(' ') {
                let word_len = word.chars().count();
                if !word_set.is_empty() && word_len + line_char_count > max_line_length {
                    lines.push(self.text_to_line(&word_set.join(" "), max_line_length));
                    word_set = vec![];
                    line_char_count = 0;
                }

                word_set.push(word);
                line_char_count += word_len + 1;
            }

            lines.push(self.text_to_line(&word_set.join(" "), max_line_length));
        }

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn text_to_line(&self, text: &str, max_line_length: usize) -> Line<'static> {
        let line_str_len = text.chars().count();
        let fill = repeat_from_subtractions(" ", vec![max_line_length, line_str_len]);
        let formatted_line_length = line_str_len + fill.len() + Bubble::style_config().bubble_padding;

        let mut wrapped_spans = vec![
            self.highlight_span("│ ".to_string()),
            self.text_span(text.to_string()),
            self.highlight_span(format!("{fill} │")),
        ];

        let outer_bubble_padding =
            repeat_from_subtractions(" ", vec![self.window_max_width, formatted_line_length]);

        if self.alignment == BubbleAlignment::Left {
            wrapped_spans.push(Span::from(outer_bubble_padding));
            return Line::from(wrapped_spans);
        }

        let mut line_spans = vec![Span::from(outer_bubble_padding)];
        line_spans.extend(wrapped_spans);

        return Line::from(line_spans);
    }

    fn get_max_line_length(&self) -> usize {
        let style_config = Bubble::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length =
            ((self.window_max_width as f32 * style_config.outer_padding_percentage).ceil()) as usize;

        // Border elements + minimum bubble padding.
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;
        let max_width = self.window_max_width.saturating_sub(line_border_width).max(1);

        let mut max_line_length = self
            .text
            .lines()
            .map(|line| return line.chars().count())
            .max()
            .unwrap_or(0)
            .min(max_width);

        let label_len = self.label.chars().count();
        if max_line_length < label_len {
            max_line_length = label_len;
        }

        return max_line_length;
    }

    fn wrap_lines_in_bubble(&self, lines: Vec<Line<'static>>, max_line_length: usize) -> Vec<Line<'static>> {
        let label_len = self.label.chars().count();
        // Add 2 for the vertical bars.
        let inner_bar = "─".repeat(max_line_length + 2 - label_len);
        let top_bar = format!("╭{}{inner_bar}╮", self.label);
        let bottom_bar = format!("╰{}╯", "─".repeat(max_line_length + 2));
        let bar_bubble_padding = repeat_from_subtractions(
            " ",
            vec![
                self.window_max_width,
                max_line_length,
                Bubble::style_config().bubble_padding,
            ],
        );

        let mut res = vec![];
        if self.alignment == BubbleAlignment::Left {
            res.push(self.highlight_line(format!("{top_bar}{bar_bubble_padding}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bottom_bar}{bar_bubble_padding}")));
        } else {
            res.push(self.highlight_line(format!("{bar_bubble_padding}{top_bar}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bar_bubble_padding}{bottom_bar}")));
        }

        return res;
    }

    fn colour(&self) -> Option<Color> {
        match self.kind {
            BubbleKind::Turn => return None,
            BubbleKind::Notice => return Some(Color::Rgb(138, 85, 63)),
            BubbleKind::Error => return Some(Color::Red),
        }
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        return Span::styled(
            text,
            Style {
                fg: self.colour(),
                ..Style::default()
            },
        );
    }

    fn text_span(&self, text: String) -> Span<'static> {
        if self.kind == BubbleKind::Error {
            return self.highlight_span(text);
        }

        return Span::from(text);
    }

    fn highlight_line(&self, text: String) -> Line<'static> {
        return Line::from(self.highlight_span(text));
    }
}
