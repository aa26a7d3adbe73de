//! Display-column text utilities and small layout helpers.
//!
//! All widths are terminal columns: wide (CJK) characters count 2 and
//! combining marks count 0.

use once_cell::sync::Lazy;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

pub const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Pre-computed padding strings to avoid repeated " ".repeat(n) allocations.
static PADDING: Lazy<Vec<String>> = Lazy::new(|| (0..=128).map(|n| " ".repeat(n)).collect());

/// Spaces of the given width; reuses the cache for common sizes.
pub fn spaces(width: usize) -> std::borrow::Cow<'static, str> {
    match PADDING.get(width) {
        Some(s) => std::borrow::Cow::Borrowed(s.as_str()),
        None => std::borrow::Cow::Owned(" ".repeat(width)),
    }
}

/// Calculate the display width of text (accounting for Unicode).
///
/// Summed per character so that it always agrees with [`truncate_to_width`].
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Longest prefix of `text` that fits in `max_width` columns.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Shorten `text` to `max_width` columns, ending in `...` when cut.
///
/// Widths too small to hold the marker get a plain cut instead.
pub fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width < ELLIPSIS_WIDTH {
        return truncate_to_width(text, max_width);
    }
    let mut out = truncate_to_width(text, max_width - ELLIPSIS_WIDTH);
    out.push_str(ELLIPSIS);
    out
}

/// Append spaces until `text` is `width` columns wide. Never truncates.
pub fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    let mut out = String::with_capacity(text.len() + pad);
    out.push_str(text);
    out.push_str(&spaces(pad));
    out
}

/// Prepend spaces until `text` is `width` columns wide. Never truncates.
pub fn pad_left(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    let mut out = String::with_capacity(text.len() + pad);
    out.push_str(&spaces(pad));
    out.push_str(text);
    out
}

/// Calculate the display width of a Line.
pub fn line_display_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| display_width(span.content.as_ref()))
        .sum()
}

/// Plain text of a Line with styling dropped.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Pad a Line to a specific width by adding trailing spaces.
pub fn pad_line_to_width<'a>(mut line: Line<'a>, width: usize) -> Line<'a> {
    let current = line_display_width(&line);
    if current < width {
        line.spans.push(Span::raw(spaces(width - current).into_owned()));
    }
    line
}

/// Fit a Line to a maximum width by truncating spans.
pub fn fit_line_to_width<'a>(line: Line<'a>, max_width: usize) -> Line<'a> {
    let Line {
        spans,
        alignment,
        style,
    } = line;
    let mut out: Vec<Span<'a>> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        if used >= max_width {
            break;
        }
        let span_width = display_width(span.content.as_ref());
        if used + span_width <= max_width {
            used += span_width;
            out.push(span);
        } else {
            let truncated = truncate_to_width(span.content.as_ref(), max_width - used);
            if !truncated.is_empty() {
                out.push(Span::styled(truncated, span.style));
            }
            break;
        }
    }

    Line {
        spans: out,
        alignment,
        style,
    }
}

/// Rows a line occupies when wrapped at `width` columns (at least 1).
pub fn wrapped_height(line: &Line<'_>, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    line_display_width(line).div_ceil(width).max(1)
}

/// Join a left and right part into one line of exactly `width` columns when
/// both fit; otherwise the parts are separated by two spaces and left to wrap.
pub fn split_line(left: Vec<Span<'static>>, right: Vec<Span<'static>>, width: usize) -> Line<'static> {
    let left_width: usize = left.iter().map(|s| display_width(&s.content)).sum();
    let right_width: usize = right.iter().map(|s| display_width(&s.content)).sum();
    let gap = if right.is_empty() {
        0
    } else if left_width + right_width + 2 <= width {
        width - left_width - right_width
    } else {
        2
    };
    let mut spans = left;
    if gap > 0 {
        spans.push(Span::raw(spaces(gap).into_owned()));
    }
    spans.extend(right);
    Line::from(spans)
}

/// Calculate a centered popup rectangle within a container.
pub fn popup_rect(
    percent_x: u16,
    percent_y: u16,
    min_width: u16,
    min_height: u16,
    r: Rect,
) -> Rect {
    let max_width = r.width.saturating_sub(2).max(1);
    let max_height = r.height.saturating_sub(2).max(1);

    let target_width = (r.width.saturating_mul(percent_x) / 100).max(min_width);
    let target_height = (r.height.saturating_mul(percent_y) / 100).max(min_height);

    let width = target_width.min(max_width);
    let height = target_height.min(max_height);

    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn display_width_counts_columns_not_bytes() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
        // e + combining acute accent
        assert_eq!(display_width("e\u{301}"), 1);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 4), "h...");
        assert_eq!(truncate("hello", 3), "...");
    }

    #[test]
    fn truncate_respects_wide_characters() {
        // 日本語テキスト is 14 columns; 7 columns leaves room for 2 wide chars
        let out = truncate("日本語テキスト", 7);
        assert_eq!(out, "日本...");
        assert!(display_width(&out) <= 7);
    }

    #[test]
    fn truncate_to_zero_or_tiny_widths() {
        assert_eq!(truncate("hello", 0), "");
        assert_eq!(truncate("hello", 2), "he");
    }

    #[test]
    fn padding_never_truncates() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_left("ab", 4), "  ab");
        assert_eq!(pad_right("abcdef", 4), "abcdef");
        assert_eq!(pad_left("日本", 5), " 日本");
    }

    #[test]
    fn wrapped_height_rounds_up() {
        assert_eq!(wrapped_height(&Line::from("abcdef"), 3), 2);
        assert_eq!(wrapped_height(&Line::from("abcdefg"), 3), 3);
        assert_eq!(wrapped_height(&Line::from(""), 3), 1);
    }

    #[test]
    fn split_line_fills_exact_width() {
        let line = split_line(vec![Span::raw("left")], vec![Span::raw("right")], 20);
        assert_eq!(line_text(&line), format!("left{}right", " ".repeat(11)));
        let narrow = split_line(vec![Span::raw("left")], vec![Span::raw("right")], 8);
        assert_eq!(line_text(&narrow), "left  right");
    }

    #[test]
    fn fit_line_cuts_inside_span() {
        let line = Line::from(vec![Span::raw("abc"), Span::raw("def")]);
        assert_eq!(line_text(&fit_line_to_width(line, 4)), "abcd");
    }

    proptest! {
        #[test]
        fn truncate_is_idempotent(s in "\\PC{0,40}", n in 0usize..50) {
            let once = truncate(&s, n);
            prop_assert_eq!(truncate(&once, n), once.clone());
            prop_assert!(display_width(&once) <= n);
        }

        #[test]
        fn pad_right_reaches_target_width(s in "\\PC{0,30}", n in 0usize..60) {
            prop_assert_eq!(display_width(&pad_right(&s, n)), display_width(&s).max(n));
            prop_assert_eq!(display_width(&pad_left(&s, n)), display_width(&s).max(n));
        }
    }
}
