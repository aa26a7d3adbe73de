//! Column layout engine for fixed-width tables.
//!
//! Columns are declared with a sizing policy, resolved against the terminal
//! width and the widest data per column, and then used to render rows. A
//! trailing run of right-aligned columns is always kept flush with the right
//! edge of the resolved width, no matter how much a flex column used.

use super::layout::{display_width, pad_left, pad_right, spaces, truncate};
use ratatui::style::Style;
use ratatui::text::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Always exactly this wide.
    Fixed(usize),
    /// Widest of header and data, clamped to `[min, max]` (`max == 0`: unbounded).
    Fit { min: usize, max: usize },
    /// Shares whatever width is left, clamped to `[min, max]`.
    Flex { min: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub sizing: Sizing,
    pub align: Align,
    /// Output of [`Table::resolve`].
    pub width: usize,
}

impl Column {
    fn new(header: &str, sizing: Sizing) -> Self {
        Self {
            header: header.to_string(),
            sizing,
            align: Align::Left,
            width: 0,
        }
    }

    pub fn fixed(header: &str, width: usize) -> Self {
        Self::new(header, Sizing::Fixed(width))
    }

    pub fn fit(header: &str, min: usize, max: usize) -> Self {
        Self::new(header, Sizing::Fit { min, max })
    }

    pub fn flex(header: &str, min: usize, max: usize) -> Self {
        Self::new(header, Sizing::Flex { min, max })
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }
}

fn clamp(width: usize, min: usize, max: usize) -> usize {
    let width = width.max(min);
    if max > 0 {
        width.min(max)
    } else {
        width
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub gap: usize,
}

impl Table {
    pub const DEFAULT_GAP: usize = 1;

    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            gap: Self::DEFAULT_GAP,
        }
    }

    pub fn with_gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    fn gaps_width(&self) -> usize {
        self.columns.len().saturating_sub(1) * self.gap
    }

    /// Compute every column's width for `total_width` columns.
    ///
    /// `data_widths[i]` is the widest cell in column `i` (missing entries
    /// count as 0). When nothing is left for flex columns they fall back to
    /// their minimum, which can overflow `total_width`.
    pub fn resolve(&mut self, total_width: usize, data_widths: &[usize]) {
        let mut used = 0usize;
        let mut flex_count = 0usize;

        for (i, col) in self.columns.iter_mut().enumerate() {
            match col.sizing {
                Sizing::Fixed(width) => {
                    col.width = width;
                    used += width;
                }
                Sizing::Fit { min, max } => {
                    let data = data_widths.get(i).copied().unwrap_or(0);
                    col.width = clamp(display_width(&col.header).max(data), min, max);
                    used += col.width;
                }
                Sizing::Flex { .. } => flex_count += 1,
            }
        }

        if flex_count == 0 {
            return;
        }

        let remaining = total_width as i64 - used as i64 - self.gaps_width() as i64;
        if remaining <= 0 {
            for col in &mut self.columns {
                if let Sizing::Flex { min, .. } = col.sizing {
                    col.width = min;
                }
            }
            return;
        }

        let remaining = remaining as usize;
        let per = remaining / flex_count;
        let extra = remaining % flex_count;
        let mut nth = 0;
        for col in &mut self.columns {
            if let Sizing::Flex { min, max } = col.sizing {
                let share = per + usize::from(nth < extra);
                col.width = clamp(share, min, max);
                nth += 1;
            }
        }
    }

    pub fn widths(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.width).collect()
    }

    /// Sum of resolved widths plus gaps.
    pub fn total_width(&self) -> usize {
        self.columns.iter().map(|c| c.width).sum::<usize>() + self.gaps_width()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// Index where the trailing run of right-aligned columns begins.
    fn right_group_start(&self) -> usize {
        self.columns
            .iter()
            .rposition(|c| c.align != Align::Right)
            .map_or(0, |i| i + 1)
    }

    fn cell(&self, idx: usize, value: &str, force_right: bool) -> String {
        let col = &self.columns[idx];
        let text = truncate(value, col.width);
        if force_right || col.align == Align::Right {
            pad_left(&text, col.width)
        } else {
            pad_right(&text, col.width)
        }
    }

    /// Render one row as styled spans. `style_fn` receives the column index
    /// and the padded cell text.
    pub fn render_spans<S, F>(&self, cells: &[S], style_fn: F) -> Vec<Span<'static>>
    where
        S: AsRef<str>,
        F: Fn(usize, &str) -> Style,
    {
        let value = |i: usize| cells.get(i).map(|c| c.as_ref()).unwrap_or("");
        let right_start = self.right_group_start();
        let gap = spaces(self.gap).into_owned();
        let mut spans = Vec::with_capacity(self.columns.len() * 2);

        let mut left_width = 0;
        for i in 0..right_start {
            if i > 0 {
                spans.push(Span::raw(gap.clone()));
                left_width += self.gap;
            }
            let text = self.cell(i, value(i), false);
            left_width += display_width(&text);
            let style = style_fn(i, &text);
            spans.push(Span::styled(text, style));
        }

        if right_start == self.columns.len() {
            return spans;
        }

        let mut right = Vec::new();
        let mut right_width = 0;
        for i in right_start..self.columns.len() {
            if i > right_start {
                right.push(Span::raw(gap.clone()));
                right_width += self.gap;
            }
            let text = self.cell(i, value(i), true);
            right_width += display_width(&text);
            let style = style_fn(i, &text);
            right.push(Span::styled(text, style));
        }

        let leftover = self.total_width().saturating_sub(left_width + right_width);
        let connecting = leftover.max(self.gap);
        if connecting > 0 {
            spans.push(Span::raw(spaces(connecting).into_owned()));
        }
        spans.extend(right);
        spans
    }

    /// Render one row as plain text.
    pub fn render_row<S: AsRef<str>>(&self, cells: &[S]) -> String {
        self.render_spans(cells, |_, _| Style::default())
            .iter()
            .map(|s| s.content.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn abc_table() -> Table {
        Table::new(vec![
            Column::fixed("A", 5),
            Column::flex("B", 3, 0),
            Column::fit("C", 3, 0).right(),
        ])
    }

    #[test]
    fn right_group_ends_at_total_width() {
        let mut table = abc_table();
        table.resolve(20, &[5, 1, 3]);
        assert_eq!(table.widths(), vec![5, 10, 3]);

        for b in ["", "x", "a much longer value than fits"] {
            let row = table.render_row(&["aaaaa", b, "ccc"]);
            assert_eq!(display_width(&row), 20, "row {row:?}");
            assert!(row.ends_with("ccc"));
        }
    }

    #[test]
    fn right_aligned_cells_are_left_padded() {
        let mut table = abc_table();
        table.resolve(20, &[5, 1, 3]);
        let row = table.render_row(&["a", "b", "c"]);
        assert_eq!(row, format!("a     b{}  c", " ".repeat(10)));
    }

    #[test]
    fn fit_uses_header_and_clamps() {
        let mut table = Table::new(vec![
            Column::fit("STATUS", 6, 12),
            Column::fit("ID", 4, 20),
            Column::fit("X", 1, 3),
        ]);
        table.resolve(80, &[2, 30, 10]);
        assert_eq!(table.widths(), vec![6, 20, 3]);
    }

    #[test]
    fn flex_remainder_goes_to_first_columns() {
        let mut table = Table::new(vec![
            Column::flex("A", 1, 0),
            Column::flex("B", 1, 0),
            Column::flex("C", 1, 0),
        ]);
        // 19 - 2 gaps = 17 -> 6, 6, 5
        table.resolve(19, &[]);
        assert_eq!(table.widths(), vec![6, 6, 5]);
        assert_eq!(table.total_width(), 19);
    }

    #[test]
    fn flex_respects_max() {
        let mut table = Table::new(vec![Column::fixed("A", 4), Column::flex("B", 2, 10)]);
        table.resolve(40, &[]);
        assert_eq!(table.widths(), vec![4, 10]);
    }

    #[test]
    fn narrow_terminal_forces_flex_to_min() {
        let mut table = Table::new(vec![Column::fixed("A", 10), Column::flex("B", 8, 0)]);
        table.resolve(9, &[]);
        assert_eq!(table.widths(), vec![10, 8]);
        assert_eq!(table.total_width(), 19);
    }

    #[test]
    fn row_without_right_group_is_left_section_only() {
        let mut table = Table::new(vec![Column::fixed("A", 3), Column::flex("B", 1, 0)]);
        table.resolve(10, &[]);
        assert_eq!(table.render_row(&["x", "y"]), "x   y     ");
    }

    #[test]
    fn missing_cells_render_blank() {
        let mut table = abc_table();
        table.resolve(20, &[]);
        assert_eq!(table.render_row(&["a"]), format!("a{}", " ".repeat(19)));
    }

    #[test]
    fn custom_gap_is_minimum_connector() {
        let mut table = Table::new(vec![Column::fixed("A", 6), Column::fixed("B", 2).right()])
            .with_gap(2);
        table.resolve(4, &[]);
        let row = table.render_row(&["abcdef", "zz"]);
        assert_eq!(row, "abcdef  zz");
    }

    #[test]
    fn all_right_aligned_row_still_leads_with_gap() {
        let mut table = Table::new(vec![
            Column::fixed("A", 2).right(),
            Column::fixed("B", 3).right(),
        ]);
        table.resolve(6, &[]);
        assert_eq!(table.render_row(&["a", "bb"]), "   a  bb");
    }

    #[test]
    fn style_fn_sees_padded_cells() {
        let mut table = Table::new(vec![Column::fixed("A", 4), Column::fixed("B", 3).right()]);
        table.resolve(8, &[]);
        let seen = std::cell::RefCell::new(Vec::new());
        table.render_spans(&["ab", "c"], |col, text| {
            seen.borrow_mut().push((col, text.to_string()));
            Style::default()
        });
        assert_eq!(
            seen.into_inner(),
            vec![(0, "ab  ".to_string()), (1, "  c".to_string())]
        );
    }

    fn sizing_strategy() -> impl Strategy<Value = Column> {
        prop_oneof![
            (0usize..12).prop_map(|w| Column::fixed("F", w)),
            (0usize..6, 0usize..12).prop_map(|(min, max)| Column::fit("FIT", min, max)),
            (0usize..6, 0usize..12).prop_map(|(min, max)| Column::fit("R", min, max).right()),
        ]
    }

    proptest! {
        #[test]
        fn unclamped_flex_absorbs_all_width(
            mut cols in prop::collection::vec(sizing_strategy(), 0..6),
            flex_at in 0usize..6,
            flex_min in 0usize..8,
            slack in 0usize..40,
            data in prop::collection::vec(0usize..20, 0..7),
        ) {
            let at = flex_at.min(cols.len());
            cols.insert(at, Column::flex("TITLE", flex_min, 0));
            let mut table = Table::new(cols);

            // Fixed/fit widths don't depend on total width; measure them first
            table.resolve(0, &data);
            let used: usize = table
                .columns
                .iter()
                .filter(|c| !matches!(c.sizing, Sizing::Flex { .. }))
                .map(|c| c.width)
                .sum();
            let total = used + table.gaps_width() + flex_min.max(1) + slack;

            table.resolve(total, &data);
            prop_assert_eq!(table.total_width(), total);

            let cells: Vec<String> = (0..table.columns.len()).map(|i| "w".repeat(i * 3)).collect();
            prop_assert_eq!(display_width(&table.render_row(&cells)), total);
        }
    }
}
