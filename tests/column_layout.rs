//! Tests for the column layout engine and the list rows built on it.

use beady::config::UiConfig;
use beady::data::Issue;
use beady::integrations::Snapshot;
use beady::tui::ui::layout::display_width;
use beady::tui::ui::table::{Column, Table};
use beady::tui::ui::theme::Theme;
use beady::tui::ListView;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

mod table {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn right_group_stays_flush_when_flex_is_narrow() {
        let mut table = Table::new(vec![
            Column::fixed("A", 5),
            Column::flex("B", 3, 0),
            Column::fit("C", 3, 0).right(),
        ]);
        table.resolve(20, &[5, 0, 3]);
        assert_eq!(table.total_width(), 20);

        let row = table.render_row(&["12345", "", "xyz"]);
        assert_eq!(row.len(), 20);
        assert_eq!(&row[17..], "xyz");
    }

    #[test]
    fn too_narrow_terminal_overflows_instead_of_shrinking() {
        let mut table = Table::new(vec![
            Column::fixed("ID", 8),
            Column::flex("TITLE", 10, 0),
            Column::fixed("AGE", 3).right(),
        ]);
        table.resolve(12, &[]);
        assert_eq!(table.widths(), vec![8, 10, 3]);
        assert_eq!(table.total_width(), 23);
    }

    #[test]
    fn long_cells_are_truncated_with_ellipsis() {
        let mut table = Table::new(vec![Column::fixed("T", 8), Column::fixed("N", 2).right()]);
        table.resolve(11, &[]);
        assert_eq!(table.render_row(&["a long title", "7"]), "a lon...  7");
    }
}

mod list_rows {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_issue(id: &str, title: &str) -> Issue {
        Issue {
            id: id.to_string(),
            title: title.to_string(),
            priority: 1,
            issue_type: "bug".to_string(),
            created_at: Utc::now() - Duration::days(3),
            ..Default::default()
        }
    }

    #[test]
    fn rows_fill_terminal_width_and_end_with_right_columns() {
        for width in [80u16, 120, 200] {
            let mut view = ListView::new(Arc::new(Theme::default()), &UiConfig::default());
            view.set_size(width, 30);
            view.set_data(Snapshot {
                issues: vec![
                    make_issue("bd-1", "short"),
                    make_issue("bd-2", &"a very long title ".repeat(20)),
                ],
                ..Default::default()
            });
            for row in view.row_texts(Utc::now()) {
                assert_eq!(display_width(&row), width as usize, "row {row:?}");
                assert!(row.trim_end().ends_with("3d"), "row {row:?}");
            }
        }
    }
}
