//! Tests for reload behavior: explicit vs quiet loads, error display and
//! retry, change flashes and watcher-driven refresh.

use beady::config::Config;
use beady::data::Issue;
use beady::integrations::Snapshot;
use beady::tui::{App, Command, DetailLoad, Message};
use chrono::{Duration, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use pretty_assertions::assert_eq;

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::from(code))
}

fn make_issue(id: &str, updated_hours_ago: i64) -> Issue {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    Issue {
        id: id.to_string(),
        title: format!("Issue {id}"),
        priority: 2,
        created_at: base - Duration::days(10),
        updated_at: Some(base - Duration::hours(updated_hours_ago)),
        ..Default::default()
    }
}

fn data(quiet: bool, issues: Vec<Issue>) -> Message {
    Message::DataLoaded {
        quiet,
        result: Ok(Snapshot {
            issues,
            ..Default::default()
        }),
    }
}

fn data_error(quiet: bool, msg: &str) -> Message {
    Message::DataLoaded {
        quiet,
        result: Err(msg.to_string()),
    }
}

fn make_app() -> App {
    let mut app = App::with_watcher(&Config::default(), None);
    app.init();
    app.update(data(false, vec![make_issue("bd-1", 5), make_issue("bd-2", 5)]));
    app
}

mod explicit_load {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initial_load_clears_loading_without_flashing() {
        let mut app = App::with_watcher(&Config::default(), None);
        app.init();
        assert!(app.is_loading());
        let commands = app.update(data(false, vec![make_issue("bd-1", 5)]));
        assert!(commands.is_empty());
        assert!(!app.is_loading());
        assert!(app.list().flashing().is_empty());
    }

    #[test]
    fn r_reloads_with_loading_state() {
        let mut app = make_app();
        assert_eq!(
            app.update(key(KeyCode::Char('r'))),
            vec![Command::FetchData { quiet: false }]
        );
        assert!(app.is_loading());
    }

    #[test]
    fn error_is_shown_and_retry_reissues_request() {
        let mut app = make_app();
        app.update(key(KeyCode::Char('r')));
        app.update(data_error(false, "bd list failed: database locked"));
        assert!(!app.is_loading());
        assert_eq!(app.error(), Some("bd list failed: database locked"));

        // Other keys do nothing while the error is up
        assert!(app.update(key(KeyCode::Char('j'))).is_empty());

        assert_eq!(
            app.update(key(KeyCode::Char('r'))),
            vec![Command::FetchData { quiet: false }]
        );
        assert!(app.error().is_none());
        assert!(app.is_loading());
    }

    #[test]
    fn failed_detail_open_is_retried_as_detail_open() {
        let mut app = make_app();
        app.update(key(KeyCode::Enter));
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Open,
            result: Err("issue bd-1 not found".to_string()),
        });
        assert_eq!(app.error(), Some("issue bd-1 not found"));
        assert_eq!(
            app.update(key(KeyCode::Char('r'))),
            vec![Command::FetchDetail {
                id: "bd-1".to_string(),
                load: DetailLoad::Open,
            }]
        );
    }

    #[test]
    fn q_quits_from_error_view() {
        let mut app = make_app();
        app.update(data_error(false, "boom"));
        assert_eq!(app.update(key(KeyCode::Char('q'))), vec![Command::Quit]);
    }

    #[test]
    fn successful_load_clears_error() {
        let mut app = make_app();
        app.update(data_error(false, "boom"));
        app.update(data(false, vec![make_issue("bd-1", 5)]));
        assert!(app.error().is_none());
    }
}

mod quiet_load {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quiet_error_keeps_stale_data() {
        let mut app = make_app();
        let commands = app.update(data_error(true, "database is locked"));
        assert!(commands.is_empty());
        assert!(app.error().is_none());
        assert_eq!(app.list().visible_ids(), vec!["bd-1", "bd-2"]);
    }

    #[test]
    fn quiet_load_does_not_touch_loading_flag() {
        let mut app = make_app();
        app.update(key(KeyCode::Char('r')));
        app.update(data(true, vec![make_issue("bd-1", 5)]));
        assert!(app.is_loading());
    }

    #[test]
    fn changed_issue_flashes_until_timer_fires() {
        let mut app = make_app();
        let commands = app.update(data(
            true,
            vec![make_issue("bd-1", 1), make_issue("bd-2", 5)],
        ));
        assert_eq!(
            commands,
            vec![Command::After(
                Config::default().ui.flash_duration(),
                Message::FlashExpired
            )]
        );
        assert!(app.list().is_flashing("bd-1"));
        assert!(!app.list().is_flashing("bd-2"));

        app.update(Message::FlashExpired);
        assert!(app.list().flashing().is_empty());
    }

    #[test]
    fn quiet_detail_error_is_swallowed() {
        let mut app = make_app();
        app.update(key(KeyCode::Enter));
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Open,
            result: Ok(make_issue("bd-1", 5)),
        });
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Quiet,
            result: Err("boom".to_string()),
        });
        assert!(app.error().is_none());
        assert_eq!(app.detail().map(|d| d.id()), Some("bd-1"));
    }

    #[test]
    fn refresh_for_other_issue_is_ignored() {
        let mut app = make_app();
        app.update(key(KeyCode::Enter));
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Open,
            result: Ok(make_issue("bd-1", 5)),
        });
        let mut other = make_issue("bd-2", 5);
        other.title = "Should not appear".to_string();
        app.update(Message::DetailLoaded {
            id: "bd-2".to_string(),
            load: DetailLoad::Quiet,
            result: Ok(other),
        });
        let detail = app.detail().unwrap();
        assert_eq!(detail.id(), "bd-1");
        assert_eq!(detail.issue().title, "Issue bd-1");
    }

    #[test]
    fn quiet_detail_refresh_keeps_scroll() {
        let mut app = make_app();
        app.update(Message::Resize {
            width: 60,
            height: 8,
        });
        app.update(key(KeyCode::Enter));
        let mut long = make_issue("bd-1", 5);
        long.description = "line\n".repeat(40);
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Open,
            result: Ok(long.clone()),
        });
        for _ in 0..5 {
            app.update(key(KeyCode::Char('j')));
        }
        assert_eq!(app.detail().unwrap().scroll(), 5);

        long.title = "Renamed".to_string();
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Quiet,
            result: Ok(long),
        });
        let detail = app.detail().unwrap();
        assert_eq!(detail.issue().title, "Renamed");
        assert_eq!(detail.scroll(), 5);
    }
}

mod file_changes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_view_reloads_quietly_and_rearms() {
        let mut app = make_app();
        assert_eq!(
            app.update(Message::FileChanged),
            vec![Command::WatchForChange, Command::FetchData { quiet: true }]
        );
        assert!(!app.is_loading());
    }

    #[test]
    fn detail_view_reloads_current_issue() {
        let mut app = make_app();
        app.update(key(KeyCode::Enter));
        app.update(Message::DetailLoaded {
            id: "bd-1".to_string(),
            load: DetailLoad::Open,
            result: Ok(make_issue("bd-1", 5)),
        });
        assert_eq!(
            app.update(Message::FileChanged),
            vec![
                Command::WatchForChange,
                Command::FetchDetail {
                    id: "bd-1".to_string(),
                    load: DetailLoad::Quiet,
                }
            ]
        );
    }
}
