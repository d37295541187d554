// =====
// TESTS: 4
// =====
//
// End-to-end flows through `App`: a real workspace resolver, link settling,
// code block selection, and the copy/apply/open actions.

use code_chat_markdown::app::{BlockSelector, create_app, read_messages};
use code_chat_markdown::apply::{ApplyStatus, FileApplier};
use code_chat_markdown::codespan::SelectionRange;
use code_chat_markdown::config::Settings;
use code_chat_markdown::error::AppError;
use code_chat_markdown::ui::terminal::line_text;
use pretty_assertions::assert_eq;
use tokio::task::LocalSet;

use crate::helpers::{RecordingClipboard, RecordingNavigator, THREAD};

fn settings_for(root: &std::path::Path) -> Settings {
    Settings {
        workspace_root: Some(root.to_path_buf()),
        width: Some(80),
        resolve_wait_ms: 10_000,
        ..Settings::default()
    }
}

#[tokio::test]
async fn workspace_links_resolve_render_and_open() {
    LocalSet::new()
        .run_until(async {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("src")).unwrap();
            std::fs::write(
                dir.path().join("src/config.rs"),
                "use std::path::Path;\n\npub fn load_settings() {}\n",
            )
            .unwrap();

            let message = "See `config.rs:3` and `load_settings`.".to_owned();
            let mut app = create_app(settings_for(dir.path()), THREAD.to_owned(), vec![message]);

            let first: Vec<String> = app.render().iter().map(line_text).collect();
            assert!(first.contains(&"See config.rs:3 and load_settings.".to_owned()), "{first:?}");

            assert_eq!(app.settle_links().await, 2);
            let settled: Vec<String> = app.render().iter().map(line_text).collect();
            assert!(
                settled.contains(&"See config.rs (src/config.rs) and load_settings.".to_owned()),
                "{settled:?}"
            );

            let mut nav = RecordingNavigator::default();
            app.open_codespan("load_settings", &mut nav).unwrap();
            app.open_codespan("config.rs:3", &mut nav).unwrap();
            let config = dir.path().join("src/config.rs");
            let line3 = Some(SelectionRange { start_line: 3, end_line: 3 });
            assert_eq!(nav.0, vec![(config.clone(), line3), (config, line3)]);
        })
        .await;
}

#[tokio::test]
async fn unresolved_spans_cannot_be_opened() {
    LocalSet::new()
        .run_until(async {
            let dir = tempfile::tempdir().unwrap();
            let mut app = create_app(
                settings_for(dir.path()),
                THREAD.to_owned(),
                vec!["Run `missing_thing` now".to_owned()],
            );
            app.render();
            app.settle_links().await;
            let err = app.open_codespan("missing_thing", &mut RecordingNavigator::default());
            assert_eq!(err, Err(AppError::CodespanUnresolved("missing_thing".to_owned())));
        })
        .await;
}

#[tokio::test]
async fn copy_and_apply_select_blocks_by_index_or_id() {
    LocalSet::new()
        .run_until(async {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("out.py");
            let messages = vec![
                format!("```python\n{}\nprint('hi')\n```", target.display()),
                "```sh\nls\n".to_owned(),
            ];
            let mut app = create_app(settings_for(dir.path()), THREAD.to_owned(), messages);

            let mut clipboard = RecordingClipboard::default();
            app.copy_block(&BlockSelector::parse("2"), &mut clipboard).unwrap();
            assert_eq!(clipboard.0, vec!["ls".to_owned()]);

            let streaming = app.apply_block(&BlockSelector::parse("2"), &mut FileApplier);
            assert!(matches!(streaming, Err(AppError::ApplyFailed(_))));

            let id = format!("{THREAD}-0-0");
            app.apply_block(&BlockSelector::parse(&id), &mut FileApplier).unwrap();
            assert_eq!(std::fs::read_to_string(&target).unwrap(), "print('hi')\n");
            assert_eq!(app.apply_states.get(&id), ApplyStatus::Applied);

            for missing in ["0", "3", "nope-0-0"] {
                assert!(matches!(
                    app.find_code_block(&BlockSelector::parse(missing)),
                    Err(AppError::CodeBlockNotFound(_))
                ));
            }
        })
        .await;
}

#[test]
fn each_input_file_is_one_message() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.md");
    let b = dir.path().join("b.md");
    std::fs::write(&a, "first").unwrap();
    std::fs::write(&b, "second").unwrap();
    assert_eq!(read_messages(&[a, b]).unwrap(), vec!["first".to_owned(), "second".to_owned()]);

    let missing = read_messages(&[dir.path().join("nope.md")]);
    assert!(matches!(missing, Err(AppError::InputUnreadable(_))));
}
