use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use prdeck_core::status::WatchPolicy;
use prdeck_core::types::{
    ChecksResult, CommentsResult, Conclusion, PullRequestRef, Review, ReviewState,
};
use prdeck_core::GithubError;
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use super::*;
use crate::views::checks_list::tests::check;
use crate::views::test_support::{ch, key, thread};

fn pr() -> PullRequestRef {
    PullRequestRef {
        owner: "octo".to_owned(),
        repo: "widgets".to_owned(),
        number: 7,
    }
}

fn app(view: View) -> App {
    let mut app = App::new(pr(), Theme::dark(), view, None);
    app.handle_event(AppEvent::Resize(80, 24));
    app
}

fn comments() -> CommentsResult {
    let mut resolved = thread("t3", "src/b.rs", 9);
    resolved.is_resolved = true;
    CommentsResult::from_threads(
        7,
        vec![
            thread("t1", "src/a.rs", 3),
            thread("t2", "src/a.rs", 12),
            resolved,
        ],
    )
}

fn checks() -> ChecksResult {
    ChecksResult::from_checks(
        7,
        "0123456789abcdef",
        vec![
            check(1, "build", Some(Conclusion::Success)),
            check(2, "lint", Some(Conclusion::Failure)),
        ],
    )
}

fn press(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    app.handle_event(AppEvent::Key(key))
}

/// Draws one frame and returns its rows as plain text.
fn screen(app: &App, width: u16, height: u16) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
    terminal
        .draw(|frame| crate::ui::draw(frame, app))
        .expect("draw");
    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}

#[test]
fn init_requests_all_three_datasets() {
    let app = App::new(pr(), Theme::dark(), View::CommentsList, None);
    assert_eq!(
        app.init(),
        vec![
            Effect::FetchComments,
            Effect::FetchChecks,
            Effect::FetchReviews
        ]
    );
}

#[test]
fn watch_session_adds_the_first_poll() {
    let watcher = Watcher::new(Duration::from_secs(5), WatchPolicy::FailFast);
    let app = App::new(pr(), Theme::dark(), View::Watch, Some(watcher));
    assert_eq!(app.view(), View::Watch);
    assert_eq!(app.init().last(), Some(&Effect::PollChecks));
}

#[test]
fn watch_without_a_watcher_falls_back_to_checks() {
    let app = App::new(pr(), Theme::dark(), View::Watch, None);
    assert_eq!(app.view(), View::ChecksList);
}

#[test]
fn draws_nothing_before_the_first_resize() {
    let app = App::new(pr(), Theme::dark(), View::CommentsList, None);
    let rows = screen(&app, 40, 5);
    assert!(rows.iter().all(|row| row.trim().is_empty()));
}

#[test]
fn frame_has_status_content_and_help_rows() {
    let mut app = app(View::CommentsList);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("prdeck"));
    assert!(rows[0].contains("octo/widgets"));
    assert!(rows[0].contains("PR #7"));
    assert!(rows[0].contains("2 unresolved"));
    assert!(rows[0].contains("1 resolved"));
    assert!(rows[1].contains("src/a.rs"));
    assert!(rows[23].contains("navigate"));
    assert!(rows[23].contains("expand"));
}

#[test]
fn load_errors_clear_the_flag_and_are_recorded() {
    let mut app = app(View::Summary);
    app.handle_event(AppEvent::CommentsLoaded(Err(GithubError::Auth)));
    assert!(!app.data().loading.comments);
    assert!(app.data().loading.checks);
    assert_eq!(app.data().load_errors, ["comments: not authenticated"]);
    assert!(app.data().comments.is_none());
}

#[test]
fn quit_from_any_view() {
    let mut app = app(View::Resolve);
    press(&mut app, ch('q'));
    assert!(app.should_quit());

    let mut app = self::app(View::Summary);
    press(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit());
}

#[test]
fn tab_cycles_between_the_two_lists() {
    let mut app = app(View::CommentsList);
    press(&mut app, key(KeyCode::Tab));
    assert_eq!(app.view(), View::ChecksList);
    press(&mut app, key(KeyCode::Tab));
    assert_eq!(app.view(), View::CommentsList);
    press(&mut app, key(KeyCode::BackTab));
    assert_eq!(app.view(), View::ChecksList);
}

#[test]
fn tab_from_a_detail_view_leaves_its_family() {
    let mut app = app(View::CommentsList);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    press(&mut app, key(KeyCode::Enter));
    assert_eq!(app.view(), View::CommentsExpand);
    press(&mut app, key(KeyCode::Tab));
    assert_eq!(app.view(), View::ChecksList);
}

#[test]
fn enter_expands_the_thread_and_esc_returns() {
    let mut app = app(View::CommentsList);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    press(&mut app, ch('j'));
    assert!(press(&mut app, key(KeyCode::Enter)).is_empty());
    assert_eq!(app.view(), View::CommentsExpand);

    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("Thread 2 of 3"));
    assert!(rows[1].contains("src/a.rs:12"));

    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::CommentsList);
}

#[test]
fn copy_effect_is_passed_through() {
    let mut app = app(View::CommentsList);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    assert_eq!(
        press(&mut app, ch('y')),
        vec![Effect::CopyToClipboard("t1".to_owned())]
    );
}

#[test]
fn check_log_opens_from_the_list() {
    let mut app = app(View::ChecksList);
    app.handle_event(AppEvent::ChecksLoaded(Ok(checks())));
    press(&mut app, ch('j'));
    press(&mut app, ch('l'));
    assert_eq!(app.view(), View::ChecksLog);

    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("HEAD: 0123456"));
    assert!(rows[0].contains("1 passed"));
    assert!(rows[0].contains("1 failed"));
    assert!(rows[1].contains("lint"));

    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::ChecksList);
}

#[test]
fn resolve_flow_through_the_shell() {
    let mut app = app(View::Resolve);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    press(&mut app, ch(' '));
    press(&mut app, key(KeyCode::Enter));

    // Esc while confirming cancels the prompt instead of leaving the view.
    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::Resolve);
    press(&mut app, key(KeyCode::Enter));

    let effects = press(&mut app, ch('y'));
    assert_eq!(effects, vec![Effect::ResolveThreads(vec!["t1".to_owned()])]);

    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("resolve mode"));
    assert!(rows[0].contains("1 selected"));

    app.handle_event(AppEvent::ThreadResolved {
        thread_id: "t1".to_owned(),
        result: Ok(()),
    });
    assert_eq!(app.resolve.state(), ResolveState::Done);
}

#[test]
fn resolve_without_comments_shows_a_badge() {
    let app = app(View::Resolve);
    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("RESOLVE"));
}

#[test]
fn r_from_the_comments_list_opens_resolve() {
    let mut app = app(View::CommentsList);
    press(&mut app, ch('r'));
    assert_eq!(app.view(), View::Resolve);
    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::CommentsList);
}

#[test]
fn summary_shortcuts_remember_the_summary() {
    let mut app = app(View::Summary);
    press(&mut app, ch('c'));
    assert_eq!(app.view(), View::CommentsList);
    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::Summary);

    press(&mut app, ch('k'));
    assert_eq!(app.view(), View::ChecksList);
    press(&mut app, key(KeyCode::Esc));
    press(&mut app, ch('r'));
    assert_eq!(app.view(), View::Resolve);
}

#[test]
fn summary_ignores_unbound_keys() {
    let mut app = app(View::Summary);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    assert!(press(&mut app, ch('o')).is_empty());
    assert!(press(&mut app, ch('y')).is_empty());
    assert_eq!(app.view(), View::Summary);
}

#[test]
fn esc_is_a_no_op_in_the_start_view() {
    let mut app = app(View::ChecksList);
    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::ChecksList);
}

#[test]
fn summary_badge_follows_merge_readiness() {
    let mut app = app(View::Summary);
    app.handle_event(AppEvent::CommentsLoaded(Ok(CommentsResult::from_threads(7, vec![]))));
    app.handle_event(AppEvent::ChecksLoaded(Ok(ChecksResult::from_checks(
        7,
        "abc",
        vec![check(1, "build", Some(Conclusion::Success))],
    ))));
    app.handle_event(AppEvent::ReviewsLoaded(Ok(vec![Review {
        id: "r1".to_owned(),
        author: "maintainer".to_owned(),
        state: ReviewState::Approved,
        body: String::new(),
        submitted_at: None,
    }])));
    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("READY"));
    assert!(!rows[0].contains("NOT READY"));

    app.handle_event(AppEvent::ReviewsLoaded(Err(GithubError::RateLimit)));
    let rows = screen(&app, 80, 24);
    assert!(rows[0].contains("NOT READY"));
}

#[test]
fn watch_poll_updates_checks_and_stops_when_terminal() {
    let watcher = Watcher::new(Duration::from_secs(5), WatchPolicy::FailFast);
    let mut app = App::new(pr(), Theme::dark(), View::Watch, Some(watcher));
    app.handle_event(AppEvent::Resize(80, 24));

    let pending = ChecksResult::from_checks(7, "abc", vec![check(1, "build", None)]);
    assert_eq!(
        app.handle_event(AppEvent::WatchPolled(Ok(pending))),
        vec![Effect::SchedulePoll(Duration::from_secs(5))]
    );
    assert_eq!(
        app.handle_event(AppEvent::WatchTick),
        vec![Effect::PollChecks]
    );

    assert!(app
        .handle_event(AppEvent::WatchPolled(Ok(checks())))
        .is_empty());
    assert_eq!(app.data().checks.as_ref().map(|c| c.fail_count), Some(1));
    assert!(app.handle_event(AppEvent::WatchTick).is_empty());

    press(&mut app, key(KeyCode::Enter));
    assert_eq!(app.view(), View::ChecksLog);
    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.view(), View::Watch);
}

#[test]
fn watch_poll_keeps_the_checks_cursor() {
    let watcher = Watcher::new(Duration::from_secs(5), WatchPolicy::WaitAll);
    let mut app = App::new(pr(), Theme::dark(), View::ChecksList, Some(watcher));
    app.handle_event(AppEvent::Resize(80, 24));
    app.handle_event(AppEvent::ChecksLoaded(Ok(checks())));
    press(&mut app, ch('j'));

    let polled = ChecksResult::from_checks(
        7,
        "0123456789abcdef",
        vec![
            check(1, "build", Some(Conclusion::Success)),
            check(2, "lint", None),
        ],
    );
    app.handle_event(AppEvent::WatchPolled(Ok(polled)));
    press(&mut app, ch('l'));
    assert_eq!(app.view(), View::ChecksLog);
    assert!(screen(&app, 80, 24)[1].contains("lint"));
}

#[test]
fn summary_watch_polls_until_every_check_completes() {
    let watcher = Watcher::new(Duration::from_secs(5), WatchPolicy::WaitAll);
    let mut app = App::new(pr(), Theme::dark(), View::Summary, Some(watcher));
    app.handle_event(AppEvent::Resize(80, 24));
    assert_eq!(app.view(), View::Summary);
    assert!(app.init().contains(&Effect::PollChecks));

    let failing_and_pending = ChecksResult::from_checks(
        7,
        "abc",
        vec![
            check(1, "lint", Some(Conclusion::Failure)),
            check(2, "test", None),
        ],
    );
    assert_eq!(
        app.handle_event(AppEvent::WatchPolled(Ok(failing_and_pending))),
        vec![Effect::SchedulePoll(Duration::from_secs(5))]
    );
    assert_eq!(app.data().checks.as_ref().map(|c| c.pending_count), Some(1));

    assert!(app
        .handle_event(AppEvent::WatchPolled(Ok(checks())))
        .is_empty());
    assert!(app.handle_event(AppEvent::WatchTick).is_empty());
    assert_eq!(app.view(), View::Summary);
}

#[test]
fn resize_reaches_inactive_views() {
    let mut app = app(View::Summary);
    app.handle_event(AppEvent::CommentsLoaded(Ok(comments())));
    app.handle_event(AppEvent::Resize(60, 6));
    press(&mut app, ch('c'));
    // Content height 4 fits the header and one three-line row.
    let rows = screen(&app, 60, 6);
    assert!(rows[1].contains("src/a.rs"));
    assert!(rows[2].contains(":3"));
    assert!(!rows[4].contains(":12"));
}
