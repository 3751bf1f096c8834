use chrono::{TimeZone, Utc};
use lexicon::{Document, Engine, Locale, LocaleStore, Policy, Timeago};

fn store() -> LocaleStore {
    let locale = Locale::from_json(
        "zh-CN",
        r#"{"dict": {"star": "星标", "watch": "关注", "pull requests": "拉取请求"}}"#,
    )
    .unwrap();
    LocaleStore::new("zh-CN", Some("zh-CN".into()), locale)
}

fn clock() -> Timeago {
    Timeago::at(Utc.with_ymd_and_hms(2021, 4, 7, 12, 0, 0).unwrap())
}

const PAGE: &str = r#"<!DOCTYPE html><html><head></head><body><div id="app"><p>Star</p></div><div id="readme"></div></body></html>"#;

#[test]
fn inserted_subtree_matches_a_fresh_load() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let fragment = r#"<ul><li><a> Watch </a></li><li><input type="button" value="Star"></li><li><code>Star</code></li></ul>"#;

    // Content present at load time.
    let mut loaded = Document::parse(&PAGE.replace(
        r#"<div id="app"><p>Star</p></div>"#,
        &format!(r#"<div id="app"><p>Star</p>{fragment}</div>"#),
    ));
    let (_, watcher) = engine.boot(&mut loaded);
    watcher.disconnect(&mut loaded);

    // Same content arriving after the initial pass.
    let mut live = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut live);
    let app = live.get_element_by_id("app").unwrap();
    live.append_html(app, fragment);
    let (batches, stats) = watcher.run_until_idle(&mut live, engine.walker(), 8);

    assert!(batches <= 2);
    assert!(!watcher.has_pending(&live));
    assert_eq!(stats.texts, 1);
    assert_eq!(stats.inputs, 1);
    assert_eq!(live.to_html(), loaded.to_html());
    assert!(live.to_html().contains("<code>Star</code>"));
}

#[test]
fn insertion_under_blocked_ancestor_is_skipped() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut doc);
    let readme = doc.get_element_by_id("readme").unwrap();
    doc.append_html(readme, "<p>Star</p>");
    let (_, stats) = watcher.run_until_idle(&mut doc, engine.walker(), 8);

    assert_eq!(stats.rewritten(), 0);
    assert_eq!(doc.inner_html(readme), "<p>Star</p>");
}

#[test]
fn bare_text_insertion_is_translated() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut doc);
    let app = doc.get_element_by_id("app").unwrap();
    let text = doc.create_text(" Pull  requests");
    doc.append_child(app, text);
    watcher.run_until_idle(&mut doc, engine.walker(), 8);

    assert_eq!(doc.text(text), Some(" 拉取请求"));
}

#[test]
fn inserted_relative_time_settles() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut doc);
    let app = doc.get_element_by_id("app").unwrap();
    doc.append_html(
        app,
        r#"<relative-time datetime="2021-04-07T11:59:00Z">Apr 7</relative-time>"#,
    );
    let (batches, stats) = watcher.run_until_idle(&mut doc, engine.walker(), 8);

    assert_eq!(stats.relative_times, 1);
    assert!(batches <= 2);
    assert!(!watcher.has_pending(&doc));
    assert!(doc.inner_html(app).ends_with("1 分钟前</relative-time>"));
}

#[test]
fn relative_time_filled_in_later_is_formatted() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);
    let stamp = r#"<relative-time datetime="2021-04-07T10:00:00Z">"#;

    let mut loaded = Document::parse(
        &PAGE.replace("<p>Star</p>", &format!("{stamp}Apr 7</relative-time>")),
    );
    let (_, watcher) = engine.boot(&mut loaded);
    watcher.disconnect(&mut loaded);

    // Rendered empty, text supplied by a later script.
    let mut live =
        Document::parse(&PAGE.replace("<p>Star</p>", &format!("{stamp}</relative-time>")));
    let (boot, watcher) = engine.boot(&mut live);
    assert_eq!(boot.initial.relative_times, 0);
    let app = live.get_element_by_id("app").unwrap();
    let element = live.children(app)[0];
    let text = live.create_text("Apr 7");
    live.append_child(element, text);
    let (_, stats) = watcher.run_until_idle(&mut live, engine.walker(), 8);

    assert_eq!(stats.relative_times, 1);
    assert!(!watcher.has_pending(&live));
    assert_eq!(live.inner_html(element), "2 小时前");
    assert_eq!(live.to_html(), loaded.to_html());
}

#[test]
fn template_content_is_left_inert() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(&PAGE.replace(
        "<p>Star</p>",
        "<p>Star</p><template id=\"row\"><span>Watch</span></template>",
    ));
    let (boot, watcher) = engine.boot(&mut doc);
    assert_eq!(boot.initial.texts, 1);
    let row = doc.get_element_by_id("row").unwrap();
    doc.append_html(row, "<b>Star</b>");
    let (_, stats) = watcher.run_until_idle(&mut doc, engine.walker(), 8);

    assert_eq!(stats.rewritten(), 0);
    assert_eq!(doc.inner_html(row), "<span>Watch</span><b>Star</b>");
}

#[test]
fn own_rewrites_do_not_requeue_work() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut doc);
    let app = doc.get_element_by_id("app").unwrap();
    doc.append_html(app, "<span>Watch</span><span>Star</span>");
    let first = watcher.process_batch(&mut doc, engine.walker());
    assert_eq!(first.texts, 2);

    let second = watcher.process_batch(&mut doc, engine.walker());
    assert_eq!(second.rewritten(), 0);
}

#[test]
fn disconnected_watcher_sees_nothing() {
    let store = store();
    let policy = Policy::default();
    let formatter = clock();
    let engine = Engine::new(&store, &policy, &formatter);

    let mut doc = Document::parse(PAGE);
    let (_, watcher) = engine.boot(&mut doc);
    let app = doc.get_element_by_id("app").unwrap();
    let root = watcher.root();
    watcher.disconnect(&mut doc);
    doc.append_html(app, "<span>Star</span>");

    assert!(doc.contains(root, app));
    assert!(doc.inner_html(app).ends_with("<span>Star</span>"));
}
