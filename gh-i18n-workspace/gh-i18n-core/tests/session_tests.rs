use chrono::{TimeZone, Utc};
use gh_i18n_core::config::TranslatorConfig;
use gh_i18n_core::services::{
    LogNotifier, OnDemandTranslator, PageSession, TranslationOutcome, TranslationResponse,
    TranslationTransport, TransportError,
};
use gh_i18n_core::CoreConfig;
use lexicon::{Document, Locale, LocaleStore, Policy};
use url::Url;

struct Echo;

impl TranslationTransport for Echo {
    fn fetch(&self, _url: &Url) -> Result<TranslationResponse, TransportError> {
        Ok(TranslationResponse::ok("<em>Star</em>"))
    }
}

const PAGE: &str = r#"<!DOCTYPE html><html><head></head><body>
<div class="repository-content"><p class="f4">Sign in</p></div>
<summary aria-label="Create new…">+</summary>
<relative-time datetime="2021-04-07T10:00:00Z">Apr 7</relative-time>
<div id="readme"><p>Sign in</p></div>
</body></html>"#;

fn session_with(translator: Option<TranslatorConfig>) -> PageSession {
    let locale = Locale::from_json(
        "zh-CN",
        r#"{
            "css": [{"selector": "summary[aria-label=\"Create new…\"]", "key": "aria-label", "replacement": "新建…"}],
            "dict": {"sign in": "登录", "star": "星标", "translate": "翻译"}
        }"#,
    )
    .unwrap();
    let store = LocaleStore::new("zh-CN", Some("zh-CN".into()), locale);
    let translator = translator.map(|cfg| OnDemandTranslator::from_config(&cfg).unwrap());
    PageSession::new(store, Policy::default(), translator, 16)
        .with_clock(Utc.with_ymd_and_hms(2021, 4, 7, 12, 0, 0).unwrap())
}

fn session(translator: bool) -> PageSession {
    session_with(translator.then(TranslatorConfig::default))
}

#[test]
fn start_runs_every_phase() {
    let s = session(true);
    let mut doc = Document::parse(PAGE);
    let page = s.start(&mut doc);
    let report = page.report().clone();
    page.finish(&mut doc);

    assert_eq!(report.overrides.applied, 1);
    assert_eq!(report.affordances, 1);
    assert_eq!(report.initial.texts, 1);
    assert_eq!(report.initial.relative_times, 1);

    let html = doc.to_html();
    assert!(html.contains(r#"aria-label="新建…""#));
    assert!(html.contains("2 小时前"));
    assert!(html.contains(r#"<div id="readme"><p>Sign in</p></div>"#));
}

#[test]
fn affordance_is_attached_before_the_walk() {
    // An English label is itself a dictionary key, so the initial pass
    // localizes it only if it is already in place.
    let s = session_with(Some(TranslatorConfig {
        label: "Translate".into(),
        ..TranslatorConfig::default()
    }));
    let mut doc = Document::parse(PAGE);
    let page = s.start(&mut doc);
    assert_eq!(page.report().initial.texts, 2);
    page.finish(&mut doc);
    let link = doc.get_element_by_id("translate-me").unwrap();
    assert_eq!(doc.text_content(link), "翻译");
}

#[test]
fn translated_description_is_localized_by_the_watcher() {
    let s = session(true);
    let mut doc = Document::parse(PAGE);
    let mut page = s.start(&mut doc);

    let outcome = s.translate_description(&mut doc, &mut page, &Echo, &LogNotifier);
    assert_eq!(outcome, Some(TranslationOutcome::Rendered(1)));

    let report = page.finish(&mut doc);
    assert_eq!(report.translation, Some(TranslationOutcome::Rendered(1)));
    assert!(report.live.texts >= 1);
    assert!(report.batches >= 1);
    assert!(doc.to_html().contains("<em>星标</em>"));
}

#[test]
fn disabled_translator_is_skipped() {
    let s = session(false);
    let mut doc = Document::parse(PAGE);
    let mut page = s.start(&mut doc);
    assert_eq!(page.report().affordances, 0);
    assert!(s
        .translate_description(&mut doc, &mut page, &Echo, &LogNotifier)
        .is_none());
    page.finish(&mut doc);
    assert!(doc.get_element_by_id("translate-me").is_none());
}

#[test]
fn render_from_default_config() {
    let mut cfg = CoreConfig::default();
    cfg.translator.enabled = false;
    let s = PageSession::from_config(&cfg, "zh-HK").unwrap();
    assert_eq!(s.store().resolved(), Some("zh-CN"));

    let (html, report) =
        s.render("<html><body><nav><a href='/login'>Sign in</a></nav><pre>Sign in</pre></body></html>");
    assert_eq!(report.language, "zh-HK");
    assert!(html.contains("<a href=\"/login\">登录</a>"));
    assert!(html.contains("<pre>Sign in</pre>"));
}
