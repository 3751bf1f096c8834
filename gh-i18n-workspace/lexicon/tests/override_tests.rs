use lexicon::{apply_overrides, CssRule, Document, Embedded, LocaleSource, Locale};

fn rule(selector: &str, key: &str, replacement: &str) -> CssRule {
    CssRule {
        selector: selector.to_string(),
        key: key.to_string(),
        replacement: replacement.to_string(),
    }
}

fn page(body: &str) -> Document {
    Document::parse(&format!("<html><head></head><body>{body}</body></html>"))
}

#[test]
fn markup_rule_replaces_inner_html() {
    let mut doc = page(r#"<nav><a class="tab"><span class="d-none">Pull requests</span></a></nav>"#);
    let report = apply_overrides(&mut doc, &[rule(".tab .d-none", "!html", "<b>拉取</b>请求")]);
    assert_eq!(report.applied, 1);
    assert_eq!(report.elements, 1);
    let body = doc.body().unwrap();
    assert_eq!(
        doc.inner_html(body),
        r#"<nav><a class="tab"><span class="d-none"><b>拉取</b>请求</span></a></nav>"#
    );
}

#[test]
fn attribute_rule_sets_every_match() {
    let mut doc = page(r#"<a class="btn" title="Fork">1</a><a class="btn" title="Fork">2</a><a title="Fork">3</a>"#);
    let report = apply_overrides(&mut doc, &[rule("a.btn", "title", "派生")]);
    assert_eq!(report.elements, 2);
    let body = doc.body().unwrap();
    let titles: Vec<_> = doc
        .children(body)
        .iter()
        .map(|a| doc.attr(*a, "title").unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, ["派生", "派生", "Fork"]);
}

#[test]
fn unmatched_and_invalid_rules_are_harmless() {
    let mut doc = page("<p>Star</p>");
    let before = doc.to_html();
    let report = apply_overrides(
        &mut doc,
        &[rule(".foo", "title", "x"), rule("p[", "title", "x"), rule("p:hover", "title", "x")],
    );
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.invalid, 2);
    assert_eq!(report.applied, 0);
    assert_eq!(doc.to_html(), before);
}

#[test]
fn rules_apply_in_order() {
    let mut doc = page(r#"<summary aria-label="Create new…">+</summary>"#);
    let report = apply_overrides(
        &mut doc,
        &[
            rule(r#"summary[aria-label="Create new…"]"#, "aria-label", "新建…"),
            rule(r#"summary[aria-label="Create new…"]"#, "title", "unused"),
            rule(r#"summary[aria-label^="新建"]"#, "title", "新建"),
        ],
    );
    assert_eq!(report.applied, 2);
    assert_eq!(report.unmatched, 1);
    let body = doc.body().unwrap();
    let summary = doc.children(body)[0];
    assert_eq!(doc.attr(summary, "aria-label"), Some("新建…"));
    assert_eq!(doc.attr(summary, "title"), Some("新建"));
}

#[test]
fn bundled_rules_hit_github_chrome() {
    let text = Embedded.locale_text("zh-CN").unwrap();
    let locale = Locale::from_json("zh-CN", &text).unwrap();
    let mut doc = page(
        r#"<details><summary aria-label="Create new…">+</summary></details>
        <a class="btn btn-with-count" title="Fork your own copy of this repository">Fork</a>"#,
    );
    let report = apply_overrides(&mut doc, &locale.css);
    assert!(report.applied >= 2);
    assert_eq!(report.invalid, 0);
    let html = doc.to_html();
    assert!(!html.contains(r#"aria-label="Create new…""#));
    assert!(!html.contains(r#"title="Fork your own copy of this repository""#));
}
