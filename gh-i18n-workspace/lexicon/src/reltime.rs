//! Relative-time custom elements (`<relative-time>`, `<time-ago>`).
//!
//! These are formatted from their `datetime` attribute instead of being
//! looked up in the dictionary.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dom::{Document, NodeId};

/// Tags whose whole content is replaced by a formatted phrase.
pub const RELATIVE_TIME_TAGS: &[&str] = &["RELATIVE-TIME", "TIME-AGO"];

pub fn is_relative_time(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node)
        .is_some_and(|tag| RELATIVE_TIME_TAGS.contains(&tag))
}

/// Turns a machine-readable timestamp into a localized phrase.
///
/// `locale` uses an underscore separator (`zh_CN`). `None` means the
/// timestamp could not be understood.
pub trait RelativeTimeFormatter {
    fn format(&self, timestamp: &str, locale: &str) -> Option<String>;
}

/// Replace the content of a relative-time element with its formatted phrase.
///
/// A missing or malformed `datetime` leaves the element as it is, and so does
/// content that already reads as the phrase.
pub fn rewrite_relative_time(
    doc: &mut Document,
    node: NodeId,
    language: &str,
    formatter: &dyn RelativeTimeFormatter,
) -> bool {
    let Some(datetime) = doc.attr(node, "datetime") else {
        debug!(node = node.index(), "relative-time element without datetime");
        return false;
    };
    let locale = language.replace('-', "_");
    let Some(phrase) = formatter.format(datetime, &locale) else {
        debug!(node = node.index(), datetime, "unparseable datetime");
        return false;
    };
    let settled = matches!(
        doc.children(node),
        [only] if doc.text(*only) == Some(phrase.as_str())
    );
    if settled {
        return false;
    }
    doc.set_text_content(node, &phrase);
    true
}

/// Past and future phrase pairs, indexed like timeago's locale tables:
/// just now, seconds, 1 minute, minutes, 1 hour, hours, 1 day, days,
/// 1 week, weeks, 1 month, months, 1 year, years.
type Table = [(&'static str, &'static str); 14];

const EN_US: Table = [
    ("just now", "right now"),
    ("%s seconds ago", "in %s seconds"),
    ("1 minute ago", "in 1 minute"),
    ("%s minutes ago", "in %s minutes"),
    ("1 hour ago", "in 1 hour"),
    ("%s hours ago", "in %s hours"),
    ("1 day ago", "in 1 day"),
    ("%s days ago", "in %s days"),
    ("1 week ago", "in 1 week"),
    ("%s weeks ago", "in %s weeks"),
    ("1 month ago", "in 1 month"),
    ("%s months ago", "in %s months"),
    ("1 year ago", "in 1 year"),
    ("%s years ago", "in %s years"),
];

const ZH_CN: Table = [
    ("刚刚", "片刻后"),
    ("%s 秒前", "%s 秒后"),
    ("1 分钟前", "1 分钟后"),
    ("%s 分钟前", "%s 分钟后"),
    ("1 小时前", "1 小时后"),
    ("%s 小时前", "%s 小时后"),
    ("1 天前", "1 天后"),
    ("%s 天前", "%s 天后"),
    ("1 周前", "1 周后"),
    ("%s 周前", "%s 周后"),
    ("1 个月前", "1 个月后"),
    ("%s 个月前", "%s 个月后"),
    ("1 年前", "1 年后"),
    ("%s 年前", "%s 年后"),
];

const ZH_TW: Table = [
    ("剛剛", "片刻後"),
    ("%s 秒前", "%s 秒後"),
    ("1 分鐘前", "1 分鐘後"),
    ("%s 分鐘前", "%s 分鐘後"),
    ("1 小時前", "1 小時後"),
    ("%s 小時前", "%s 小時後"),
    ("1 天前", "1 天後"),
    ("%s 天前", "%s 天後"),
    ("1 週前", "1 週後"),
    ("%s 週前", "%s 週後"),
    ("1 個月前", "1 個月後"),
    ("%s 個月前", "%s 個月後"),
    ("1 年前", "1 年後"),
    ("%s 年前", "%s 年後"),
];

const JA: Table = [
    ("すこし前", "すぐに"),
    ("%s秒前", "%s秒以内"),
    ("1分前", "1分以内"),
    ("%s分前", "%s分以内"),
    ("1時間前", "1時間以内"),
    ("%s時間前", "%s時間以内"),
    ("1日前", "1日以内"),
    ("%s日前", "%s日以内"),
    ("1週間前", "1週間以内"),
    ("%s週間前", "%s週間以内"),
    ("1ヶ月前", "1ヶ月以内"),
    ("%sヶ月前", "%sヶ月以内"),
    ("1年前", "1年以内"),
    ("%s年前", "%s年以内"),
];

/// Successive divisors: seconds, minutes, hours, days, weeks, months.
const STEPS: [f64; 6] = [60.0, 60.0, 24.0, 7.0, 365.0 / 7.0 / 12.0, 12.0];

fn table_for(locale: &str) -> &'static Table {
    match locale {
        "zh_CN" => &ZH_CN,
        "zh_TW" | "zh_HK" => &ZH_TW,
        "ja" | "ja_JP" => &JA,
        _ => &EN_US,
    }
}

/// Timeago-style formatter. Unknown locales fall back to `en_US`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeago {
    now: Option<DateTime<Utc>>,
}

impl Timeago {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure against a fixed instant instead of the wall clock.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    pub fn phrase(&self, then: DateTime<Utc>, locale: &str) -> String {
        let now = self.now.unwrap_or_else(Utc::now);
        let seconds = (now - then).num_milliseconds() as f64 / 1000.0;
        let future = seconds < 0.0;
        let mut diff = seconds.abs();

        let mut idx = 0;
        while idx < STEPS.len() && diff >= STEPS[idx] {
            diff /= STEPS[idx];
            idx += 1;
        }
        let count = diff.floor() as u64;
        let mut slot = idx * 2;
        let singular_up_to = if slot == 0 { 9 } else { 1 };
        if count > singular_up_to {
            slot += 1;
        }

        let (past, ahead) = table_for(locale)[slot];
        let pattern = if future { ahead } else { past };
        pattern.replace("%s", &count.to_string())
    }
}

impl RelativeTimeFormatter for Timeago {
    fn format(&self, timestamp: &str, locale: &str) -> Option<String> {
        let then = DateTime::parse_from_rfc3339(timestamp.trim()).ok()?;
        Some(self.phrase(then.with_timezone(&Utc), locale))
    }
}
