//! Text normalization used to derive dictionary keys from page text.
//!
//! Policy:
//! - Trim surrounding whitespace (including U+00A0).
//! - Unicode-aware lowercasing (`char::to_lowercase`).
//! - U+00A0 (the `&nbsp;` entity) becomes an ordinary space.
//! - Runs of two or more whitespace characters collapse into one space.
//!   A lone tab or newline is kept as is.
//!
//! Keep this logic single-sourced so locale audits and the rewriter agree.

/// Derive the dictionary key for a raw piece of page text.
pub fn for_lookup(raw: &str) -> String {
    let lowered: String = raw
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == '\u{00A0}' { ' ' } else { ch })
        .collect();

    let mut out = String::with_capacity(lowered.len());
    let mut run: Vec<char> = Vec::new();
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            run.push(ch);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(ch);
    }
    flush_run(&mut out, &mut run);

    out.trim().to_string()
}

fn flush_run(out: &mut String, run: &mut Vec<char>) {
    match run.len() {
        0 => {}
        1 => out.push(run[0]),
        _ => out.push(' '),
    }
    run.clear();
}

/// Byte range of the trimmed span inside `raw`, or `None` when it is all whitespace.
pub fn trimmed_span(raw: &str) -> Option<(usize, usize)> {
    let start = raw.len() - raw.trim_start().len();
    let end = raw.trim_end().len();
    (start < end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_and_lowercases() {
        assert_eq!(for_lookup("  Sign   in "), "sign in");
        assert_eq!(for_lookup("Pull\u{00A0}\u{00A0}requests"), "pull requests");
        assert_eq!(for_lookup("New\u{00A0}issue"), "new issue");
    }

    #[test]
    fn single_tab_survives() {
        assert_eq!(for_lookup("a\tb"), "a\tb");
        assert_eq!(for_lookup("a\t\nb"), "a b");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        for s in [
            "",
            "   ",
            "\u{00A0}x\u{00A0}",
            "ÀB  \t C",
            "İstanbul",
            "one\u{00A0} two",
            "\n\nStar\n",
        ] {
            let once = for_lookup(s);
            assert_eq!(for_lookup(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn span_of_padded_text() {
        assert_eq!(trimmed_span("  Sign   in "), Some((2, 11)));
        assert_eq!(trimmed_span(" \n "), None);
        assert_eq!(trimmed_span("x"), Some((0, 1)));
    }
}
