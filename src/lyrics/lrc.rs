//! Conversion of provider timing formats into LRC lines.
//!
//! Two encodings are handled:
//! - line-timed: millisecond timestamp per line, rendered `[mm:ss.cc]text`
//! - word-timed (QRC): `[start,duration]word(start,duration)...` per line,
//!   rendered `[mm:ss.cc]<mm:ss.cc>word<mm:ss.cc>...`
//!
//! Timestamps are only well-formed two-digit minutes below 100 minutes
//! (6,000,000 ms); longer tracks render three-digit minutes.

use std::sync::LazyLock;

use regex::Regex;

static METADATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[A-Za-z]+:[^\]]*\]").expect("valid regex"));
static LINE_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+),(\d+)\]").expect("valid regex"));
static TIMED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*?)\((\d+),(\d+)\)").expect("valid regex"));
static LRC_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\d+:\d{2}[.:]\d{2,3}\]").expect("valid regex"));

/// Format milliseconds as `mm:ss.cc`.
pub fn format_timestamp(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let centis = (millis % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

/// Render line-timed entries, sorted by timestamp (stable on ties).
pub fn render_timed_lines(mut entries: Vec<(u64, String)>) -> Vec<String> {
    entries.sort_by_key(|(timestamp, _)| *timestamp);
    entries
        .into_iter()
        .map(|(timestamp, text)| format!("[{}]{}\n", format_timestamp(timestamp), text.trim()))
        .collect()
}

/// Convert word-timed lines to LRC with inline word timestamps.
///
/// Metadata tags (`[ti:...]`) are copied verbatim and blank lines dropped.
/// Every other line must be a `[start,duration]` prefix followed by one or
/// more `word(start,duration)` records and nothing else; any deviation, or a
/// document without a single timed line, aborts the whole conversion.
pub fn convert_word_timed<'a, I>(lines: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lrc_lines = Vec::new();
    let mut timed_lines = 0;

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if METADATA_LINE.is_match(line) {
            lrc_lines.push(format!("{line}\n"));
            continue;
        }

        let captures = LINE_TIMESTAMP.captures(line)?;
        let line_start: u64 = captures[1].parse().ok()?;
        let content = &line[captures.get(0)?.end()..];

        let mut lrc_line = format!("[{}]", format_timestamp(line_start));
        let mut consumed = 0;
        for word in TIMED_WORD.captures_iter(content) {
            let start: u64 = word[2].parse().ok()?;
            let duration: u64 = word[3].parse().ok()?;
            let end = start.checked_add(duration)?;
            lrc_line.push_str(&format!(
                "<{}>{}<{}>",
                format_timestamp(start),
                &word[1],
                format_timestamp(end)
            ));
            consumed = word.get(0)?.end();
        }
        if consumed == 0 || !content[consumed..].trim().is_empty() {
            return None;
        }
        lrc_line.push('\n');
        lrc_lines.push(lrc_line);
        timed_lines += 1;
    }

    (timed_lines > 0).then_some(lrc_lines)
}

/// Normalize text that is already LRC: drop blank lines, terminate each
/// line with `\n`. Returns `None` if no line carries a timestamp.
pub fn normalize_lrc_text(content: &str) -> Option<Vec<String>> {
    let lines: Vec<String> = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("{l}\n"))
        .collect();

    lines
        .iter()
        .any(|l| LRC_TIMESTAMP.is_match(l))
        .then_some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00.00");
        assert_eq!(format_timestamp(61_234), "01:01.23");
        assert_eq!(format_timestamp(59_999), "00:59.99");
        assert_eq!(format_timestamp(5_999_990), "99:59.99");
    }

    #[test]
    fn test_render_timed_lines_sorts_and_strips() {
        let lines = render_timed_lines(vec![
            (61_234, "b ".to_string()),
            (0, " a".to_string()),
        ]);
        assert_eq!(lines, vec!["[00:00.00]a\n", "[01:01.23]b\n"]);
    }

    #[test]
    fn test_duplicate_timestamps_keep_input_order() {
        let lines = render_timed_lines(vec![
            (2000, "second".to_string()),
            (1000, "first".to_string()),
            (1000, "also first".to_string()),
        ]);
        assert_eq!(
            lines,
            vec!["[00:01.00]first\n", "[00:01.00]also first\n", "[00:02.00]second\n"]
        );
    }

    #[test]
    fn test_word_timed_line() {
        let lines = convert_word_timed(["[1000,500]Hi(1000,200)(1200,300)"]).unwrap();
        assert_eq!(lines, vec!["[00:01.00]<00:01.00>Hi<00:01.20><00:01.20><00:01.50>\n"]);
    }

    #[test]
    fn test_word_timed_metadata_and_blank_lines() {
        let lines = convert_word_timed([
            "[ti:Song]",
            "",
            "[offset:0]",
            "[65000,1000]One(65000,400) two(65400,600)",
        ])
        .unwrap();

        assert_eq!(
            lines,
            vec![
                "[ti:Song]\n",
                "[offset:0]\n",
                "[01:05.00]<01:05.00>One<01:05.40><01:05.40> two<01:06.00>\n",
            ]
        );
    }

    #[test]
    fn test_word_timed_malformed_line_aborts_everything() {
        let result = convert_word_timed([
            "[1000,500]Hi(1000,200)",
            "[oops]",
            "[2000,500]There(2000,500)",
        ]);
        assert!(result.is_none());

        assert!(convert_word_timed(["plain text without timing"]).is_none());
    }

    #[test]
    fn test_word_timed_line_must_be_fully_timed() {
        assert!(convert_word_timed(["[1000,500]Hello world"]).is_none());
        assert!(convert_word_timed(["[1000,500]Hi(1000,200) lost tail"]).is_none());
        assert!(convert_word_timed(["[1000,500]"]).is_none());

        let lines = convert_word_timed(["[1000,500]Hi(1000,200)  \r"]).unwrap();
        assert_eq!(lines, vec!["[00:01.00]<00:01.00>Hi<00:01.20>\n"]);
    }

    #[test]
    fn test_word_timed_needs_a_timed_line() {
        assert!(convert_word_timed(["[ti:Song]", "[ar:Artist]"]).is_none());
        assert!(convert_word_timed(Vec::<&str>::new()).is_none());
    }

    #[test]
    fn test_word_timed_overflowing_offset_is_rejected() {
        assert!(convert_word_timed(["[0,1]x(18446744073709551615,1)"]).is_none());
    }

    #[test]
    fn test_word_timed_metadata_tag_case() {
        let lines = convert_word_timed(["[Ti:Song]", "[AR:Artist]", "[0,100]a(0,100)"]).unwrap();
        assert_eq!(lines, vec!["[Ti:Song]\n", "[AR:Artist]\n", "[00:00.00]<00:00.00>a<00:00.10>\n"]);
    }

    #[test]
    fn test_normalize_lrc_text() {
        let lines = normalize_lrc_text("[ti:Song]\r\n[00:01.00]Hello\n\n[00:02.50]World").unwrap();
        assert_eq!(lines, vec!["[ti:Song]\n", "[00:01.00]Hello\n", "[00:02.50]World\n"]);

        assert!(normalize_lrc_text("no timestamps here").is_none());
    }

    proptest! {
        #[test]
        fn prop_timestamp_order_is_lexicographic(a in 0u64..6_000_000, b in 0u64..6_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Centisecond resolution: distinct only across a 10ms boundary
            prop_assume!(lo / 10 < hi / 10);
            prop_assert!(format_timestamp(lo) < format_timestamp(hi));
        }

        #[test]
        fn prop_timestamp_shape(t in 0u64..6_000_000) {
            let formatted = format_timestamp(t);
            prop_assert_eq!(formatted.len(), 8);
            prop_assert_eq!(&formatted[2..3], ":");
            prop_assert_eq!(&formatted[5..6], ".");
        }
    }
}
