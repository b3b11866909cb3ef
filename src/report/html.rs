//! HTML rendering of the missing-links report.

use std::path::Path;

use super::{MissingReport, ReportEntry};
use crate::error::{Error, Result};

const ARTIST_URL: &str = "https://musicbrainz.org/artist/";
const RELEASE_URL: &str = "https://musicbrainz.org/release/";

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_section(html: &mut String, heading: &str, base_url: &str, entries: &[ReportEntry]) {
    html.push_str(&format!("<h2>{} ({})</h2>\n", heading, entries.len()));
    if entries.is_empty() {
        html.push_str("<p>None.</p>\n");
        return;
    }
    html.push_str("<ul>\n");
    for entry in entries {
        html.push_str(&format!(
            "<li><a href=\"{}{}\">{}</a></li>\n",
            base_url,
            escape(&entry.id),
            escape(&entry.name)
        ));
    }
    html.push_str("</ul>\n");
}

/// Render the report as a standalone HTML document.
pub fn render(report: &MissingReport) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>lyriks report</title></head>\n<body>\n<h1>lyriks report</h1>\n",
    );
    write_section(&mut html, "Artists missing URLs", ARTIST_URL, &report.artists());
    write_section(&mut html, "Releases missing URLs", RELEASE_URL, &report.releases());
    html.push_str("</body>\n</html>");
    html
}

/// Write the rendered report to `path`.
pub fn write(report: &MissingReport, path: &Path) -> Result<()> {
    std::fs::write(path, render(report)).map_err(|source| Error::Report {
        path: path.to_path_buf(),
        source,
    })
}
