//! HTML rendering of raw records

use std::io::{Read, Seek};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::Result;
use crate::format::field;
use crate::store::{BibStore, Offset};
use crate::util::filename_from_entry;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(https?://[^}\s"<]*)"#).expect("static regex"))
}

fn cite_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\cite\{([^}]*)\}").expect("static regex"))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the record at `start` as HTML lines.
///
/// The opening line links to the document download when the entry has a
/// file; the `file` line itself is hidden. URLs and `\cite{...}` keys
/// become links.
pub fn render_record<S: Read + Seek>(store: &mut BibStore<S>, start: Offset) -> Result<Vec<String>> {
    let entry = store.read_entry_dict(start)?.into_entry();
    let raw = store.read_entry_raw(start)?;
    let format = std::sync::Arc::clone(store.format());

    let has_file = !entry.get_or_empty(field::FILE).is_empty();
    let mut lines = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let escaped = escape_html(line);
        let html = if format.is_record_start(line) {
            if has_file {
                format!(
                    "<a href=\"/file/{}/{}\">{}</a>",
                    escape_html(&entry.key),
                    escape_html(&filename_from_entry(&entry)),
                    escaped
                )
            } else {
                escaped
            }
        } else if format.field_value(line, field::FILE).is_some() {
            continue;
        } else if format.is_terminator(line) {
            escaped
        } else if line.contains("http") {
            let linked = url_regex().replace_all(&escaped, "<a href=\"$1\">$1</a>");
            format!("&nbsp;&nbsp;{}", linked)
        } else if line.contains("\\cite{") {
            let linked = cite_regex().replace_all(&escaped, |caps: &Captures| {
                let links: Vec<String> = caps[1]
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(|k| format!("<a href=\"/key/{k}\">{k}</a>"))
                    .collect();
                format!("\\cite{{{}}}", links.join(", "))
            });
            format!("&nbsp;&nbsp;{}", linked)
        } else {
            format!("&nbsp;&nbsp;{}", escaped)
        };

        lines.push(html);
    }

    Ok(lines)
}

/// Wrap rendered lines in a page
pub fn render_page(title: &str, lines: &[String]) -> String {
    let mut page = format!(
        "<html>\n<head>\n<title>{}</title>\n<style>\nbody {{\n  font-family: monospace;\n}}\n</style>\n</head>\n<body>\n",
        escape_html(title)
    );
    for line in lines {
        page.push_str(line);
        page.push_str("<br>\n");
    }
    page.push_str("</body>\n</html>\n");
    page
}
