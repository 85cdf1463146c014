//! Minimal HTML rendering helpers.

use axum::response::Html;
use chrono::{DateTime, Utc};

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:64rem;margin:0 auto;\
padding:3rem 1.5rem;color:#0f172a}\
a{color:#334155}\
.muted{color:#64748b;font-size:.875rem}\
.card{border:1px solid #e2e8f0;border-radius:.5rem;padding:1rem 1.5rem;margin:1rem 0}\
.cards{display:grid;grid-template-columns:repeat(3,1fr);gap:1rem}\
.metric{font-size:1.5rem;font-weight:600}\
.error{border:1px solid #fecaca;background:#fef2f2;color:#b91c1c;padding:.75rem 1rem;border-radius:.5rem}\
table{width:100%;border-collapse:collapse;font-size:.875rem}\
th,td{text-align:left;padding:.5rem;border-bottom:1px solid #f1f5f9}\
label{display:block;margin:.5rem 0}";

/// Escape text for use in element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `body` (already escaped) in the page shell.
#[must_use]
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} · AEO Visibility OS</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        escape(title)
    ))
}

/// Error banner for a `?error=` message; empty when there is none.
#[must_use]
pub fn error_banner(message: Option<&str>) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => format!("<div class=\"error\" role=\"alert\">{}</div>\n", escape(message)),
        None => String::new(),
    }
}

#[must_use]
pub fn back_link(href: &str, label: &str) -> String {
    format!(
        "<a class=\"muted\" href=\"{}\">{}</a>\n",
        escape(href),
        escape(label)
    )
}

#[must_use]
pub fn date(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

#[must_use]
pub fn date_time(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p UTC").to_string()
}

#[must_use]
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// A titled page with a heading and a short explanation.
#[must_use]
pub fn not_found(heading: &str, back_href: &str, back_label: &str) -> Html<String> {
    let body = format!("{}<h1>{}</h1>\n", back_link(back_href, back_label), escape(heading));
    page(heading, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escape_replaces_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn error_banner_is_empty_without_message() {
        assert_eq!(error_banner(None), "");
        assert_eq!(error_banner(Some("  ")), "");
        assert!(error_banner(Some("<b>bad</b>")).contains("&lt;b&gt;bad&lt;/b&gt;"));
    }

    #[test]
    fn dates_are_not_zero_padded() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(date(at), "1/2/2026");
        assert_eq!(date_time(at), "1/2/2026, 3:04:05 PM UTC");
    }
}
