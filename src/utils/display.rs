//! Terminal display helpers for article listings.

use chrono::{DateTime, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

use crate::models::Article;

/// Widest title shown in table output before truncation.
pub const MAX_TITLE_WIDTH: usize = 72;

/// Truncate text to at most `max_width` characters, appending an ellipsis
/// when anything was cut.
///
/// ```
/// use news_pager::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let kept: String = text.chars().take(max_width - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Render a backend date for humans.
///
/// RFC 3339 (newsapi.org) and `YYYY-MM-DD HH:MM:SS` (newsdata.io) are
/// normalised to `YYYY-MM-DD HH:MM`; anything else is shown as-is, which
/// includes the "Unknown Date" placeholder.
pub fn format_published(date: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    date.to_string()
}

/// Build a table of articles, numbered from `offset + 1`.
pub fn articles_table(articles: &[Article], offset: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "Author", "Published"]);

    for (i, article) in articles.iter().enumerate() {
        table.add_row(vec![
            (offset + i + 1).to_string(),
            truncate_with_ellipsis(&article.title, MAX_TITLE_WIDTH),
            truncate_with_ellipsis(&article.author, 24),
            format_published(&article.published_date),
        ]);
    }

    table
}

/// One line per article: `title - author (date) <url>`.
pub fn articles_plain(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| {
            let mut line = format!(
                "{} - {} ({})",
                a.title,
                a.author,
                format_published(&a.published_date)
            );
            if !a.url.is_empty() {
                line.push_str(&format!(" <{}>", a.url));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hello", 5), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello", 2), "..");
        assert_eq!(truncate_with_ellipsis("Hello", 0), "");
    }

    #[test]
    fn test_format_published() {
        assert_eq!(format_published("2024-05-01T12:30:00Z"), "2024-05-01 12:30");
        assert_eq!(format_published("2024-05-01 08:05:59"), "2024-05-01 08:05");
        assert_eq!(format_published("Unknown Date"), "Unknown Date");
    }

    #[test]
    fn test_articles_plain() {
        let articles = vec![
            RawRecord::titled("One").author("A").url("https://x/1").into_article(),
            RawRecord::titled("Two").into_article(),
        ];

        assert_eq!(
            articles_plain(&articles),
            "One - A (Unknown Date) <https://x/1>\nTwo - Unknown Author (Unknown Date)"
        );
    }

    #[test]
    fn test_articles_table_rows() {
        let articles = vec![RawRecord::titled("One").into_article()];
        let table = articles_table(&articles, 10);
        let rendered = table.to_string();
        assert!(rendered.contains("11"));
        assert!(rendered.contains("One"));
    }
}
