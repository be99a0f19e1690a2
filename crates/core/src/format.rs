use std::sync::OnceLock;

use regex::Regex;

const LIST_OPEN: &str = "<ul>";
const LIST_CLOSE: &str = "</ul>";

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern should compile")
    })
}

/// Convert summary text (paragraph lines, `**bold**` spans and `*`-prefixed
/// list lines) into HTML-like markup for display.
///
/// Not idempotent: feed it raw summary text only, exactly once.
pub fn format_summary(text: &str) -> String {
    let text = bold_pattern().replace_all(text, "<strong>$1</strong>");

    let mut in_list = false;
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if let Some(item) = trimmed.strip_prefix('*') {
                let item = format!("<li>{}</li>", item.trim());
                if in_list {
                    item
                } else {
                    in_list = true;
                    format!("{LIST_OPEN}{item}")
                }
            } else if in_list {
                in_list = false;
                format!("{LIST_CLOSE}{line}")
            } else {
                line.to_string()
            }
        })
        .collect();

    if in_list {
        lines.push(LIST_CLOSE.to_string());
    }

    lines.join("\n")
}

/// Format a byte count for listings, e.g. `12.4 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_span() {
        assert_eq!(format_summary("**a**"), "<strong>a</strong>");
    }

    #[test]
    fn bold_is_non_greedy() {
        assert_eq!(
            format_summary("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn unbalanced_bold_is_left_alone() {
        assert_eq!(
            format_summary("**a** then **b"),
            "<strong>a</strong> then **b"
        );
    }

    #[test]
    fn consecutive_items_share_one_list() {
        let out = format_summary("* one\n* two");
        assert_eq!(out, "<ul><li>one</li>\n<li>two</li>\n</ul>");
        assert_eq!(out.matches("<ul>").count(), 1);
        assert_eq!(out.matches("</ul>").count(), 1);
    }

    #[test]
    fn list_closes_before_plain_line() {
        assert_eq!(
            format_summary("* one\ntext"),
            "<ul><li>one</li>\n</ul>text"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(format_summary(""), "");
    }

    #[test]
    fn empty_line_closes_list() {
        assert_eq!(
            format_summary("* a\n\n* b"),
            "<ul><li>a</li>\n</ul>\n<ul><li>b</li>\n</ul>"
        );
    }

    #[test]
    fn bare_marker_is_empty_item() {
        assert_eq!(format_summary("*"), "<ul><li></li>\n</ul>");
    }

    #[test]
    fn bolded_list_item() {
        assert_eq!(
            format_summary("* **Key:** value"),
            "<ul><li><strong>Key:</strong> value</li>\n</ul>"
        );
    }

    #[test]
    fn line_starting_with_bold_is_not_a_list_item() {
        assert_eq!(format_summary("**Title**"), "<strong>Title</strong>");
    }

    #[test]
    fn indented_marker_is_a_list_item() {
        assert_eq!(format_summary("   *  spaced  "), "<ul><li>spaced</li>\n</ul>");
    }

    #[test]
    fn plain_lines_keep_order_and_count() {
        let input = "first\n  second  \nthird";
        let out = format_summary(input);
        assert_eq!(out, input);
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
