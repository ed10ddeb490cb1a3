//! Outbound message sizing utilities
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//!
//! Change summaries and schedule listings grow with the number of reminders,
//! so anything posted through the Web API is split to stay under the post
//! limit. Splitting prefers line boundaries and never breaks UTF-8.

/// Conservative per-post character budget (Slack truncates around 40k;
/// messages near that size render poorly anyway)
pub const POST_LIMIT: usize = 4000;

/// Split text into posts of at most `POST_LIMIT` bytes.
pub fn split_for_post(text: &str) -> Vec<String> {
    split_text(text, POST_LIMIT)
}

fn split_text(text: &str, limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut posts = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        // +1 for the newline that joins it to the previous line
        if !current.is_empty() && current.len() + line.len() + 1 > limit {
            posts.push(std::mem::take(&mut current));
        }
        if line.len() > limit {
            posts.extend(split_long_line(line, limit));
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        posts.push(current);
    }
    posts
}

/// A single line over the limit is split at character boundaries.
fn split_long_line(line: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        if current.len() + ch.len_utf8() > limit {
            parts.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Truncate text to the post limit, appending an ellipsis when cut.
pub fn truncate_for_post(text: &str) -> String {
    if text.len() <= POST_LIMIT {
        return text.to_string();
    }
    let mut end = POST_LIMIT - 3;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_post() {
        assert_eq!(split_for_post("hello"), vec!["hello"]);
    }

    #[test]
    fn test_split_prefers_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let posts = split_text(text, 10);
        assert_eq!(posts, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_split_at_char_boundaries() {
        let posts = split_text(&"あ".repeat(40), 30);
        assert!(posts.len() >= 2);
        for post in &posts {
            assert!(post.len() <= 30);
            assert!(!post.is_empty());
        }
    }

    #[test]
    fn test_truncate_for_post() {
        let long = "a".repeat(POST_LIMIT + 100);
        let out = truncate_for_post(&long);
        assert!(out.len() <= POST_LIMIT);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_for_post("short"), "short");
    }
}
