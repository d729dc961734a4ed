//! Pull request output formatting

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;

use super::types::{CommentThread, OutputFormat, PullRequest};

/// Color for a PR status column
fn status_color(pr: &PullRequest) -> Color {
    if pr.is_draft {
        return Color::Yellow;
    }
    match pr.status.as_str() {
        "active" => Color::Green,
        "completed" => Color::Blue,
        "abandoned" => Color::DarkGrey,
        _ => Color::White,
    }
}

fn status_label(pr: &PullRequest) -> String {
    if pr.is_draft {
        format!("{} (draft)", pr.status)
    } else {
        pr.status.clone()
    }
}

/// Format relative time from an ISO8601 timestamp
fn time_ago(timestamp: &str) -> String {
    let Ok(dt) = chrono::DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };

    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Truncate string to max length
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Output the merged PR list
pub fn output_prs(prs: &[PullRequest], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(prs)?);
        }
        OutputFormat::Table => {
            if prs.is_empty() {
                println!("No pull requests found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Title", "Author", "Repo", "Branch", "Created", "Status"]);

            for pr in prs {
                let created = pr
                    .creation_date
                    .as_deref()
                    .map(time_ago)
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(pr.pull_request_id).fg(Color::Cyan),
                    Cell::new(truncate(&pr.title, 60)),
                    Cell::new(pr.author()),
                    Cell::new(pr.repo_name()),
                    Cell::new(truncate(pr.source_branch(), 30)),
                    Cell::new(created),
                    Cell::new(status_label(pr)).fg(status_color(pr)),
                ]);
            }

            println!("{table}");
            println!("\n{} pull request(s)", prs.len());
        }
    }
    Ok(())
}

/// Output the comment threads of one PR
pub fn output_threads(
    pr: &PullRequest,
    threads: &[CommentThread],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(threads)?);
        }
        OutputFormat::Table => {
            println!(
                "{} {}\n",
                format!("!{}", pr.pull_request_id).cyan(),
                pr.title.bold()
            );

            if threads.is_empty() {
                println!("No review comments.");
                return Ok(());
            }

            for thread in threads {
                let status = thread.status.as_deref().unwrap_or("unknown");
                let status = match status {
                    "active" | "pending" => status.red().to_string(),
                    "fixed" | "closed" | "wontFix" => status.green().to_string(),
                    other => other.dimmed().to_string(),
                };
                let anchor = thread
                    .thread_context
                    .as_ref()
                    .and_then(|c| c.file_path.as_deref())
                    .unwrap_or("(general)");
                println!("── thread {} [{}] {}", thread.id, status, anchor.dimmed());

                for comment in &thread.comments {
                    let when = comment
                        .published_date
                        .as_deref()
                        .map(time_ago)
                        .unwrap_or_default();
                    println!("   {} {}", comment.author_name().cyan(), when.dimmed());
                    for line in comment.content.lines() {
                        println!("     {line}");
                    }
                }
                println!();
            }
            println!("{} thread(s)", threads.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pr(value: serde_json::Value) -> PullRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello w…");
    }

    #[test]
    fn truncate_unicode_counts_chars() {
        assert_eq!(truncate("héllo", 5), "héllo");
        assert_eq!(truncate("héllo world", 6), "héllo…");
    }

    #[test]
    fn time_ago_passes_through_garbage() {
        assert_eq!(time_ago("not a date"), "not a date");
    }

    #[test]
    fn time_ago_formats_days() {
        let old = chrono::Utc::now() - chrono::Duration::days(3);
        assert_eq!(time_ago(&old.to_rfc3339()), "3d ago");
    }

    #[test]
    fn draft_status_is_yellow() {
        let pr = pr(json!({ "pullRequestId": 1, "status": "active", "isDraft": true }));
        assert_eq!(status_color(&pr), Color::Yellow);
        assert_eq!(status_label(&pr), "active (draft)");
    }

    #[test]
    fn active_status_is_green() {
        let pr = pr(json!({ "pullRequestId": 1, "status": "active" }));
        assert_eq!(status_color(&pr), Color::Green);
    }

    #[test]
    fn output_prs_table_renders_without_panic() {
        let prs = vec![
            pr(json!({
                "pullRequestId": 1,
                "title": "Short title",
                "status": "active",
                "createdBy": { "displayName": "Ada" },
                "creationDate": "2024-01-01T00:00:00+00:00",
                "sourceRefName": "refs/heads/feature/x",
                "repository": { "name": "web" }
            })),
            pr(json!({
                "pullRequestId": 2,
                "title": "A very long title that will definitely need truncation because it far exceeds the sixty character budget",
                "status": "abandoned"
            })),
        ];
        output_prs(&prs, OutputFormat::Table).unwrap();
        output_prs(&prs, OutputFormat::Json).unwrap();
    }

    #[test]
    fn output_prs_empty_list() {
        output_prs(&[], OutputFormat::Table).unwrap();
    }

    #[test]
    fn output_threads_renders_without_panic() {
        let pr = pr(json!({ "pullRequestId": 42, "title": "Fix login" }));
        let threads: Vec<CommentThread> = vec![serde_json::from_value(json!({
            "id": 1,
            "status": "active",
            "threadContext": { "filePath": "/src/login.rs" },
            "comments": [{
                "id": 1,
                "author": { "displayName": "Ada" },
                "content": "multi\nline\ncomment",
                "publishedDate": "2024-01-01T00:00:00+00:00"
            }]
        }))
        .unwrap()];
        output_threads(&pr, &threads, OutputFormat::Table).unwrap();
        output_threads(&pr, &threads, OutputFormat::Json).unwrap();
        output_threads(&pr, &[], OutputFormat::Table).unwrap();
    }
}
