//! Report tool — appends findings to a markdown report document with
//! fixed-width incrementing entry identifiers.
//!
//! The next identifier is derived by scanning the existing document for
//! `### ID: NNN` headings; the first entry in a fresh document is `001` and
//! the document header is written only on first creation.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use super::{Tool, ToolInvocation};
use crate::constants::REPORT_HEADER;

static REPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<report\s+title=["'](.*?)["']>(.*?)</report>"#)
        .expect("valid report tag pattern")
});

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"### ID: (\d+)").expect("valid report id pattern"));

/// Tool that documents findings with auto-allocated ids.
pub struct ReportTool {
    path: PathBuf,
}

impl ReportTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Highest existing entry id plus one, as a zero-padded 3-digit string.
    fn next_id(&self) -> std::io::Result<String> {
        if !self.path.exists() {
            return Ok("001".to_string());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let last = ID_RE
            .captures_iter(&content)
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("{:03}", last + 1))
    }

    fn append_entry(&self, title: &str, content: &str, id: &str) -> std::io::Result<()> {
        use std::io::Write;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!(
            "\n---\n### ID: {}\n**Title**: {}\n**Date**: {}\n\n{}\n",
            id, title, timestamp, content
        );

        // Append-only: existing entries are never rewritten.
        let is_new = !self.path.exists();
        let mut document = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        if is_new {
            document.write_all(REPORT_HEADER.as_bytes())?;
        }
        document.write_all(entry.as_bytes())
    }
}

#[async_trait::async_trait]
impl Tool for ReportTool {
    fn name(&self) -> &str {
        "report"
    }

    fn description(&self) -> &str {
        "Add a finding to the report with an incremental ID"
    }

    fn can_handle(&self, message: &str) -> bool {
        REPORT_RE.is_match(message)
    }

    fn extract_request(&self, message: &str) -> Option<String> {
        REPORT_RE.captures(message).and_then(|c| {
            let title = c[1].trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(format!("{}|{}", title, c[2].trim()))
        })
    }

    async fn execute(&self, request: &str) -> ToolInvocation {
        let Some((title, content)) = request.split_once('|') else {
            return ToolInvocation::failure(self.name(), request, "invalid report format");
        };

        let id = match self.next_id() {
            Ok(id) => id,
            Err(e) => return ToolInvocation::failure(self.name(), title, e.to_string()),
        };
        match self.append_entry(title, content, &id) {
            Ok(()) => ToolInvocation::success(
                self.name(),
                title,
                format!("Finding {} successfully added to {}", id, self.path.display()),
            )
            .with_metadata("id", id.as_str())
            .with_metadata("title", title),
            Err(e) => ToolInvocation::failure(self.name(), title, e.to_string()),
        }
    }
}
