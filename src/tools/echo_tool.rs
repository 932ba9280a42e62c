//! Echo tool — loops `<echo>` text back, for exercising the dispatch plumbing.

use std::sync::LazyLock;

use regex::Regex;

use super::{Tool, ToolInvocation};

static ECHO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<echo>(.*?)</echo>").expect("valid echo tag pattern"));

/// Simple tool that echoes the extracted text back.
pub struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo text back for testing"
    }

    fn can_handle(&self, message: &str) -> bool {
        ECHO_RE.is_match(message)
    }

    fn extract_request(&self, message: &str) -> Option<String> {
        ECHO_RE
            .captures(message)
            .map(|c| c[1].trim().to_string())
            .filter(|text| !text.is_empty())
    }

    async fn execute(&self, request: &str) -> ToolInvocation {
        ToolInvocation::success(self.name(), request, format!("ECHO: {}", request))
    }
}
