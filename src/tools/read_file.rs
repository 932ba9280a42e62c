//! Read-file tool — reads file contents requested via `<read_file>` tags.

use std::sync::LazyLock;

use regex::Regex;

use super::shell_tool::{docker_wrap, run_sh};
use super::{Tool, ToolInvocation};
use crate::constants::DOCKER_IO_TIMEOUT_SECS;

static READ_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<read_file>(.*?)</read_file>").expect("valid read_file tag pattern")
});

/// Tool that reads a file, locally or via `cat` inside a docker container.
pub struct ReadFileTool {
    use_docker: bool,
    container_name: Option<String>,
}

impl ReadFileTool {
    pub fn new(use_docker: bool, container_name: Option<String>) -> Self {
        Self {
            use_docker,
            container_name,
        }
    }

    fn mode(&self) -> &'static str {
        if self.use_docker {
            "docker"
        } else {
            "local"
        }
    }

    async fn read_docker(&self, path: &str) -> Result<String, String> {
        let Some(container) = &self.container_name else {
            return Err("docker container name not specified".to_string());
        };
        let command = docker_wrap(container, &format!("cat \"{}\"", path));
        let (exit_code, stdout, stderr) = run_sh(&command, DOCKER_IO_TIMEOUT_SECS).await?;
        if exit_code != 0 {
            return Err(if stderr.is_empty() {
                format!("failed to read file in docker (code {})", exit_code)
            } else {
                stderr
            });
        }
        Ok(stdout)
    }
}

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read contents of a file (local or docker)"
    }

    fn can_handle(&self, message: &str) -> bool {
        READ_FILE_RE.is_match(message)
    }

    fn extract_request(&self, message: &str) -> Option<String> {
        READ_FILE_RE
            .captures(message)
            .map(|c| c[1].trim().to_string())
            .filter(|path| !path.is_empty())
    }

    async fn execute(&self, request: &str) -> ToolInvocation {
        let result = if self.use_docker {
            self.read_docker(request).await
        } else {
            tokio::fs::read_to_string(request)
                .await
                .map_err(|e| format!("{}: {}", request, e))
        };

        match result {
            Ok(content) => ToolInvocation::success(self.name(), request, content)
                .with_metadata("mode", self.mode())
                .with_metadata("path", request),
            Err(err) => ToolInvocation::failure(self.name(), request, err),
        }
    }
}
