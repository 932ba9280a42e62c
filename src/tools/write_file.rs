//! Write-file tool — writes content requested via `<write_file>` tags,
//! creating parent directories as needed.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::shell_tool::{docker_wrap, run_sh};
use super::{Tool, ToolInvocation};
use crate::constants::DOCKER_IO_TIMEOUT_SECS;

// Attribute quoting accepts both single and double quotes.
static WRITE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<write_file\s+path=["'](.*?)["']>(.*?)</write_file>"#)
        .expect("valid write_file tag pattern")
});

/// Tool that writes content to a file, locally or inside a docker container.
///
/// The extracted request is `path|content`; the body is everything between
/// the tags, untrimmed.
pub struct WriteFileTool {
    use_docker: bool,
    container_name: Option<String>,
}

impl WriteFileTool {
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

    async fn write_local(&self, path: &str, content: &str) -> Result<(), String> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| format!("{}: {}", path, e))
    }

    async fn write_docker(&self, path: &str, content: &str) -> Result<(), String> {
        let Some(container) = &self.container_name else {
            return Err("docker container name not specified".to_string());
        };
        // Quoted heredoc keeps the body inert inside the container shell.
        let inner = format!("cat << 'EOF' > '{}'\n{}\nEOF\n", path, content);
        let command = docker_wrap(container, &inner);
        let (exit_code, _, stderr) = run_sh(&command, DOCKER_IO_TIMEOUT_SECS).await?;
        if exit_code != 0 {
            return Err(if stderr.is_empty() {
                format!("failed to write file in docker (code {})", exit_code)
            } else {
                stderr
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file (local or docker)"
    }

    fn can_handle(&self, message: &str) -> bool {
        WRITE_FILE_RE.is_match(message)
    }

    fn extract_request(&self, message: &str) -> Option<String> {
        WRITE_FILE_RE.captures(message).and_then(|c| {
            let path = c[1].trim().to_string();
            if path.is_empty() {
                return None;
            }
            Some(format!("{}|{}", path, &c[2]))
        })
    }

    async fn execute(&self, request: &str) -> ToolInvocation {
        let Some((path, content)) = request.split_once('|') else {
            return ToolInvocation::failure(
                self.name(),
                request,
                "invalid write_file request; use <write_file path=\"...\">content</write_file>",
            );
        };

        let result = if self.use_docker {
            self.write_docker(path, content).await
        } else {
            self.write_local(path, content).await
        };

        match result {
            Ok(()) => ToolInvocation::success(
                self.name(),
                format!("Write to {}", path),
                format!(
                    "Successfully wrote {} bytes to {} ({})",
                    content.len(),
                    path,
                    self.mode()
                ),
            )
            .with_metadata("mode", self.mode())
            .with_metadata("path", path),
            Err(err) => ToolInvocation::failure(self.name(), path, err),
        }
    }
}
