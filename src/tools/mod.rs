//! Tool capabilities and the registry that dispatches them.
//!
//! A tool recognizes a trigger pattern embedded in assistant text, extracts
//! a request from it, and executes a side-effecting action. Executors never
//! fail the call: every failure mode is encoded into the returned
//! [`ToolInvocation`] and rendered as text the model can react to.
//!
//! Tools are assembled into the registry once at startup; there is no
//! runtime discovery. Registration order is dispatch order, so overlapping
//! trigger patterns resolve deterministically.

pub mod echo_tool;
pub mod read_file;
pub mod report_tool;
pub mod shell_tool;
pub mod write_file;

use std::collections::HashSet;
use std::sync::Arc;

use echo_tool::EchoTool;
use read_file::ReadFileTool;
use report_tool::ReportTool;
use shell_tool::ShellTool;
use write_file::WriteFileTool;

use crate::config::ToolsConfig;

/// The result of executing a tool.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub request: String,
    pub success: bool,
    pub output: String,
    pub error: String,
    /// Ordered key/value pairs appended to the rendering.
    pub metadata: Vec<(String, String)>,
}

impl ToolInvocation {
    pub fn success(
        tool_name: impl Into<String>,
        request: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            request: request.into(),
            success: true,
            output: output.into(),
            error: String::new(),
            metadata: Vec::new(),
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        request: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            request: request.into(),
            success: false,
            output: String::new(),
            error: error.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// The canonical textual rendering fed back into the conversation.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("TOOL_RESULT {}", self.tool_name),
            format!("request: {}", self.request),
            format!("success: {}", if self.success { "yes" } else { "no" }),
        ];
        if !self.output.is_empty() {
            lines.push(format!("output:\n{}", self.output));
        }
        if !self.error.is_empty() {
            lines.push(format!("error:\n{}", self.error));
        }
        for (key, value) in &self.metadata {
            lines.push(format!("{}: {}", key, value));
        }
        lines.join("\n")
    }
}

/// Every tool capability implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for registration and result rendering.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Whether this tool's trigger pattern appears in the assistant text.
    fn can_handle(&self, message: &str) -> bool;

    /// Extracts the request from the assistant text. `None` when the tag is
    /// malformed or empty — "does not apply", never an error.
    fn extract_request(&self, message: &str) -> Option<String>;

    /// Executes the extracted request. Never fails the call; failures are
    /// encoded into the returned invocation.
    async fn execute(&self, request: &str) -> ToolInvocation;
}

/// Holds the registered tools and dispatches on assistant text.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    enabled: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            enabled: HashSet::new(),
        }
    }

    /// Registers a tool under its unique name. Called during startup.
    pub fn register(&mut self, tool: Box<dyn Tool>, enabled: bool) {
        if enabled {
            self.enabled.insert(tool.name().to_string());
        }
        self.tools.push(Arc::from(tool));
    }

    /// Adds a registered tool to the active set.
    pub fn enable(&mut self, name: &str) {
        if self.tools.iter().any(|t| t.name() == name) {
            self.enabled.insert(name.to_string());
        }
    }

    /// Removes a tool from the active set without unregistering it.
    pub fn disable(&mut self, name: &str) {
        self.enabled.remove(name);
    }

    /// Names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Finds the first enabled tool whose trigger pattern matches, in
    /// registration order. Order is stable so overlapping patterns resolve
    /// the same way every time.
    pub fn find_match(&self, message: &str) -> Option<&Arc<dyn Tool>> {
        self.tools
            .iter()
            .filter(|t| self.enabled.contains(t.name()))
            .find(|t| t.can_handle(message))
    }

    /// Dispatches on assistant text: finds a match, extracts the request,
    /// executes, and returns the rendered result. `None` means not
    /// triggered — including a predicate hit whose extraction came up empty.
    pub async fn dispatch(&self, message: &str) -> Option<String> {
        let tool = self.find_match(message)?;
        let request = tool.extract_request(message)?;
        Some(tool.execute(&request).await.render())
    }

    /// Creates a registry with all built-in tools, configured from the
    /// tools section of the application config.
    pub fn with_builtins(config: &ToolsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ShellTool::from_config(config)), true);
        registry.register(
            Box::new(ReadFileTool::new(
                config.use_docker(),
                config.container_name(),
            )),
            true,
        );
        registry.register(
            Box::new(WriteFileTool::new(
                config.use_docker(),
                config.container_name(),
            )),
            true,
        );
        registry.register(
            Box::new(ReportTool::new(crate::constants::REPORT_FILENAME)),
            true,
        );
        registry.register(Box::new(EchoTool), true);

        // An explicit enabled list overrides the defaults for every tool.
        if let Some(enabled) = &config.enabled {
            let names: Vec<String> = registry.names().iter().map(|n| n.to_string()).collect();
            for name in names {
                if enabled.iter().any(|e| *e == name) {
                    registry.enable(&name);
                } else {
                    registry.disable(&name);
                }
            }
        }
        registry
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
