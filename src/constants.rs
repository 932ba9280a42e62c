//! Centralized constants for zephyr.
//!
//! All magic numbers, default strings, and protocol constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "zephyr";

/// Default model identifier sent with every payload.
pub const DEFAULT_MODEL: &str = "GLM-4-6-API-V1";

/// Default base URL of the remote chat endpoint.
pub const DEFAULT_BASE_URL: &str = "https://chat.z.ai";

/// Frontend version string the endpoint expects in the `x-fe-version` header.
pub const FE_VERSION: &str = "prod-fe-1.0.220";

/// Shared secret for the request signature. Must match the remote counterpart.
pub const SIGNATURE_SECRET: &str = "key-@@@@)))()((9))-xxxx&&&%%%%%";

/// Width of a signature time window in milliseconds (5 minutes).
pub const SIGNATURE_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Browser user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

/// Page title reported in the telemetry query block.
pub const PAGE_TITLE: &str = "New Chat | Z.ai Chat - Free AI powered by GLM-4.7 & GLM-4.6";

/// Client version reported in the telemetry query block.
pub const CLIENT_VERSION: &str = "0.0.1";

/// Sentinel frame value that carries no event.
pub const STREAM_DONE_SENTINEL: &str = "[DONE]";

/// Connect timeout for the HTTP client, in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout for conversation creation, in seconds.
pub const CREATE_TIMEOUT_SECS: u64 = 60;

// --- Configuration files ---

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "zephyr.toml";

/// Saved credential filename (under the config dir).
pub const AUTH_FILENAME: &str = "auth.json";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

// --- Tool defaults ---

/// Default maximum consecutive tool iterations per human turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 3;

/// Default shell command timeout in seconds.
pub const SHELL_DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Timeout for docker-mediated file reads and writes, in seconds.
pub const DOCKER_IO_TIMEOUT_SECS: u64 = 30;

/// Default docker container name for sandboxed tool execution.
pub const DEFAULT_CONTAINER_NAME: &str = "zephyr-sandbox";

/// Report document filename.
pub const REPORT_FILENAME: &str = "report.md";

/// Header written when the report document is first created.
pub const REPORT_HEADER: &str = "# Zephyr Security Report\n\n";

/// Tool-usage instructions appended to the configured system prompt.
pub const TOOL_SYSTEM_HINT: &str = "\n\nAVAILABLE TOOLS:\n\
1. Shell: <shell>command</shell> - Execute terminal commands.\n\
2. Read File: <read_file>path</read_file> - Read file contents.\n\
3. Write File: <write_file path=\"path\">content</write_file> - Write to files.\n\
4. Report: <report title=\"title\">finding</report> - Document findings with auto-IDs.\n\
\nUSAGE RULES:\n\
- Output ONLY one tool tag per response when an action is required.\n\
- Use absolute paths when possible.\n\
- After tool result is returned, analyze the output and continue.";
