use super::read_file::ReadFileTool;
use super::report_tool::ReportTool;
use super::shell_tool::ShellTool;
use super::write_file::WriteFileTool;
use super::*;

fn shell_only_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ShellTool::new(true, 10, false, None)), true);
    registry
}

fn temp_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("zephyr_test_{}_{}", label, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn builtins_register_in_stable_order() {
    let registry = ToolRegistry::with_builtins(&crate::config::ToolsConfig::default());
    assert_eq!(registry.len(), 5);
    assert!(!registry.is_empty());
    assert_eq!(
        registry.names(),
        vec!["shell", "file_read", "file_write", "report", "echo"]
    );
}

#[test]
fn enabled_list_overrides_defaults() {
    let config = crate::config::ToolsConfig {
        enabled: Some(vec!["echo".to_string()]),
        ..Default::default()
    };
    let registry = ToolRegistry::with_builtins(&config);
    assert!(registry.find_match("<shell>ls</shell>").is_none());
    assert!(registry.find_match("<echo>hi</echo>").is_some());
}

#[test]
fn disabled_tool_stops_matching_until_reenabled() {
    let mut registry = shell_only_registry();
    assert!(registry.find_match("<shell>ls</shell>").is_some());
    registry.disable("shell");
    assert!(registry.find_match("<shell>ls</shell>").is_none());
    registry.enable("shell");
    assert!(registry.find_match("<shell>ls</shell>").is_some());
}

#[test]
fn enable_ignores_unregistered_names() {
    let mut registry = shell_only_registry();
    registry.enable("no_such_tool");
    assert!(registry.find_match("<echo>hi</echo>").is_none());
}

#[test]
fn first_registered_tool_wins_on_overlap() {
    // Both tools match the same text; registration order decides.
    struct Always(&'static str);
    #[async_trait::async_trait]
    impl Tool for Always {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "matches everything"
        }
        fn can_handle(&self, _message: &str) -> bool {
            true
        }
        fn extract_request(&self, message: &str) -> Option<String> {
            Some(message.to_string())
        }
        async fn execute(&self, request: &str) -> ToolInvocation {
            ToolInvocation::success(self.name(), request, "")
        }
    }

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(Always("first")), true);
    registry.register(Box::new(Always("second")), true);
    let matched = registry.find_match("anything").unwrap();
    assert_eq!(matched.name(), "first");
}

#[test]
fn extraction_is_idempotent() {
    let shell = ShellTool::new(true, 10, false, None);
    let message = "run this: <shell>ls -la</shell> please";
    let first = shell.extract_request(message);
    let second = shell.extract_request(message);
    assert_eq!(first, second);
    assert_eq!(first.as_deref(), Some("ls -la"));
}

#[test]
fn empty_tag_matches_but_does_not_extract() {
    let shell = ShellTool::new(true, 10, false, None);
    let message = "<shell></shell>";
    assert!(shell.can_handle(message));
    assert_eq!(shell.extract_request(message), None);
}

#[test]
fn fenced_shell_blocks_extract_too() {
    let shell = ShellTool::new(true, 10, false, None);
    let message = "```shell\nls -la\n```";
    assert!(shell.can_handle(message));
    assert_eq!(shell.extract_request(message).as_deref(), Some("ls -la"));
}

#[tokio::test]
async fn dispatch_ignores_plain_text() {
    let registry = shell_only_registry();
    assert!(registry.dispatch("no tool tags here").await.is_none());
}

#[tokio::test]
async fn dispatch_treats_malformed_tag_as_not_triggered() {
    let registry = shell_only_registry();
    assert!(registry.dispatch("<shell>   </shell>").await.is_none());
}

#[tokio::test]
async fn shell_dispatch_renders_result_with_exit_code() {
    let registry = shell_only_registry();
    let rendered = registry.dispatch("<shell>echo hello</shell>").await.unwrap();
    assert!(rendered.contains("TOOL_RESULT shell"));
    assert!(rendered.contains("request: echo hello"));
    assert!(rendered.contains("success: yes"));
    assert!(rendered.contains("hello"));
    assert!(rendered.contains("exit_code: 0"));
    assert!(rendered.contains("execution_mode: local"));
}

#[tokio::test]
async fn shell_nonzero_exit_is_a_failed_result() {
    let shell = ShellTool::new(true, 10, false, None);
    let invocation = shell.execute("exit 3").await;
    assert!(!invocation.success);
    let rendered = invocation.render();
    assert!(rendered.contains("success: no"));
    assert!(rendered.contains("exit_code: 3"));
}

#[tokio::test]
async fn shell_timeout_is_a_failed_result_not_a_crash() {
    let shell = ShellTool::new(true, 1, false, None);
    let invocation = shell.execute("sleep 5").await;
    assert!(!invocation.success);
    assert!(invocation.error.contains("timed out after 1 seconds"));
}

#[tokio::test]
async fn timed_out_command_is_killed() {
    let dir = temp_dir("timeout_kill");
    let marker = dir.join("marker");
    let shell = ShellTool::new(true, 1, false, None);

    let invocation = shell
        .execute(&format!("sleep 2; touch {}", marker.to_string_lossy()))
        .await;
    assert!(!invocation.success);
    assert!(invocation.error.contains("timed out after 1 seconds"));

    // The child dies with the timeout, so its side effect never lands.
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert!(!marker.exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn shell_docker_without_container_fails_cleanly() {
    let shell = ShellTool::new(true, 10, true, None);
    let invocation = shell.execute("ls").await;
    assert!(!invocation.success);
    assert!(invocation.error.contains("container name"));
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let dir = temp_dir("write_read");
    let path = dir.join("notes.txt");
    let path_str = path.to_string_lossy().to_string();

    let write = WriteFileTool::new(false, None);
    let message = format!("<write_file path=\"{}\">line one\nline two</write_file>", path_str);
    let request = write.extract_request(&message).unwrap();
    let invocation = write.execute(&request).await;
    assert!(invocation.success, "write failed: {}", invocation.error);

    let read = ReadFileTool::new(false, None);
    let message = format!("<read_file>{}</read_file>", path_str);
    let request = read.extract_request(&message).unwrap();
    let invocation = read.execute(&request).await;
    assert!(invocation.success);
    assert_eq!(invocation.output, "line one\nline two");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn write_file_creates_parent_directories() {
    let dir = temp_dir("write_parents");
    let path = dir.join("a/b/deep.txt");
    let write = WriteFileTool::new(false, None);
    let request = format!("{}|nested", path.to_string_lossy());
    let invocation = write.execute(&request).await;
    assert!(invocation.success, "write failed: {}", invocation.error);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "nested");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn write_file_accepts_single_quoted_path() {
    let write = WriteFileTool::new(false, None);
    let request = write
        .extract_request("<write_file path='out.txt'>body</write_file>")
        .unwrap();
    assert_eq!(request, "out.txt|body");
}

#[tokio::test]
async fn read_missing_file_is_a_failed_result() {
    let read = ReadFileTool::new(false, None);
    let invocation = read.execute("/nonexistent/zephyr_missing.txt").await;
    assert!(!invocation.success);
    assert!(!invocation.error.is_empty());
}

#[tokio::test]
async fn report_ids_increment_from_001() {
    let dir = temp_dir("report");
    let path = dir.join("report.md");
    let report = ReportTool::new(&path);

    let first = report.execute("First finding|something odd").await;
    assert!(first.success, "report failed: {}", first.error);
    assert!(first.render().contains("id: 001"));

    let second = report.execute("Second finding|more detail").await;
    assert!(second.render().contains("id: 002"));

    let document = std::fs::read_to_string(&path).unwrap();
    // Header written exactly once, on creation.
    assert_eq!(document.matches("# Zephyr Security Report").count(), 1);
    assert!(document.contains("### ID: 001"));
    assert!(document.contains("### ID: 002"));
    assert!(document.contains("**Title**: First finding"));
    assert!(document.contains("something odd"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn report_appends_without_rewriting_existing_entries() {
    let dir = temp_dir("report_append");
    let path = dir.join("report.md");
    let existing = format!(
        "{}\n---\n### ID: 007\n**Title**: Prior finding\n\nkept intact\n",
        crate::constants::REPORT_HEADER
    );
    std::fs::write(&path, &existing).unwrap();

    let report = ReportTool::new(&path);
    let invocation = report.execute("New finding|details").await;
    assert!(invocation.success, "report failed: {}", invocation.error);

    // Prior document content is untouched; the new entry follows it.
    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.starts_with(&existing));
    assert!(document.contains("### ID: 008"));
    assert!(document.contains("**Title**: New finding"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn report_extracts_title_and_body() {
    let report = ReportTool::new("unused.md");
    let request = report
        .extract_request("<report title=\"X\">finding</report>")
        .unwrap();
    assert_eq!(request, "X|finding");
    // Single quotes work as well.
    let request = report
        .extract_request("<report title='Y'>body</report>")
        .unwrap();
    assert_eq!(request, "Y|body");
}

#[tokio::test]
async fn echo_round_trips() {
    let registry = ToolRegistry::with_builtins(&crate::config::ToolsConfig::default());
    let rendered = registry.dispatch("<echo>ping</echo>").await.unwrap();
    assert!(rendered.contains("TOOL_RESULT echo"));
    assert!(rendered.contains("ECHO: ping"));
}

#[test]
fn render_includes_error_block_on_failure() {
    let invocation = ToolInvocation::failure("shell", "rm -rf /", "user rejected command");
    let rendered = invocation.render();
    assert!(rendered.starts_with("TOOL_RESULT shell"));
    assert!(rendered.contains("success: no"));
    assert!(rendered.contains("error:\nuser rejected command"));
}
