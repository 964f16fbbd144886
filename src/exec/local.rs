use super::{now_iso, ExecutionResult};
use crate::config::ServerSettings;
use std::process::Stdio;
use tokio::process::Command;

/// Run the dialog tool on this host.
///
/// Waits for process exit with no timeout; the original design accepts that
/// a stuck dialog blocks its request indefinitely. Spawn failures (missing
/// binary, permissions) become a `code:-1` failure result rather than an
/// error.
pub async fn run_local(
    message: &str,
    title: Option<&str>,
    settings: &ServerSettings,
) -> ExecutionResult {
    let tool = settings.local_tool();

    let mut command = Command::new(tool);
    command.arg(message);
    if let Some(title) = title {
        command.arg(title);
    }

    let output = match command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Failed to spawn dialog tool {:?}: {}", tool, e);
            return ExecutionResult::failure(format!("Local execution failed: {}", e));
        }
    };

    // Exit-by-signal has no code; report it like a spawn-level failure
    let code = output.status.code().unwrap_or(-1);

    ExecutionResult {
        success: output.status.success(),
        message: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        code,
        execution_mode: Some("local".to_string()),
        endpoint: None,
        hostname: None,
        platform: Some(std::env::consts::OS.to_string()),
        timestamp: now_iso(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;
    use std::path::PathBuf;

    fn settings_with_tool(path: &str) -> ServerSettings {
        let mut settings = ServerSettings::default();
        settings.dialog.unix_tool = PathBuf::from(path);
        settings.dialog.windows_tool = PathBuf::from(path);
        settings
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let settings = settings_with_tool("/bin/echo");
        let result = run_local("hi", None, &settings).await;
        assert!(result.success);
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "hi");
        assert!(result.error.is_empty());
        assert_eq!(result.execution_mode.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_echo_with_title() {
        let settings = settings_with_tool("/bin/echo");
        let result = run_local("hello", Some("world"), &settings).await;
        assert!(result.success);
        assert_eq!(result.message, "hello world");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let settings = settings_with_tool("/nonexistent/dialog-tool");
        let result = run_local("hi", None, &settings).await;
        assert!(!result.success);
        assert_eq!(result.code, -1);
        assert!(result.error.contains("Local execution failed"));
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let settings = settings_with_tool("/bin/false");
        let result = run_local("hi", None, &settings).await;
        assert!(!result.success);
        assert_eq!(result.code, 1);
    }
}
