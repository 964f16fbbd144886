use super::{now_iso, Credentials, ExecutionResult};
use crate::config::ServerSettings;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// PowerShell script executed by the local scripting host. Parameters come
/// in through the process environment and are forwarded to the remote
/// script block via -ArgumentList, so neither credentials nor the message
/// are spliced into the script text.
const INVOKE_SCRIPT: &str = r#"
$secure = ConvertTo-SecureString $env:DIALOG_RELAY_PASSWORD -AsPlainText -Force
$credential = New-Object System.Management.Automation.PSCredential($env:DIALOG_RELAY_USERNAME, $secure)
$block = {
    param($tool, $message, $title)
    if ($title) { & $tool $message $title } else { & $tool $message }
}
Invoke-Command -ComputerName $env:DIALOG_RELAY_ENDPOINT -Credential $credential -ScriptBlock $block -ArgumentList $env:DIALOG_RELAY_TOOL, $env:DIALOG_RELAY_MESSAGE, $env:DIALOG_RELAY_TITLE
"#;

/// Run the dialog tool on a remote Windows host via WMI/PowerShell
/// remoting.
///
/// Requires both username and password; fails fast without spawning
/// anything when either is missing. Bounded by the configured timeout, and
/// the scripting-host process is killed on expiry. As with SSH, success
/// reports a fixed code of 0.
pub async fn run_remote_wmi(
    message: &str,
    title: Option<&str>,
    endpoint: Option<&str>,
    credentials: Option<&Credentials>,
    settings: &ServerSettings,
) -> ExecutionResult {
    let (username, password) = match credentials {
        Some(Credentials {
            username: Some(username),
            password: Some(password),
            ..
        }) => (username.clone(), password.clone()),
        _ => return ExecutionResult::failure("WMI credentials (username/password) required"),
    };
    let endpoint = match endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint.to_string(),
        _ => return ExecutionResult::failure("Endpoint required for WMI execution"),
    };

    let timeout = Duration::from_secs(settings.remote.timeout_secs);

    let mut command = Command::new(&settings.remote.scripting_host);
    command
        .args(["-NoProfile", "-NonInteractive", "-Command", INVOKE_SCRIPT])
        .env("DIALOG_RELAY_USERNAME", &username)
        .env("DIALOG_RELAY_PASSWORD", &password)
        .env("DIALOG_RELAY_ENDPOINT", &endpoint)
        .env("DIALOG_RELAY_TOOL", &settings.remote.tool_path)
        .env("DIALOG_RELAY_MESSAGE", message)
        .env("DIALOG_RELAY_TITLE", title.unwrap_or(""))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the future on timeout must take the child with it
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!("Failed to spawn powershell: {}", e);
            return ExecutionResult::failure(format!("WMI execution failed: {}", e));
        }
        Err(_) => {
            tracing::warn!("WMI execution timed out against {}", endpoint);
            return ExecutionResult::failure(format!(
                "WMI execution timed out after {} seconds",
                timeout.as_secs()
            ));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let detail = if stderr.is_empty() {
            format!("exit code {}", output.status.code().unwrap_or(-1))
        } else {
            stderr
        };
        return ExecutionResult::failure(format!("WMI execution failed: {}", detail));
    }

    ExecutionResult {
        success: true,
        message: stdout,
        error: stderr,
        code: 0,
        execution_mode: Some("remote_wmi".to_string()),
        endpoint: Some(endpoint),
        hostname: None,
        platform: None,
        timestamp: now_iso(),
    }
}
