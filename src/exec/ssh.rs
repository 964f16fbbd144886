use super::{now_iso, Credentials, ExecutionResult};
use crate::config::ServerSettings;
use crate::error::{AppError, AppResult};
use ssh2::Session as Ssh2Session;
use std::io::Read;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

const SSH_PORT: u16 = 22;

/// Run the dialog tool on a remote Windows host over SSH.
///
/// Key-based auth takes priority when a private key is present, else
/// password auth. The whole operation is bounded by the configured timeout;
/// on expiry the socket is shut down, which unblocks whatever ssh2 stage
/// the worker is sitting in, and a timeout failure is returned. On success
/// the reported code is always 0 regardless of the remote exit status
/// (known fidelity limitation, kept deliberately).
pub async fn run_remote_ssh(
    message: &str,
    title: Option<&str>,
    endpoint: Option<&str>,
    credentials: Option<&Credentials>,
    settings: &ServerSettings,
) -> ExecutionResult {
    let username = match credentials.and_then(|c| c.username.clone()) {
        Some(username) => username,
        None => return ExecutionResult::failure("SSH credentials required"),
    };
    let endpoint = match endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint.to_string(),
        _ => return ExecutionResult::failure("Endpoint required for SSH execution"),
    };

    let password = credentials.and_then(|c| c.password.clone());
    let private_key = credentials.and_then(|c| c.private_key.clone());
    let command = remote_command(&settings.remote.tool_path, message, title);
    let timeout = Duration::from_secs(settings.remote.timeout_secs);

    // The worker hands a clone of its socket back so the async side can
    // tear the connection down when the deadline passes
    let (socket_tx, mut socket_rx) = tokio::sync::oneshot::channel::<TcpStream>();

    let host = endpoint.clone();
    let task = tokio::task::spawn_blocking(move || {
        exec_blocking(
            &host,
            &username,
            password,
            private_key,
            &command,
            timeout,
            socket_tx,
        )
    });

    let outcome = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Err(AppError::Ssh(format!("SSH task failed: {}", e))),
        Err(_) => {
            tracing::warn!("SSH execution timed out against {}", endpoint);
            if let Ok(socket) = socket_rx.try_recv() {
                let _ = socket.shutdown(Shutdown::Both);
            }
            return ExecutionResult::failure(format!(
                "SSH execution timed out after {} seconds",
                timeout.as_secs()
            ));
        }
    };

    match outcome {
        Ok((stdout, stderr)) => ExecutionResult {
            success: true,
            message: stdout.trim().to_string(),
            error: stderr.trim().to_string(),
            code: 0,
            execution_mode: Some("remote_ssh".to_string()),
            endpoint: Some(endpoint),
            hostname: None,
            platform: None,
            timestamp: now_iso(),
        },
        Err(e) => ExecutionResult::failure(format!("SSH execution failed: {}", e)),
    }
}

/// Blocking SSH connect/auth/exec (runs under spawn_blocking)
fn exec_blocking(
    host: &str,
    username: &str,
    password: Option<String>,
    private_key: Option<String>,
    command: &str,
    timeout: Duration,
    socket_tx: tokio::sync::oneshot::Sender<TcpStream>,
) -> AppResult<(String, String)> {
    let (host, port) = split_host_port(host);

    tracing::info!("Connecting to {}@{}:{}", username, host, port);

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| AppError::Connection(format!("Invalid address: {}", e)))?
        .next()
        .ok_or_else(|| AppError::Connection(format!("No address found for {}", host)))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| AppError::Connection(format!("TCP connect failed: {}", e)))?;
    tcp.set_write_timeout(Some(timeout))?;

    if let Ok(clone) = tcp.try_clone() {
        let _ = socket_tx.send(clone);
    }

    let mut session = Ssh2Session::new()
        .map_err(|e| AppError::Ssh(format!("Failed to create SSH session: {}", e)))?;
    session.set_tcp_stream(tcp);
    // Per-operation backstop sits above the overall deadline; the async
    // side owns cancellation by shutting the socket down, which fails the
    // current ssh2 operation immediately
    session.set_timeout(timeout.as_millis() as u32 + 5_000);

    session
        .handshake()
        .map_err(|e| AppError::Ssh(format!("SSH handshake failed: {}", e)))?;

    authenticate(&session, username, password, private_key)?;

    let mut channel = session
        .channel_session()
        .map_err(|e| AppError::Ssh(format!("Failed to open channel: {}", e)))?;
    channel
        .exec(command)
        .map_err(|e| AppError::Ssh(format!("Remote exec failed: {}", e)))?;

    let mut stdout = String::new();
    let mut stderr = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| AppError::Ssh(format!("Failed to read remote stdout: {}", e)))?;
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| AppError::Ssh(format!("Failed to read remote stderr: {}", e)))?;

    let _ = channel.wait_close();

    Ok((stdout, stderr))
}

/// Authenticate with key (priority) or password
fn authenticate(
    session: &Ssh2Session,
    username: &str,
    password: Option<String>,
    private_key: Option<String>,
) -> AppResult<()> {
    if let Some(key_data) = private_key {
        // Write key to a temp file with restrictive permissions, delete after
        let key_file_path =
            std::env::temp_dir().join(format!("dialog_relay_key_{}", uuid::Uuid::new_v4()));
        std::fs::write(&key_file_path, &key_data)
            .map_err(|e| AppError::Auth(format!("Failed to write temp key file: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&key_file_path, perms);
        }

        let auth_result = session.userauth_pubkey_file(username, None, &key_file_path, None);
        let _ = std::fs::remove_file(&key_file_path);

        auth_result.map_err(|_| AppError::Auth("Private key not accepted by server".to_string()))?;
    } else {
        let password =
            password.ok_or_else(|| AppError::Auth("Password or private key required".to_string()))?;
        session
            .userauth_password(username, &password)
            .map_err(|_| AppError::Auth("Password authentication failed".to_string()))?;
    }

    if !session.authenticated() {
        return Err(AppError::Auth("Authentication failed".to_string()));
    }

    Ok(())
}

/// Build the remote command line with quote-escaped arguments.
///
/// The message and title are embedded as quoted arguments rather than raw
/// string concatenation, keeping the original contract without its
/// injection surface.
fn remote_command(tool_path: &str, message: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!(
            "\"{}\" \"{}\" \"{}\"",
            tool_path,
            quote_escape(message),
            quote_escape(title)
        ),
        None => format!("\"{}\" \"{}\"", tool_path, quote_escape(message)),
    }
}

fn quote_escape(arg: &str) -> String {
    arg.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Split an endpoint into host and port, defaulting to the SSH port when
/// none is given
fn split_host_port(endpoint: &str) -> (&str, u16) {
    match endpoint.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, port),
            Err(_) => (endpoint, SSH_PORT),
        },
        None => (endpoint, SSH_PORT),
    }
}
