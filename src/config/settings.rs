use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub dialog: DialogSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory the static front-end is served from
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            asset_dir: default_asset_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSettings {
    /// Directory holding the bundled dialog-tool binaries
    #[serde(default = "default_binaries_dir")]
    pub binaries_dir: PathBuf,
    /// Local dialog tool invoked on Windows hosts
    #[serde(default = "default_windows_tool")]
    pub windows_tool: PathBuf,
    /// Local dialog tool invoked on Unix hosts
    #[serde(default = "default_unix_tool")]
    pub unix_tool: PathBuf,
}

fn default_binaries_dir() -> PathBuf {
    PathBuf::from("binaries")
}

fn default_windows_tool() -> PathBuf {
    PathBuf::from("binaries/dialog-tool-x86_64-pc-windows-msvc.exe")
}

fn default_unix_tool() -> PathBuf {
    PathBuf::from("binaries/dialog-tool")
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            binaries_dir: default_binaries_dir(),
            windows_tool: default_windows_tool(),
            unix_tool: default_unix_tool(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Dialog tool path on the remote Windows host (SSH and WMI modes)
    #[serde(default = "default_remote_tool")]
    pub tool_path: String,
    /// Local scripting host the WMI strategy runs its invocation through
    #[serde(default = "default_scripting_host")]
    pub scripting_host: String,
    /// Upper bound on remote execution, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Agent port advertised to clients via /config
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,
}

fn default_remote_tool() -> String {
    r"C:\Program Files\dialog-tool\dialog-tool.exe".to_string()
}

fn default_scripting_host() -> String {
    "powershell".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_agent_port() -> u16 {
    8080
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            tool_path: default_remote_tool(),
            scripting_host: default_scripting_host(),
            timeout_secs: default_timeout_secs(),
            agent_port: default_agent_port(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            dialog: DialogSettings::default(),
            remote: RemoteSettings::default(),
        }
    }
}

impl ServerSettings {
    pub fn load(config_dir: &Path) -> AppResult<Self> {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: ServerSettings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            let settings = ServerSettings::default();
            settings.save(config_dir)?;
            Ok(settings)
        }
    }

    pub fn save(&self, config_dir: &Path) -> AppResult<()> {
        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Dialog tool path for the host OS family
    pub fn local_tool(&self) -> &Path {
        if cfg!(windows) {
            &self.dialog.windows_tool
        } else {
            &self.dialog.unix_tool
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.http.port, 5000);
        assert_eq!(settings.remote.timeout_secs, 30);
        assert_eq!(settings.remote.agent_port, 8080);
    }

    #[test]
    fn test_partial_toml() {
        let settings: ServerSettings = toml::from_str("[http]\nport = 9000\n").unwrap();
        assert_eq!(settings.http.port, 9000);
        assert_eq!(settings.http.bind, "0.0.0.0");
        assert_eq!(settings.remote.timeout_secs, 30);
    }
}
