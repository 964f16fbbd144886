use crate::exec::{now_iso, ExecutionMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Host introspection returned by GET /system-info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub arch: String,
    pub hostname: String,
    pub release: String,
    pub uptime: u64,
    pub total_memory: u64,
    pub free_memory: u64,
    pub cpus: u32,
    pub supported_modes: Vec<String>,
    pub server_time: String,
}

/// Collect static host information. Pure read; the volatile fields are
/// `uptime` and `serverTime`, everything else is stable across calls.
pub fn system_info() -> SystemInfo {
    let mem = sys_info::mem_info().ok();

    SystemInfo {
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        hostname: sys_info::hostname().unwrap_or_else(|_| "unknown".to_string()),
        release: sys_info::os_release().unwrap_or_else(|_| "unknown".to_string()),
        uptime: uptime_secs(),
        // mem_info reports kilobytes
        total_memory: mem.as_ref().map(|m| m.total * 1024).unwrap_or(0),
        free_memory: mem.as_ref().map(|m| m.free * 1024).unwrap_or(0),
        cpus: sys_info::cpu_num().unwrap_or(1),
        supported_modes: ExecutionMode::ALL.iter().map(|m| m.to_string()).collect(),
        server_time: now_iso(),
    }
}

fn uptime_secs() -> u64 {
    sys_info::boottime()
        .ok()
        .map(|bt| {
            let now = chrono::Utc::now().timestamp();
            (now - bt.tv_sec as i64).max(0) as u64
        })
        .unwrap_or(0)
}

/// One bundled dialog-tool binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutableInfo {
    pub name: String,
    pub platform: String,
    pub path: String,
}

/// List dialog-tool binaries in the given directory.
///
/// Files with no extension or an `exe`/`bin` extension count as
/// executables; names containing "windows" or ending in `.exe` are
/// classified as windows builds, everything else as linux. An absent
/// directory yields an empty list, not an error.
pub fn list_executables(dir: &Path) -> Vec<ExecutableInfo> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut executables = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "" | "exe" | "bin") {
            continue;
        }

        let platform = if name.contains("windows") || name.ends_with(".exe") {
            "windows"
        } else {
            "linux"
        };

        executables.push(ExecutableInfo {
            name,
            platform: platform.to_string(),
            path: path.to_string_lossy().to_string(),
        });
    }

    executables.sort_by(|a, b| a.name.cmp(&b.name));
    executables
}
