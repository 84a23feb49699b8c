use crate::domain::model::Platform;
use crate::domain::ports::{ConfigProvider, GpuProbe};
use crate::utils::error::{RelPerfError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const TOOL_NAME: &str = "nvidia-smi";
pub const LIST_GPUS_ARG: &str = "--list-gpus";
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
pub const WINDOWS_SEARCH_DIRS: &[&str] = &["C:\\Program Files\\NVIDIA Corporation\\NVSMI\\"];

/// Runs `<tool> --list-gpus` with a deadline. Shared by every platform
/// that can find the tool.
async fn run_list_gpus(tool: &Path, timeout: Duration) -> Result<String> {
    let tool_name = tool.display().to_string();
    tracing::info!("Getting current system cards via {}", tool_name);

    let invocation_error = |message: String| RelPerfError::ToolInvocationError {
        tool: tool_name.clone(),
        message,
    };

    let child = Command::new(tool)
        .arg(LIST_GPUS_ARG)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| invocation_error(format!("could not start process: {}", e)))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| invocation_error(format!("no answer within {:?}", timeout)))?
        .map_err(|e| invocation_error(format!("could not read output: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(invocation_error(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| invocation_error(format!("output is not valid UTF-8: {}", e)))
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn joined(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Finds `nvidia-smi` on the executable search path.
#[derive(Debug, Clone)]
pub struct UnixProbe {
    search_path: Option<OsString>,
    timeout: Duration,
}

impl UnixProbe {
    /// Uses `$PATH` at lookup time.
    pub fn new(timeout: Duration) -> Self {
        Self {
            search_path: None,
            timeout,
        }
    }

    /// Uses the given `PATH`-style list instead of the environment.
    pub fn with_search_path(search_path: impl Into<OsString>, timeout: Duration) -> Self {
        Self {
            search_path: Some(search_path.into()),
            timeout,
        }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();
        std::env::split_paths(&path).collect()
    }
}

#[async_trait]
impl GpuProbe for UnixProbe {
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    fn locate_tool(&self) -> Result<PathBuf> {
        tracing::info!("Detected System: {}", self.platform());
        let dirs = self.search_dirs();

        dirs.iter()
            .map(|dir| dir.join(TOOL_NAME))
            .find(|candidate| is_executable_file(candidate))
            .ok_or_else(|| RelPerfError::ToolNotFoundError {
                tool: TOOL_NAME.to_string(),
                searched: format!("PATH ({})", joined(&dirs)),
            })
    }

    async fn list_devices(&self, tool: &Path) -> Result<String> {
        run_list_gpus(tool, self.timeout).await
    }
}

/// Looks for `nvidia-smi.exe` in the known NVIDIA install directories.
#[derive(Debug, Clone)]
pub struct WindowsProbe {
    search_dirs: Vec<PathBuf>,
    timeout: Duration,
}

impl WindowsProbe {
    pub fn new(search_dirs: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            search_dirs,
            timeout,
        }
    }
}

#[async_trait]
impl GpuProbe for WindowsProbe {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn locate_tool(&self) -> Result<PathBuf> {
        tracing::info!("Detected System: {}", self.platform());
        let exe = format!("{}.exe", TOOL_NAME);

        self.search_dirs
            .iter()
            .map(|dir| dir.join(&exe))
            .find(|candidate| is_executable_file(candidate))
            .ok_or_else(|| RelPerfError::ToolNotFoundError {
                tool: exe.clone(),
                searched: joined(&self.search_dirs),
            })
    }

    async fn list_devices(&self, tool: &Path) -> Result<String> {
        run_list_gpus(tool, self.timeout).await
    }
}

/// Platforms without an NVIDIA management tool (macOS).
#[derive(Debug, Clone)]
pub struct UnsupportedProbe {
    platform: Platform,
}

impl UnsupportedProbe {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn unsupported(&self) -> RelPerfError {
        RelPerfError::UnsupportedPlatformError {
            platform: self.platform.to_string(),
        }
    }
}

#[async_trait]
impl GpuProbe for UnsupportedProbe {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn locate_tool(&self) -> Result<PathBuf> {
        tracing::info!("Detected System: {}", self.platform);
        tracing::warn!("{} not yet supported.", self.platform);
        Err(self.unsupported())
    }

    async fn list_devices(&self, _tool: &Path) -> Result<String> {
        Err(self.unsupported())
    }
}

/// The probe for the running platform, chosen once at startup.
#[derive(Debug, Clone)]
pub enum PlatformProbe {
    Unix(UnixProbe),
    Windows(WindowsProbe),
    Unsupported(UnsupportedProbe),
}

impl PlatformProbe {
    pub fn for_platform(platform: Platform, windows_dirs: Vec<PathBuf>, timeout: Duration) -> Self {
        match platform {
            Platform::Unix => PlatformProbe::Unix(UnixProbe::new(timeout)),
            Platform::Windows => PlatformProbe::Windows(WindowsProbe::new(windows_dirs, timeout)),
            Platform::MacOs => PlatformProbe::Unsupported(UnsupportedProbe::new(platform)),
        }
    }

    pub fn detect<C: ConfigProvider>(config: &C) -> Self {
        Self::for_platform(
            Platform::current(),
            config.windows_search_dirs(),
            config.tool_timeout(),
        )
    }

    fn inner(&self) -> &dyn GpuProbe {
        match self {
            PlatformProbe::Unix(probe) => probe,
            PlatformProbe::Windows(probe) => probe,
            PlatformProbe::Unsupported(probe) => probe,
        }
    }
}

#[async_trait]
impl GpuProbe for PlatformProbe {
    fn platform(&self) -> Platform {
        self.inner().platform()
    }

    fn locate_tool(&self) -> Result<PathBuf> {
        self.inner().locate_tool()
    }

    async fn list_devices(&self, tool: &Path) -> Result<String> {
        self.inner().list_devices(tool).await
    }
}

pub fn default_windows_dirs() -> Vec<PathBuf> {
    WINDOWS_SEARCH_DIRS.iter().map(PathBuf::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_unix_probe_missing_tool() {
        let dir = TempDir::new().unwrap();
        let probe = UnixProbe::with_search_path(dir.path(), DEFAULT_TOOL_TIMEOUT);
        assert!(matches!(
            probe.locate_tool(),
            Err(RelPerfError::ToolNotFoundError { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_probe_finds_tool_on_search_path() {
        let empty = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let tool = write_script(bin.path(), TOOL_NAME, "exit 0");

        let search_path = std::env::join_paths([empty.path(), bin.path()]).unwrap();
        let probe = UnixProbe::with_search_path(search_path, DEFAULT_TOOL_TIMEOUT);
        assert_eq!(probe.locate_tool().unwrap(), tool);
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_probe_skips_non_executable() {
        let bin = TempDir::new().unwrap();
        std::fs::write(bin.path().join(TOOL_NAME), "not a program").unwrap();

        let probe = UnixProbe::with_search_path(bin.path(), DEFAULT_TOOL_TIMEOUT);
        assert!(probe.locate_tool().is_err());
    }

    #[test]
    fn test_windows_probe_searches_known_dirs() {
        let missing = TempDir::new().unwrap();
        let install = TempDir::new().unwrap();
        let exe = install.path().join("nvidia-smi.exe");
        std::fs::write(&exe, "").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let probe = WindowsProbe::new(
            vec![missing.path().to_path_buf(), install.path().to_path_buf()],
            DEFAULT_TOOL_TIMEOUT,
        );
        assert_eq!(probe.locate_tool().unwrap(), exe);

        let nothing = WindowsProbe::new(vec![missing.path().to_path_buf()], DEFAULT_TOOL_TIMEOUT);
        assert!(matches!(
            nothing.locate_tool(),
            Err(RelPerfError::ToolNotFoundError { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_probe_reports_platform() {
        let probe = PlatformProbe::for_platform(Platform::MacOs, Vec::new(), DEFAULT_TOOL_TIMEOUT);
        assert_eq!(probe.platform(), Platform::MacOs);
        assert!(matches!(
            probe.locate_tool(),
            Err(RelPerfError::UnsupportedPlatformError { .. })
        ));
        assert!(probe.list_devices(Path::new(TOOL_NAME)).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_devices_passes_list_gpus_flag() {
        let bin = TempDir::new().unwrap();
        let tool = write_script(
            bin.path(),
            TOOL_NAME,
            r#"[ "$1" = "--list-gpus" ] || exit 9
echo "0: TITAN V (UUID: GPU-1)""#,
        );

        let probe = UnixProbe::with_search_path(bin.path(), DEFAULT_TOOL_TIMEOUT);
        let output = probe.list_devices(&tool).await.unwrap();
        assert_eq!(output, "0: TITAN V (UUID: GPU-1)\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_devices_propagates_exit_status() {
        let bin = TempDir::new().unwrap();
        let tool = write_script(bin.path(), TOOL_NAME, "echo 'driver mismatch' >&2\nexit 3");

        let probe = UnixProbe::with_search_path(bin.path(), DEFAULT_TOOL_TIMEOUT);
        match probe.list_devices(&tool).await {
            Err(RelPerfError::ToolInvocationError { message, .. }) => {
                assert!(message.contains("driver mismatch"), "{}", message);
            }
            other => panic!("expected ToolInvocationError, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_devices_times_out() {
        let bin = TempDir::new().unwrap();
        let tool = write_script(bin.path(), TOOL_NAME, "sleep 5");

        let probe = UnixProbe::with_search_path(bin.path(), Duration::from_millis(200));
        assert!(matches!(
            probe.list_devices(&tool).await,
            Err(RelPerfError::ToolInvocationError { .. })
        ));
    }
}
