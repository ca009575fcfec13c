//! External audio tool integration (SoundVolumeView)
//!
//! The tool is a black box: one invocation dumps the audio inventory as
//! UTF-16LE tab-separated text, others change an application's default
//! device or mute state. Exit codes of routing commands only feed logs;
//! the next refresh shows what actually happened.

use crate::config::ToolConfig;
use crate::error::ToolError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

/// Settings page listing per-application volume and devices
const VOLUME_SETTINGS_URI: &str = "ms-settings:apps-volume";

/// `CREATE_NO_WINDOW`, keeps console windows from flashing on every refresh
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Collaborator that queries and mutates audio routing.
///
/// All methods take `&self` so the tool can be shared as `Arc<dyn AudioTool>`.
#[async_trait]
pub trait AudioTool: Send + Sync {
    /// Tool name for logs
    fn name(&self) -> &str;

    /// Raw dump bytes (UTF-16LE tab-separated text)
    async fn query_dump(&self) -> Result<Vec<u8>, ToolError>;

    /// Route every stream of `process_id` to `device_id`
    async fn set_app_default(&self, device_id: &str, process_id: &str) -> Result<(), ToolError>;

    /// Mute or unmute every stream of `process_id`
    async fn set_muted(&self, process_id: &str, muted: bool) -> Result<(), ToolError>;

    /// Open the system per-application volume settings
    async fn open_volume_settings(&self) -> Result<(), ToolError>;

    /// Open the tool's own window
    async fn open_tool_window(&self) -> Result<(), ToolError>;
}

/// NirSoft SoundVolumeView driven through its command line
#[derive(Debug, Clone)]
pub struct SoundVolumeView {
    config: ToolConfig,
}

impl SoundVolumeView {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Program and arguments for a tool invocation
    fn command_line(&self, args: &[&str]) -> (String, Vec<String>) {
        let program = self.config.path.to_string_lossy().into_owned();
        if self.config.use_shell {
            let mut shell_args = vec!["/c".to_string(), program];
            shell_args.extend(args.iter().map(|a| a.to_string()));
            ("cmd".to_string(), shell_args)
        } else {
            (program, args.iter().map(|a| a.to_string()).collect())
        }
    }

    fn command(&self, args: &[&str]) -> (String, Command) {
        let (program, args) = self.command_line(args);
        trace!(program = %program, ?args, "Tool invocation");
        let mut cmd = Command::new(&program);
        cmd.args(&args).stdin(Stdio::null());
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);
        (program, cmd)
    }

    async fn run(&self, args: &[&str]) -> Result<(), ToolError> {
        let (program, mut cmd) = self.command(args);
        let status = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(ToolError::Exit {
                program,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AudioTool for SoundVolumeView {
    fn name(&self) -> &str {
        "SoundVolumeView"
    }

    async fn query_dump(&self) -> Result<Vec<u8>, ToolError> {
        let (program, mut cmd) = self.command(&["/stab"]);
        let output = cmd
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(ToolError::Exit {
                program,
                status: output.status.to_string(),
            });
        }
        debug!(bytes = output.stdout.len(), "Dump received");
        Ok(output.stdout)
    }

    async fn set_app_default(&self, device_id: &str, process_id: &str) -> Result<(), ToolError> {
        debug!(device_id, process_id, "Setting application default device");
        self.run(&["/SetAppDefault", device_id, "all", process_id]).await
    }

    async fn set_muted(&self, process_id: &str, muted: bool) -> Result<(), ToolError> {
        let verb = if muted { "/Mute" } else { "/Unmute" };
        debug!(process_id, muted, "Setting application mute");
        self.run(&[verb, process_id]).await
    }

    async fn open_volume_settings(&self) -> Result<(), ToolError> {
        Command::new("cmd")
            .args(["/c", "start", VOLUME_SETTINGS_URI])
            .spawn()
            .map(|_| ())
            .map_err(|source| ToolError::Spawn {
                program: "cmd".to_string(),
                source,
            })
    }

    async fn open_tool_window(&self) -> Result<(), ToolError> {
        let program = self.config.path.to_string_lossy().into_owned();
        Command::new(&program)
            .spawn()
            .map(|_| ())
            .map_err(|source| ToolError::Spawn { program, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tool(use_shell: bool) -> SoundVolumeView {
        SoundVolumeView::new(ToolConfig {
            path: PathBuf::from("SoundVolumeView.exe"),
            use_shell,
        })
    }

    #[test]
    fn test_command_line_through_shell() {
        let (program, args) = tool(true).command_line(&["/stab"]);
        assert_eq!(program, "cmd");
        assert_eq!(args, vec!["/c", "SoundVolumeView.exe", "/stab"]);
    }

    #[test]
    fn test_command_line_direct() {
        let (program, args) = tool(false).command_line(&["/SetAppDefault", "DevA", "all", "100"]);
        assert_eq!(program, "SoundVolumeView.exe");
        assert_eq!(args, vec!["/SetAppDefault", "DevA", "all", "100"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let tool = SoundVolumeView::new(ToolConfig {
            path: PathBuf::from("definitely-not-a-real-sound-tool-binary"),
            use_shell: false,
        });
        let result = tool.set_muted("100", true).await;
        assert!(matches!(result, Err(ToolError::Spawn { .. })));
    }
}

/// Scriptable stand-in for the external tool
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub(crate) struct FakeTool {
        /// Bytes returned by the next query; `None` fails the query
        dump: Mutex<Option<Vec<u8>>>,
        fail_commands: Mutex<bool>,
        calls: Mutex<Vec<String>>,
    }

    /// Encode text the way the tool writes it
    pub(crate) fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    impl FakeTool {
        pub(crate) fn with_dump(text: &str) -> Self {
            let tool = Self::default();
            tool.set_dump(text);
            tool
        }

        pub(crate) fn set_dump(&self, text: &str) {
            *self.dump.lock() = Some(utf16le(text));
        }

        pub(crate) fn set_raw_dump(&self, bytes: Option<Vec<u8>>) {
            *self.dump.lock() = bytes;
        }

        pub(crate) fn fail_commands(&self, fail: bool) {
            *self.fail_commands.lock() = fail;
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub(crate) fn queries(&self) -> usize {
            self.calls.lock().iter().filter(|c| *c == "query").count()
        }

        fn record(&self, call: String) -> Result<(), ToolError> {
            self.calls.lock().push(call);
            if *self.fail_commands.lock() {
                return Err(ToolError::Exit {
                    program: "fake".to_string(),
                    status: "exit code: 1".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AudioTool for FakeTool {
        fn name(&self) -> &str {
            "fake"
        }

        async fn query_dump(&self) -> Result<Vec<u8>, ToolError> {
            self.calls.lock().push("query".to_string());
            self.dump.lock().clone().ok_or_else(|| ToolError::Exit {
                program: "fake".to_string(),
                status: "exit code: 1".to_string(),
            })
        }

        async fn set_app_default(&self, device_id: &str, process_id: &str) -> Result<(), ToolError> {
            self.record(format!("switch {} {}", process_id, device_id))
        }

        async fn set_muted(&self, process_id: &str, muted: bool) -> Result<(), ToolError> {
            self.record(format!("mute {} {}", process_id, muted))
        }

        async fn open_volume_settings(&self) -> Result<(), ToolError> {
            self.record("settings".to_string())
        }

        async fn open_tool_window(&self) -> Result<(), ToolError> {
            self.record("window".to_string())
        }
    }
}
