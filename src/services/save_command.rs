//! Save control backed by an external shell command

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::agent::SaveControl;

/// Runs a configured command each time the save control is activated,
/// e.g. a key-press injector aimed at the editor window
#[derive(Debug, Clone)]
pub struct CommandSaveControl {
    command: String,
}

impl CommandSaveControl {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl SaveControl for CommandSaveControl {
    /// Spawn the command and report its exit in the background
    fn activate(&self) -> bool {
        debug!("Attempting to run save command: {}", self.command);

        let child = Command::new("sh").arg("-c").arg(&self.command).spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to execute save command: {}", e);
                return false;
            }
        };

        let command = self.command.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("Save command completed"),
                Ok(status) => warn!(
                    "Save command `{}` failed (exit code: {})",
                    command,
                    status.code().unwrap_or(-1)
                ),
                Err(e) => warn!("Failed to wait for save command: {}", e),
            }
        });

        true
    }
}

/// Check that a shell is available to run save commands
pub async fn check_shell_available() -> Result<(), String> {
    Command::new("sh")
        .args(["-c", "true"])
        .output()
        .await
        .map_err(|_| "sh is not available. Save commands require a POSIX shell.".to_string())?;

    info!("sh is available");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn activation_spawns_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("saved");
        let control = CommandSaveControl::new(format!("touch {}", marker.display()));

        assert!(control.activate());

        for _ in 0..50 {
            if marker.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn shell_is_available() {
        assert!(check_shell_available().await.is_ok());
    }
}
