//! Audio device: one `mpv --no-video` child per track.
//!
//! Starting a track kills whatever was playing.  Pause is sent over mpv's
//! JSON IPC socket; nothing is read back, playback position stays with mpv.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tracing::{info, warn};

const CYCLE_PAUSE: &[u8] = b"{\"command\":[\"cycle\",\"pause\"]}\n";

pub struct Player {
    binary: Option<PathBuf>,
    volume: u8,
    process: Option<Child>,
}

impl Player {
    pub fn new(binary: Option<PathBuf>, volume: u8) -> Self {
        match &binary {
            Some(path) => info!("player: using {}", path.display()),
            None => warn!("player: mpv not found, playback disabled"),
        }
        Self {
            binary,
            volume: volume.min(100),
            process: None,
        }
    }

    pub async fn play(&mut self, url: &str) -> anyhow::Result<()> {
        self.stop().await;

        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let stderr_path = podcast_core::platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(binary)
            .arg("--no-video")
            .arg("--quiet")
            .arg("--no-terminal")
            .arg(format!("--volume={}", self.volume))
            .arg(ipc_arg())
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("player: spawned pid {:?} for {}", child.id(), url);
        self.process = Some(child);
        Ok(())
    }

    /// Kill the process if running.
    pub async fn stop(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut().map(|p| p.try_wait()) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                info!("player: exited with {}", status);
                self.process = None;
                false
            }
            Some(Err(e)) => {
                warn!("player: liveness check failed: {}", e);
                false
            }
            None => false,
        }
    }

    pub async fn toggle_pause(&mut self) -> anyhow::Result<()> {
        if !self.is_running() {
            anyhow::bail!("nothing playing");
        }
        send_ipc(CYCLE_PAUSE).await
    }
}

#[cfg(unix)]
fn ipc_arg() -> String {
    format!(
        "--input-ipc-server={}",
        podcast_core::platform::player_socket_path().display()
    )
}

#[cfg(windows)]
const PIPE_NAME: &str = r"\\.\pipe\podcasts-mpv";

#[cfg(windows)]
fn ipc_arg() -> String {
    format!("--input-ipc-server={}", PIPE_NAME)
}

#[cfg(unix)]
async fn send_ipc(payload: &[u8]) -> anyhow::Result<()> {
    let socket = podcast_core::platform::player_socket_path();
    let mut stream = tokio::net::UnixStream::connect(&socket).await?;
    stream.write_all(payload).await?;
    Ok(())
}

#[cfg(windows)]
async fn send_ipc(payload: &[u8]) -> anyhow::Result<()> {
    let mut pipe = tokio::net::windows::named_pipe::ClientOptions::new().open(PIPE_NAME)?;
    pipe.write_all(payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn play_without_binary_fails() {
        let mut player = Player::new(None, 70);
        assert!(player.play("https://cdn.example/a.mp3").await.is_err());
        assert!(!player.is_running());
    }

    #[tokio::test]
    async fn pause_without_process_fails() {
        let mut player = Player::new(None, 70);
        assert!(player.toggle_pause().await.is_err());
    }

    #[test]
    fn volume_is_capped() {
        let player = Player::new(None, 250);
        assert_eq!(player.volume, 100);
    }
}
