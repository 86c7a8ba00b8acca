use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/podcasts/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("podcasts")
    }
    #[cfg(windows)]
    {
        // Portable install: a data directory beside the executable wins
        if let Some(dir) = beside_exe("data") {
            return dir;
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podcasts")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Some(exe_dir) = beside_exe("config.toml").and_then(|p| p.parent().map(PathBuf::from)) {
            return exe_dir;
        }
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("podcasts")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podcasts")
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// IPC socket the audio player listens on for pause commands.
pub fn player_socket_path() -> PathBuf {
    temp_dir().join("podcasts-mpv.sock")
}

#[cfg(windows)]
fn beside_exe(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(name);
    candidate.exists().then_some(candidate)
}

#[cfg(unix)]
fn player_binary_names() -> &'static [&'static str] {
    &["mpv"]
}

#[cfg(windows)]
fn player_binary_names() -> &'static [&'static str] {
    &["mpv.exe", "mpv"]
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find the mpv binary used as the audio device.
/// Checks the configured override, then beside the current exe, then PATH.
pub fn find_player_binary(configured: Option<&std::path::Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            for name in player_binary_names() {
                let local = dir.join(name);
                if local.exists() {
                    return Some(local);
                }
            }
        }
    }

    find_on_path(player_binary_names())
}
