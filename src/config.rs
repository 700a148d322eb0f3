use crate::art::Bounds;
use crate::mpd;
use anyhow::{ensure, Context, Result};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6600;
pub const DEFAULT_MPD_CONF: &str = "~/.mpdconf";
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 512;
/// Largest sticker value MPD reliably accepts in one command.
pub const DEFAULT_CHUNK_SIZE: usize = 6144;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// MPD configuration file to take `music_directory` from.
    pub mpd_conf: PathBuf,
    /// Skips the `mpd_conf` lookup when set.
    pub music_dir: Option<PathBuf>,
    pub thumbnail: Bounds,
    pub chunk_size: usize,
    pub timeout: Duration,
    /// Threads used to extract art. Sticker writes stay on one connection.
    pub jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            mpd_conf: PathBuf::from(DEFAULT_MPD_CONF),
            music_dir: None,
            thumbnail: Bounds {
                width: DEFAULT_THUMBNAIL_SIZE,
                height: DEFAULT_THUMBNAIL_SIZE,
            },
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            jobs: 1,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.chunk_size > 0, "chunk size must be positive");
        ensure!(
            self.thumbnail.width > 0 && self.thumbnail.height > 0,
            "thumbnail size must be positive"
        );
        ensure!(self.jobs > 0, "need at least one job");
        ensure!(!self.timeout.is_zero(), "timeout must be positive");
        Ok(())
    }

    /// Directory that song paths reported by MPD are relative to.
    pub fn library_root(&self) -> Result<PathBuf> {
        match &self.music_dir {
            Some(dir) => expand_home(dir),
            None => read_music_directory(&expand_home(&self.mpd_conf)?),
        }
    }

    /// Opens the daemon connection and authenticates if a password is set.
    pub fn connect(&self) -> Result<mpd::Client> {
        let mut client = mpd::Client::connect(&self.host, self.port, self.timeout)
            .with_context(|| format!("couldn't connect to MPD at {}:{}", self.host, self.port))?;
        info!("connected to MPD {} at {}:{}", client.version(), self.host, self.port);

        if let Some(password) = &self.password {
            client.password(password).context("MPD rejected the password")?;
        }

        Ok(client)
    }
}

/// Replaces a leading `~` component with the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().context("couldn't determine home directory")?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// First `music_directory "<path>"` setting in an MPD configuration file.
pub fn find_music_directory(conf: &str) -> Option<&str> {
    static REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?m)^\s*music_directory\s+"(\S+)"\s*$"#).unwrap());

    REGEX
        .captures(conf)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn read_music_directory(conf_path: &Path) -> Result<PathBuf> {
    let conf = read_to_string(conf_path)
        .with_context(|| format!("couldn't read MPD config {:?}", conf_path))?;
    let dir = find_music_directory(&conf)
        .with_context(|| format!("no music_directory in {:?}", conf_path))?;
    expand_home(Path::new(dir))
}
