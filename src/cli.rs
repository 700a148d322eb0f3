//! Command-line options shared by the binaries.
use crate::art::Bounds;
use crate::config::{self, Config};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// MPD host
    #[arg(long, default_value = config::DEFAULT_HOST)]
    pub host: String,

    /// MPD port
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    pub port: u16,

    /// MPD password
    #[arg(long, env = "MPD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read/write timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Verbosity
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct LibraryArgs {
    /// MPD config file to read music_directory from
    #[arg(long, default_value = config::DEFAULT_MPD_CONF)]
    pub mpd_conf: PathBuf,

    /// Music directory, instead of reading it from the MPD config
    #[arg(short = 'd', long)]
    pub music_dir: Option<PathBuf>,

    /// Maximum thumbnail width
    #[arg(long, default_value_t = config::DEFAULT_THUMBNAIL_SIZE)]
    pub width: u32,

    /// Maximum thumbnail height
    #[arg(long, default_value_t = config::DEFAULT_THUMBNAIL_SIZE)]
    pub height: u32,

    /// Largest sticker value sent to MPD, in bytes
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Threads used to extract art
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

impl ConnectionArgs {
    pub fn into_config(self, library: Option<LibraryArgs>) -> Config {
        let ConnectionArgs {
            host,
            port,
            password,
            timeout,
            verbose: _,
        } = self;

        let mut config = Config {
            host,
            port,
            password,
            timeout: Duration::from_secs(timeout),
            ..Config::default()
        };

        if let Some(LibraryArgs {
            mpd_conf,
            music_dir,
            width,
            height,
            chunk_size,
            jobs,
        }) = library
        {
            config.mpd_conf = mpd_conf;
            config.music_dir = music_dir;
            config.thumbnail = Bounds { width, height };
            config.chunk_size = chunk_size;
            config.jobs = jobs;
        }

        config
    }
}

pub fn init_logging(verbose: bool) {
    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();
}
