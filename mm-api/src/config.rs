//! Command-line arguments and their merge with the TOML configuration

use std::path::PathBuf;

use clap::Parser;
use mm_common::config::TomlConfig;

/// Command-line arguments for mm-api
#[derive(Parser, Debug, Default)]
#[command(name = "mm-api")]
#[command(about = "Media metadata upload and conversion service")]
#[command(version)]
pub struct Args {
    /// Configuration file
    #[arg(short, long, env = "MM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "MM_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MM_PORT")]
    pub port: Option<u16>,

    /// ffprobe executable
    #[arg(long = "ffprobe", env = "FFPROBE_PATH")]
    pub ffprobe_path: Option<PathBuf>,

    /// AVB dumper executable
    #[arg(long = "avb-dump", env = "MM_AVB_DUMP_PATH")]
    pub avb_dump_path: Option<PathBuf>,
}

impl Args {
    /// Overlay arguments on a loaded configuration
    pub fn apply(self, mut config: TomlConfig) -> TomlConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.ffprobe_path.is_some() {
            config.ffprobe_path = self.ffprobe_path;
        }
        if self.avb_dump_path.is_some() {
            config.avb_dump_path = self.avb_dump_path;
        }
        config
    }
}
