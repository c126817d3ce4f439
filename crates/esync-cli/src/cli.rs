use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "etcd-sync",
    about = "Synchronize a local directory tree with an etcd key prefix",
    version
)]
#[command(group(
    ArgGroup::new("direction")
        .required(true)
        .args(["to_etcd", "to_files"]),
))]
pub struct Cli {
    /// etcd location, e.g. http://127.0.0.1:2379/config/app
    #[arg(value_parser = parse_etcd_url)]
    pub etcd_url: String,

    /// Local directory mirrored to or from etcd
    pub local_path: PathBuf,

    /// Make etcd match the local directory
    #[arg(long)]
    pub to_etcd: bool,

    /// Make the local directory match etcd
    #[arg(long)]
    pub to_files: bool,

    /// Apply the operations instead of only listing them
    #[arg(long)]
    pub apply: bool,

    /// Maximum number of value characters shown per SET in the preview
    #[arg(long)]
    pub max_value_len: Option<usize>,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which side is made to match the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// etcd is the base, the local directory is the target.
    ToEtcd,
    /// The local directory is the base, etcd is the target.
    ToFiles,
}

impl Cli {
    pub fn direction(&self) -> Direction {
        if self.to_etcd {
            Direction::ToEtcd
        } else {
            Direction::ToFiles
        }
    }
}

fn parse_etcd_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| format!("not a URL: {e}"))?;
    if url.host_str().is_none() {
        return Err("URL must include a host".into());
    }
    Ok(raw.to_owned())
}
