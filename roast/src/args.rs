use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Debug, Parser)]
#[clap(name = "roast", about = "Live sampling profiler with a call tree view")]
#[clap(group(ArgGroup::new("target").required(true).args(["pid", "replay"])))]
pub struct Opt {
    /// Pid of the process to sample
    #[clap(short, long)]
    pub pid: Option<i32>,
    /// Replay snapshots from a JSON file instead of sampling a process
    #[clap(long)]
    pub replay: Option<PathBuf>,
    /// Sampling interval in milliseconds
    #[clap(short, long)]
    pub interval: Option<u64>,
    /// Stop sampling after this many seconds
    #[clap(short, long)]
    pub timeout: Option<u64>,
    /// Only record the thread with exactly this name
    #[clap(long)]
    pub thread: Option<String>,
    /// Directory containing joined.srg and methods.csv
    #[clap(short, long)]
    pub mappings: Option<PathBuf>,
    /// Address to serve the view on
    #[clap(short, long)]
    pub bind: Option<String>,
    /// Port to serve the view on
    #[clap(long)]
    pub port: Option<u16>,
    /// Path to a Roast.toml
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Print the call tree to stdout once sampling stops
    #[clap(long)]
    pub dump: bool,
    /// Exit once sampling stops instead of serving until Ctrl-C
    #[clap(long)]
    pub exit_on_stop: bool,
    #[clap(long, default_value = "info")]
    pub log_level: tracing::Level,
}
