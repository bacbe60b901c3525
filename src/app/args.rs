use std::path::PathBuf;

use clap::Parser;

use crate::console::poller::DEFAULT_POLL_INTERVAL;

#[derive(Parser, Debug, Clone)]
#[command(name = "logai-console")]
#[command(about = "Terminal console for a log analysis backend")]
pub struct AppArgs {
    #[arg(long, help = "Backend base URL (or set LOGAI_API_URL)")]
    pub api_url: Option<String>,

    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        help = "Seconds between log feed refreshes (minimum 1)"
    )]
    pub poll_interval_secs: u64,

    #[arg(
        long,
        default_value = "visualizations",
        help = "Directory analysis images are written to"
    )]
    pub export_dir: PathBuf,

    #[arg(long, help = "Also write diagnostics to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        default_value = "info",
        help = "Diagnostics filter, e.g. `debug` or `info,logai_console=trace`"
    )]
    pub log_level: String,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
