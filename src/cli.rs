use {
    crate::{config, format::Format},
    clap::Parser,
    std::{path::PathBuf, time::Duration},
};

/// Scrape thermostat and sensor readings from the Nest web dashboard.
#[derive(Debug, Parser)]
#[command(name = "nest-scraper", version)]
pub struct Cli {
    /// More output on stderr; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show the web browser being controlled, and don't close it when done
    #[arg(short, long)]
    pub show: bool,

    /// Stop after logging in
    #[arg(short, long)]
    pub login_only: bool,

    /// Output format: csv, csv+hdr or json
    #[arg(short, long, default_value = "csv")]
    pub format: Format,

    /// Seconds to wait for page elements to appear
    #[arg(short, long, default_value_t = 8)]
    pub timeout: u64,

    /// Config file
    #[arg(short, long, default_value = config::DEFAULT_PATH)]
    pub config: PathBuf,

    /// Write a sample config file and exit
    #[arg(long)]
    pub gen_config: bool,
}

impl Cli {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
