use {clap::Parser, nest_scraper::Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = nest_scraper::run(cli).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
