use {
    anyhow::{Context, Result},
    browser::{Browser, LaunchOptions},
    chrono::Local,
    log::{debug, info, LevelFilter},
    scraper::{Credentials, NestScraper},
    sensors::{Parsed, SensorSource},
    std::{env, path::PathBuf},
};

pub mod browser;
pub mod cli;
pub mod config;
pub mod format;
pub mod scraper;
pub mod sensors;

pub use {cli::Cli, config::Config, format::Format};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);
    color_backtrace::install();

    if cli.gen_config {
        config::generate(&cli.config).context("Generating config failed")?;
        info!("wrote sample config to {}", cli.config.display());
        return Ok(());
    }

    let conf = Config::load(&cli.config).context("Loading config failed")?;

    let opts = LaunchOptions {
        browser_path: conf.browser_path.clone(),
        profile_dir: PathBuf::from(&conf.browser_profile_dir),
        show: cli.show,
    };
    let mut browser = Browser::launch(&opts)
        .await
        .context("Starting browser failed")?;

    let output = scrape(&mut browser, &cli, &conf).await;
    browser.shutdown().await;

    if let Some(text) = output? {
        print!("{}", text);
    }
    Ok(())
}

/// Logs in and, unless only a login was asked for, returns the formatted
/// readings.
async fn scrape(browser: &mut Browser, cli: &Cli, conf: &Config) -> Result<Option<String>> {
    let page = browser
        .open_page()
        .await
        .context("Connecting to browser failed")?;

    let credentials = Credentials {
        login: conf.login.clone(),
        password: conf.password.clone(),
    };
    let mut scraper = NestScraper::new(page, credentials, cli.wait_timeout());

    scraper.login().await.context("Login failed")?;
    if cli.login_only {
        return Ok(None);
    }

    let parsed = read_measurements(&mut scraper)
        .await
        .context("Reading thermostat failed")?;

    let text = cli
        .format
        .render(&parsed.measurements, &Local::now())
        .context("Formatting output failed")?;
    Ok(Some(text))
}

/// Pulls the sensor text from `source` and sorts it into measurements.
pub async fn read_measurements<S>(source: &mut S) -> Result<Parsed>
where
    S: SensorSource + ?Sized,
{
    let text = source.sensor_text().await?;
    debug!("raw sensor text: {:?}", text);

    let parsed = sensors::parse(&text);
    info!(
        "read {} measurements ({} tokens dropped)",
        parsed.measurements.len(),
        parsed.warnings.len()
    );
    Ok(parsed)
}

/// `RUST_LOG` wins when set; otherwise each `-v` raises the level one step
/// from `warn`.
fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    match env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(level_for(verbose));
        }
    }

    let _ = builder.try_init();
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
