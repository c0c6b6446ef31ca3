use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use webttfb::config::load_config;
use webttfb::render::render_table;
use webttfb::{
    AppConfig, LocalProbe, Orchestrator, Probe, RemoteProbe, Report, SortCriterion,
    VantageDirectory,
};

const ABOUT: &str = "\
Time To First Byte (TTFB) is a measurement used as an indication of the
responsiveness of a webserver or other network resource. TTFB measures the
duration from the user or client making an HTTP request to the first byte of the
page being received by the client's browser. This time is made up of the socket
connection time, the time taken to send the HTTP request, and the time taken to
get the first byte of the page.";

const AFTER_HELP: &str = "\
Sorting: status, conn, ttfb, ttl

Abbrs:
  Time is measured in seconds
  Performance is based on TTL
  Conn - Connection Time
  TTFB - Time To First Byte
  TTL  - Total Time";

#[derive(Parser, Debug)]
#[command(
    name = "webttfb",
    version,
    about = "Website TTFB",
    long_about = ABOUT,
    after_help = AFTER_HELP
)]
struct Args {
    /// Domain name to be tested
    #[arg(short, long, default_value = "example.com")]
    domain: String,

    /// Criteria to sort the results
    #[arg(short, long, default_value = "status")]
    sort: SortCriterion,

    /// Hide results from public stats
    #[arg(short, long)]
    private: bool,

    /// Run the test with local resources
    #[arg(short, long)]
    local: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Do not show the progress bar
    #[arg(long)]
    no_progress: bool,

    /// YAML config file, defaults to $CONFIG_FILE or config.yml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let report = if args.local {
        let probe = LocalProbe::new(config.timeout());
        execute(probe, VantageDirectory::local(), &args, &config).await?
    } else {
        let path = config.vantage_file();
        let directory = VantageDirectory::load(&path)
            .with_context(|| format!("cannot load vantage points from {}", path.display()))?;
        let probe = RemoteProbe::new(config.service_url.as_str(), config.timeout())?;
        execute(probe, directory, &args, &config).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_table(&report));
    }

    Ok(())
}

async fn execute<P: Probe>(
    probe: P,
    directory: VantageDirectory,
    args: &Args,
    config: &AppConfig,
) -> anyhow::Result<Report> {
    let orchestrator = Orchestrator::new(probe, args.domain.as_str(), args.private)?;

    let bar = if args.no_progress || args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(directory.len() as u64)
    };
    bar.set_style(ProgressStyle::with_template("Testing {pos:>2}/{len} {spinner}")?);

    let outcome = orchestrator
        .run_with_progress(&directory, |done, _| bar.set_position(done as u64))
        .await?;
    bar.finish_and_clear();

    Ok(Report::build(
        orchestrator.domain(),
        outcome,
        args.sort,
        &config.thresholds,
    ))
}
