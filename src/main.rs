use clap::builder::FalseyValueParser;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use color_eyre::Result;
use env_logger::Env;
use log::{error, info};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use reachcheck::config_loader::{dump_topology, load_topology, read_topology_or_default};
use reachcheck::driver::{DriverConfig, VerificationDriver};
use reachcheck::executor::{ExecutorConfig, MockSet, ReachabilityExecutor};
use reachcheck::resolver::ResolveOptions;
use reachcheck::topology::Topology;
use reachcheck::utils::parse_timeout;

/// Exit status when at least one check failed or the location is unknown
const EXIT_FAILURE: u8 = 2;

/// Exit status for usage errors
const EXIT_USAGE: u8 = 1;

/// Verify that a role can reach every endpoint its topology requires
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Role identity: browser, worker, or a ccm/cco/rabbit node name
    location: String,

    /// Read the topology from this YAML file instead of stdin
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Log successful probes and the final verdict
    #[arg(
        short,
        long,
        env = "VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    verbose: bool,

    /// Write the loaded topology back to stdout as YAML
    #[arg(
        long,
        env = "DUMP",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    dump: bool,

    /// Comma-separated host:port addresses to treat as reachable
    #[arg(long, env = "MOCK", value_delimiter = ',')]
    mock: Vec<String>,

    /// Per-connection timeout (e.g. 3s, 500ms)
    #[arg(long, env = "TIMEOUT", default_value = "3s", value_parser = parse_timeout)]
    timeout: Duration,

    /// Concurrent probes (1 = sequential, 0 = one per destination host)
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Omit checks from a node to its own listed host
    #[arg(long)]
    skip_self: bool,

    /// Print the resolved checks and exit without connecting
    #[arg(long)]
    plan: bool,

    /// Print the verification report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn parse_args() -> std::result::Result<Args, ExitCode> {
    Args::try_parse().map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            _ => ExitCode::from(EXIT_USAGE),
        }
    })
}

fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    let mock: MockSet = args.mock.iter().collect();
    info!(
        "version {} VERBOSE={} DUMP={} MOCK={:?} timeout={:?} jobs={}",
        env!("CARGO_PKG_VERSION"),
        args.verbose,
        args.dump,
        args.mock,
        args.timeout,
        args.jobs
    );

    let topology = match &args.topology {
        Some(path) => match load_topology(path) {
            Ok(topology) => topology,
            Err(e) => {
                error!("{:#}", e);
                return Ok(ExitCode::from(EXIT_USAGE));
            }
        },
        None => read_topology_or_default(io::stdin().lock()),
    };

    let executor = ReachabilityExecutor::new(ExecutorConfig {
        timeout: args.timeout,
        verbose: args.verbose,
        mock,
    });
    let driver = VerificationDriver::new(
        executor,
        DriverConfig {
            resolve: ResolveOptions {
                include_self: !args.skip_self,
            },
            jobs: args.jobs,
        },
    );

    if args.plan {
        return print_plan(&driver, &args.location, &topology);
    }

    let report = driver.verify(&args.location, &topology);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.dump {
        dump_topology(&topology, &mut out)?;
    }
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    }
    out.flush()?;

    if !report.passed() {
        error!("FAILURE");
        return Ok(ExitCode::from(EXIT_FAILURE));
    }
    if args.verbose {
        info!("SUCCESS");
    }
    Ok(ExitCode::SUCCESS)
}

fn print_plan(
    driver: &VerificationDriver,
    location: &str,
    topology: &Topology,
) -> Result<ExitCode> {
    match driver.plan(location, topology) {
        Ok(checks) => {
            let mut out = BufWriter::new(io::stdout().lock());
            for check in &checks {
                writeln!(out, "{}\t{}", check.label, check.address())?;
            }
            out.flush()?;
            info!("{}: {} checks planned", location, checks.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
    }
}
