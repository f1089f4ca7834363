//! shadowblock CLI
//!
//! Builds a minimal dnsmasq servers file from a hosts blocklist and personal
//! block/allow lists, and audits existing servers files.

mod logging;
mod output;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use sb_compiler::pipeline::{compile, CompileOptions, Inputs, DEFAULT_CHANNEL_CAPACITY};
use sb_compiler::{check_servers_file, load_hosts_file, load_optional_list, ListKind};

use crate::logging::LogFormat;
use crate::report::RunReport;

#[derive(Parser)]
#[command(name = "shadowblock")]
#[command(version, about = "Minimal dnsmasq blocklists from hosts files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format for logs
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the servers file
    Build(BuildArgs),

    /// Audit an existing servers file
    Check {
        /// Servers file to inspect
        #[arg(short, long, env = "SHADOWBLOCK_OUTPUT", default_value = "/etc/servers-blacklist")]
        input: PathBuf,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Hosts-format blocklist (required)
    #[arg(short, long, env = "SHADOWBLOCK_DOMAINS", default_value = "/etc/hosts-blacklist")]
    domains: PathBuf,

    /// Personal block list, one domain per line (optional)
    #[arg(short, long, env = "SHADOWBLOCK_BLOCKLIST", default_value = "/tmp/my_blacklist")]
    blocklist: PathBuf,

    /// Personal allow list, one domain per line (optional)
    #[arg(short, long, env = "SHADOWBLOCK_ALLOWLIST", default_value = "/tmp/my_whitelist")]
    allowlist: PathBuf,

    /// Servers file to write
    #[arg(short, long, env = "SHADOWBLOCK_OUTPUT", default_value = "/etc/servers-blacklist")]
    output: PathBuf,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long, env = "SHADOWBLOCK_THREADS", default_value_t = 0)]
    threads: usize,

    /// Capacity of the channel feeding the result collector
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE")]
    stats: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let result = logging::init(cli.log_format, cli.verbose, cli.quiet).and_then(|()| match cli.command {
        Commands::Build(args) => cmd_build(&args),
        Commands::Check { input } => cmd_check(&input),
    });

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let start = Instant::now();

    tracing::info!("Reading domains from '{}'", args.domains.display());
    let inputs = Inputs {
        domains: load_hosts_file(&args.domains).context("Could not read domains")?,
        block_list: load_optional_list(&args.blocklist, ListKind::Block)
            .context("Error while reading block list")?,
        allow_list: load_optional_list(&args.allowlist, ListKind::Allow)
            .context("Error while reading allow list")?,
    };
    let load_time = start.elapsed();

    let options = CompileOptions {
        threads: args.threads,
        channel_capacity: args.channel_capacity,
    };
    let compiled = compile(inputs, &options).context("Compilation failed")?;

    let written = output::write_output(&args.output, &compiled.output)?;

    let report = RunReport::from(&compiled.stats);
    println!("Wrote {} directives to '{}'", written, args.output.display());
    println!("  Load:       {:.1}ms", load_time.as_secs_f64() * 1000.0);
    report.print();

    if let Some(path) = &args.stats {
        report.write_json(path)?;
    }

    tracing::info!("Finished in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}

fn cmd_check(input: &Path) -> Result<()> {
    let text = output::read_output(input)?;
    let report = check_servers_file(&text).with_context(|| format!("Invalid servers file '{}'", input.display()))?;

    println!("Servers file '{}'", input.display());
    println!("  Block:      {}", report.blocks);
    println!("  Unblock:    {}", report.unblocks);
    println!("  Duplicates: {}", report.duplicates);
    println!("  Shadowed:   {}", report.shadowed.len());

    for domain in report.shadowed.iter().take(10) {
        println!("    {}", domain);
    }
    for domain in &report.stray_unblocks {
        tracing::warn!("Unblock directive without a blocked ancestor: {}", domain);
    }

    if !report.is_minimal() {
        bail!(
            "'{}' is not minimal: {} shadowed, {} duplicate directives",
            input.display(),
            report.shadowed.len(),
            report.duplicates
        );
    }
    Ok(())
}
