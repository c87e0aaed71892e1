use std::path::PathBuf;
use anyhow::bail;
use clap::{Parser, Subcommand};

mod alias;
mod bucket;
mod candidate;
mod correlate;
mod criteria;
mod execute;
mod find;
mod partition;
mod report;
mod scan;
mod util;

use correlate::ColorMode;
use util::parse_byte_count;

#[derive(Debug, Parser)]
#[clap(name = "dupefind", version, about = "Finds files with identical contents", propagate_version = true)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find groups of files with identical contents
    Find(FindArgs),
    /// Compare two directory trees by content
    Correlate(CorrelateArgs),
}

#[derive(Debug, clap::Args)]
struct FindArgs {
    /// Files or directories to scan
    #[clap(parse(from_os_str), value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Recurse into directories
    #[clap(short, long)]
    recurse: bool,

    /// Follow symlinks
    #[clap(short, long)]
    symlinks: bool,

    /// Include zero-length files (same as --min-size 0)
    #[clap(short, long)]
    zero: bool,

    /// Fold hardlinked copies into one entry with several names
    #[clap(short, long)]
    aliases: bool,

    /// Drop groups whose members all come from the same argument
    #[clap(long)]
    only_mixed_roots: bool,

    /// Smallest file size to consider
    #[clap(long, value_name = "BYTES", default_value = "1", parse(try_from_str = parse_byte_count))]
    min_size: u64,

    /// Largest per-file read buffer
    #[clap(long, value_name = "BYTES", default_value = "1M", parse(try_from_str = parse_byte_count))]
    max_buffer: u64,

    /// Memory budget for comparing one group
    #[clap(long, value_name = "BYTES", default_value = "64M", parse(try_from_str = parse_byte_count))]
    max_memory: u64,

    /// Skip files and directories with this exact name (can be repeated)
    #[clap(short = 'x', long, value_name = "NAME")]
    exclude: Vec<String>,

    /// Mark preferred group members by these criteria
    #[clap(short, long, value_name = "CRITERIA")]
    prefer: Option<String>,

    /// Explain the criteria language and exit
    #[clap(long)]
    prefer_help: bool,

    /// Delete the non-preferred files listed in REPORT
    #[clap(long, value_name = "REPORT", parse(from_os_str), conflicts_with = "coalesce")]
    execute: Option<PathBuf>,

    /// Replace the non-preferred files listed in REPORT with hard links
    #[clap(long, value_name = "REPORT", parse(from_os_str))]
    coalesce: Option<PathBuf>,

    /// Print destructive actions instead of performing them
    #[clap(short = 'n', long)]
    dry_run: bool,

    /// Set verbosity of the output (can be used multiple times)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u32,
}

#[derive(Debug, clap::Args)]
struct CorrelateArgs {
    /// The tree taken as the old state
    #[clap(parse(from_os_str), value_name = "LEFT")]
    left: PathBuf,

    /// The tree taken as the new state
    #[clap(parse(from_os_str), value_name = "RIGHT")]
    right: PathBuf,

    /// Do not list files present in both trees
    #[clap(long)]
    no_matches: bool,

    /// Do not list files only present in LEFT
    #[clap(long)]
    no_removes: bool,

    /// Do not list files only present in RIGHT
    #[clap(long)]
    no_adds: bool,

    /// Colorize the listing
    #[clap(long, arg_enum, default_value = "auto", value_name = "WHEN")]
    color: ColorMode,

    /// Do not print the closing summary
    #[clap(long)]
    no_summary: bool,

    /// Largest per-file read buffer
    #[clap(long, value_name = "BYTES", default_value = "1M", parse(try_from_str = parse_byte_count))]
    max_buffer: u64,

    /// Memory budget for comparing one group
    #[clap(long, value_name = "BYTES", default_value = "64M", parse(try_from_str = parse_byte_count))]
    max_memory: u64,

    /// Set verbosity of the output (can be used multiple times)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u32,
}


fn main()
{
    let args = Args::parse();

    let verbosity = match &args.command {
        Command::Find(a) => a.verbose,
        Command::Correlate(a) => a.verbose,
    };
    init_logging(verbosity);

    let status = match args.command {
        Command::Find(a) => run_find(a),
        Command::Correlate(a) => run_correlate(a),
    };

    if let Err(e) = status {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}


fn init_logging(verbosity: u32)
{
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG still wins when set explicitly.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}


fn run_find(args: FindArgs) -> anyhow::Result<()>
{
    if args.prefer_help {
        print!("{}", criteria::HELP);
        return Ok(());
    }

    if let Some(report) = &args.execute {
        return execute::run(report, execute::Action::Delete, args.dry_run);
    }
    if let Some(report) = &args.coalesce {
        return execute::run(report, execute::Action::Coalesce, args.dry_run);
    }

    if args.paths.is_empty() {
        bail!("no paths to scan");
    }

    let cfg = FindConfig {
        roots: args.paths,
        recurse: args.recurse,
        symlinks: args.symlinks,
        aliases: args.aliases,
        only_mixed_roots: args.only_mixed_roots,
        min_size: if args.zero { 0 } else { args.min_size },
        max_buffer: args.max_buffer,
        max_memory: args.max_memory,
        exclude: args.exclude,
        prefer: args.prefer,
        argv: std::env::args().skip(1).collect(),
    };

    let stdout = std::io::stdout();
    find::run(&cfg, &mut stdout.lock())
}


fn run_correlate(args: CorrelateArgs) -> anyhow::Result<()>
{
    let cfg = CorrelateConfig {
        left: args.left,
        right: args.right,
        matches: !args.no_matches,
        removes: !args.no_removes,
        adds: !args.no_adds,
        color: args.color,
        summary: !args.no_summary,
        max_buffer: args.max_buffer,
        max_memory: args.max_memory,
    };

    let stdout = std::io::stdout();
    correlate::run(&cfg, &mut stdout.lock())
}


/// Contains configuration options for the find command.
#[derive(Debug)]
pub struct FindConfig {
    pub roots: Vec<PathBuf>,
    pub recurse: bool,
    pub symlinks: bool,
    pub aliases: bool,
    pub only_mixed_roots: bool,
    pub min_size: u64,
    pub max_buffer: u64,
    pub max_memory: u64,
    pub exclude: Vec<String>,
    pub prefer: Option<String>,
    /// Arguments echoed into the report's provenance header.
    pub argv: Vec<String>,
}


/// Contains configuration options for the correlate command.
#[derive(Debug)]
pub struct CorrelateConfig {
    pub left: PathBuf,
    pub right: PathBuf,
    pub matches: bool,
    pub removes: bool,
    pub adds: bool,
    pub color: ColorMode,
    pub summary: bool,
    pub max_buffer: u64,
    pub max_memory: u64,
}
