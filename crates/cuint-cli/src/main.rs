//! cuint CLI - bind C headers and run native tests in isolation.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "cuint")]
#[command(about = "Convention-driven C bindings and crash-isolated native tests", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the types and functions a header binds to
    Bind {
        /// Header to preprocess and collect
        header: PathBuf,

        /// Extra include directories
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build `X.c` into the shared object `X.so`
    Compile {
        /// C source file
        source: PathBuf,

        /// Extra compiler flags, added after the configured ones
        #[arg(long = "cflag", allow_hyphen_values = true)]
        cflags: Vec<String>,

        /// Extra link inputs, added after the configured ones
        #[arg(long = "ldadd", allow_hyphen_values = true)]
        ldadd: Vec<String>,
    },

    /// Run every test of a test binary in its own process
    Test {
        /// Test binary built by `cargo test --no-run`
        binary: PathBuf,

        /// Only run tests whose name contains this pattern
        pattern: Option<String>,

        /// Stop after the first failure or crash
        #[arg(long)]
        bail: bool,

        /// Per-test timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format: default, json
        #[arg(long, default_value = "default")]
        reporter: String,
    },

    /// Print the backtrace of the last crash against a shared object
    Bt {
        /// Shared object the crash happened in
        artifact: PathBuf,

        /// Directory searched for a `core` file and used for unpacking
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Bind {
            header,
            include,
            json,
        } => commands::bind::execute(commands::bind::BindArgs {
            header,
            include,
            json,
            color: cli.color,
        }),

        Commands::Compile {
            source,
            cflags,
            ldadd,
        } => commands::compile::execute(commands::compile::CompileArgs {
            source,
            cflags,
            ldadd,
            color: cli.color,
        }),

        Commands::Test {
            binary,
            pattern,
            bail,
            timeout,
            reporter,
        } => commands::test::execute(commands::test::TestArgs {
            binary,
            filter: pattern,
            bail,
            timeout,
            reporter,
            color: cli.color,
        }),

        Commands::Bt { artifact, workdir } => {
            commands::bt::execute(commands::bt::BtArgs { artifact, workdir })
        }
    }
}
