//! `hal-gen` command line.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use halgen::base::constants::BUILD_TOP_ENV;
use halgen::codegen::FormatRegistry;
use halgen::driver::{Driver, DriverOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hal-gen", version, about = "Compiler for .hal interface definitions")]
struct Cli {
    /// Output directory or file, depending on the format
    #[arg(short = 'o', value_name = "OUTPUT_PATH")]
    output: Option<PathBuf>,

    /// Root of the source tree that package roots are relative to
    #[arg(short = 'p', value_name = "ROOT_PATH", env = BUILD_TOP_ENV)]
    root: Option<PathBuf>,

    /// Package root, as <package>:<path>; repeatable
    #[arg(short = 'r', value_name = "PACKAGE:PATH")]
    package_roots: Vec<String>,

    /// Output format
    #[arg(short = 'L', value_name = "FORMAT")]
    format: String,

    /// Generate build files for tests (only with -Landroidbp)
    #[arg(short = 't')]
    for_test: bool,

    /// Reject bare names that more than one import declares
    #[arg(long)]
    strict_imports: bool,

    /// Packages (pkg@M.m) or files (pkg@M.m::Name)
    #[arg(required = true, value_name = "FQNAME")]
    targets: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let command = Cli::command().after_help(format!(
        "Formats (-L):\n{}",
        FormatRegistry::new().usage_table()
    ));
    let cli = match command
        .try_get_matches()
        .and_then(|matches| Cli::from_arg_matches(&matches))
    {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage text counts as a usage error; only --version succeeds.
            return match err.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.format.clone();
    let options = DriverOptions {
        format: cli.format,
        output_path: cli.output,
        root_path: cli.root,
        package_roots: cli.package_roots,
        for_test: cli.for_test,
        strict_imports: cli.strict_imports,
        targets: cli.targets,
    };
    let mut driver = Driver::new(options).context("invalid invocation")?;

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    driver
        .run(&mut stdout)
        .with_context(|| format!("-L{format} failed"))?;
    stdout.flush().context("could not flush standard output")?;
    Ok(())
}
