use std::{panic, path::PathBuf, process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use codetest::{
    collection::{load_collection, load_report, write_report},
    config::{CppToolchain, Limits, Settings},
    constants::{
        DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_COMPILER, DEFAULT_FORMAT_TIMEOUT_SECS,
        DEFAULT_FORMATTER, DEFAULT_RUN_TIMEOUT_SECS,
    },
    core::{
        errors::AppError,
        pipeline::{checking::Autotest, formatting::check_formatting},
    },
    native::native_testers,
    report::markdown,
};

#[derive(Parser, Debug)]
#[command(version, about = "Compile, run and format-check collections of source files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check-compile sources and run tests, writing a JSON report
    Check(CheckArgs),
    /// Verify, or apply with --inplace, canonical formatting
    Format(FormatArgs),
    /// Render a JSON report as markdown on standard output
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Base directory for declared paths; defaults to the collection's base_path
    #[arg(long)]
    basedir: Option<PathBuf>,
    #[arg(long)]
    collection_path: PathBuf,
    /// Scratch directory for build artifacts; a temporary one is used if absent
    #[arg(long)]
    tempdir: Option<PathBuf>,
    #[arg(long)]
    output_result_path: PathBuf,
    #[command(flatten)]
    toolchain: ToolchainArgs,
}

#[derive(Args, Debug)]
struct FormatArgs {
    #[arg(long)]
    basedir: Option<PathBuf>,
    #[arg(long)]
    collection_path: PathBuf,
    /// Rewrite files instead of only checking them
    #[arg(long)]
    inplace: bool,
    #[command(flatten)]
    toolchain: ToolchainArgs,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    result_path: PathBuf,
    /// Exit non-zero if any check failed
    #[arg(long)]
    check_test_fail: bool,
}

#[derive(Args, Debug)]
struct ToolchainArgs {
    #[arg(long, env = "CXX", default_value = DEFAULT_COMPILER)]
    cxx: String,
    #[arg(long, env = "CLANG_FORMAT", default_value = DEFAULT_FORMATTER)]
    clang_format: String,
    #[arg(long, default_value_t = DEFAULT_BUILD_TIMEOUT_SECS)]
    build_timeout_secs: u64,
    #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT_SECS)]
    run_timeout_secs: u64,
    #[arg(long, default_value_t = DEFAULT_FORMAT_TIMEOUT_SECS)]
    format_timeout_secs: u64,
    /// Invoke the compiler directly instead of through `bash -l`
    #[arg(long)]
    no_login_shell: bool,
}

impl ToolchainArgs {
    fn settings(&self, basedir: PathBuf) -> Settings {
        Settings {
            basedir,
            limits: Limits {
                build_timeout: Duration::from_secs(self.build_timeout_secs),
                run_timeout: Duration::from_secs(self.run_timeout_secs),
                format_timeout: Duration::from_secs(self.format_timeout_secs),
            },
            cpp: CppToolchain {
                compiler: self.cxx.clone(),
                formatter: self.clang_format.clone(),
                login_shell: !self.no_login_shell,
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = parse_cli();
    let result = match cli.command {
        Commands::Check(args) => check(args).await,
        Commands::Format(args) => format(args).await,
        Commands::Report(args) => report(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Missing required inputs print usage on standard output and exit with 1.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            println!("{}", e.render());
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

async fn check(args: CheckArgs) -> Result<ExitCode, AppError> {
    let collection = load_collection(&args.collection_path).await?;
    let basedir = absolute(
        args.basedir
            .unwrap_or_else(|| PathBuf::from(&collection.base_path)),
    )?;
    let settings = args.toolchain.settings(basedir);

    // Held until the report is written; dropping it removes the directory.
    let (scratch_dir, _scratch_guard) = scratch_dir(args.tempdir)?;
    tracing::info!("Scratch directory: {}", scratch_dir.display());

    let autotest = Autotest::new(native_testers(&settings), &settings.basedir, &scratch_dir);
    let report = autotest.run(&collection).await;

    write_report(&args.output_result_path, &report).await?;
    tracing::info!(
        "Report written to {} ({} failed checks)",
        args.output_result_path.display(),
        report.failed_count()
    );

    Ok(ExitCode::SUCCESS)
}

async fn format(args: FormatArgs) -> Result<ExitCode, AppError> {
    let collection = load_collection(&args.collection_path).await?;
    let basedir = absolute(
        args.basedir
            .unwrap_or_else(|| PathBuf::from(&collection.base_path)),
    )?;
    let settings = args.toolchain.settings(basedir);

    let summary = check_formatting(
        &native_testers(&settings),
        &collection,
        &settings.basedir,
        args.inplace,
    )
    .await;

    if summary.success() {
        tracing::info!("{} files formatted", summary.checked);
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            "format check failed: {} of {} files",
            summary.unformatted.len(),
            summary.checked
        );
        Ok(ExitCode::FAILURE)
    }
}

async fn report(args: ReportArgs) -> Result<ExitCode, AppError> {
    let report = load_report(&args.result_path).await?;
    print!("{}", markdown::render(&report, &script_name()));

    let failed = report.failed_count();
    if args.check_test_fail && failed > 0 {
        tracing::error!("Some tests failed: count = {}", failed);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Name this program was invoked as, shown in the markdown header.
fn script_name() -> String {
    std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Compilers and test binaries run inside the scratch directory, so
/// directories are resolved against the invocation directory once.
fn absolute(path: PathBuf) -> Result<PathBuf, AppError> {
    let path = if path.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        path
    };
    std::path::absolute(&path).map_err(|e| AppError::io(&path, e))
}

fn scratch_dir(requested: Option<PathBuf>) -> Result<(PathBuf, Option<TempDir>), AppError> {
    match requested {
        Some(dir) => {
            std::fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;
            Ok((absolute(dir)?, None))
        }
        None => {
            let dir = tempfile::Builder::new()
                .prefix("codetest")
                .tempdir()
                .map_err(|e| AppError::io(std::env::temp_dir(), e))?;
            Ok((dir.path().to_path_buf(), Some(dir)))
        }
    }
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
