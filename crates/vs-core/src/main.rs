//! votescope CLI entry point.
//!
//! Reports go to stdout; logs and errors go to stderr. The process exit
//! code follows [`ExitCode`].

use clap::{Args, Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use vs_common::error::format_error_human;
use vs_common::{Error, OutputFormat, Result, StructuredError, SCHEMA_VERSION};
use vs_core::config::{
    load_config, load_config_from_file, validate, AnalysisConfig, AxisMode, ConfigError,
    ConfigOptions, ConfigOverrides, ConfigResolution, ConfigSource,
};
use vs_core::exit_codes::ExitCode;
use vs_core::log_event;
use vs_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use vs_core::pipeline::{run_binomial, run_exponential, run_rates, run_stats};
use vs_core::render::ImageFormat;
use vs_core::report::{render_report, ConfigShowReport, ConfigValidateReport};
use vs_core::timeline::TimeUnit;

/// votescope: voting-activity distributions from a movies database
#[derive(Parser)]
#[command(name = "votescope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// SQLite database holding the movies table
    #[arg(long, global = true, env = "VOTESCOPE_DB")]
    db: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/votescope/config.toml, or VOTESCOPE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Date elapsed times are measured to (YYYY-MM-DD)
    #[arg(long, global = true)]
    reference_date: Option<String>,

    /// Unit of elapsed time
    #[arg(long, global = true, value_enum)]
    unit: Option<TimeUnit>,

    /// Directory figures are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Figure file format
    #[arg(long, global = true, value_enum)]
    image: Option<ImageFormat>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

impl GlobalOpts {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            db: self.db.clone(),
            reference_date: self.reference_date.clone(),
            unit: self.unit,
            output_dir: self.output_dir.clone(),
            image: self.image,
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate exponential fit with one marker per record
    Exponential(ExponentialArgs),

    /// Per-record rates, top-N curves
    Rates(RatesArgs),

    /// Binomial approximation of vote counts
    Binomial,

    /// Descriptive statistics of the dataset
    Stats,

    /// Configuration management
    Config(ConfigArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Exponential(_) => "exponential",
            Commands::Rates(_) => "rates",
            Commands::Binomial => "binomial",
            Commands::Stats => "stats",
            Commands::Config(args) => match args.command {
                ConfigCommands::Show => "config show",
                ConfigCommands::Validate { .. } => "config validate",
            },
        }
    }
}

#[derive(Args, Debug)]
struct ExponentialArgs {
    /// Draw the curve without per-record markers
    #[arg(long)]
    no_markers: bool,
}

#[derive(Args, Debug)]
struct RatesArgs {
    /// Number of records to plot (0 or negative: all)
    #[arg(long, allow_negative_numbers = true)]
    top_n: Option<i64>,

    /// Time axis: observed range with margin, or a fixed upper bound
    #[arg(long, value_enum)]
    axis: Option<AxisMode>,

    /// Upper bound of a fixed axis
    #[arg(long)]
    axis_upper: Option<f64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (default: the resolved config file)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    // Machine-readable stdout pairs with machine-readable stderr.
    let log_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    let log_config = LogConfig::from_env(log_level, log_format).with_color(!cli.global.no_color);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id(), cli.command.name());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "run started",
        format = tracing::field::display(cli.global.format)
    );

    let exit_code = match run(&cli, &ctx).and_then(|output| write_stdout(&output)) {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(&cli.global, &ctx, &err),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Report,
        "run finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli, ctx: &LogContext) -> Result<String> {
    let global = &cli.global;
    match &cli.command {
        Commands::Exponential(args) => {
            let (config, source) = resolve_config(global, global.overrides(), ctx)?;
            let report = run_exponential(&config, !args.no_markers, ctx)?;
            render_report(&report, global.format, ctx, &source)
        }
        Commands::Rates(args) => {
            let overrides = ConfigOverrides {
                top_n: args.top_n,
                axis_mode: args.axis,
                axis_upper: args.axis_upper,
                ..global.overrides()
            };
            let (config, source) = resolve_config(global, overrides, ctx)?;
            let report = run_rates(&config, ctx)?;
            render_report(&report, global.format, ctx, &source)
        }
        Commands::Binomial => {
            let (config, source) = resolve_config(global, global.overrides(), ctx)?;
            let report = run_binomial(&config, ctx)?;
            render_report(&report, global.format, ctx, &source)
        }
        Commands::Stats => {
            let (config, source) = resolve_config(global, global.overrides(), ctx)?;
            let report = run_stats(&config, ctx)?;
            render_report(&report, global.format, ctx, &source)
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                let (config, source) = resolve_config(global, global.overrides(), ctx)?;
                let report = ConfigShowReport::new(source.clone(), config)?;
                render_report(&report, global.format, ctx, &source)
            }
            ConfigCommands::Validate { path } => {
                // The file alone is checked here; flag overrides do not apply.
                let (config, source) = match path {
                    Some(path) => {
                        let (config, hash) = load_config_from_file(path)?;
                        let source = ConfigSource {
                            path: Some(path.clone()),
                            hash: Some(hash),
                            resolution: ConfigResolution::CliFlag,
                        };
                        (config, source)
                    }
                    None => {
                        let resolved = load_config(&config_options(global))?;
                        let source = resolved.source();
                        (resolved.config, source)
                    }
                };
                validate(&config).map_err(ConfigError::from)?;
                let report = ConfigValidateReport {
                    source: source.clone(),
                    valid: true,
                };
                render_report(&report, global.format, ctx, &source)
            }
        },
    }
}

/// Print the report; a closed or full stdout is an I/O error, not a panic.
fn write_stdout(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    stdout.flush()?;
    Ok(())
}

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        config_path: global.config.clone(),
    }
}

/// Load the config file, apply flag overrides and validate the result.
///
/// Validation runs on the effective values, so a flag can replace a value
/// the file gets wrong.
fn resolve_config(
    global: &GlobalOpts,
    overrides: ConfigOverrides,
    ctx: &LogContext,
) -> Result<(AnalysisConfig, ConfigSource)> {
    let resolved = load_config(&config_options(global))?;
    let source = resolved.source();
    match &source.path {
        Some(path) => log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "configuration loaded",
            path = tracing::field::display(path.display()),
            resolution = tracing::field::debug(source.resolution)
        ),
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no config file, using defaults"
        ),
    }

    let mut config = resolved.config;
    config.apply(&overrides);
    validate(&config).map_err(ConfigError::from)?;
    Ok((config, source))
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    if exit_code.is_internal_error() {
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Report,
            "internal error",
            code = err.code(),
            error = tracing::field::display(err)
        );
    }

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": &ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": &ctx.command,
                "status": "error",
                "exit_code": exit_code.as_i32(),
                "error": StructuredError::from(err),
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", StructuredError::from(err).to_json()),
            }
        }
        OutputFormat::Summary => {
            eprintln!("[{}] {} error {}: {}", ctx.run_id, ctx.command, err.code(), err);
        }
        OutputFormat::Human => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
    }

    exit_code
}
