use clap::Parser;
use tfvars_conv_rs::cli::run_conversion;
use tfvars_conv_rs::config::ConversionConfig;
use tfvars_conv_rs::generator::Emitter;
use tfvars_conv_rs::parser::assembler::{AssemblerOptions, BoolPolicy, CellPolicy};
use tfvars_conv_rs::get_sheet_types;

use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory; relative paths below are resolved against it.
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    workdir: PathBuf,

    /// Workbook to convert.
    #[arg(short = 'i', long, value_name = "FILE", default_value = "input.xlsx")]
    input: PathBuf,

    /// Directory for the intermediate JSON and assignment block files.
    #[arg(long, value_name = "DIR", default_value = "intermediate")]
    intermediate_dir: PathBuf,

    /// Directory for the final tfvars files.
    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// How the final tfvars text is produced.
    #[arg(long, value_enum, default_value_t = Emitter::Legacy)]
    emitter: Emitter,

    /// Reuse the previous boolean when a boolean cell holds anything else.
    #[arg(long, default_value_t = false)]
    legacy_booleans: bool,

    /// Fail instead of writing an empty value when a rule or tag cell is malformed.
    #[arg(long, default_value_t = false)]
    strict_cells: bool,

    /// List the supported sheet names
    #[arg(short = 'l', long)]
    list_sheets: bool,

    /// Log debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log errors only.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_sheets {
        println!("supported sheets:");
        println!("{}", get_sheet_types().join(" "));
        println!();
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet);

    let config = ConversionConfig {
        workdir: cli.workdir,
        input: cli.input,
        intermediate_dir: cli.intermediate_dir,
        output_dir: cli.output_dir,
        emitter: cli.emitter,
        assembler: AssemblerOptions {
            bool_policy: if cli.legacy_booleans {
                BoolPolicy::CarryOver
            } else {
                BoolPolicy::Strict
            },
            cell_policy: if cli.strict_cells {
                CellPolicy::Abort
            } else {
                CellPolicy::Degrade
            },
        },
    };

    let reports = run_conversion(&config)?;
    info!("Converted {} sheet(s)", reports.len());

    Ok(())
}
