//! office-fragment - office HTML exports to CMS fragments

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use office_fragment::{
    Conversion, FilePublisher, PipelineConfig, ProgressEvent, SofficeConverter, convert_and_publish,
};

#[derive(Parser)]
#[command(name = "office-fragment")]
#[command(
    version,
    about = "Turn office HTML exports into self-contained CMS fragments",
    long_about = None
)]
#[command(after_help = "EXAMPLES:
    office-fragment Report.htm                 Print the fragment to stdout
    office-fragment Budget.xlsx -o budget.html Convert with LibreOffice, write a file
    office-fragment Memo.htm --json -o out.html Print a JSON report")]
struct Cli {
    /// Input file (HTML export, Word, or Excel)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, or `-` for stdout
    #[arg(short, long, value_name = "OUTPUT", default_value = "-")]
    output: String,

    /// Directory for converter output (office binaries only)
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// JSON file with pipeline settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum container width in pixels
    #[arg(long, value_name = "PX")]
    max_width: Option<u32>,

    /// Baseline line-height for text blocks
    #[arg(long, value_name = "VALUE")]
    line_height: Option<String>,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(px) = cli.max_width {
        config = config.with_max_width(px);
    }
    if let Some(value) = &cli.line_height {
        config = config.with_line_height(value.clone());
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = load_config(cli)?;
    let workdir = cli
        .workdir
        .clone()
        .unwrap_or_else(|| {
            std::env::temp_dir().join(format!("office-fragment-{}", std::process::id()))
        });
    let converter = SofficeConverter::locate().unwrap_or_default();

    let quiet = cli.quiet;
    let mut progress = |event: ProgressEvent| {
        if !quiet {
            eprintln!("{event}");
        }
    };

    let conversion = convert_and_publish(
        &cli.input,
        &workdir,
        &cli.output,
        &converter,
        &FilePublisher,
        &config,
        &mut progress,
    )
    .map_err(|e| e.to_string())?;

    if cli.json {
        print_report(&conversion, cli.output == "-")?;
    }
    Ok(())
}

fn print_report(conversion: &Conversion, fragment_on_stdout: bool) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&conversion.report).map_err(|e| e.to_string())?;
    if fragment_on_stdout {
        eprintln!("{json}");
    } else {
        println!("{json}");
    }
    Ok(())
}
