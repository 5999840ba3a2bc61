use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use prepdeck::{
    Dashboard, DashboardBuilder, FilterDimension, FilterSelection, OutputFormat, PrepDeckError,
};

#[derive(Parser)]
#[command(name = "prepdeck")]
#[command(about = "Culinary production dashboard for schedule spreadsheets", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    summary: SummaryArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selectable values for each filter dimension
    Filters {
        /// Spreadsheet file (xlsx, xls, xlsb, ods)
        file: PathBuf,
    },
}

#[derive(Args)]
struct SummaryArgs {
    /// Spreadsheet file (xlsx, xls, xlsb, ods)
    file: Option<PathBuf>,

    /// Only include rows for this event
    #[arg(long)]
    event: Option<String>,

    /// Only include rows for this producer
    #[arg(long)]
    producer: Option<String>,

    #[arg(long, value_enum, default_value_t = FormatArg::Markdown)]
    format: FormatArg,

    /// Number of entries in the producer and event series
    #[arg(long, default_value_t = prepdeck::DEFAULT_TOP_N)]
    top_n: usize,

    /// Number of rows shown in the data preview
    #[arg(long, default_value_t = prepdeck::DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,

    /// Write the output to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Filters { file }) => list_filters(&file),
        None => summarize(cli.summary),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn load(dashboard: &Dashboard, path: &Path) -> Result<prepdeck::Dataset, PrepDeckError> {
    log::info!("reading {}", path.display());
    let file = File::open(path)?;
    dashboard.parse_reader(file)
}

fn list_filters(path: &Path) -> Result<(), PrepDeckError> {
    let dashboard = DashboardBuilder::new().build()?;
    let dataset = load(&dashboard, path)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for dimension in FilterDimension::ALL {
        writeln!(out, "{}:", dimension.label())?;
        for value in dashboard.available_values(&dataset, dimension) {
            writeln!(out, "  {}", value)?;
        }
    }
    Ok(())
}

fn summarize(args: SummaryArgs) -> Result<(), PrepDeckError> {
    let path = args.file.ok_or_else(|| {
        PrepDeckError::Config("an input file is required (see --help)".to_string())
    })?;

    let dashboard = DashboardBuilder::new()
        .with_output_format(args.format.into())
        .with_top_n(args.top_n)
        .with_preview_rows(args.preview_rows)
        .build()?;
    let dataset = load(&dashboard, &path)?;

    let mut selection = FilterSelection::new();
    if let Some(event) = args.event.as_deref() {
        selection.set(FilterDimension::Event, event);
    }
    if let Some(producer) = args.producer.as_deref() {
        selection.set(FilterDimension::Producer, producer);
    }

    let view = dashboard.summarize(&dataset, &selection);
    match args.output {
        Some(output) => {
            let writer = BufWriter::new(File::create(&output)?);
            dashboard.render(&view, writer)?;
            log::info!("wrote {}", output.display());
        }
        None => dashboard.render(&view, std::io::stdout().lock())?,
    }
    Ok(())
}
