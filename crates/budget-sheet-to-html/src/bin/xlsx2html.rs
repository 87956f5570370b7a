use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use budget_sheet_to_html::{
    FlatTable, HeaderRows, RenderOptions, RenderReport, ReportOptions, Theme, export_flat_csv,
    load_table, render_table_to_html,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "xlsx2html",
    version,
    about = "Render a budget summary workbook as an HTML dashboard"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render one company's dashboard page.
    Render(RenderArgs),
    /// List the companies found in the workbook.
    Companies(SheetArgs),
    /// Dump the flattened table as CSV.
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
struct SheetArgs {
    /// Input workbook path (.xlsx).
    #[arg(short, long)]
    input: PathBuf,

    /// Zero-based sheet rows of the two header levels, like 11,12.
    #[arg(long, default_value = "11,12")]
    header_rows: String,

    /// Flattened name of the column identifying each company.
    #[arg(long, default_value = budget_sheet_to_html::DEFAULT_IDENTIFIER_COLUMN)]
    id_column: String,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    /// Output HTML path.
    #[arg(short, long)]
    output: PathBuf,

    /// Company to render; defaults to the first one in the sheet.
    #[arg(short, long)]
    company: Option<String>,

    /// JSON file overriding page colors.
    #[arg(long)]
    theme: Option<PathBuf>,

    /// Footer line printed under the page.
    #[arg(long)]
    footer: Option<String>,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ColumnsArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    /// Output CSV path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,
}

fn parse_report_options(args: &SheetArgs) -> Result<ReportOptions> {
    let header_rows = HeaderRows::from_str(&args.header_rows)
        .map_err(|error| anyhow!("invalid header rows: {error}"))
        .context("failed to parse --header-rows")?;

    Ok(ReportOptions {
        header_rows,
        identifier_column: args.id_column.clone(),
    })
}

fn parse_render_options(args: &RenderArgs) -> Result<RenderOptions> {
    let theme = match &args.theme {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read theme '{}'", path.display()))?;
            Theme::from_json(&json)
                .with_context(|| format!("failed to parse theme '{}'", path.display()))?
        }
        None => Theme::default(),
    };

    Ok(RenderOptions {
        theme,
        footer: args.footer.clone(),
        ..RenderOptions::default()
    })
}

fn load(args: &SheetArgs) -> Result<FlatTable> {
    let options = parse_report_options(args)?;
    load_table(&args.input, &options)
        .with_context(|| format!("failed to read workbook '{}'", args.input.display()))
}

fn log_report(report: &RenderReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!(
        "warning: {} field issue(s) for {}",
        report.warnings.len(),
        report.company
    );
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} field={:?} column={:?}: {}",
                warning.code, warning.field, warning.column, warning.message
            );
        }
    }
}

fn run_render(args: &RenderArgs) -> Result<RenderReport> {
    let render_options = parse_render_options(args)?;
    let table = load(&args.sheet)?;
    let (html, report) = render_table_to_html(&table, args.company.as_deref(), &render_options)
        .context("failed to build dashboard")?;
    std::fs::write(&args.output, html)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(report)
}

fn run_companies(args: &SheetArgs) -> Result<usize> {
    let table = load(args)?;
    let companies = table.companies();
    let mut stdout = std::io::stdout().lock();
    for company in &companies {
        writeln!(stdout, "{company}")?;
    }
    Ok(companies.len())
}

fn run_columns(args: &ColumnsArgs) -> Result<usize> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let table = load(&args.sheet)?;
    let duplicates = table.duplicate_columns();
    if !duplicates.is_empty() {
        eprintln!("warning: duplicate column names: {}", duplicates.join(", "));
    }

    let csv = export_flat_csv(&table, args.output.as_deref(), args.delimiter as u8)
        .context("failed to write CSV")?;
    if let Some(csv) = csv {
        std::io::stdout().lock().write_all(csv.as_bytes())?;
    }
    Ok(table.rows.len())
}

fn exit_for_rows(result: Result<usize>) -> ExitCode {
    match result {
        Ok(0) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("budget_sheet_to_html=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => match run_render(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                ExitCode::SUCCESS
            }
            Err(error) => {
                let no_rows = error
                    .downcast_ref::<budget_sheet_to_html::ReportError>()
                    .is_some_and(|error| matches!(error, budget_sheet_to_html::ReportError::NoCompanies));
                eprintln!("error: {error:#}");
                if no_rows {
                    ExitCode::from(2)
                } else {
                    ExitCode::from(1)
                }
            }
        },
        Commands::Companies(args) => exit_for_rows(run_companies(&args)),
        Commands::Columns(args) => exit_for_rows(run_columns(&args)),
    }
}
