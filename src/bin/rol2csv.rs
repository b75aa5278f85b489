use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use ans_rol_to_csv::{
    ColumnMap, DEFAULT_ANNEX_ARCHIVE, DEFAULT_KEYWORDS, DEFAULT_SOURCE_URL, DocumentNaming,
    ExtractOptions, ExtractWarning, PageSelection, PipelineOptions, acquire_annex_archive,
    extract_pdf_to_csv, fetch_annex_links, run_pipeline,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rol2csv",
    version,
    about = "Extract the ANS Rol de Procedimentos annex table into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the ANS update page, download the annex PDFs and archive them.
    Download(DownloadArgs),
    /// Extract the ruled table from one annex PDF and write normalized CSV.
    Extract(ExtractArgs),
    /// Run the full archive-to-archive pipeline with intermediate cleanup.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct DownloadArgs {
    /// Page listing the annex PDFs.
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Directory receiving the downloaded files and the archive.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Name of the output ZIP archive.
    #[arg(long, default_value = DEFAULT_ANNEX_ARCHIVE)]
    zip_name: String,

    /// Print the scraped links as JSON and skip downloading.
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Skip the coded-header normalization map.
    #[arg(long)]
    no_map: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Input ZIP archive containing the annex PDFs.
    #[arg(short, long)]
    input: PathBuf,

    /// Working directory for unpacked and generated files.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Required file-name prefix of the source document.
    #[arg(long, default_value = "Anexo_I_")]
    prefix: String,

    /// Name of the generated CSV inside the working directory.
    #[arg(long, default_value = "rol_procedimentos.csv")]
    csv_name: String,

    /// Name of the final ZIP archive.
    #[arg(long, default_value = "rol_procedimentos.zip")]
    zip_name: String,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Keep intermediate PDF/CSV files instead of cleaning them up.
    #[arg(long)]
    keep: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pages(pages: Option<&str>) -> Result<Option<PageSelection>> {
    pages
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")
}

fn parse_delimiter(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    Ok(delimiter as u8)
}

fn extract_options(
    pages: Option<&str>,
    delimiter: char,
    no_map: bool,
) -> Result<ExtractOptions> {
    Ok(ExtractOptions {
        pages: parse_pages(pages)?,
        delimiter: parse_delimiter(delimiter)?,
        column_map: if no_map {
            ColumnMap::empty()
        } else {
            ColumnMap::default()
        },
        ..ExtractOptions::default()
    })
}

fn log_warnings(warnings: &[ExtractWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} page={:?} count={:?}: {}",
                warning.code, warning.page, warning.count, warning.message
            );
        }
    }
}

fn run_download(args: &DownloadArgs) -> Result<usize> {
    if args.list {
        let links = fetch_annex_links(&args.source_url, DEFAULT_KEYWORDS)
            .with_context(|| format!("failed to scrape '{}'", args.source_url))?;
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(links.len());
    }

    let (zip_path, links) = acquire_annex_archive(
        &args.source_url,
        DEFAULT_KEYWORDS,
        &args.out_dir,
        &args.zip_name,
    )
    .with_context(|| format!("failed to acquire annexes from '{}'", args.source_url))?;

    eprintln!("archived {} annex(es) into {}", links.len(), zip_path.display());
    Ok(links.len())
}

fn run_extract(args: &ExtractArgs) -> Result<usize> {
    let options = extract_options(args.pages.as_deref(), args.delimiter, args.no_map)?;
    let report = extract_pdf_to_csv(&args.input, &args.output, &options)
        .with_context(|| format!("failed to extract table from '{}'", args.input.display()))?;

    log_warnings(&report.warnings, args.verbose);
    eprintln!(
        "extracted {} row(s) across {} column(s) from {} page fragment(s)",
        report.row_count, report.column_count, report.fragment_count
    );
    Ok(report.row_count)
}

fn run_run(args: &RunArgs) -> Result<usize> {
    let options = PipelineOptions {
        extract: extract_options(args.pages.as_deref(), args.delimiter, false)?,
        naming: DocumentNaming {
            prefix: args.prefix.clone(),
            ..DocumentNaming::default()
        },
        csv_name: args.csv_name.clone(),
        zip_name: args.zip_name.clone(),
        keep_intermediates: args.keep,
    };

    let report = run_pipeline(&args.input, &args.work_dir, &options)
        .with_context(|| format!("pipeline failed for '{}'", args.input.display()))?;

    log_warnings(&report.extraction.warnings, args.verbose);
    eprintln!(
        "processed '{}': {} row(s), {} column(s) -> {}",
        report.source_document,
        report.extraction.row_count,
        report.extraction.column_count,
        report.archive_path.display()
    );
    Ok(report.extraction.row_count)
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ans_rol_to_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Download(args) => run_download(&args),
        Commands::Extract(args) => run_extract(&args),
        Commands::Run(args) => run_run(&args),
    };

    match outcome {
        Ok(count) if count > 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
