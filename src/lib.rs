mod archive;
mod csv_out;
mod error;
mod locate;
mod merge;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod source_scraper;
mod table_detect;
mod warning;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::model::PageContent;

pub use archive::{cleanup_intermediates, pack_archive, unpack_archive};
pub use error::PipelineError;
pub use model::Table;
pub use options::{ColumnMap, DocumentNaming, ExtractOptions, PageSelection, PipelineOptions};
pub use source_scraper::{
    AnnexLink, DEFAULT_KEYWORDS, DEFAULT_SOURCE_URL, download_annexes, extract_annex_links,
    fetch_annex_links,
};
pub use warning::{ExtractWarning, WarningCode};

pub const DEFAULT_ANNEX_ARCHIVE: &str = "anexos_rol_procedimentos.zip";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub row_count: usize,
    pub column_count: usize,
    pub fragment_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub source_document: String,
    pub archive_path: PathBuf,
    pub extraction: ExtractionReport,
}

fn extract_and_normalize(
    pages: &[PageContent],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<(Table, usize), PipelineError> {
    let fragments = table_detect::detect_fragments(pages, options);
    if fragments.is_empty() {
        return Err(PipelineError::NoTablesFound);
    }

    let mut table = merge::merge_fragments(&fragments, warnings)?;
    normalize::apply_column_map(&mut table, &options.column_map)?;

    info!(
        "extracted table with {} rows and {} columns",
        table.row_count(),
        table.column_count()
    );

    Ok((table, fragments.len()))
}

pub fn extract_pdf_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, PipelineError> {
    let pages = pdf_reader::read_pdf_pages(input_pdf, options.pages.as_ref())?;
    let mut warnings = Vec::new();
    let (table, fragment_count) = extract_and_normalize(&pages, options, &mut warnings)?;
    write_csv(output_csv, &table, options.delimiter)?;

    Ok(ExtractionReport {
        row_count: table.row_count(),
        column_count: table.column_count(),
        fragment_count,
        warnings,
    })
}

pub fn extract_pdf_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), PipelineError> {
    let pages = pdf_reader::read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    let mut warnings = Vec::new();
    let (table, fragment_count) = extract_and_normalize(&pages, options, &mut warnings)?;
    let csv = write_csv_to_string(&table, options.delimiter)?;

    Ok((
        csv,
        ExtractionReport {
            row_count: table.row_count(),
            column_count: table.column_count(),
            fragment_count,
            warnings,
        },
    ))
}

fn run_stages(
    input_zip: &Path,
    work_dir: &Path,
    options: &PipelineOptions,
) -> Result<PipelineReport, PipelineError> {
    let names = unpack_archive(input_zip, work_dir)?;

    let mut warnings = Vec::new();
    let source_document = locate::find_source_document(&names, &options.naming, &mut warnings)?;
    let pdf_path = work_dir.join(&source_document);

    let pages = pdf_reader::read_pdf_pages(&pdf_path, options.extract.pages.as_ref())?;
    let (table, fragment_count) = extract_and_normalize(&pages, &options.extract, &mut warnings)?;

    let csv_path = work_dir.join(&options.csv_name);
    write_csv(&csv_path, &table, options.extract.delimiter)?;

    let archive_path = work_dir.join(&options.zip_name);
    pack_archive(&archive_path, &[csv_path])?;

    Ok(PipelineReport {
        source_document,
        archive_path,
        extraction: ExtractionReport {
            row_count: table.row_count(),
            column_count: table.column_count(),
            fragment_count,
            warnings,
        },
    })
}

pub fn run_pipeline(
    input_zip: &Path,
    work_dir: &Path,
    options: &PipelineOptions,
) -> Result<PipelineReport, PipelineError> {
    let outcome = run_stages(input_zip, work_dir, options);

    // intermediates go away on success and failure alike; only the archive survives
    let mut cleanup_warnings = Vec::new();
    if !options.keep_intermediates {
        cleanup_intermediates(work_dir, &["pdf", "csv"], &mut cleanup_warnings);
    }

    match outcome {
        Ok(mut report) => {
            report.extraction.warnings.append(&mut cleanup_warnings);
            Ok(report)
        }
        Err(error) => Err(error),
    }
}

pub fn acquire_annex_archive(
    source_url: &str,
    keywords: &[&str],
    out_dir: &Path,
    zip_name: &str,
) -> Result<(PathBuf, Vec<AnnexLink>), PipelineError> {
    let links = fetch_annex_links(source_url, keywords)?;
    if links.is_empty() {
        return Err(PipelineError::Download {
            url: source_url.to_string(),
            reason: "no annex PDF links found on the source page".to_string(),
        });
    }

    let files = download_annexes(&links, out_dir)?;
    let zip_path = out_dir.join(zip_name);
    pack_archive(&zip_path, &files)?;

    let mut cleanup_warnings = Vec::new();
    cleanup_intermediates(out_dir, &["pdf"], &mut cleanup_warnings);

    Ok((zip_path, links))
}
