use std::path::Path;

use csv::WriterBuilder;

use crate::error::PipelineError;
use crate::model::Table;

pub(crate) fn write_csv(path: &Path, table: &Table, delimiter: u8) -> Result<(), PipelineError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv_to_string(table: &Table, delimiter: u8) -> Result<String, PipelineError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| PipelineError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes).map_err(|error| {
        PipelineError::InvalidOption(format!("invalid utf-8 csv output: {error}"))
    })
}
