use crate::error::PipelineError;
use crate::model::Table;
use crate::options::ColumnMap;

pub(crate) fn apply_column_map(table: &mut Table, map: &ColumnMap) -> Result<(), PipelineError> {
    for (code, label) in map.entries() {
        let Some(index) = table.headers.iter().position(|header| header == code) else {
            if table.headers.iter().any(|header| header == label) {
                continue;
            }
            return Err(PipelineError::MissingColumn {
                column: code.to_string(),
            });
        };

        // cell values first: substitution is keyed by the coded column
        for row in &mut table.rows {
            if row[index] == code {
                row[index] = label.to_string();
            }
        }
        table.headers[index] = label.to_string();
    }

    Ok(())
}
