use crate::error::PipelineError;
use crate::model::{Table, TableFragment};
use crate::warning::{ExtractWarning, WarningCode};

fn row_is_empty(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn drop_empty_columns(table: &mut Table, warnings: &mut Vec<ExtractWarning>) {
    let keep = (0..table.headers.len())
        .filter(|&index| {
            table
                .rows
                .iter()
                .any(|row| !row[index].trim().is_empty())
        })
        .collect::<Vec<_>>();

    let dropped = table.headers.len() - keep.len();
    if dropped == 0 {
        return;
    }

    table.headers = keep
        .iter()
        .map(|&index| table.headers[index].clone())
        .collect();
    table.rows = table
        .rows
        .iter()
        .map(|row| keep.iter().map(|&index| row[index].clone()).collect())
        .collect();

    warnings.push(
        ExtractWarning::new(
            WarningCode::EmptyColumnsDropped,
            "dropped column(s) that were empty across every row",
        )
        .with_count(dropped),
    );
}

pub(crate) fn merge_fragments(
    fragments: &[TableFragment],
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Table, PipelineError> {
    let schema_fragment = fragments.iter().find(|fragment| !fragment.is_empty());
    let Some(schema_fragment) = schema_fragment else {
        return Err(PipelineError::NoTablesFound);
    };

    let headers = schema_fragment.rows[0].clone();
    let expected = headers.len();

    let mut rows = Vec::new();
    for fragment in fragments {
        if fragment.is_empty() {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::EmptyPageFragment,
                    "page fragment contained no cell values",
                )
                .with_page(fragment.page),
            );
            continue;
        }

        let found = fragment.column_count();
        if found != expected {
            return Err(PipelineError::ColumnCountMismatch {
                page: fragment.page,
                expected,
                found,
            });
        }

        let mut fragment_rows = fragment.rows.iter();
        if fragment.rows[0] == headers {
            fragment_rows.next();
        }
        rows.extend(
            fragment_rows
                .filter(|row| !row_is_empty(row.as_slice()))
                .cloned(),
        );
    }

    let mut table = Table { headers, rows };
    drop_empty_columns(&mut table, warnings);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::merge_fragments;
    use crate::error::PipelineError;
    use crate::model::TableFragment;
    use crate::warning::WarningCode;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn repeated_page_headers_are_dropped_once_per_fragment() {
        let fragments = vec![
            TableFragment {
                page: 1,
                rows: rows(&[&["OD", "AMB"], &["a", "b"]]),
            },
            TableFragment {
                page: 2,
                rows: rows(&[&["OD", "AMB"], &["c", "d"]]),
            },
        ];

        let mut warnings = Vec::new();
        let table = merge_fragments(&fragments, &mut warnings).expect("merge should succeed");
        assert_eq!(table.headers, vec!["OD", "AMB"]);
        assert_eq!(table.rows, rows(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn continuation_fragment_without_header_keeps_all_rows() {
        let fragments = vec![
            TableFragment {
                page: 1,
                rows: rows(&[&["OD", "AMB"], &["a", "b"]]),
            },
            TableFragment {
                page: 2,
                rows: rows(&[&["c", "d"], &["e", "f"]]),
            },
        ];

        let mut warnings = Vec::new();
        let table = merge_fragments(&fragments, &mut warnings).expect("merge should succeed");
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn all_empty_rows_are_removed() {
        let fragments = vec![TableFragment {
            page: 1,
            rows: rows(&[&["OD", "AMB"], &["a", ""], &["", ""], &["", "b"]]),
        }];

        let mut warnings = Vec::new();
        let table = merge_fragments(&fragments, &mut warnings).expect("merge should succeed");
        assert_eq!(table.rows, rows(&[&["a", ""], &["", "b"]]));
    }

    #[test]
    fn columns_empty_across_all_rows_are_dropped_with_warning() {
        let fragments = vec![TableFragment {
            page: 1,
            rows: rows(&[&["OD", "VAZIO", "AMB"], &["a", "", "b"], &["c", "", "d"]]),
        }];

        let mut warnings = Vec::new();
        let table = merge_fragments(&fragments, &mut warnings).expect("merge should succeed");
        assert_eq!(table.headers, vec!["OD", "AMB"]);
        assert_eq!(table.rows, rows(&[&["a", "b"], &["c", "d"]]));
        assert!(
            warnings
                .iter()
                .any(|warning| warning.code == WarningCode::EmptyColumnsDropped)
        );
    }

    #[test]
    fn empty_fragment_contributes_nothing_but_warns() {
        let fragments = vec![
            TableFragment {
                page: 1,
                rows: rows(&[&["OD", "AMB"], &["a", "b"]]),
            },
            TableFragment {
                page: 2,
                rows: rows(&[&["", ""], &["", ""]]),
            },
        ];

        let mut warnings = Vec::new();
        let table = merge_fragments(&fragments, &mut warnings).expect("merge should succeed");
        assert_eq!(table.rows.len(), 1);
        assert!(
            warnings
                .iter()
                .any(|warning| warning.code == WarningCode::EmptyPageFragment
                    && warning.page == Some(2))
        );
    }

    #[test]
    fn column_count_mismatch_fails() {
        let fragments = vec![
            TableFragment {
                page: 1,
                rows: rows(&[&["OD", "AMB"], &["a", "b"]]),
            },
            TableFragment {
                page: 2,
                rows: rows(&[&["x", "y", "z"], &["1", "2", "3"]]),
            },
        ];

        let mut warnings = Vec::new();
        let error = merge_fragments(&fragments, &mut warnings).expect_err("merge should fail");
        assert!(matches!(
            error,
            PipelineError::ColumnCountMismatch {
                page: 2,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn no_fragment_with_content_is_an_extraction_failure() {
        let fragments = vec![TableFragment {
            page: 1,
            rows: rows(&[&["", ""], &["", ""]]),
        }];

        let mut warnings = Vec::new();
        let error = merge_fragments(&fragments, &mut warnings).expect_err("merge should fail");
        assert!(matches!(error, PipelineError::NoTablesFound));
    }
}
