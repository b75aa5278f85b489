use crate::model::{PageContent, TableFragment, TextSpan};
use crate::options::ExtractOptions;

fn cluster_positions(mut values: Vec<f32>, tolerance: f32) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }

    values.sort_by(f32::total_cmp);

    let mut clusters = Vec::new();
    let mut sum = values[0];
    let mut count = 1.0_f32;
    let mut last = values[0];

    for value in values.into_iter().skip(1) {
        if value - last <= tolerance {
            sum += value;
            count += 1.0;
        } else {
            clusters.push(sum / count);
            sum = value;
            count = 1.0;
        }
        last = value;
    }
    clusters.push(sum / count);

    clusters
}

fn band_index(boundaries: &[f32], value: f32) -> Option<usize> {
    boundaries
        .windows(2)
        .position(|pair| pair[0] <= value && value <= pair[1])
}

fn cell_text(mut spans: Vec<&TextSpan>) -> String {
    spans.sort_by(|left, right| {
        right
            .y
            .total_cmp(&left.y)
            .then_with(|| left.x.total_cmp(&right.x))
    });

    let mut text = String::new();
    for span in spans {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(span.text.trim());
    }
    text
}

pub(crate) fn detect_page_fragment(
    page: &PageContent,
    options: &ExtractOptions,
) -> Option<TableFragment> {
    let tolerance = options.rule_tolerance;

    let horizontal_ys = page
        .rules
        .iter()
        .filter(|rule| rule.is_horizontal(tolerance))
        .map(|rule| (rule.y0 + rule.y1) / 2.0)
        .collect::<Vec<_>>();
    let vertical_xs = page
        .rules
        .iter()
        .filter(|rule| rule.is_vertical(tolerance))
        .map(|rule| (rule.x0 + rule.x1) / 2.0)
        .collect::<Vec<_>>();

    let row_bounds = cluster_positions(horizontal_ys, tolerance);
    let col_bounds = cluster_positions(vertical_xs, tolerance);
    if row_bounds.len() < 2 || col_bounds.len() < 2 {
        return None;
    }

    let row_count = row_bounds.len() - 1;
    let col_count = col_bounds.len() - 1;

    let mut cells: Vec<Vec<Vec<&TextSpan>>> = vec![vec![Vec::new(); col_count]; row_count];
    for span in &page.spans {
        let Some(col) = band_index(&col_bounds, span.x) else {
            continue;
        };
        // row bands run top to bottom while boundaries were clustered ascending
        let Some(from_bottom) = band_index(&row_bounds, span.y) else {
            continue;
        };
        let row = row_count - 1 - from_bottom;
        cells[row][col].push(span);
    }

    let rows = cells
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    Some(TableFragment {
        page: page.page_number,
        rows,
    })
}

pub(crate) fn detect_fragments(
    pages: &[PageContent],
    options: &ExtractOptions,
) -> Vec<TableFragment> {
    pages
        .iter()
        .filter_map(|page| detect_page_fragment(page, options))
        .collect()
}
