use std::fs::File;
use std::io::Write;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const GRID_LEFT: i64 = 50;
const GRID_TOP: i64 = 780;
const COL_WIDTH: i64 = 150;
const ROW_HEIGHT: i64 = 30;

fn save_pdf(path: &Path, page_contents: Vec<Content>) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for content in page_contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

fn grid_page_content(rows: &[Vec<&str>]) -> Content {
    let row_count = i64::try_from(rows.len()).expect("row count fits in i64");
    let col_count = i64::try_from(rows.first().map_or(0, Vec::len)).expect("fits in i64");

    let mut operations = Vec::new();

    for index in 0..=row_count {
        let y = GRID_TOP - index * ROW_HEIGHT;
        operations.push(Operation::new("m", vec![GRID_LEFT.into(), y.into()]));
        operations.push(Operation::new(
            "l",
            vec![(GRID_LEFT + col_count * COL_WIDTH).into(), y.into()],
        ));
    }
    for index in 0..=col_count {
        let x = GRID_LEFT + index * COL_WIDTH;
        operations.push(Operation::new("m", vec![x.into(), GRID_TOP.into()]));
        operations.push(Operation::new(
            "l",
            vec![x.into(), (GRID_TOP - row_count * ROW_HEIGHT).into()],
        ));
    }
    operations.push(Operation::new("S", vec![]));

    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
    for (row_index, row) in rows.iter().enumerate() {
        for (col_index, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let x = GRID_LEFT + i64::try_from(col_index).expect("fits in i64") * COL_WIDTH + 5;
            let y = GRID_TOP - i64::try_from(row_index).expect("fits in i64") * ROW_HEIGHT - 20;
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    x.into(),
                    y.into(),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*cell)]));
        }
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// One entry per page; each page is a full ruled grid with one string per cell.
pub fn create_grid_pdf(
    path: &Path,
    pages: &[Vec<Vec<&str>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = pages
        .iter()
        .map(|rows| grid_page_content(rows))
        .collect::<Vec<_>>();
    save_pdf(path, contents)
}

/// Plain narrative pages without any ruled lines.
pub fn create_text_pdf(
    path: &Path,
    pages: &[Vec<&str>],
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = pages
        .iter()
        .map(|lines| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![16.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
            ];
            for (index, line) in lines.iter().enumerate() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                if index + 1 < lines.len() {
                    operations.push(Operation::new("T*", vec![]));
                }
            }
            operations.push(Operation::new("ET", vec![]));
            Content { operations }
        })
        .collect::<Vec<_>>();
    save_pdf(path, contents)
}

pub fn create_zip(
    path: &Path,
    entries: &[(&str, &[u8])],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    writer.finish()?;
    Ok(())
}
