use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;

use crate::error::PipelineError;
use crate::model::{PageContent, RuleSegment, TextSpan};
use crate::options::PageSelection;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn concat(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
            e: self.e * rhs.a + self.f * rhs.c + rhs.e,
            f: self.e * rhs.b + self.f * rhs.d + rhs.f,
        }
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn origin(self) -> (f32, f32) {
        (self.e, self.f)
    }
}

fn operand_number(operand: &Object) -> Option<f32> {
    match operand {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn operand_matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut values = [0.0_f32; 6];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = operand_number(operand)?;
    }
    Some(Matrix {
        a: values[0],
        b: values[1],
        c: values[2],
        d: values[3],
        e: values[4],
        f: values[5],
    })
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        let bytes = if bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("winansi") || lower.contains("1252") {
            let (latin, _, had_errors) = WINDOWS_1252.decode(bytes);
            if !had_errors && !latin.is_empty() {
                return latin.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn collect_show_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                text.push_str(&decode_pdf_bytes(encoding, bytes));
            }
            Object::Array(items) => {
                collect_show_text(text, encoding, items);
            }
            Object::Integer(value) => {
                if *value < -100 {
                    text.push(' ');
                }
            }
            Object::Real(value) => {
                if *value < -100.0 {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collect_page_content(
    document: &Document,
    page_number: u32,
    page_id: lopdf::ObjectId,
) -> Option<PageContent> {
    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut spans: Vec<TextSpan> = Vec::new();
    let mut rules: Vec<RuleSegment> = Vec::new();

    let mut ctm = Matrix::IDENTITY;
    let mut ctm_stack: Vec<Matrix> = Vec::new();

    let mut line_matrix = Matrix::IDENTITY;
    let mut leading = 0.0_f32;
    let mut current_encoding: Option<&str> = None;
    let mut current_text = String::new();
    let mut current_origin = (0.0_f32, 0.0_f32);

    let mut subpath: Vec<RuleSegment> = Vec::new();
    let mut current_point: Option<(f32, f32)> = None;
    let mut subpath_start: Option<(f32, f32)> = None;

    let flush_span =
        |spans: &mut Vec<TextSpan>, text: &mut String, origin: (f32, f32)| {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                spans.push(TextSpan {
                    x: origin.0,
                    y: origin.1,
                    text: trimmed.to_string(),
                });
            }
            text.clear();
        };

    for operation in content.operations {
        match operation.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => {
                if let Some(previous) = ctm_stack.pop() {
                    ctm = previous;
                }
            }
            "cm" => {
                if let Some(matrix) = operand_matrix(&operation.operands) {
                    ctm = matrix.concat(ctm);
                }
            }

            "BT" => {
                flush_span(&mut spans, &mut current_text, current_origin);
                line_matrix = Matrix::IDENTITY;
                leading = 0.0;
                current_origin = ctm.apply(0.0, 0.0);
            }
            "ET" => flush_span(&mut spans, &mut current_text, current_origin),
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "TL" => {
                if let Some(value) = operation.operands.first().and_then(operand_number) {
                    leading = value;
                }
            }
            "Tm" => {
                if let Some(matrix) = operand_matrix(&operation.operands) {
                    flush_span(&mut spans, &mut current_text, current_origin);
                    line_matrix = matrix;
                    let (x, y) = line_matrix.origin();
                    current_origin = ctm.apply(x, y);
                }
            }
            "Td" | "TD" => {
                let tx = operation.operands.first().and_then(operand_number);
                let ty = operation.operands.get(1).and_then(operand_number);
                if let (Some(tx), Some(ty)) = (tx, ty) {
                    flush_span(&mut spans, &mut current_text, current_origin);
                    if operation.operator == "TD" {
                        leading = -ty;
                    }
                    line_matrix = Matrix::translation(tx, ty).concat(line_matrix);
                    let (x, y) = line_matrix.origin();
                    current_origin = ctm.apply(x, y);
                }
            }
            "T*" => {
                flush_span(&mut spans, &mut current_text, current_origin);
                line_matrix = Matrix::translation(0.0, -leading).concat(line_matrix);
                let (x, y) = line_matrix.origin();
                current_origin = ctm.apply(x, y);
            }
            "Tj" | "TJ" => {
                collect_show_text(&mut current_text, current_encoding, &operation.operands);
            }
            "'" | "\"" => {
                flush_span(&mut spans, &mut current_text, current_origin);
                line_matrix = Matrix::translation(0.0, -leading).concat(line_matrix);
                let (x, y) = line_matrix.origin();
                current_origin = ctm.apply(x, y);
                collect_show_text(&mut current_text, current_encoding, &operation.operands);
            }

            "m" => {
                let x = operation.operands.first().and_then(operand_number);
                let y = operation.operands.get(1).and_then(operand_number);
                if let (Some(x), Some(y)) = (x, y) {
                    let point = ctm.apply(x, y);
                    current_point = Some(point);
                    subpath_start = Some(point);
                }
            }
            "l" => {
                let x = operation.operands.first().and_then(operand_number);
                let y = operation.operands.get(1).and_then(operand_number);
                if let (Some(x), Some(y), Some(from)) = (x, y, current_point) {
                    let to = ctm.apply(x, y);
                    subpath.push(RuleSegment {
                        x0: from.0,
                        y0: from.1,
                        x1: to.0,
                        y1: to.1,
                    });
                    current_point = Some(to);
                }
            }
            "h" => {
                if let (Some(from), Some(start)) = (current_point, subpath_start) {
                    subpath.push(RuleSegment {
                        x0: from.0,
                        y0: from.1,
                        x1: start.0,
                        y1: start.1,
                    });
                    current_point = Some(start);
                }
            }
            "re" => {
                let x = operation.operands.first().and_then(operand_number);
                let y = operation.operands.get(1).and_then(operand_number);
                let w = operation.operands.get(2).and_then(operand_number);
                let h = operation.operands.get(3).and_then(operand_number);
                if let (Some(x), Some(y), Some(w), Some(h)) = (x, y, w, h) {
                    let corners = [
                        ctm.apply(x, y),
                        ctm.apply(x + w, y),
                        ctm.apply(x + w, y + h),
                        ctm.apply(x, y + h),
                    ];
                    for index in 0..4 {
                        let from = corners[index];
                        let to = corners[(index + 1) % 4];
                        subpath.push(RuleSegment {
                            x0: from.0,
                            y0: from.1,
                            x1: to.0,
                            y1: to.1,
                        });
                    }
                    current_point = Some(corners[0]);
                    subpath_start = Some(corners[0]);
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                rules.append(&mut subpath);
                current_point = None;
                subpath_start = None;
            }
            "n" => {
                subpath.clear();
                current_point = None;
                subpath_start = None;
            }
            _ => {}
        }
    }
    flush_span(&mut spans, &mut current_text, current_origin);

    if spans.is_empty() && rules.is_empty() {
        None
    } else {
        Some(PageContent {
            page_number,
            spans,
            rules,
        })
    }
}

fn collect_pages(
    document: &Document,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, PipelineError> {
    let pages_map = document.get_pages();

    let mut pages = Vec::new();
    for (page_no, page_id) in &pages_map {
        if let Some(selection) = page_selection {
            if !selection.contains(*page_no) {
                continue;
            }
        }

        let content = collect_page_content(document, *page_no, *page_id).unwrap_or(PageContent {
            page_number: *page_no,
            spans: Vec::new(),
            rules: Vec::new(),
        });
        pages.push(content);
    }

    if pages.is_empty() {
        return Err(PipelineError::NoPagesSelected);
    }

    Ok(pages)
}

pub(crate) fn read_pdf_pages(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, PipelineError> {
    let document = Document::load(input_pdf)?;
    collect_pages(&document, page_selection)
}

pub(crate) fn read_pdf_pages_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, PipelineError> {
    let document = Document::load_mem(input_pdf)?;
    collect_pages(&document, page_selection)
}
