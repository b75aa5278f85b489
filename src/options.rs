use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!("invalid range '{token}': end is smaller than start"));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    #[must_use]
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, label)| (code.as_str(), label.as_str()))
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::new(vec![
            ("OD".to_string(), "Seg. Odontológica".to_string()),
            ("AMB".to_string(), "Seg. Ambulatorial".to_string()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNaming {
    pub prefix: String,
    pub extension: String,
}

impl Default for DocumentNaming {
    fn default() -> Self {
        Self {
            prefix: "Anexo_I_".to_string(),
            extension: ".pdf".to_string(),
        }
    }
}

impl DocumentNaming {
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.extension)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub delimiter: u8,
    pub column_map: ColumnMap,
    pub rule_tolerance: f32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            delimiter: b',',
            column_map: ColumnMap::default(),
            rule_tolerance: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub naming: DocumentNaming,
    pub csv_name: String,
    pub zip_name: String,
    pub keep_intermediates: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            naming: DocumentNaming::default(),
            csv_name: "rol_procedimentos.csv".to_string(),
            zip_name: "rol_procedimentos.zip".to_string(),
            keep_intermediates: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ColumnMap, DocumentNaming, PageSelection};

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn default_column_map_covers_coverage_codes() {
        let map = ColumnMap::default();
        let entries = map.entries().collect::<Vec<_>>();
        assert_eq!(
            entries,
            vec![
                ("OD", "Seg. Odontológica"),
                ("AMB", "Seg. Ambulatorial"),
            ]
        );
    }

    #[test]
    fn document_naming_requires_prefix_and_extension() {
        let naming = DocumentNaming::default();
        assert!(naming.matches("Anexo_I_Rol_2021.pdf"));
        assert!(!naming.matches("Anexo_II_Rol_2021.pdf"));
        assert!(!naming.matches("Anexo_I_Rol_2021.xlsx"));
    }
}
