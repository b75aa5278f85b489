use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::PipelineError;

pub const DEFAULT_SOURCE_URL: &str = "https://www.gov.br/ans/pt-br/acesso-a-informacao/participacao-da-sociedade/atualizacao-do-rol-de-procedimentos";
pub const DEFAULT_KEYWORDS: &[&str] = &["anexo i", "anexo ii"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnexLink {
    pub label: String,
    pub url: String,
    pub file_name: String,
}

pub fn extract_annex_links(
    html: &str,
    source_url: &str,
    keywords: &[&str],
) -> Result<Vec<AnnexLink>, PipelineError> {
    let base_url = Url::parse(source_url).map_err(|error| PipelineError::InvalidUrl {
        url: source_url.to_string(),
        reason: error.to_string(),
    })?;
    let anchor_re = Regex::new(
        r#"(?is)<a[^>]*href\s*=\s*["'](?P<href>[^"'#>]+\.pdf(?:\?[^"'#>]*)?)["'][^>]*>(?P<text>.*?)</a>"#,
    )
    .map_err(|error| PipelineError::InvalidOption(error.to_string()))?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for capture in anchor_re.captures_iter(html) {
        let Some(href_match) = capture.name("href") else {
            continue;
        };
        let href = href_match.as_str().trim();
        let joined_url = match base_url.join(href) {
            Ok(url) => url,
            Err(_) => continue,
        };

        let raw_text = capture
            .name("text")
            .map(|value| value.as_str())
            .unwrap_or_default();
        let label = strip_html_tags(raw_text).trim().to_string();
        let lowered = label.to_lowercase();
        if !keywords.iter().any(|keyword| lowered.contains(keyword)) {
            continue;
        }

        let Some(file_name) = file_name_from_url(&joined_url) else {
            continue;
        };

        if seen.insert(joined_url.to_string()) {
            links.push(AnnexLink {
                label,
                url: joined_url.to_string(),
                file_name,
            });
        }
    }

    Ok(links)
}

fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| last.to_string());
    Some(decoded)
}

fn strip_html_tags(input: &str) -> String {
    let tags_re = Regex::new(r"(?is)<[^>]+>").expect("hardcoded HTML tags regex is valid");
    tags_re.replace_all(input, " ").to_string()
}

fn http_client() -> Result<reqwest::blocking::Client, PipelineError> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| PipelineError::Download {
            url: String::new(),
            reason: error.to_string(),
        })
}

fn fetch_bytes(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, PipelineError> {
    let response = client
        .get(url)
        .send()
        .map_err(|error| PipelineError::Download {
            url: url.to_string(),
            reason: if error.is_timeout() {
                "request timed out".to_string()
            } else {
                error.to_string()
            },
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Download {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }

    let bytes = response
        .bytes()
        .map_err(|error| PipelineError::Download {
            url: url.to_string(),
            reason: error.to_string(),
        })?
        .to_vec();
    if bytes.is_empty() {
        return Err(PipelineError::Download {
            url: url.to_string(),
            reason: "response body is empty".to_string(),
        });
    }
    Ok(bytes)
}

pub fn fetch_annex_links(
    source_url: &str,
    keywords: &[&str],
) -> Result<Vec<AnnexLink>, PipelineError> {
    let client = http_client()?;
    let body = fetch_bytes(&client, source_url)?;
    let html = String::from_utf8_lossy(&body);
    extract_annex_links(&html, source_url, keywords)
}

pub fn download_annexes(
    links: &[AnnexLink],
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    let client = http_client()?;
    fs::create_dir_all(dest_dir)?;

    let mut downloaded = Vec::new();
    for link in links {
        info!("downloading {}", link.file_name);
        let bytes = fetch_bytes(&client, &link.url)?;
        let path = dest_dir.join(&link.file_name);
        fs::write(&path, bytes)?;
        downloaded.push(path);
    }

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_KEYWORDS, extract_annex_links};

    const SOURCE: &str = "https://www.gov.br/ans/pt-br/rol";

    #[test]
    fn keeps_only_keyword_matching_pdf_links() {
        let html = r#"
            <a href="/arquivos/Anexo_I_Rol_2021.pdf"><strong>Anexo I</strong> - Lista</a>
            <a href="/arquivos/Anexo_II_DUT.pdf">Anexo II - Diretrizes</a>
            <a href="/arquivos/edital.pdf">Edital de abertura</a>
            <a href="/paginas/anexo-i.html">Anexo I em HTML</a>
        "#;

        let links = extract_annex_links(html, SOURCE, DEFAULT_KEYWORDS).expect("extract links");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].file_name, "Anexo_I_Rol_2021.pdf");
        assert_eq!(
            links[0].url,
            "https://www.gov.br/arquivos/Anexo_I_Rol_2021.pdf"
        );
        assert_eq!(links[1].file_name, "Anexo_II_DUT.pdf");
    }

    #[test]
    fn deduplicates_repeated_urls() {
        let html = r#"
            <a href="/a/Anexo_I.pdf">Anexo I</a>
            <a href="/a/Anexo_I.pdf">Anexo I (link repetido)</a>
        "#;

        let links = extract_annex_links(html, SOURCE, DEFAULT_KEYWORDS).expect("extract links");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn decodes_percent_escaped_file_names() {
        let html = r#"<a href="/a/Anexo%20I%20Rol.pdf">Anexo I</a>"#;

        let links = extract_annex_links(html, SOURCE, DEFAULT_KEYWORDS).expect("extract links");
        assert_eq!(links[0].file_name, "Anexo I Rol.pdf");
    }

    #[test]
    fn rejects_invalid_source_url() {
        let error =
            extract_annex_links("", "not a url", DEFAULT_KEYWORDS).expect_err("should fail");
        assert!(error.to_string().contains("invalid URL"));
    }
}
