use tracing::debug;

use crate::error::PipelineError;
use crate::options::DocumentNaming;
use crate::warning::{ExtractWarning, WarningCode};

pub(crate) fn find_source_document(
    names: &[String],
    naming: &DocumentNaming,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<String, PipelineError> {
    let matches = names
        .iter()
        .filter(|name| naming.matches(name.as_str()))
        .collect::<Vec<_>>();

    let Some(first) = matches.first() else {
        return Err(PipelineError::SourceDocumentNotFound {
            prefix: naming.prefix.clone(),
            extension: naming.extension.clone(),
            candidates: names.len(),
        });
    };

    // first-match-wins is the accepted policy when the archive carries duplicates
    if matches.len() > 1 {
        warnings.push(
            ExtractWarning::new(
                WarningCode::MultipleSourceMatches,
                format!("{} candidates match; selected '{first}'", matches.len()),
            )
            .with_count(matches.len()),
        );
    }

    debug!("selected source document '{first}'");
    Ok((*first).clone())
}
