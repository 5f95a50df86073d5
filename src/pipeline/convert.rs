//! Single-document conversion through named phases.

use tracing::{error, info};

use crate::capabilities::Extractor;
use crate::error::{ServiceError, ServiceResult, CONVERSION};
use crate::progress::ProgressObserver;

pub const PHASE_LOADING: &str = "Loading document";
pub const PHASE_EXTRACTING: &str = "Extracting text";
pub const PHASE_GENERATING: &str = "Generating markdown";

/// Phases announced by [`convert_document`], in order.
pub const CONVERSION_PHASES: [&str; 3] = [PHASE_LOADING, PHASE_EXTRACTING, PHASE_GENERATING];

/// Convert a binary document to markdown.
///
/// Each phase is announced to the observer as it starts. There is one unit
/// of work, so no percentages are reported. The extractor's markdown is
/// returned as produced.
pub async fn convert_document(
    bytes: Vec<u8>,
    extractor: &dyn Extractor,
    observer: &dyn ProgressObserver,
) -> ServiceResult<String> {
    begin_phase(observer, PHASE_LOADING).await?;
    if bytes.is_empty() {
        return Err(ServiceError::transformation(CONVERSION, "document is empty"));
    }
    info!(bytes = bytes.len(), extractor = extractor.name(), "Converting document");

    begin_phase(observer, PHASE_EXTRACTING).await?;
    let raw = extractor.convert_to_markdown(bytes).await.map_err(|e| {
        error!(error = %e, "Extraction failed");
        ServiceError::transformation(CONVERSION, e)
    })?;

    begin_phase(observer, PHASE_GENERATING).await?;
    if raw.trim().is_empty() {
        return Err(ServiceError::transformation(
            CONVERSION,
            "no text could be extracted",
        ));
    }

    info!(chars = raw.len(), "Conversion complete");
    Ok(raw)
}

async fn begin_phase(observer: &dyn ProgressObserver, phase: &str) -> ServiceResult<()> {
    if observer.is_cancelled() {
        return Err(ServiceError::cancelled(CONVERSION));
    }
    observer.on_activity(phase).await;
    Ok(())
}
