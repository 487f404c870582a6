//! JSON interchange document.
//!
//! The document shape is owned by the serde derives on
//! [`HoldConfiguration`]: `wallImage`, `imageWidth`, `imageHeight`,
//! `version` and `holds`, each hold carrying `id`, its bounding box and
//! `polygon: [{x, y}, ...]`.

use holdtrace_core::HoldConfiguration;

/// Errors from reading or writing a hold configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The document is not valid JSON or does not match the schema.
    #[error("hold configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document's major version is not one this build reads.
    #[error("unsupported hold configuration version {0:?}")]
    UnsupportedVersion(String),
}

/// Serialize `config` as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(config: &HoldConfiguration) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(config)?)
}

/// Parse a JSON document produced by [`to_json`].
///
/// Any minor revision of the current major version is accepted.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed input and
/// [`ExportError::UnsupportedVersion`] for a different major version.
pub fn from_json(input: &str) -> Result<HoldConfiguration, ExportError> {
    let config: HoldConfiguration = serde_json::from_str(input)?;
    if major(&config.version) != major(HoldConfiguration::VERSION) {
        return Err(ExportError::UnsupportedVersion(config.version));
    }
    Ok(config)
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version).trim()
}
