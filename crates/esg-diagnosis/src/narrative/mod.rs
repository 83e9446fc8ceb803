mod fallback;
mod gemini;
mod prompt;

pub use fallback::StaticNarrator;
pub use gemini::GeminiNarrator;

use crate::config::NarrativeConfig;
use crate::diagnosis::IndicatorCatalog;
use crate::diagnosis::domain::{DiagnosisResult, ReportSuggestions};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("narrative response could not be parsed: {0}")]
    Malformed(String),
}

/// The narrative backend picked at startup.
///
/// With a configured API key the live generative endpoint is used; without
/// one the canned generator stands in so the flow stays usable offline.
pub enum Narrator {
    Gemini(GeminiNarrator),
    Static(StaticNarrator),
}

impl Narrator {
    pub fn from_config(config: &NarrativeConfig) -> Self {
        match &config.api_key {
            Some(api_key) => {
                info!(model = %config.model, "narrative generation uses the live endpoint");
                Self::Gemini(GeminiNarrator::new(api_key.clone(), config))
            }
            None => {
                info!("no narrative API key configured, using canned suggestions");
                Self::Static(StaticNarrator)
            }
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Gemini(_))
    }

    pub async fn generate(
        &self,
        catalog: &IndicatorCatalog,
        result: &DiagnosisResult,
    ) -> Result<ReportSuggestions, NarrativeError> {
        match self {
            Self::Gemini(narrator) => narrator.generate(catalog, result).await,
            Self::Static(narrator) => Ok(narrator.generate(result)),
        }
    }
}
