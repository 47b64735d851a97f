use std::sync::Arc;

use prm_core::config::InferenceSettings;
use prm_core::Result;

pub mod deepseek;

pub use prm_core::InferenceModel;

/// Build the language model backend described by the settings.
pub fn create_model(settings: &InferenceSettings) -> Result<Arc<dyn InferenceModel>> {
    let model = deepseek::DeepSeekModel::with_endpoint(
        settings.api_key.clone(),
        &settings.model_url,
        &settings.model_name,
    )?;
    tracing::info!("🧠 Inference model initialized ({} at {})", settings.model_name, model.base_url());
    Ok(Arc::new(model))
}
