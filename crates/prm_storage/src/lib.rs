use std::sync::Arc;

use prm_core::config::JobSettings;
use prm_core::{Error, JobStore, Result};

pub mod backends;

pub use backends::*;

/// Build the job store named by `kind`. Only the in-memory backend exists;
/// the name is kept so a durable backend can be slotted in later.
pub fn create_store(kind: &str, settings: &JobSettings) -> Result<Arc<dyn JobStore>> {
    match kind {
        "memory" => {
            let config = MemoryConfig::from_settings(settings);
            tracing::info!(
                "🏦 Job store initialized (memory, max {} entries, ttl {}s)",
                config.max_entries.map_or_else(|| "∞".to_string(), |n| n.to_string()),
                config.ttl.map_or(0, |t| t.as_secs())
            );
            Ok(Arc::new(InMemoryJobStore::new(config)))
        }
        other => Err(Error::Config(format!("Unknown job store backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_store;
}

#[cfg(test)]
mod tests {
    use super::*;
    use prm_core::config::Settings;

    #[tokio::test]
    async fn test_create_memory_store() {
        let settings = Settings::default();
        let store = create_store("memory", &settings.jobs).unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_unknown_backend() {
        let settings = Settings::default();
        assert!(matches!(create_store("sqlite", &settings.jobs), Err(Error::Config(_))));
    }
}
