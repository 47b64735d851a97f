use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "deepseek-chat";
pub const DEFAULT_SCHEDULE: &str = "0 0 2 * * *";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMethod {
    /// Deterministic selector-based extraction
    Dom,
    /// Extraction delegated to the language model
    Agent,
}

impl FromStr for ScrapeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dom" => Ok(ScrapeMethod::Dom),
            "agent" => Ok(ScrapeMethod::Agent),
            other => Err(Error::Config(format!("Unknown scrape method: {}", other))),
        }
    }
}

impl fmt::Display for ScrapeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeMethod::Dom => write!(f, "dom"),
            ScrapeMethod::Agent => write!(f, "agent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub method: ScrapeMethod,
    pub max_concurrency: usize,
    pub article_delay: Duration,
    pub request_timeout: Duration,
    pub max_content_chars: usize,
}

#[derive(Clone)]
pub struct InferenceSettings {
    pub api_key: Option<String>,
    pub model_url: String,
    pub model_name: String,
    pub relevance_threshold: i32,
    pub max_tags: usize,
}

impl fmt::Debug for InferenceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceSettings")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_url", &self.model_url)
            .field("model_name", &self.model_name)
            .field("relevance_threshold", &self.relevance_threshold)
            .field("max_tags", &self.max_tags)
            .finish()
    }
}

#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub password: Option<String>,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("subject", &self.subject)
            .field("password", &self.password.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct JobSettings {
    pub max_entries: usize,
    pub ttl: Duration,
    pub schedule: String,
    pub scheduled_pages: usize,
}

/// Process-wide settings: defaults, overridden by `.env` and the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub scraper: ScraperSettings,
    pub inference: InferenceSettings,
    pub mail: MailSettings,
    pub jobs: JobSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_addr: DEFAULT_BIND_ADDR.to_string(),
            },
            scraper: ScraperSettings {
                method: ScrapeMethod::Dom,
                max_concurrency: 5,
                article_delay: Duration::from_millis(500),
                request_timeout: Duration::from_secs(30),
                max_content_chars: 10_000,
            },
            inference: InferenceSettings {
                api_key: None,
                model_url: DEFAULT_MODEL_URL.to_string(),
                model_name: DEFAULT_MODEL_NAME.to_string(),
                relevance_threshold: 5,
                max_tags: 5,
            },
            mail: MailSettings {
                smtp_host: "smtp.gmail.com".to_string(),
                sender: "press-monitor@localhost".to_string(),
                recipients: Vec::new(),
                subject: "here's the latest China press release".to_string(),
                password: None,
            },
            jobs: JobSettings {
                max_entries: 1000,
                ttl: Duration::from_secs(24 * 60 * 60),
                schedule: DEFAULT_SCHEDULE.to_string(),
                scheduled_pages: 1,
            },
        }
    }
}

/// Export the nearest `.env` file into the process environment without
/// overriding variables that are already set. Binaries call this before
/// installing the log subscriber so `RUST_LOG` from `.env` takes effect.
///
/// Returns a warning when a `.env` file exists but cannot be read; it is
/// returned rather than logged because logging may not be set up yet.
pub fn load_dotenv() -> Option<String> {
    dotenv_warning(dotenvy::dotenv().map(|_| ()))
}

/// Same as [`load_dotenv`] for an explicit file.
pub fn load_dotenv_from(path: &std::path::Path) -> Option<String> {
    dotenv_warning(dotenvy::from_path(path))
}

fn dotenv_warning(result: std::result::Result<(), dotenvy::Error>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(format!("Failed to load .env file: {}", e)),
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Some(warning) = load_dotenv() {
            tracing::warn!("{}", warning);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get("PRM_BIND_ADDR") {
            settings.server.bind_addr = addr;
        }

        if let Some(method) = get("PRM_SCRAPE_METHOD") {
            settings.scraper.method = method.parse()?;
        }
        if let Some(v) = get("PRM_MAX_CONCURRENCY") {
            settings.scraper.max_concurrency = parse_number("PRM_MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("PRM_ARTICLE_DELAY_MS") {
            settings.scraper.article_delay = Duration::from_millis(parse_number("PRM_ARTICLE_DELAY_MS", &v)?);
        }
        if let Some(v) = get("PRM_REQUEST_TIMEOUT_SECS") {
            settings.scraper.request_timeout = Duration::from_secs(parse_number("PRM_REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("PRM_MAX_CONTENT_CHARS") {
            settings.scraper.max_content_chars = parse_number("PRM_MAX_CONTENT_CHARS", &v)?;
        }

        settings.inference.api_key = get("DEEPSEEK_API_KEY");
        if let Some(url) = get("PRM_MODEL_URL") {
            settings.inference.model_url = url;
        }
        if let Some(name) = get("PRM_MODEL_NAME") {
            settings.inference.model_name = name;
        }
        if let Some(v) = get("PRM_RELEVANCE_THRESHOLD") {
            settings.inference.relevance_threshold = parse_number("PRM_RELEVANCE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("PRM_MAX_TAGS") {
            settings.inference.max_tags = parse_number("PRM_MAX_TAGS", &v)?;
        }

        settings.mail.password = get("EMAIL_PASSWORD");
        if let Some(host) = get("PRM_SMTP_HOST") {
            settings.mail.smtp_host = host;
        }
        if let Some(sender) = get("PRM_MAIL_SENDER") {
            settings.mail.sender = sender;
        }
        if let Some(recipients) = get("PRM_MAIL_RECIPIENTS") {
            settings.mail.recipients = recipients
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Some(subject) = get("PRM_MAIL_SUBJECT") {
            settings.mail.subject = subject;
        }

        if let Some(v) = get("PRM_JOB_MAX_ENTRIES") {
            settings.jobs.max_entries = parse_number("PRM_JOB_MAX_ENTRIES", &v)?;
        }
        if let Some(v) = get("PRM_JOB_TTL_SECS") {
            settings.jobs.ttl = Duration::from_secs(parse_number("PRM_JOB_TTL_SECS", &v)?);
        }
        if let Some(schedule) = get("PRM_SCHEDULE") {
            settings.jobs.schedule = schedule;
        }
        if let Some(v) = get("PRM_SCHEDULED_PAGES") {
            settings.jobs.scheduled_pages = parse_number("PRM_SCHEDULED_PAGES", &v)?;
        }

        Ok(settings)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.server.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(settings.scraper.method, ScrapeMethod::Dom);
        assert_eq!(settings.scraper.max_concurrency, 5);
        assert_eq!(settings.scraper.article_delay, Duration::from_millis(500));
        assert_eq!(settings.inference.relevance_threshold, 5);
        assert!(settings.inference.api_key.is_none());
        assert_eq!(settings.jobs.schedule, DEFAULT_SCHEDULE);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("PRM_SCRAPE_METHOD", "Agent"),
            ("PRM_RELEVANCE_THRESHOLD", "4"),
            ("PRM_MAIL_RECIPIENTS", "a@example.com, b@example.com,"),
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("PRM_JOB_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(settings.scraper.method, ScrapeMethod::Agent);
        assert_eq!(settings.inference.relevance_threshold, 4);
        assert_eq!(settings.mail.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(settings.inference.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.jobs.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Settings::from_lookup(lookup(&[("PRM_MAX_CONCURRENCY", "five")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = Settings::from_lookup(lookup(&[
            ("DEEPSEEK_API_KEY", "sk-secret"),
            ("EMAIL_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_dotenv_is_exported_to_process_environment() {
        let path = std::env::temp_dir().join(format!("prm-dotenv-{}.env", std::process::id()));
        std::fs::write(&path, "PRM_DOTENV_EXPORT_CHECK=debug\n").unwrap();

        assert_eq!(load_dotenv_from(&path), None);
        assert_eq!(std::env::var("PRM_DOTENV_EXPORT_CHECK").as_deref(), Ok("debug"));

        std::fs::remove_file(&path).unwrap();
        assert_eq!(load_dotenv_from(&path), None);
    }
}
