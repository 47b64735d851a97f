use std::sync::Arc;

use clap::{Parser, Subcommand};
use prm_core::config::{load_dotenv, ScrapeMethod, Settings};
use prm_core::{InferenceModel, JobStatusView};
use prm_inference::{create_model, AnalyzerConfig, ArticleAnalyzer};
use prm_jobs::{start_scheduler, JobRunner};
use prm_mailer::{DigestNotifier, SmtpMailer};
use prm_scrapers::{create_scraper_factory, init_logging, ScraperManager};
use prm_web::AppState;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "prm", author, version, about = "China press release monitor", long_about = None)]
pub struct Cli {
    /// Job store backend
    #[arg(long, global = true, default_value = "memory")]
    storage: String,
    /// Extraction method: dom (selectors) or agent (language model)
    #[arg(long, global = true)]
    method: Option<ScrapeMethod>,
    /// Base URL of the chat-completions API
    #[arg(long, global = true)]
    model_url: Option<String>,
    /// Minimum relevance score (1-7) for an article to be kept
    #[arg(long, global = true)]
    threshold: Option<i32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the daily scheduled scrape
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one scrape in the foreground and print the job as JSON
    Scrape {
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Skip the digest email
        #[arg(long)]
        no_email: bool,
    },
    /// Extract a single article page and print it as JSON
    Url { url: String },
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(method) = self.method {
            settings.scraper.method = method;
        }
        if let Some(model_url) = &self.model_url {
            settings.inference.model_url = model_url.clone();
        }
        if let Some(threshold) = self.threshold {
            settings.inference.relevance_threshold = threshold;
        }
        if let Commands::Serve { bind: Some(bind) } = &self.command {
            settings.server.bind_addr = bind.clone();
        }
    }
}

fn build_runner(
    cli: &Cli,
    settings: &Settings,
    model: Arc<dyn InferenceModel>,
    send_email: bool,
) -> anyhow::Result<Arc<JobRunner>> {
    let store = prm_storage::create_store(&cli.storage, &settings.jobs)?;
    let factory = create_scraper_factory(&settings.scraper, Some(model.clone()))?;
    let scraper = ScraperManager::from_settings(factory, &settings.scraper);
    let analyzer = ArticleAnalyzer::new(model, AnalyzerConfig::from_settings(&settings.inference));
    let notifier = send_email.then(|| {
        let transport = Arc::new(SmtpMailer::from_settings(&settings.mail));
        DigestNotifier::from_settings(transport, &settings.mail)
    });
    info!(
        "🦗 Scraper ready ({} method, {} concurrent, threshold {})",
        settings.scraper.method, settings.scraper.max_concurrency, settings.inference.relevance_threshold
    );
    Ok(Arc::new(JobRunner::new(store, scraper, analyzer, notifier)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_warning = load_dotenv();
    init_logging();
    if let Some(warning) = dotenv_warning {
        tracing::warn!("{}", warning);
    }
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    cli.apply(&mut settings);
    info!("⚙️ Settings loaded: {:?}", settings);

    match &cli.command {
        Commands::Serve { .. } => {
            let model = create_model(&settings.inference)?;
            let runner = build_runner(&cli, &settings, model, true)?;
            let _scheduler = start_scheduler(runner.clone(), &settings.jobs).await?;
            prm_web::serve(AppState::new(runner), &settings.server.bind_addr).await?;
        }
        Commands::Scrape { pages, no_email } => {
            let model = create_model(&settings.inference)?;
            let runner = build_runner(&cli, &settings, model, !no_email)?;
            let job_id = runner.store().create().await?;
            runner.run(&job_id, *pages).await?;

            let job = runner.store().get(&job_id).await?;
            println!("{}", serde_json::to_string_pretty(&JobStatusView::from(&job))?);
        }
        Commands::Url { url } => {
            let model = match settings.scraper.method {
                ScrapeMethod::Agent => Some(create_model(&settings.inference)?),
                ScrapeMethod::Dom => None,
            };
            let factory = create_scraper_factory(&settings.scraper, model)?;
            let manager = ScraperManager::from_settings(factory, &settings.scraper);
            info!("Scraping single URL: {}", url);
            let article = manager.scrape_url(url).await?;
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
    }

    Ok(())
}
