//! Runtime glue for the Vitalis conversational core.
//!
//! - `init_tracing` / `init_tracing_with` install the global subscriber (text or JSON output,
//!   plus the optional UI event channel)
//! - `bootstrap_conversation` assembles a `ConversationUseCase` from the
//!   configuration file and the two external services

pub mod tracing_layer;

pub use tracing_layer::{ConversationEvent, ConversationEventLayer};

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vitalis_application::{ConversationUseCase, ResponseCache};
use vitalis_core::generation::GenerationService;
use vitalis_core::session::SessionTransport;
use vitalis_infrastructure::ConfigService;

/// Options for [`init_tracing`].
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Filter used when `RUST_LOG` is unset (e.g. `"info,vitalis_application=debug"`)
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Channel receiving conversation events for the UI
    pub events: Option<mpsc::UnboundedSender<ConversationEvent>>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            events: None,
        }
    }
}

/// Installs a text subscriber with `filter` as the default directive.
pub fn init_tracing(filter: &str) -> anyhow::Result<()> {
    init_tracing_with(LoggingOptions {
        filter: filter.to_string(),
        ..Default::default()
    })
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `options.filter`.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing_with(options: LoggingOptions) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.filter)
            .with_context(|| format!("Invalid log filter '{}'", options.filter))?,
    };
    let events = options.events.map(ConversationEventLayer::new);
    let registry = tracing_subscriber::registry().with(filter).with(events);

    if options.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    }
    .context("Failed to install tracing subscriber")?;

    tracing::debug!("[Execution] Tracing initialized (json: {})", options.json);
    Ok(())
}

/// Builds a ready-to-start conversation from `config_service`.
///
/// The response cache gets the configured TTL and a background sweeper
/// running once per TTL. Must be called inside a tokio runtime.
///
/// # Errors
///
/// Fails if the loaded configuration does not validate.
pub async fn bootstrap_conversation(
    generation: Arc<dyn GenerationService>,
    transport: Arc<dyn SessionTransport>,
    config_service: &ConfigService,
) -> anyhow::Result<Arc<ConversationUseCase>> {
    let config = config_service.get_config();
    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
    let sweep_period = config.cache_ttl();

    let conversation = ConversationUseCase::new(generation, transport, cache, config)
        .context("Invalid orchestrator configuration")?;
    conversation.start_cache_sweeper(sweep_period);

    tracing::info!("[Execution] Conversation assembled");
    Ok(Arc::new(conversation))
}
