use std::sync::Arc;

use anyhow::Context;

use interview_coach::channels::{CliChannel, TelegramChannel, TelegramConfig, Transport};
use interview_coach::coach::Coach;
use interview_coach::config::CoachConfig;
use interview_coach::dispatcher::Dispatcher;
use interview_coach::document::PdfExtractor;
use interview_coach::llm::{LlmConfig, create_gateway};
use interview_coach::routes::status_routes;
use interview_coach::runner::Runner;
use interview_coach::session::ConversationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let coach_config = CoachConfig::from_env().context("invalid coach configuration")?;
    let llm_config = LlmConfig::from_env().context("invalid LLM configuration")?;

    eprintln!("🎯 Interview Coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {:?}", llm_config.backend);
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Follow-ups per session: {}", coach_config.follow_up_limit);

    // Create generation gateway
    let gateway = create_gateway(&llm_config)?;

    let store = ConversationStore::new();

    // Spawn status server
    if let Some(port) = coach_config.http_port {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind status server on port {port}"))?;
        let app = status_routes(Arc::clone(&store));
        eprintln!("   Status API: http://0.0.0.0:{port}/api/health");
        tokio::spawn(async move {
            tracing::info!(port, "Status server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Status server stopped");
            }
        });
    } else {
        eprintln!("   Status API: disabled");
    }

    // Telegram when a bot token is set, otherwise a local REPL
    let transport: Arc<dyn Transport> = match TelegramConfig::from_env() {
        Some(telegram_config) => {
            let telegram = TelegramChannel::new(telegram_config);
            telegram.health_check().await?;
            if let Err(e) = telegram.register_commands().await {
                tracing::warn!(error = %e, "Could not register Telegram commands");
            }
            eprintln!("   Channel: telegram\n");
            Arc::new(telegram)
        }
        None => {
            eprintln!("   Channel: cli (send @path/to/resume.pdf to upload)\n");
            Arc::new(CliChannel::new())
        }
    };

    let coach = Arc::new(Coach::new(
        gateway,
        Arc::new(PdfExtractor::new()),
        coach_config,
    ));
    let dispatcher = Arc::new(Dispatcher::new(store, coach, Arc::clone(&transport)));

    let events = transport.start().await?;
    Runner::new(dispatcher).run(events).await;

    Ok(())
}
