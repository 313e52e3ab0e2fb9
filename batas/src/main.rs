use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batas::config::Config;
use batas::models::ChatMode;
use batas::services::KnowledgeService;

#[derive(Parser)]
#[command(name = "batas")]
#[command(about = "Legal question-answering gateway over an external knowledge base")]
struct Args {
    /// The question to answer
    question: String,

    /// Interaction mode: consultation or case_assessment
    #[arg(long, default_value = "consultation")]
    mode: String,

    /// Only search the knowledge base, skip answering
    #[arg(long)]
    search: bool,

    /// Result limit for --search
    #[arg(long, default_value_t = 12)]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    if !config.kb.enabled {
        tracing::warn!("KB_ENABLED is false — every chat will return the disabled sentinel");
    }

    let service = KnowledgeService::new(config)?;

    if args.search {
        let entries = service.search_knowledge_base(&args.question, args.limit).await;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mode: ChatMode = args.mode.parse().unwrap_or_default();
    let response = service.chat_with_knowledge_base(&args.question, mode).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
