use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use voxnote_core::{AppConfig, VoiceRef};
use voxnote_pipeline::{Pipeline, PipelineOptions};
use voxnote_store::ActivityStore;

#[derive(Parser)]
#[command(name = "voxnote", about = "Telegram bot that transcribes voice messages")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Transcribe a single local audio file, print the reply and exit
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("voxnote starting");

    let artifact_dir = config.audio.artifact_dir();
    std::fs::create_dir_all(&artifact_dir)
        .with_context(|| format!("failed to create artifact dir {:?}", artifact_dir))?;

    // The model is loaded exactly once and shared by every run.
    let registry = voxnote_engine::PluginRegistry::new();
    let engine_name = config.recognition.engine.as_str();
    let engine_config = config
        .recognition
        .engine_config()
        .context("invalid recognition config")?;
    let backend = registry
        .load(engine_name, engine_config)
        .await
        .with_context(|| {
            format!(
                "failed to load recognition engine '{engine_name}' (available: {:?})",
                registry.list_engines()
            )
        })?;
    tracing::info!(
        engine = engine_name,
        mode = ?config.recognition.mode,
        "recognition backend ready"
    );

    let options = PipelineOptions::from_config(&config);

    if let Some(path) = cli.file {
        let fetcher = Arc::new(voxnote_audio::LocalFileFetcher::new(&artifact_dir));
        let pipeline = Pipeline::new(fetcher, Arc::clone(&backend), options);
        let voice = VoiceRef::new(path.to_string_lossy());
        let reply = pipeline
            .try_run(&voice)
            .await
            .with_context(|| format!("failed to transcribe {:?}", path))?;
        println!("{reply}");
        backend.shutdown().await?;
        return Ok(());
    }

    let telegram = config
        .telegram
        .as_ref()
        .context("[telegram] section is required unless --file is given")?;

    let client = Arc::new(voxnote_telegram::TelegramClient::new(
        &telegram.token,
        &telegram.api_url,
    ));
    let fetcher = Arc::new(voxnote_telegram::TelegramFetcher::new(
        Arc::clone(&client),
        &artifact_dir,
    ));
    let pipeline = Arc::new(Pipeline::new(fetcher, Arc::clone(&backend), options));

    let store: Arc<dyn ActivityStore> = match config.store {
        Some(ref store_cfg) => {
            tracing::info!(url = %store_cfg.url, "activity store enabled");
            Arc::new(voxnote_store::SupabaseStore::from_config(store_cfg))
        }
        None => Arc::new(voxnote_store::NullStore),
    };

    let mut host = voxnote_telegram::BotHost::new(client, pipeline, store, telegram);
    host.start();
    tracing::info!("bot running, press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    tracing::info!("shutting down");
    host.shutdown().await;
    backend.shutdown().await?;

    Ok(())
}
