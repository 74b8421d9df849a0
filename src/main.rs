use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use lectern::{
    Cleaner, CommandExtractor, CommandTranscriber, Config, FfmpegBackend, LectureIngestion,
    LectureStore, NotePipeline, OpenRouterMerger, SledStore,
};

#[derive(Parser)]
#[command(name = "lectern", about = "Lecture recording + document → merged notes")]
struct Cli {
    /// Config file (TOML, extension omitted)
    #[arg(long, default_value = "config/lectern")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve,
    /// Run the full pipeline once: document + media → merged notes
    Process {
        document_url: String,
        media_url: String,
        /// Generated when omitted
        lecture_id: Option<String>,
    },
    /// Run only lecture ingestion (media → transcript)
    Ingest {
        lecture_id: String,
        media_url: String,
    },
    /// Export a stored transcript to a text file
    Export {
        lecture_id: String,
        out_path: Option<PathBuf>,
    },
    /// Remove temp files (audio artifacts, documents)
    Cleanup {
        lecture_id: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

fn build_ingestion(cfg: &Config, store: Arc<dyn LectureStore>) -> LectureIngestion {
    let media = Arc::new(FfmpegBackend::new(cfg.audio.clone()));
    let transcriber = Arc::new(CommandTranscriber::new(&cfg.engines.transcribe_command));
    LectureIngestion::new(media, transcriber, store, cfg.audio.clone())
}

fn build_pipeline(cfg: &Config, store: Arc<dyn LectureStore>) -> Result<NotePipeline> {
    let extractor = Arc::new(CommandExtractor::new(
        &cfg.engines.extract_command,
        &cfg.documents.workdir,
    ));
    let merger = Arc::new(OpenRouterMerger::from_env(cfg.engines.openrouter.clone())?);
    let ingestion = build_ingestion(cfg, Arc::clone(&store));
    Ok(NotePipeline::new(extractor, merger, ingestion, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => {
            let store: Arc<dyn LectureStore> = Arc::new(SledStore::open(&cfg.store.path)?);
            let pipeline = Arc::new(build_pipeline(&cfg, Arc::clone(&store))?);
            let cleaner = Arc::new(Cleaner::new(&cfg.audio.workdir, &cfg.documents.workdir));

            let app = lectern::create_router(lectern::AppState {
                pipeline,
                store,
                cleaner,
            });

            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            info!("HTTP server listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            axum::serve(listener, app).await?;
        }

        Command::Process {
            document_url,
            media_url,
            lecture_id,
        } => {
            let store: Arc<dyn LectureStore> = Arc::new(SledStore::open(&cfg.store.path)?);
            let pipeline = build_pipeline(&cfg, store)?;

            let outcome = pipeline.run(&document_url, &media_url, lecture_id).await?;

            if outcome.skipped {
                info!("Lecture {} already had notes (skipped)", outcome.lecture_id);
            } else {
                info!("Notes generated for lecture {}", outcome.lecture_id);
            }
            println!("{}", outcome.notes);
        }

        Command::Ingest {
            lecture_id,
            media_url,
        } => {
            let store: Arc<dyn LectureStore> = Arc::new(SledStore::open(&cfg.store.path)?);
            let ingestion = build_ingestion(&cfg, store);

            let report = ingestion.ingest(&lecture_id, &media_url).await?;
            info!(
                "Ingested lecture {}: {}/{} segments transcribed",
                report.lecture_id, report.successful_segments, report.total_segments
            );
        }

        Command::Export {
            lecture_id,
            out_path,
        } => {
            let store = SledStore::open(&cfg.store.path)?;
            let out_path = out_path.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "merged_notes_{}_{}.txt",
                    lecture_id,
                    chrono::Utc::now().timestamp_millis()
                ))
            });

            let stats = lectern::export::export_transcript(&store, &lecture_id, &out_path).await?;
            info!(
                "Exported transcript to {} ({} chars, {} words, ~{} tokens)",
                out_path.display(),
                stats.characters,
                stats.words,
                stats.approx_tokens
            );
        }

        Command::Cleanup { lecture_id, all } => {
            let cleaner = Cleaner::new(&cfg.audio.workdir, &cfg.documents.workdir);

            let report = if all {
                cleaner.cleanup_all()
            } else {
                let lecture_id = lecture_id
                    .context("provide a lecture_id or --all")?;
                cleaner.cleanup_lecture(&lecture_id)
            };

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
