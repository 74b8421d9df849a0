use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub documents: DocumentConfig,
    pub store: StoreConfig,
    pub engines: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Directory for normalized artifacts and their chunk subdirectories.
    pub workdir: String,
    /// Logical segment length in seconds.
    pub chunk_size_secs: f64,
    /// Extra decoded audio past each segment's logical end, in seconds.
    pub overlap_secs: f64,
    /// Hard ceiling on total decoded duration, in seconds.
    pub max_duration_secs: f64,
    /// Target sample rate (the transcription engine expects 16kHz).
    pub sample_rate: u32,
    /// Target channel count (1 = mono).
    pub channels: u16,
    pub ffmpeg_program: String,
    pub ffprobe_program: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Directory for downloaded documents and extracted text.
    pub workdir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Speech-to-text command; the segment path is appended as the last
    /// argument and the transcript is read from stdout.
    pub transcribe_command: Vec<String>,
    /// Document OCR command; invoked as `<cmd> <pdf_path> <txt_path>`.
    pub extract_command: Vec<String>,
    pub openrouter: OpenRouterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "lectern")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000)?
            .set_default("audio.workdir", "audios")?
            .set_default("audio.chunk_size_secs", 600.0)?
            .set_default("audio.overlap_secs", 5.0)?
            .set_default("audio.max_duration_secs", 5400.0)?
            .set_default("audio.sample_rate", 16000)?
            .set_default("audio.channels", 1)?
            .set_default("audio.ffmpeg_program", "ffmpeg")?
            .set_default("audio.ffprobe_program", "ffprobe")?
            .set_default("documents.workdir", "pdfs")?
            .set_default("store.path", "data/lectern.db")?
            .set_default(
                "engines.transcribe_command",
                vec!["whisper-cli".to_string(), "--no-timestamps".to_string()],
            )?
            .set_default("engines.extract_command", vec!["pdf-ocr".to_string()])?
            .set_default(
                "engines.openrouter.base_url",
                "https://openrouter.ai/api/v1",
            )?
            .set_default(
                "engines.openrouter.model",
                "tngtech/deepseek-r1t2-chimera:free",
            )?
            .set_default("engines.openrouter.api_key_env", "OPENROUTER_KEY")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
