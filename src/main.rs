//! waifu-voice CLI: synthesize a line, analyze text, manage characters.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use waifu_voice_lib::tts::{load_config, SynthesisRequest, SynthesisService};

#[derive(Parser, Debug)]
#[command(name = "waifu-voice")]
#[command(author, version, about = "Emotion-aware anime character voice synthesis", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = "tts_config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize speech from text
    Speak {
        /// Text to synthesize
        #[arg(short, long)]
        text: String,

        /// Character id (sakura, yuki, rei, miku or a registered one)
        #[arg(long)]
        character: Option<String>,

        /// Emotion label, or "auto" to infer it from the text
        #[arg(short, long)]
        emotion: Option<String>,

        /// Voice style override (cute, soft, cool, energetic)
        #[arg(long)]
        style: Option<String>,

        #[arg(long)]
        speed: Option<f32>,

        #[arg(long)]
        pitch: Option<f32>,

        #[arg(long)]
        energy: Option<f32>,

        /// Output format: wav or pcm
        #[arg(short, long)]
        format: Option<String>,

        /// Output file; streamed chunks get a numeric suffix
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,

        /// Synthesize sentence by sentence
        #[arg(long)]
        stream: bool,
    },

    /// Print the emotion and speech-pattern analysis of a text as JSON
    Analyze {
        #[arg(short, long)]
        text: String,
    },

    /// List characters, voice styles and emotions
    Voices,

    /// Register a character from a JSON document
    Register {
        /// Character id
        id: String,

        /// Path to the character JSON document
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config);
    let service = SynthesisService::init_from_config(&config);

    match cli.command {
        Commands::Speak {
            text,
            character,
            emotion,
            style,
            speed,
            pitch,
            energy,
            format,
            output,
            stream,
        } => {
            let request = SynthesisRequest {
                text,
                character,
                emotion,
                voice_style: style,
                speed,
                pitch,
                energy,
                output_format: format,
            };

            if stream {
                let mut chunks = service.synthesize_stream(&request).await?;
                let mut index = 0usize;
                while let Some(chunk) = chunks.next().await {
                    let audio = chunk?;
                    let path = chunk_path(&output, index);
                    std::fs::write(&path, &audio)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Wrote chunk {} ({} bytes) to {}", index, audio.len(), path.display());
                    index += 1;
                }
            } else {
                let out = service.synthesize_with_report(&request).await?;
                std::fs::write(&output, &out.audio)
                    .with_context(|| format!("writing {}", output.display()))?;
                info!(
                    "Wrote {} bytes to {} (emotion: {}, source: {:?})",
                    out.audio.len(),
                    output.display(),
                    out.emotion,
                    out.source
                );
            }
        }
        Commands::Analyze { text } => {
            let report = service.analyze_text(&text);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Voices => {
            let voices = service.available_voices().await;
            println!("{}", serde_json::to_string_pretty(&voices)?);
        }
        Commands::Register { id, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)?;
            service.register_character_value(&id, value).await?;
            info!("Registered character '{}'", id);
        }
    }

    Ok(())
}

fn chunk_path(output: &std::path::Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wav".to_string());
    output.with_file_name(format!("{}_{:03}.{}", stem, index, ext))
}
