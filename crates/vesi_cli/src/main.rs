mod gauge;
mod telemetry;
mod typed;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use vesi_core::{InputOrigin, Utterance, VesiConfig};
use vesi_memory::{HistoryStore, InMemoryStore, JsonFileStore};
use vesi_reasoning::providers::{OpenAiCompatClient, ScriptedModel};
use vesi_reasoning::session::{inbox, SessionLoop};
use vesi_reasoning::{ChatModel, TurnController, TurnReply};
use vesi_voice::{
    spawn_spoken_input, KokoroClient, SpeakOptions, SpeechToText, SpokenInput, TextToSpeech,
    TranscribeOptions, WavFileCapture, WhisperClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Text,
    Voice,
}

#[derive(Parser, Debug)]
#[command(name = "vesi", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "vesi.toml", env = "VESI_CONFIG")]
    config: PathBuf,

    /// Where user input comes from
    #[arg(short, long, value_enum, default_value_t = Mode::Text)]
    mode: Mode,

    /// WAV files to feed through speech-to-text in voice mode, in order
    #[arg(long = "voice-file")]
    voice_files: Vec<PathBuf>,

    /// Also run the HTTP gateway
    #[arg(long)]
    serve: bool,

    /// Keep the conversation in memory only
    #[arg(long)]
    no_persist: bool,

    /// Use a canned offline model instead of the configured endpoint
    #[arg(long)]
    offline: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Also write daily log files here
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Debug logging plus per-turn fragment counts
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = telemetry::init(args.log_json, args.log_dir.as_deref(), args.verbose);

    info!("Initializing Vesi...");
    let config = VesiConfig::load_or_default(&args.config);
    config.validate().context("Invalid configuration")?;

    // 1. Model
    let model: Arc<dyn ChatModel> = if args.offline {
        info!("Offline mode: replies are canned");
        Arc::new(ScriptedModel::echo())
    } else {
        info!("Using model {} at {}", config.llm.model, config.llm.base_url);
        Arc::new(OpenAiCompatClient::new(&config.llm)?)
    };

    // 2. Memory
    let store: Arc<dyn HistoryStore> = if args.no_persist {
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(&config.history.path))
    };

    // 3. Session
    let controller = Arc::new(TurnController::new(model, store, &config));
    let session = controller.open_session(&config);
    let session_loop = SessionLoop::new(controller);
    let (tx, rx) = inbox();

    spawn_interrupt_handler(tx.downgrade());

    // 4. Optional gateway
    if args.serve {
        start_gateway(&config, tx.clone(), session_loop.subscribe())?;
    }

    // 5. Input
    match args.mode {
        Mode::Text => {
            println!("Vesi is online. Type 'exit' or 'quit' to leave.");
            tokio::spawn(print_replies(session_loop.subscribe(), args.verbose, |o| {
                o != InputOrigin::Typed
            }));
            typed::spawn_typed_input(tx.clone(), session_loop.subscribe(), args.verbose)
                .context("Failed to start keyboard input")?;
        }
        Mode::Voice => {
            let stt = speech_to_text(&config)?
                .context("Voice mode needs voice.stt_url (or VESI_STT_URL)")?;
            if args.voice_files.is_empty() {
                anyhow::bail!("Voice mode needs at least one --voice-file");
            }
            println!("Vesi is listening ({} clips queued).", args.voice_files.len());
            tokio::spawn(print_replies(session_loop.subscribe(), args.verbose, |_| true));
            spawn_spoken_input(
                SpokenInput {
                    capture: Box::new(WavFileCapture::new(args.voice_files.clone())),
                    stt,
                    options: transcribe_options(&config),
                },
                tx.clone(),
            );
        }
    }
    // Producers hold the remaining senders; the loop ends when they all hang up.
    drop(tx);

    let session = session_loop.run(session, rx).await;
    info!("Goodbye ({} messages in memory)", session.history.len());
    Ok(())
}

/// Ctrl-C queues an exit word. The weak sender does not keep the inbox open.
fn spawn_interrupt_handler(tx: mpsc::WeakSender<Utterance>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(Utterance::new(InputOrigin::Typed, "exit")).await;
        }
    });
}

async fn print_replies(
    mut replies: broadcast::Receiver<TurnReply>,
    verbose: bool,
    wanted: impl Fn(InputOrigin) -> bool,
) {
    loop {
        match replies.recv().await {
            Ok(reply) if reply.closing => break,
            Ok(reply) if wanted(reply.origin) => {
                print!("{}", gauge::render(&reply, verbose));
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Console missed {} replies", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn transcribe_options(config: &VesiConfig) -> TranscribeOptions {
    TranscribeOptions {
        language: Some(config.voice.language.clone()),
        initial_prompt: Some(config.persona.stt_prompt.clone()).filter(|p| !p.is_empty()),
    }
}

fn speech_to_text(config: &VesiConfig) -> anyhow::Result<Option<Arc<dyn SpeechToText>>> {
    match config.voice.stt_url {
        Some(ref url) => {
            let client = WhisperClient::new(url, &config.voice.stt_model)?;
            Ok(Some(Arc::new(client)))
        }
        None => Ok(None),
    }
}

fn text_to_speech(config: &VesiConfig) -> anyhow::Result<Option<Arc<dyn TextToSpeech>>> {
    match config.voice.tts_url {
        Some(ref url) => {
            let client =
                KokoroClient::new(url, &config.voice.tts_model, config.voice.tts_sample_rate)?;
            Ok(Some(Arc::new(client)))
        }
        None => Ok(None),
    }
}

#[cfg(feature = "gateway")]
fn start_gateway(
    config: &VesiConfig,
    tx: mpsc::Sender<Utterance>,
    replies: broadcast::Receiver<TurnReply>,
) -> anyhow::Result<()> {
    let voice = vesi_gateway::VoiceServices {
        stt: speech_to_text(config)?,
        tts: text_to_speech(config)?,
        transcribe: transcribe_options(config),
        speak: SpeakOptions {
            voice: config.voice.voice.clone(),
            speed: config.voice.speed,
            lang_tag: config.voice.lang_tag.clone(),
        },
    };
    info!(
        "Starting gateway on {}:{}",
        config.gateway.host, config.gateway.port
    );
    vesi_gateway::GatewayServer::new(tx, replies, config)
        .with_voice(voice)
        .start();
    Ok(())
}

#[cfg(not(feature = "gateway"))]
fn start_gateway(
    _config: &VesiConfig,
    _tx: mpsc::Sender<Utterance>,
    _replies: broadcast::Receiver<TurnReply>,
) -> anyhow::Result<()> {
    anyhow::bail!("This build has no gateway; rebuild with --features gateway")
}
