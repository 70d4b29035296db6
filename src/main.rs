use clap::Parser;
use jgtml_intent::config::toml_config::{TomlConfig, DEFAULT_CONFIG_FILE};
use jgtml_intent::core::market_structure::{
    build_market_structure, parse_csv, render_market_structure,
};
use jgtml_intent::core::parser::DOWNSTREAM_STAGES;
use jgtml_intent::core::prompts::{ASSISTANT_PERSONA, EXAMPLE_NARRATIVE};
use jgtml_intent::domain::model::{ChatSettings, JgtmlSpec, ParsedSpecOutput};
use jgtml_intent::domain::ports::ConfigProvider;
use jgtml_intent::utils::error::ErrorSeverity;
use jgtml_intent::utils::validation::{validate_file_extension, Validate};
use jgtml_intent::utils::logger;
use jgtml_intent::{
    ChatSession, ChatStore, CliConfig, Command, FlowEngine, FlowOutcome, GeminiClient,
    IntentError, IntentPipeline, IntentSpecParser, LocalStorage, NarrativeSource, Result,
    Settings,
};
use std::io::Write;
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, cli.log_json);

    tracing::debug!("Command: {:?}", cli.command);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let file_config = load_file_config(cli.config.as_deref())?;
    let settings = Settings::from_process_env(&cli.overrides(), file_config.as_ref());
    settings.validate()?;

    if settings.api_key.is_none() {
        tracing::debug!("No Gemini API key configured; LLM calls will be refused");
    }

    match cli.command {
        Command::Translate {
            narrative,
            file,
            example,
            output,
        } => {
            let source = match (narrative, file) {
                (Some(text), _) => NarrativeSource::Inline(text),
                (None, Some(path)) => NarrativeSource::File(path),
                (None, None) if example => NarrativeSource::Inline(EXAMPLE_NARRATIVE.to_string()),
                (None, None) => {
                    tracing::info!("Reading narrative from stdin");
                    NarrativeSource::Inline(std::io::read_to_string(std::io::stdin())?)
                }
            };
            let outcome = run_flow(&settings, source, output).await?;
            print_outcome(&outcome)?;
        }

        Command::Parse { spec } => {
            let spec = JgtmlSpec::from_file(&spec)?;
            let parsed = IntentSpecParser::new(settings.simulated_parse_delay())
                .parse(&spec)
                .await?;
            print_parsed(&parsed)?;
            print_next_steps();
        }

        Command::Visualize { csv, json } => {
            validate_file_extension("csv", &csv, &["csv"])?;
            let text = std::fs::read_to_string(&csv)?;
            let file_name = Path::new(&csv)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            let rows = parse_csv(&text)?;
            let data = build_market_structure(&rows, file_name)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("File: {} (Trends from last completed bar, Price from current bar)", file_name);
                println!();
                print!("{}", render_market_structure(&data));
            }
        }

        Command::Chat { message } => {
            let store = ChatStore::new(LocalStorage::new(settings.data_dir.clone()));
            let history = store.load_messages().await;
            let llm = GeminiClient::from_config(&settings)?;
            let mut session = ChatSession::new(llm, ASSISTANT_PERSONA, history)
                .with_summarize_temperature(settings.summarize_temperature());

            if session.welcome() {
                if let Some(welcome) = session.messages().last() {
                    println!("{}: {}\n", session.persona().name, welcome.text);
                }
            }

            let text = message.join(" ");
            let mut stdout = std::io::stdout();
            let result = session
                .send_message(&text, &mut |chunk: &str| {
                    let _ = write!(stdout, "{}", chunk);
                    let _ = stdout.flush();
                })
                .await;
            println!();

            store.save_messages(session.messages()).await?;

            if store.load_settings().await.auto_play_tts {
                tracing::info!("🔈 Text-to-speech autoplay is enabled but not available in the terminal");
            }
            result?;
        }

        Command::ChatHistory => {
            let store = ChatStore::new(LocalStorage::new(settings.data_dir.clone()));
            let messages = store.load_messages().await;
            if messages.is_empty() {
                println!("No chat history yet.");
            }
            for msg in messages {
                println!(
                    "[{}] {}{}: {}",
                    msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    msg.sender,
                    if msg.is_error { " (error)" } else { "" },
                    msg.text
                );
            }
        }

        Command::ChatClear => {
            let store = ChatStore::new(LocalStorage::new(settings.data_dir.clone()));
            let llm = GeminiClient::from_config(&settings)?;
            let mut session = ChatSession::new(llm, ASSISTANT_PERSONA, Vec::new());
            session.clear();
            store.save_messages(session.messages()).await?;
            println!("🧹 Chat cleared.");
        }

        Command::Summarize { translate, output } => {
            let store = ChatStore::new(LocalStorage::new(settings.data_dir.clone()));
            let history = store.load_messages().await;
            let llm = GeminiClient::from_config(&settings)?;
            let session = ChatSession::new(llm, ASSISTANT_PERSONA, history)
                .with_summarize_temperature(settings.summarize_temperature());

            if !session.has_summarizable_content() {
                return Err(IntentError::ProcessingError {
                    message: "Chat history is empty or contains no relevant text to summarize."
                        .to_string(),
                });
            }

            tracing::info!("✍️ Summarizing chat history into a narrative");
            let summary = session.summarize().await?;
            println!("{}", summary);

            if translate {
                println!();
                let outcome = run_flow(&settings, NarrativeSource::Inline(summary), output).await?;
                print_outcome(&outcome)?;
            }
        }

        Command::Settings { auto_play_tts } => {
            let store = ChatStore::new(LocalStorage::new(settings.data_dir.clone()));
            let mut chat_settings = store.load_settings().await;

            if let Some(value) = auto_play_tts {
                chat_settings = ChatSettings {
                    auto_play_tts: value,
                };
                store.save_settings(&chat_settings).await?;
                tracing::info!("🔧 autoPlayTTS set to {}", value);
            }

            println!("autoPlayTTS: {}", chat_settings.auto_play_tts);
        }
    }

    Ok(())
}

fn load_file_config(path: Option<&str>) -> Result<Option<TomlConfig>> {
    match path {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path).map(Some)
        }
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            tracing::debug!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
            TomlConfig::from_file(DEFAULT_CONFIG_FILE).map(Some)
        }
        None => Ok(None),
    }
}

async fn run_flow(
    settings: &Settings,
    source: NarrativeSource,
    output: String,
) -> Result<FlowOutcome> {
    let llm = GeminiClient::from_config(settings)?;
    tracing::debug!("Using model: {}", llm.model());

    let pipeline = IntentPipeline::new(
        LocalStorage::new(output.clone()),
        llm,
        source,
        IntentSpecParser::new(settings.simulated_parse_delay()),
        output,
        settings.translate_temperature(),
    );

    FlowEngine::new(pipeline).run().await
}

fn print_outcome(outcome: &FlowOutcome) -> Result<()> {
    println!("📋 Generated JGTML Spec:");
    println!("{}", outcome.bundle.spec.to_pretty_json()?);
    println!();
    print_parsed(&outcome.bundle.parsed)?;
    println!();
    println!("✅ Signal package saved to: {}", outcome.output_path);
    print_next_steps();
    Ok(())
}

fn print_parsed(parsed: &ParsedSpecOutput) -> Result<()> {
    println!("🔍 Intent Spec Parser: {}", parsed.status);
    println!("{}", parsed.message);
    if let Some(preview) = &parsed.signal_package_preview {
        println!("{}", serde_json::to_string_pretty(preview)?);
    }
    Ok(())
}

fn print_next_steps() {
    println!();
    println!("➡️ Next steps (external JGTML pipeline):");
    for (stage, purpose) in DOWNSTREAM_STAGES {
        println!("  - {}: {}", stage, purpose);
    }
}
