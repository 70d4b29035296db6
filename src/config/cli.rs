use crate::config::SettingsOverrides;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "jgtml-intent")]
#[command(about = "Turn trader narratives into JGTML specs and visualize multi-timeframe market structure")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to ./jgtml.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Gemini API key (falls back to llm.api_key, then API_KEY / GEMINI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory holding the chat transcript and settings
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Translate a trader narrative into a JGTML spec and run the simulated parser
    Translate {
        /// Narrative text
        #[arg(short, long, conflicts_with_all = ["file", "example"])]
        narrative: Option<String>,

        /// Read the narrative from a file
        #[arg(short, long, conflicts_with = "example")]
        file: Option<String>,

        /// Use the built-in example narrative
        #[arg(long)]
        example: bool,

        /// Directory for jgtml_spec.json and signal_package.zip
        #[arg(short, long, default_value = "./output")]
        output: String,
    },

    /// Run the simulated intent parser on a saved spec
    Parse {
        /// Path to a JGTML spec JSON file
        spec: String,
    },

    /// Summarize MFI and zone structure from a CSV export
    Visualize {
        /// CSV file with mfi_str_* / zcol_* / Close columns
        csv: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a message to the Trading Narrative Assistant
    Chat {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Print the saved chat transcript
    ChatHistory,

    /// Clear the saved chat transcript
    ChatClear,

    /// Condense the chat transcript into a trader narrative
    Summarize {
        /// Feed the summary straight into the translate flow
        #[arg(long)]
        translate: bool,

        /// Output directory when --translate is used
        #[arg(short, long, default_value = "./output")]
        output: String,
    },

    /// Show or change chat settings
    Settings {
        /// Enable or disable text-to-speech autoplay
        #[arg(long)]
        auto_play_tts: Option<bool>,
    },
}

impl CliConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translate_with_example() {
        let cli = CliConfig::try_parse_from(["jgtml-intent", "translate", "--example", "-v"]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Translate {
                example, output, ..
            } => {
                assert!(example);
                assert_eq!(output, "./output");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_narrative_conflicts_with_file() {
        let result = CliConfig::try_parse_from([
            "jgtml-intent",
            "translate",
            "--narrative",
            "EUR/USD",
            "--file",
            "n.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_joins_words_and_global_flags() {
        let cli = CliConfig::try_parse_from([
            "jgtml-intent",
            "chat",
            "Double",
            "top",
            "--api-key",
            "k",
        ])
        .unwrap();

        assert_eq!(cli.overrides().api_key.as_deref(), Some("k"));
        match cli.command {
            Command::Chat { message } => assert_eq!(message.join(" "), "Double top"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_settings_flag() {
        let cli =
            CliConfig::try_parse_from(["jgtml-intent", "settings", "--auto-play-tts", "true"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Settings {
                auto_play_tts: Some(true)
            }
        ));
    }
}
