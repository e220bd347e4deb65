use crate::models;
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

/// Chat with OpenAI GPT or Google Gemini models from the terminal
#[derive(Debug, Parser)]
#[command(name = "chatbot")]
#[command(version)]
#[command(about = "Chat with OpenAI GPT or Google Gemini models", long_about = None)]
pub struct Args {
    /// Model name (default: config/model or "gpt-3.5-turbo")
    #[arg(short = 'm', long = "model", value_parser = PossibleValuesParser::new(models::ids()))]
    pub model: Option<String>,

    /// API key for the chosen provider; prompted for when omitted. Never stored.
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Prompt text (positional); runs a single turn and exits
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the selectable models and their providers
    Models,

    /// Run an interactive terminal chat UI
    #[cfg(feature = "tui")]
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_key_and_prompt() {
        let args = Args::try_parse_from(["chatbot", "-m", "gpt-4", "--api-key", "sk", "Hello", "there"]).unwrap();
        assert_eq!(args.model.as_deref(), Some("gpt-4"));
        assert_eq!(args.api_key.as_deref(), Some("sk"));
        assert_eq!(args.prompt, ["Hello", "there"]);
        assert!(args.cmd.is_none());
    }

    #[test]
    fn rejects_models_outside_the_catalog() {
        assert!(Args::try_parse_from(["chatbot", "-m", "gpt-5", "hi"]).is_err());
    }

    #[test]
    fn models_subcommand() {
        let args = Args::try_parse_from(["chatbot", "models"]).unwrap();
        assert!(matches!(args.cmd, Some(Command::Models)));
    }
}
