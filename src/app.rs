use crate::command::{self, ChatCommand};
use crate::console::ConsoleSurface;
use crate::provider::{ChatCompletions, GenerateContent};
use crate::session::{Backends, Session, Surface, MISSING_KEY_NOTICE};
use crate::{config, models, provider};
use std::io::{BufRead, IsTerminal, Write};

const TITLE: &str = "💬 Chatbot";
const DESCRIPTION: &str = "A simple chatbot that uses OpenAI's GPT models and Google's Gemini models \
to generate responses. To use it, you need to provide an OpenAI or Gemini API key.";
pub const HELP: &str = "Commands: /model [name], /models, /key <key>, /history, /clear, /quit";

pub fn build_backends(http: &reqwest::Client, cfg: &config::Config) -> anyhow::Result<Backends> {
    let completions = provider::openai::OpenAiProvider::new(http.clone(), cfg.openai_base())?;
    let generative = provider::google::GoogleProvider::new(http.clone(), cfg.google_base())?;
    tracing::debug!(
        completions = completions.name(),
        generative = generative.name(),
        "built backends"
    );

    Ok(Backends {
        completions: Box::new(completions),
        generative: Box::new(generative),
    })
}

fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// Ask for the key without echoing it. Piped stdin falls back to a plain line read.
pub fn prompt_api_key() -> anyhow::Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return read_api_key(&mut std::io::stdin().lock(), &mut std::io::stdout());
    }
    let raw = dialoguer::Password::new()
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()?;
    Ok(normalize_key(&raw))
}

/// Ask for a key on `out`, read one line from `input`. Empty means no key.
pub fn read_api_key(input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<Option<String>> {
    write!(out, "API Key: ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(normalize_key(&line))
}

pub fn print_models(out: &mut impl Write) -> anyhow::Result<()> {
    for m in &models::CATALOG {
        writeln!(out, "{:<18} {}", m.id, m.provider.as_str())?;
    }
    Ok(())
}

/// Run a single turn. Errors propagate to the caller.
pub async fn run_once<W: Write>(
    session: &mut Session,
    backends: &Backends,
    prompt: &str,
    out: W,
) -> anyhow::Result<()> {
    let mut surface = ConsoleSurface::new(out);
    session.submit(prompt, backends, &mut surface).await?;
    Ok(())
}

/// Line-oriented chat loop. Returns the session as it stood when input ended.
pub async fn run_repl<R: BufRead, W: Write>(
    mut input: R,
    out: W,
    mut session: Session,
    backends: &Backends,
) -> anyhow::Result<Session> {
    let mut surface = ConsoleSurface::new(out);
    {
        let out = surface.out_mut();
        writeln!(out, "{TITLE}\n{DESCRIPTION}\n")?;
        writeln!(out, "model: {}", session.model().id)?;
        writeln!(out, "{HELP}\n")?;
    }
    if !session.has_api_key() {
        surface.notice(MISSING_KEY_NOTICE)?;
    }

    loop {
        write!(surface.out_mut(), "> ")?;
        surface.out_mut().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let Some(cmd) = command::parse(&line) else {
            continue;
        };
        match cmd {
            ChatCommand::Quit => break,
            ChatCommand::Clear => {
                session.reset();
                writeln!(surface.out_mut(), "conversation cleared\n")?;
            }
            ChatCommand::History => {
                if session.transcript().is_empty() {
                    writeln!(surface.out_mut(), "(history is empty)\n")?;
                }
                session.replay(&mut surface)?;
            }
            ChatCommand::Models => {
                print_models(surface.out_mut())?;
                writeln!(surface.out_mut())?;
            }
            ChatCommand::ShowModel => writeln!(surface.out_mut(), "model: {}\n", session.model().id)?,
            ChatCommand::SelectModel(id) => match session.select_model(id) {
                Ok(()) => writeln!(surface.out_mut(), "model set to: {}\n", session.model().id)?,
                Err(e) => surface.show_error(&e)?,
            },
            ChatCommand::SetKey(key) => {
                session.set_api_key(key);
                if session.has_api_key() {
                    writeln!(surface.out_mut(), "API key set\n")?;
                } else {
                    surface.notice(MISSING_KEY_NOTICE)?;
                }
            }
            ChatCommand::Prompt(msg) => {
                if let Err(e) = session.submit(msg, backends, &mut surface).await {
                    tracing::error!(model = session.model().id, error = %format!("{e:#}"), "turn failed");
                    surface.show_error(&e)?;
                }
            }
        }
    }

    Ok(session)
}
