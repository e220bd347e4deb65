/// A line typed into the chat input, after command parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Quit,
    Clear,
    History,
    Models,
    /// Bare `/model`: show the current selection.
    ShowModel,
    SelectModel(&'a str),
    /// `/key` with an empty argument clears the key.
    SetKey(&'a str),
    Prompt(&'a str),
}

/// Parse one input line. Blank input is `None`.
pub fn parse(line: &str) -> Option<ChatCommand<'_>> {
    let msg = line.trim();
    if msg.is_empty() {
        return None;
    }

    let cmd = if msg == "/quit" || msg.eq_ignore_ascii_case("exit") || msg.eq_ignore_ascii_case("quit") {
        ChatCommand::Quit
    } else if msg == "/clear" {
        ChatCommand::Clear
    } else if msg == "/history" {
        ChatCommand::History
    } else if msg == "/models" {
        ChatCommand::Models
    } else if let Some(arg) = command_arg(msg, "/model") {
        if arg.is_empty() {
            ChatCommand::ShowModel
        } else {
            ChatCommand::SelectModel(arg)
        }
    } else if let Some(arg) = command_arg(msg, "/key") {
        ChatCommand::SetKey(arg)
    } else {
        ChatCommand::Prompt(msg)
    };
    Some(cmd)
}

/// `Some(arg)` when `msg` is `cmd` alone or `cmd <arg>`.
fn command_arg<'a>(msg: &'a str, cmd: &str) -> Option<&'a str> {
    let rest = msg.strip_prefix(cmd)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, ChatCommand};

    #[test]
    fn commands_need_a_word_boundary() {
        assert_eq!(parse("/model gpt-4"), Some(ChatCommand::SelectModel("gpt-4")));
        assert_eq!(parse("/model"), Some(ChatCommand::ShowModel));
        assert_eq!(parse("/models"), Some(ChatCommand::Models));
        assert_eq!(parse("/modelling"), Some(ChatCommand::Prompt("/modelling")));
    }

    #[test]
    fn key_argument_may_be_empty() {
        assert_eq!(parse("/key  sk-1 "), Some(ChatCommand::SetKey("sk-1")));
        assert_eq!(parse("/key "), Some(ChatCommand::SetKey("")));
        assert_eq!(parse("/keys"), Some(ChatCommand::Prompt("/keys")));
    }

    #[test]
    fn quit_spellings_and_plain_prompts() {
        for q in ["/quit", "exit", "QUIT"] {
            assert_eq!(parse(q), Some(ChatCommand::Quit), "{q}");
        }
        assert_eq!(parse("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse("/history"), Some(ChatCommand::History));
        assert_eq!(parse("  Hello there \n"), Some(ChatCommand::Prompt("Hello there")));
        assert_eq!(parse(" \n"), None);
    }
}
