use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.toml";

/// Where `config.toml` would live. Nothing is created on disk.
///
/// `None` when no base directory can be determined; the config is optional,
/// so callers treat that the same as a missing file.
pub fn config_path() -> Option<PathBuf> {
    config_path_from(
        env::var_os("CHATBOT_HOME"),
        env::var_os("XDG_CONFIG_HOME"),
        env::var_os("HOME"),
    )
}

fn config_path_from(
    chatbot_home: Option<OsString>,
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Option<PathBuf> {
    let non_empty = |v: Option<OsString>| v.filter(|s| !s.is_empty()).map(PathBuf::from);

    let dir = if let Some(base) = non_empty(chatbot_home) {
        base.join("config")
    } else if let Some(xdg) = non_empty(xdg_config_home) {
        xdg.join("chatbot")
    } else {
        non_empty(home)?.join(".config").join("chatbot")
    };
    Some(dir.join(CONFIG_FILE))
}
