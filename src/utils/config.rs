use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub editor_mode: String,
    pub config_dir: PathBuf,
    pub history_file: PathBuf,
    pub location_history_file: PathBuf,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub builtin_fallthrough: bool,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/shellfyre")
        } else {
            PathBuf::from("tmp")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("shellfyre"),
            theme: String::from("default"),
            editor_mode: String::from("emacs"),
            history_file: config_dir.join(".shellfyre_history"),
            location_history_file: config_dir.join("cdh_history"),
            logger_level: String::from("warn"),
            logger_dir: config_dir.join("logs"),
            builtin_fallthrough: false,
            config_dir,
        }
    }

    pub fn new() -> Self {
        // environment files take precedence over the built-in defaults
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("SHELLFYRE_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("SHELLFYRE_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("SHELLFYRE_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(history) = env::var("SHELLFYRE_CDH_HISTORY") {
            config.location_history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("SHELLFYRE_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("SHELLFYRE_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Ok(value) = env::var("SHELLFYRE_BUILTIN_FALLTHROUGH") {
            config.builtin_fallthrough =
                value == "1" || value.eq_ignore_ascii_case("true");
        }

        // the history files must have somewhere to live
        for file in [&config.history_file, &config.location_history_file] {
            if let Some(parent) = file.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    eprintln!(
                        "{}: unable to create {}: {}",
                        config.name,
                        parent.display(),
                        err
                    );
                }
            }
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
