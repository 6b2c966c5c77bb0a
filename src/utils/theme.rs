use colored::Colorize;
use rand::seq::SliceRandom;
use std::collections::HashMap;

pub struct Theme {
    messages: HashMap<&'static str, String>,
    pub prompt_style: Box<dyn Fn(String) -> String>,
    pub success_style: Box<dyn Fn(String) -> String>,
    pub warning_style: Box<dyn Fn(String) -> String>,
    pub error_style: Box<dyn Fn(String) -> String>,
}

impl Theme {
    pub fn get_message(&self, key: &str) -> String {
        self.messages.get(key).cloned().unwrap_or_default()
    }
}

const WELCOMES: [&str; 3] = [
    "welcome to shellfyre — pipes, redirects and dad jokes included",
    "shellfyre is lit. type a command to get going",
    "another day, another shell. shellfyre at your service",
];

fn base_messages() -> HashMap<&'static str, String> {
    let welcome = WELCOMES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(WELCOMES[0]);
    HashMap::from([
        ("welcome", welcome.to_string()),
        ("exit", String::from("so long, and thanks for all the pipes")),
        ("eof_signal", String::from("caught end of input, leaving shellfyre")),
        ("interrupt_signal", String::from("interrupted")),
        ("error", String::from("readline error")),
    ])
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            messages: base_messages(),
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
            success_style: Box::new(|s| s.bright_green().to_string()),
            warning_style: Box::new(|s| s.yellow().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "dark" => Theme {
            messages: base_messages(),
            prompt_style: Box::new(|s| s.bright_purple().to_string()),
            success_style: Box::new(|s| s.green().to_string()),
            warning_style: Box::new(|s| s.bright_yellow().to_string()),
            error_style: Box::new(|s| s.red().to_string()),
        },
        _ => Theme::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_present() {
        let theme = Theme::default();
        assert!(!theme.get_message("welcome").is_empty());
        assert!(!theme.get_message("exit").is_empty());
        assert!(theme.get_message("no-such-key").is_empty());
    }

    #[test]
    fn test_unknown_theme_name_falls_back_to_default() {
        let theme = load_theme("no-such-theme");
        assert!(!theme.get_message("eof_signal").is_empty());
    }
}
