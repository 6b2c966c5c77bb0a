use log::{debug, error, warn};
use std::env;
use std::error::Error;
use std::io::Write;

use crate::shell::executor::{Executor, Outcome};
use crate::shell::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::path;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: Theme) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            config,
            theme,
            readline: ReadlineManager::new(config)?,
            executor: Executor::new(config),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("starting {}...", self.config.name);
        self.readline.load_history()?;

        println!(
            "{}",
            (self.theme.success_style)(self.theme.get_message("welcome"))
        );

        self.run_loop()?;
        self.readline.save_history()?;

        debug!("leaving {}...", self.config.name);
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            std::io::stdout().flush()?;
            let prompt = (self.theme.prompt_style)(self.render_prompt());

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if self.handle_input(&line)? == Outcome::Exit {
                        println!(
                            "{}",
                            (self.theme.success_style)(self.theme.get_message("exit"))
                        );
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    warn!("received EOF, leaving {}...", self.config.name);
                    println!(
                        "\n{}",
                        (self.theme.warning_style)(self.theme.get_message("eof_signal"))
                    );
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    warn!("received interrupt at the prompt");
                    println!(
                        "\n{}",
                        (self.theme.warning_style)(self.theme.get_message("interrupt_signal"))
                    );
                }
                Err(err) => {
                    error!("readline failed: {}", err);
                    eprintln!(
                        "{}: {}",
                        (self.theme.error_style)(self.theme.get_message("error")),
                        err
                    );
                    break;
                }
            }
        }
        Ok(())
    }

    /// One parsed line in, `Continue` or `Exit` out. Empty input does
    /// nothing; everything else goes through the executor.
    fn handle_input(&mut self, line: &str) -> Result<Outcome, Box<dyn Error>> {
        if line.trim().is_empty() {
            return Ok(Outcome::Continue);
        }

        self.readline.add_history(line.to_string())?;

        let command = Parser::new(line).parse();
        debug!("parsed: {:?}", command);
        if command.auto_complete {
            // completion itself belongs to the line editor
            debug!("completion marker on: {}", command.name);
        }
        if command.is_empty() {
            return Ok(Outcome::Continue);
        }

        Ok(self.executor.execute(&command))
    }

    fn render_prompt(&self) -> String {
        let user = env::var("USER").unwrap_or_default();
        let host = nix::unistd::gethostname()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("localhost"));
        format!(
            "{}@{}:{} {}$ ",
            user,
            host,
            path::current_dir(),
            self.config.name
        )
    }
}
