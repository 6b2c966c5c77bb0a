use std::fs::{File, OpenOptions};
use std::io;
use std::process::{self, Child, ChildStdout, Stdio};

use log::{debug, warn};
use nix::sys::wait::waitpid;
use nix::unistd::Pid;

use crate::shell::builtins::{self, Session};
use crate::shell::jobs::JobManager;
use crate::shell::parser::ast::Command;
use crate::utils::config::Config;
use crate::utils::path::resolve_program;

/// What one dispatched line means for the read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
    NotFound,
}

/// Where the next stage's standard input comes from.
enum Upstream {
    /// First stage, or nothing upstream redirected away: the terminal.
    Inherit,
    /// The upstream stage wrote elsewhere (redirect or failure); the reader
    /// must still observe end-of-stream instead of blocking.
    Eof,
    /// The read end of the pipe fed by the previous stage.
    Pipe(ChildStdout),
}

pub struct Executor {
    sysname: String,
    builtin_fallthrough: bool,
    session: Session,
    jobs: JobManager,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        Self {
            sysname: config.name.clone(),
            builtin_fallthrough: config.builtin_fallthrough,
            session: Session::new(config),
            jobs: JobManager::new(),
        }
    }

    /// Execute one parsed command chain. Builtins are matched on the head
    /// name first; everything else becomes a pipeline of child processes.
    pub fn execute(&mut self, command: &Command) -> Outcome {
        if command.is_empty() {
            return Outcome::Continue;
        }

        if let Some(handler) = builtins::lookup(&command.name) {
            debug!("builtin: {}", command);
            let outcome = match handler(command, &mut self.session) {
                Ok(outcome) => outcome,
                Err(err) => {
                    eprintln!("-{}: {}: {}", self.sysname, command.name, err);
                    Outcome::Continue
                }
            };
            // Historically this shell family ran the external lookup even
            // after a builtin matched; that behavior stays available behind
            // the fallthrough switch, but the default returns here.
            if outcome == Outcome::Exit || !self.builtin_fallthrough {
                return outcome;
            }
        }

        debug!("pipeline: {}", command);
        match self.run_pipeline(command) {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("-{}: {}: {}", self.sysname, command.name, err);
                Outcome::Continue
            }
        }
    }

    fn run_pipeline(&mut self, head: &Command) -> io::Result<Outcome> {
        let stages: Vec<&Command> = head.stages().filter(|c| !c.name.is_empty()).collect();
        if stages.is_empty() {
            return Ok(Outcome::Continue);
        }

        let mut children: Vec<Child> = Vec::new();
        let mut upstream = Upstream::Inherit;
        let mut missing = false;

        let count = stages.len();
        for (i, stage) in stages.iter().enumerate() {
            let has_next = i + 1 < count;

            let Some(program) = resolve_program(&stage.name) else {
                eprintln!("-{}: {}: command not found", self.sysname, stage.name);
                missing = true;
                // collapse the broken link so the next stage sees EOF
                upstream = Upstream::Eof;
                continue;
            };

            let incoming = std::mem::replace(&mut upstream, Upstream::Inherit);
            match spawn_stage(stage, &program, incoming, has_next) {
                Ok(mut child) => {
                    upstream = match child.stdout.take() {
                        Some(pipe) => Upstream::Pipe(pipe),
                        None if has_next => Upstream::Eof,
                        None => Upstream::Inherit,
                    };
                    children.push(child);
                }
                Err(err) => {
                    eprintln!("-{}: {}: {}", self.sysname, stage.name, err);
                    upstream = Upstream::Eof;
                }
            }
        }
        // any pipe end still held here is dropped, so readers can finish
        drop(upstream);

        if head.background {
            if let Some(last) = children.last() {
                let job = self
                    .jobs
                    .add_job(last.id() as i32, head.to_string());
                println!("{}", job);
            }
            return Ok(if missing {
                Outcome::NotFound
            } else {
                Outcome::Continue
            });
        }

        // reap every spawned stage, not just the last one
        for child in &children {
            if let Err(err) = waitpid(Pid::from_raw(child.id() as i32), None) {
                warn!("waitpid failed for pid {}: {}", child.id(), err);
            }
        }

        Ok(if missing {
            Outcome::NotFound
        } else {
            Outcome::Continue
        })
    }
}

/// Wire one stage's stdio and spawn it. Explicit redirects take precedence
/// over pipe wiring on both ends; the consumed upstream handle is closed
/// here even when spawning fails.
fn spawn_stage(
    stage: &Command,
    program: &std::path::Path,
    upstream: Upstream,
    has_next: bool,
) -> io::Result<Child> {
    let mut command = process::Command::new(program);
    command.args(&stage.arguments);

    match (&stage.redirects.input, upstream) {
        (Some(path), _) => {
            command.stdin(File::open(path)?);
        }
        (None, Upstream::Pipe(pipe)) => {
            command.stdin(Stdio::from(pipe));
        }
        (None, Upstream::Eof) => {
            command.stdin(Stdio::null());
        }
        (None, Upstream::Inherit) => {
            command.stdin(Stdio::inherit());
        }
    }

    if let Some(path) = &stage.redirects.truncate {
        command.stdout(File::create(path)?);
    } else if let Some(path) = &stage.redirects.append {
        command.stdout(OpenOptions::new().append(true).create(true).open(path)?);
    } else if has_next {
        command.stdout(Stdio::piped());
    } else {
        command.stdout(Stdio::inherit());
    }
    command.stderr(Stdio::inherit());

    command.spawn()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::parser::Parser;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = env::temp_dir().join(format!(
            "shellfyre_exec_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn test_executor(dir: &std::path::Path) -> Executor {
        let config = Config {
            name: String::from("shellfyre"),
            theme: String::from("default"),
            editor_mode: String::from("emacs"),
            config_dir: dir.to_path_buf(),
            history_file: dir.join("history"),
            location_history_file: dir.join("cdh_history"),
            logger_level: String::from("warn"),
            logger_dir: dir.join("logs"),
            builtin_fallthrough: false,
        };
        Executor::new(&config)
    }

    fn run(executor: &mut Executor, line: &str) -> Outcome {
        let command = Parser::new(line).parse();
        executor.execute(&command)
    }

    #[test]
    fn test_empty_command_is_a_no_op() {
        let dir = make_unique_temp_dir("noop");
        let mut executor = test_executor(&dir);
        assert_eq!(run(&mut executor, "   "), Outcome::Continue);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_unknown_command_reports_not_found() {
        let dir = make_unique_temp_dir("notfound");
        let mut executor = test_executor(&dir);
        assert_eq!(
            run(&mut executor, "definitely-not-a-command-5309"),
            Outcome::NotFound
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_truncating_redirect_captures_stdout() {
        let dir = make_unique_temp_dir("truncate");
        let out = dir.join("out.txt");
        let mut executor = test_executor(&dir);

        let outcome = run(&mut executor, &format!("echo hello >{}", out.display()));
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");

        // a second run truncates, never concatenates
        run(&mut executor, &format!("echo again >{}", out.display()));
        assert_eq!(fs::read_to_string(&out).unwrap(), "again\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_appending_redirect_concatenates_runs() {
        let dir = make_unique_temp_dir("append");
        let out = dir.join("log.txt");
        let mut executor = test_executor(&dir);

        run(&mut executor, &format!("echo one >>{}", out.display()));
        run(&mut executor, &format!("echo two >>{}", out.display()));
        assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_input_redirect_feeds_the_stage() {
        let dir = make_unique_temp_dir("input");
        let input = dir.join("in.txt");
        let out = dir.join("out.txt");
        fs::write(&input, "alpha\nbeta\n").unwrap();
        let mut executor = test_executor(&dir);

        let outcome = run(
            &mut executor,
            &format!("grep alpha <{} >{}", input.display(), out.display()),
        );
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(fs::read_to_string(&out).unwrap(), "alpha\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_two_stage_pipe_into_redirect() {
        let dir = make_unique_temp_dir("pipe");
        let out = dir.join("result.txt");
        let mut executor = test_executor(&dir);

        let outcome = run(
            &mut executor,
            &format!("echo hi | grep h >{}", out.display()),
        );
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_three_stage_pipe_preserves_bytes() {
        let dir = make_unique_temp_dir("pipe3");
        let out = dir.join("result.txt");
        let mut executor = test_executor(&dir);

        let outcome = run(
            &mut executor,
            &format!("echo hi | cat | cat >{}", out.display()),
        );
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_middle_stage_still_terminates() {
        let dir = make_unique_temp_dir("broken");
        let out = dir.join("result.txt");
        let mut executor = test_executor(&dir);

        // the consumer must see end-of-stream, not hang forever
        let outcome = run(
            &mut executor,
            &format!("echo hi | no-such-filter-5309 | cat >{}", out.display()),
        );
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(fs::read_to_string(&out).unwrap(), "");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_background_pipeline_returns_without_waiting() {
        let dir = make_unique_temp_dir("background");
        let mut executor = test_executor(&dir);

        let started = Instant::now();
        let outcome = run(&mut executor, "sleep 5 &");
        assert_eq!(outcome, Outcome::Continue);
        assert!(started.elapsed() < Duration::from_secs(2));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_builtin_short_circuits_external_lookup() {
        let dir = make_unique_temp_dir("builtin");
        let mut executor = test_executor(&dir);
        // `exit` must come back as a terminating outcome, not "not found"
        assert_eq!(run(&mut executor, "exit"), Outcome::Exit);
        fs::remove_dir_all(dir).unwrap();
    }
}
