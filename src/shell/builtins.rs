use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use chrono::Local;
use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::shell::executor::Outcome;
use crate::shell::parser::ast::Command;
use crate::utils::config::Config;

/// Kernel module installed/removed by `pstraverse` and `exit`.
const MODULE_NAME: &str = "pstraverse";
const MODULE_FILE: &str = "pstraverse.ko";

/// How many recorded locations `cdh` offers at most.
const LOCATION_WINDOW: usize = 10;

const COURSE_LAYOUT: [&str; 5] = ["HW", "LectureNotes", "Projects", "Syllabus", "PastExams"];

/// Mutable interpreter state threaded through the builtins, instead of the
/// process-wide globals the shell family historically used.
pub struct Session {
    pub location_history_file: PathBuf,
    pub config_dir: PathBuf,
    pub module_loaded: bool,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            location_history_file: config.location_history_file.clone(),
            config_dir: config.config_dir.clone(),
            module_loaded: false,
        }
    }
}

pub type Builtin = fn(&Command, &mut Session) -> io::Result<Outcome>;

/// Fixed-order dispatch table; only the first match for a name fires.
static BUILTINS: Lazy<Vec<(&'static str, Builtin)>> = Lazy::new(|| {
    vec![
        ("exit", builtin_exit as Builtin),
        ("cd", builtin_cd),
        ("cdh", builtin_cdh),
        ("take", builtin_take),
        ("filesearch", builtin_filesearch),
        ("courseprep", builtin_courseprep),
        ("joker", builtin_joker),
        ("pstraverse", builtin_pstraverse),
    ]
});

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, handler)| *handler)
}

fn builtin_exit(_command: &Command, session: &mut Session) -> io::Result<Outcome> {
    if session.module_loaded {
        match process::Command::new("sudo")
            .args(["rmmod", MODULE_NAME])
            .status()
        {
            Ok(status) if status.success() => {
                println!("previously loaded module has been removed")
            }
            Ok(status) => warn!("rmmod exited with {}", status),
            Err(err) => warn!("failed to run rmmod: {}", err),
        }
        session.module_loaded = false;
    }
    Ok(Outcome::Exit)
}

/// Change directory and append the new location to the history `cdh` reads.
fn builtin_cd(command: &Command, session: &mut Session) -> io::Result<Outcome> {
    let target = command.arguments.first().map(String::as_str).unwrap_or("~");
    let target = shellexpand::tilde(target);
    std::env::set_current_dir(target.as_ref())?;

    let cwd = std::env::current_dir()?;
    record_location(&session.location_history_file, &cwd)?;
    Ok(Outcome::Continue)
}

fn builtin_cdh(_command: &Command, session: &mut Session) -> io::Result<Outcome> {
    let entries = recent_locations(&session.location_history_file, LOCATION_WINDOW)?;
    if entries.is_empty() {
        println!("no directories recorded yet; `cd` somewhere first");
        return Ok(Outcome::Continue);
    }

    let count = entries.len();
    for (i, path) in entries.iter().enumerate() {
        let letter = (b'a' + (count - 1 - i) as u8) as char;
        println!("{} {}) {}", letter, count - i, path);
    }
    print!("select a directory (letter or number): ");
    io::stdout().flush()?;

    let mut choice = String::new();
    io::stdin().read_line(&mut choice)?;
    let choice = choice.trim();
    match pick_location(&entries, choice) {
        Some(target) => std::env::set_current_dir(target)?,
        None => println!("no such entry: {}", choice),
    }
    Ok(Outcome::Continue)
}

/// Create every `/`-separated component in turn and descend into it.
fn builtin_take(command: &Command, _session: &mut Session) -> io::Result<Outcome> {
    let Some(raw) = command.arguments.first() else {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "missing directory path",
        ));
    };
    let path = shellexpand::tilde(raw);
    if path.starts_with('/') {
        std::env::set_current_dir("/")?;
    }
    for part in path.split('/').filter(|p| !p.is_empty()) {
        match fs::create_dir(part) {
            Ok(()) => debug!("take: created {}", part),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(err),
        }
        std::env::set_current_dir(part)?;
    }
    Ok(Outcome::Continue)
}

fn builtin_filesearch(command: &Command, _session: &mut Session) -> io::Result<Outcome> {
    let Some(pattern) = command.arguments.first() else {
        return Err(io::Error::new(ErrorKind::InvalidInput, "missing search term"));
    };
    let recursive = command.arguments.iter().any(|arg| arg == "-r");
    let open_matches = command.arguments.iter().any(|arg| arg == "-o");

    let mut matches = Vec::new();
    search_directory(Path::new("."), pattern, recursive, &mut matches)?;
    for found in &matches {
        println!("{}", found.display());
        if open_matches {
            if let Err(err) = process::Command::new("xdg-open").arg(found).spawn() {
                warn!("xdg-open {} failed: {}", found.display(), err);
            }
        }
    }
    Ok(Outcome::Continue)
}

/// Scaffold a course directory with the standard subfolders and a first,
/// timestamped lecture note.
fn builtin_courseprep(command: &Command, _session: &mut Session) -> io::Result<Outcome> {
    let Some(course) = command.arguments.first() else {
        return Err(io::Error::new(ErrorKind::InvalidInput, "missing course name"));
    };
    let root = PathBuf::from(shellexpand::tilde(course).as_ref());
    for sub in COURSE_LAYOUT {
        fs::create_dir_all(root.join(sub))?;
    }

    let mut note = fs::File::create(root.join("LectureNotes").join("NOTE1.txt"))?;
    writeln!(
        note,
        "The first note for the {} course was taken at: {}",
        course,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    println!("course directory ready at {}", root.display());
    Ok(Outcome::Continue)
}

/// Install a crontab entry that pushes a dad joke to the desktop once a
/// minute.
fn builtin_joker(_command: &Command, session: &mut Session) -> io::Result<Outcome> {
    let cron_line = r#"*/1 * * * *  XDG_RUNTIME_DIR=/run/user/$(id -u) notify-send "$(curl https://icanhazdadjoke.com/)""#;
    let cron_file = session.config_dir.join("joker.cron");
    fs::write(&cron_file, format!("{}\n", cron_line))?;

    let status = process::Command::new("crontab").arg(&cron_file).status()?;
    if !status.success() {
        return Err(io::Error::new(
            ErrorKind::Other,
            "crontab installation failed",
        ));
    }
    println!("dad-joke notifier installed (runs every minute)");
    Ok(Outcome::Continue)
}

fn builtin_pstraverse(_command: &Command, session: &mut Session) -> io::Result<Outcome> {
    if session.module_loaded {
        println!("module already loaded");
        return Ok(Outcome::Continue);
    }
    let status = process::Command::new("sudo")
        .args(["insmod", MODULE_FILE])
        .status()?;
    if !status.success() {
        return Err(io::Error::new(ErrorKind::Other, "insmod failed"));
    }
    session.module_loaded = true;
    println!("module has been loaded");
    Ok(Outcome::Continue)
}

/// Append one absolute path, newline-terminated, to the location history.
/// Append-only and lockless; concurrent shell instances are unsupported.
pub fn record_location(history: &Path, cwd: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(history)?;
    writeln!(file, "{}", cwd.display())
}

/// The last `limit` recorded locations, oldest first. A missing history
/// file is the same as an empty one.
fn recent_locations(history: &Path, limit: usize) -> io::Result<Vec<String>> {
    let contents = match fs::read_to_string(history) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let lines: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect();
    let skip = lines.len().saturating_sub(limit);
    Ok(lines[skip..].to_vec())
}

/// `1` and `a` both select the most recent entry, matching the listing.
fn pick_location<'a>(entries: &'a [String], choice: &str) -> Option<&'a str> {
    let count = entries.len();
    let offset = match choice.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => n,
        _ => {
            let mut chars = choice.chars();
            let letter = chars.next()?;
            if chars.next().is_some() || !letter.is_ascii_lowercase() {
                return None;
            }
            let index = (letter as usize) - ('a' as usize);
            if index >= count {
                return None;
            }
            index + 1
        }
    };
    Some(&entries[count - offset])
}

fn search_directory(
    dir: &Path,
    pattern: &str,
    recursive: bool,
    matches: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().contains(pattern) {
            matches.push(entry.path());
        }
        if recursive && entry.file_type()?.is_dir() {
            if let Err(err) = search_directory(&entry.path(), pattern, recursive, matches) {
                warn!("filesearch: skipping {}: {}", entry.path().display(), err);
            }
        }
    }
    Ok(())
}
