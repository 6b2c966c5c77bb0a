use std::env;
use std::fs::read_dir;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::error;

/// Resolve a command name to a runnable program. Names containing a slash
/// are taken as paths; everything else is searched for along `$PATH`.
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return if is_executable(&path) { Some(path) } else { None };
    }
    find_in_path(name)
}

fn is_executable(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

pub fn find_in_path(filename: &str) -> Option<PathBuf> {
    let env_path = match env::var("PATH") {
        Ok(x) => x,
        Err(e) => {
            error!("shellfyre: error with env PATH: {:?}", e);
            return None;
        }
    };
    for dir in env_path.split(':') {
        match read_dir(dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    if entry.file_name().to_str() != Some(filename) {
                        continue;
                    }
                    if is_executable(&entry.path()) {
                        return Some(entry.path());
                    }
                }
            }
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    continue;
                }
                error!("shellfyre: fs read_dir error: {}: {}", dir, e);
            }
        }
    }
    None
}

pub fn current_dir() -> String {
    let cwd = match env::current_dir() {
        Ok(x) => x,
        Err(e) => {
            error!("shellfyre: env current_dir error: {}", e);
            return String::new();
        }
    };
    cwd.to_string_lossy().to_string()
}
