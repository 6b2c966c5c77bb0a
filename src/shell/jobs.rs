use std::fmt;

/// A detached background pipeline. Recorded for display only; the shell
/// never waits on detached children (reaping is deferred indefinitely).
#[derive(Debug, Clone)]
pub struct Job {
    pub pid: i32,
    pub index: usize,
    pub command: String,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.index, self.pid, self.command)
    }
}

pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    pub fn add_job(&mut self, pid: i32, command: String) -> Job {
        let job = Job {
            pid,
            index: self.find_available_index(),
            command,
        };
        self.jobs.push(job.clone());
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_count_up_from_one() {
        let mut manager = JobManager::new();
        let first = manager.add_job(100, String::from("sleep 5"));
        let second = manager.add_job(101, String::from("sleep 6"));
        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
    }

    #[test]
    fn test_display_format() {
        let job = Job {
            pid: 4242,
            index: 1,
            command: String::from("sleep 5"),
        };
        assert_eq!(job.to_string(), "[1] 4242 sleep 5");
    }
}
