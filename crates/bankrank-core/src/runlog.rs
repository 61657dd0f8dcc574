use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::LOG_TIMESTAMP_FORMAT;

/// Append-only run log: one `<timestamp> : <message>` line per event, plus a
/// console echo. The file grows across runs; there is no rotation.
///
/// Logging is best-effort by contract — a failed write is reported to stderr
/// and never aborts the pipeline.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    echo: bool,
}

impl RunLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            echo: true,
        }
    }

    /// Same log, without the console echo. Used by tests and `--quiet`.
    pub fn silent(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            echo: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, message: &str) {
        let stamp = Local::now().format(LOG_TIMESTAMP_FORMAT);
        let line = format!("{stamp} : {message}\n");

        if let Err(error) = self.append(&line) {
            eprintln!("log write to `{}` failed: {error}", self.path.display());
        }

        if self.echo {
            println!("[ok] {message}");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::RunLog;

    #[test]
    fn record_appends_timestamped_lines() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let path = dir.path().join("code_log.txt");
            let log = RunLog::silent(&path);

            log.record("first message");
            log.record("second message");

            let body = std::fs::read_to_string(&path);
            assert!(body.is_ok());
            if let Ok(body) = body {
                let lines = body.lines().collect::<Vec<&str>>();
                assert_eq!(lines.len(), 2);
                assert!(lines[0].ends_with(" : first message"));
                assert!(lines[1].ends_with(" : second message"));
                // stamp shape: 2023-Sep-08-09:16:35
                let stamp = lines[0].split(" : ").next().unwrap_or("");
                assert_eq!(stamp.split('-').count(), 4);
            }
        }
    }

    #[test]
    fn record_creates_missing_parent_directories() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let path = dir.path().join("nested").join("deeper").join("log.txt");
            let log = RunLog::silent(&path);

            log.record("hello");
            assert!(path.exists());
        }
    }
}
