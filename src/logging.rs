use crate::config::TracingConfig;
use crate::error::ResqError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the non-blocking file writer alive; drop flushes and stops it.
#[must_use]
pub struct LogHandle {
    _guard: WorkerGuard,
}

/// Install the global subscriber: env-filtered console output plus a daily
/// rolling file in `cfg.dir`. The UI log panel reads the same files back via
/// [`read_recent`].
pub fn init(cfg: &TracingConfig) -> Result<LogHandle, ResqError> {
    fs::create_dir_all(&cfg.dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&cfg.file_name)
        .filename_suffix("log")
        .build(&cfg.dir)
        .map_err(|e| ResqError::Io(std::io::Error::other(e)))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(LogHandle { _guard: guard })
}

/// Tail of the most recently modified `.log` file in `dir`, capped at
/// `max_bytes`. Returns an empty string when there is nothing to read; the
/// log panel polls this and an error would only add noise.
pub fn read_recent(dir: &Path, max_bytes: u64) -> String {
    let Some(path) = newest_log_file(dir) else {
        return String::new();
    };
    let Ok(contents) = fs::read(&path) else {
        return String::new();
    };

    let start = contents.len().saturating_sub(max_bytes as usize);
    let at_line_boundary = start == 0 || contents[start - 1] == b'\n';
    let text = String::from_utf8_lossy(&contents[start..]);
    if at_line_boundary {
        return text.into_owned();
    }
    // Drop the partial first line when the cut landed mid-line.
    match text.find('\n') {
        Some(nl) => text[nl + 1..].to_string(),
        None => text.into_owned(),
    }
}

fn newest_log_file(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("log"))
                == Some(true)
        })
        .max_by_key(|p| {
            fs::metadata(p)
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(tag: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("resq-logging-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_dir_reads_empty() {
        assert_eq!(read_recent(Path::new("/no/such/dir"), 1024), "");
    }

    #[test]
    fn reads_tail_of_newest_log() {
        let dir = temp_dir("tail");
        let old = dir.join("resq.2024-01-01.log");
        fs::File::create(&old)
            .unwrap()
            .write_all(b"old entry\n")
            .unwrap();
        // Ignore non-log files regardless of mtime.
        fs::File::create(dir.join("notes.txt"))
            .unwrap()
            .write_all(b"not a log\n")
            .unwrap();
        let new = dir.join("resq.2024-01-02.log");
        let mut f = fs::File::create(&new).unwrap();
        f.write_all(b"first line\nsecond line\n").unwrap();
        filetime_touch(&old, &new);

        let tail = read_recent(&dir, 1024);
        assert_eq!(tail, "first line\nsecond line\n");

        let bounded = read_recent(&dir, 12);
        assert_eq!(bounded, "second line\n");

        let _ = fs::remove_dir_all(&dir);
    }

    // Order the two files by mtime without pulling in a clock-manipulation crate.
    fn filetime_touch(older: &Path, newer: &Path) {
        let earlier = std::time::SystemTime::now() - std::time::Duration::from_secs(60);
        let f = fs::File::open(older).unwrap();
        let _ = f.set_modified(earlier);
        let f = fs::File::open(newer).unwrap();
        let _ = f.set_modified(std::time::SystemTime::now());
    }
}
