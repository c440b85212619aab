//! # Motion Logger
//!
//! Appends every dispatched step to a JSON Lines journal.
//!
//! ```text
//! {"timestamp":"2026-10-16T09:12:44.120Z","source":0,"action":"issue","command":{"kind":"drive","linear":30,"angular":-250,"hold_ms":18}}
//! {"timestamp":"2026-10-16T09:12:44.140Z","source":0,"action":"revert"}
//! ```
//!
//! Files are named `motion_<UTC start time>_<sequence>.jsonl`. A new file is
//! started after `max_records_per_file` lines and only the newest
//! `max_files_to_keep` files are kept.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::translator::Dispatch;

const FILE_PREFIX: &str = "motion_";
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct MotionRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    dispatch: &'a Dispatch,
}

/// Rotating JSONL journal of motion commands.
#[derive(Debug)]
pub struct MotionLogger {
    dir: PathBuf,
    writer: BufWriter<File>,
    current_path: PathBuf,
    records_in_file: usize,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    sequence: u32,
}

impl MotionLogger {
    /// Opens a journal as configured in `[telemetry]`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or the first file cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Self::with_limits(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Opens a journal in `dir` with explicit rotation limits.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or the first file cannot be created.
    pub fn with_limits<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let (writer, current_path) = open_file(&dir, 0)?;
        let logger = Self {
            dir,
            writer,
            current_path,
            records_in_file: 0,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            sequence: 0,
        };
        logger.prune()?;

        info!("Motion journal at {}", logger.current_path.display());
        Ok(logger)
    }

    /// File currently written to.
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    /// Appends one dispatched step.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write or rotation failure, `Journal` if serialization
    /// fails.
    pub fn log(&mut self, dispatch: &Dispatch) -> Result<()> {
        if self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = MotionRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            dispatch,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.records_in_file += 1;
        Ok(())
    }

    /// Appends a tick's worth of steps and flushes.
    ///
    /// # Errors
    ///
    /// Same as [`MotionLogger::log`].
    pub fn log_all(&mut self, dispatched: &[Dispatch]) -> Result<()> {
        if dispatched.is_empty() {
            return Ok(());
        }
        for dispatch in dispatched {
            self.log(dispatch)?;
        }
        self.flush()
    }

    /// Flushes buffered lines to disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.sequence += 1;

        let (writer, path) = open_file(&self.dir, self.sequence)?;
        self.writer = writer;
        self.current_path = path;
        self.records_in_file = 0;

        debug!("Rotated motion journal to {}", self.current_path.display());
        self.prune()
    }

    /// Deletes the oldest journal files beyond the retention limit.
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_journal_file(path))
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names start with the UTC start time, so name order is age order
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old motion journal {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn open_file(dir: &Path, sequence: u32) -> Result<(BufWriter<File>, PathBuf)> {
    let name = format!(
        "{}{}_{:04}.{}",
        FILE_PREFIX,
        Utc::now().format("%Y%m%d_%H%M%S"),
        sequence,
        FILE_EXTENSION
    );
    let path = dir.join(name);
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((BufWriter::new(file), path))
}

fn is_journal_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(FILE_PREFIX));
    let extension = path.extension().is_some_and(|ext| ext == FILE_EXTENSION);
    named && extension
}
