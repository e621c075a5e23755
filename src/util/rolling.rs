//! Log file rotated once per calendar day
//!
//! The active file keeps its configured name. When the first write of a new
//! local day arrives, it is renamed to `<name>.<YYYY-MM-DD>` after the day it
//! covered and a fresh file is opened. Only the newest `backups` rotated files
//! are kept.

use chrono::{Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKUPS: usize = 3;

#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    backups: usize,
    file: File,
    current_date: NaiveDate,
}

impl RollingFile {
    pub fn open(path: impl Into<PathBuf>, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let current_date = file
            .metadata()
            .and_then(|m| m.modified())
            .map(|t| chrono::DateTime::<Local>::from(t).date_naive())
            .unwrap_or_else(|_| Local::now().date_naive());

        Ok(Self {
            path,
            backups,
            file,
            current_date,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, date: NaiveDate) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", date.format("%Y-%m-%d")));
        PathBuf::from(name)
    }

    /// Rotates the active file if `today` differs from the day it covers
    fn roll_if_needed(&mut self, today: NaiveDate) -> io::Result<()> {
        if today == self.current_date {
            return Ok(());
        }

        self.file.flush()?;
        fs::rename(&self.path, self.backup_path(self.current_date))?;
        self.file = open_append(&self.path)?;
        self.current_date = today;
        self.prune()
    }

    fn prune(&self) -> io::Result<()> {
        let mut backups = self.existing_backups()?;
        if backups.len() <= self.backups {
            return Ok(());
        }
        backups.sort();
        let excess = backups.len() - self.backups;
        for old in backups.into_iter().take(excess) {
            fs::remove_file(old)?;
        }
        Ok(())
    }

    /// Rotated files, named `<file>.<YYYY-MM-DD>`
    fn existing_backups(&self) -> io::Result<Vec<PathBuf>> {
        let Some(file_name) = self.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!("{}.", file_name);

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(suffix) = name.strip_prefix(&prefix) else {
                continue;
            };
            if NaiveDate::parse_from_str(suffix, "%Y-%m-%d").is_ok() {
                found.push(entry.path());
            }
        }
        Ok(found)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.roll_if_needed(Local::now().date_naive())?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
