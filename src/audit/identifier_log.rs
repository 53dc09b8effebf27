use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use crate::types::identifiers::Identifier;
use crate::types::kind::ErrorKind;

pub const LOG_HEADER: &str = "StudentID,Timestamp";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
/// Named zones also carry the abbreviation in force, e.g. `AEDT+1100`.
pub const ZONED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z%z";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to append to identifier log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LogError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IoFailure
    }
}

/// Clock used to render log timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTimeZone {
    /// IANA zone; daylight saving is applied from the tz database.
    Named(Tz),
    Fixed(FixedOffset),
}

impl LogTimeZone {
    pub fn render(&self, at: DateTime<Utc>) -> String {
        match self {
            LogTimeZone::Named(tz) => at.with_timezone(tz).format(ZONED_TIMESTAMP_FORMAT).to_string(),
            LogTimeZone::Fixed(offset) => at.with_timezone(offset).format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl From<Tz> for LogTimeZone {
    fn from(tz: Tz) -> Self {
        LogTimeZone::Named(tz)
    }
}

impl From<FixedOffset> for LogTimeZone {
    fn from(offset: FixedOffset) -> Self {
        LogTimeZone::Fixed(offset)
    }
}

/// Append-only CSV record of every identifier a generator has seen.
///
/// Appends from one `IdentifierLog` are serialized; the header row is written
/// only when the file is empty.
#[derive(Debug)]
pub struct IdentifierLog {
    path: PathBuf,
    zone: LogTimeZone,
    write_lock: Mutex<()>,
}

impl IdentifierLog {
    pub fn new(path: impl Into<PathBuf>, zone: impl Into<LogTimeZone>) -> Self {
        Self {
            path: path.into(),
            zone: zone.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `identifier` with the current time.
    pub fn record(&self, identifier: &Identifier) -> Result<(), LogError> {
        self.record_at(identifier, Utc::now())
    }

    pub fn record_at(&self, identifier: &Identifier, at: DateTime<Utc>) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let timestamp = self.zone.render(at);

        self.append(&format!("{identifier},{timestamp}\n"))
            .map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(identifier = %identifier, log = %self.path.display(), "identifier recorded");
        Ok(())
    }

    fn append(&self, row: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = String::new();
        if f.metadata()?.len() == 0 {
            buf.push_str(LOG_HEADER);
            buf.push('\n');
        }
        buf.push_str(row);

        f.write_all(buf.as_bytes())?;
        f.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sydney() -> FixedOffset {
        FixedOffset::east_opt(10 * 3600).unwrap()
    }

    #[test]
    fn header_written_once_and_rows_appended() {
        let dir = tempdir().unwrap();
        let log = IdentifierLog::new(dir.path().join("numbers.csv"), sydney());
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 4, 3, 11).unwrap();

        log.record_at(&Identifier::from(12345u32), at).unwrap();
        log.record_at(&Identifier::from(42u32), at).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "StudentID,Timestamp\n\
             12345,2024-03-05 14:03:11 +1000\n\
             42,2024-03-05 14:03:11 +1000\n"
        );
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let dir = tempdir().unwrap();
        let log = IdentifierLog::new(dir.path().join("numbers.csv"), chrono_tz::Australia::Sydney);

        let summer = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 7, 15, 3, 0, 0).unwrap();
        log.record_at(&Identifier::from(1u8), summer).unwrap();
        log.record_at(&Identifier::from(2u8), winter).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "StudentID,Timestamp\n\
             1,2024-01-15 14:00:00 AEDT+1100\n\
             2,2024-07-15 13:00:00 AEST+1000\n"
        );
    }

    #[test]
    fn existing_log_keeps_its_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("numbers.csv");
        fs::write(&path, "StudentID,Timestamp\n1,2020-01-01 00:00:00 +1000\n").unwrap();

        let log = IdentifierLog::new(&path, sydney());
        log.record(&Identifier::from(2u8)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches(LOG_HEADER).count(), 1);
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.lines().last().unwrap().starts_with("2,"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let log = IdentifierLog::new(dir.path().join("nested/logs/ids.csv"), sydney());
        log.record(&Identifier::from(7u8)).unwrap();
        assert!(log.path().is_file());
    }

    #[test]
    fn unwritable_log_reports_io_failure() {
        let dir = tempdir().unwrap();
        // A directory where the file should be.
        let path = dir.path().join("numbers.csv");
        fs::create_dir(&path).unwrap();

        let log = IdentifierLog::new(&path, sydney());
        let err = log.record(&Identifier::from(1u8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
