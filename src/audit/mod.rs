pub mod identifier_log;

pub use identifier_log::{IdentifierLog, LogError, LogTimeZone, LOG_HEADER, TIMESTAMP_FORMAT, ZONED_TIMESTAMP_FORMAT};
