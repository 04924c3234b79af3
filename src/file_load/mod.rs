pub mod fetch;

use std::fmt;

use crate::error::{IngestError, Result};

// Enum that represents the supported source formats
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileType {
    Csv,
    Parquet,
}

impl FileType {
    /// Pick a reader from the local file name.
    ///
    /// This is a substring test, not a suffix test: `data.csv.backup` is read
    /// as CSV, and a name containing both markers is CSV because that check
    /// runs first.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        if file_name.contains(".csv") {
            Ok(FileType::Csv)
        } else if file_name.contains(".parquet") {
            Ok(FileType::Parquet)
        } else {
            Err(IngestError::UnsupportedFormat(file_name.to_string()))
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Csv => write!(f, "CSV"),
            FileType::Parquet => write!(f, "Parquet"),
        }
    }
}
