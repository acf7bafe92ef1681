//! Purpose: Load typed rows from a delimited text file.
//! Exports: `load_csv`.
//! Role: One-time startup boundary; given a path, returns the ordered
//! sequence of typed field maps the table is built from.
//! Invariants: The header row supplies field names and is never stored as data.
//! Invariants: Scalars are coerced to integers when lexically possible.

use std::path::Path;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{coerce_scalar, Record};

pub fn load_csv(path: &Path) -> Result<Vec<Record>, Error> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to open data file")
            .with_path(path)
            .with_source(err)
    })?;

    let headers = reader
        .headers()
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read data file header")
                .with_path(path)
                .with_source(err)
        })?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read data row")
                .with_path(path)
                .with_source(err)
        })?;
        let mut record = Record::new();
        for (name, raw) in headers.iter().zip(row.iter()) {
            record.insert(name.to_string(), coerce_scalar(raw));
        }
        rows.push(record);
    }
    Ok(rows)
}
