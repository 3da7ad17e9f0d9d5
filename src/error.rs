use std::error;
use std::fmt;

use crate::row::Row;

/// A UTF-8 validation error that occurs when attempting to convert a
/// `Row` into a `StringRow`.
///
/// The error owns the offending `Row` so that the caller can recover it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FromUtf8Error {
    row: Row,
    err: Utf8Error,
}

/// Create a new FromUtf8Error.
pub(crate) fn new_from_utf8_error(row: Row, err: Utf8Error) -> FromUtf8Error {
    FromUtf8Error { row, err }
}

impl FromUtf8Error {
    /// Access the underlying `Row` that failed UTF-8 validation.
    pub fn into_row(self) -> Row {
        self.row
    }

    /// Access the underlying UTF-8 validation error.
    pub fn utf8_error(&self) -> &Utf8Error {
        &self.err
    }
}

impl fmt::Display for FromUtf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl error::Error for FromUtf8Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}

/// A UTF-8 validation error, reported for a single field of a row.
///
/// The error includes the index of the field that failed validation, and
/// the index within that field up to which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The index of the field in which UTF-8 validation failed.
    field: usize,
    /// The index into the field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

/// Create a new UTF-8 error.
pub(crate) fn new_utf8_error(field: usize, valid_up_to: usize) -> Utf8Error {
    Utf8Error { field, valid_up_to }
}

impl Utf8Error {
    /// The index of the field in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8 in field {} near byte index {}",
            self.field, self.valid_up_to
        )
    }
}

impl error::Error for Utf8Error {}
