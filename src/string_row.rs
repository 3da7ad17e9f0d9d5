use std::fmt;
use std::ops;
use std::result;
use std::str;

use crate::error::{new_from_utf8_error, FromUtf8Error};
use crate::row::{Row, RowIter};

/// A single row stored as valid UTF-8.
///
/// The reader itself is encoding agnostic and yields [`Row`]s of raw
/// bytes; `StringRow` is the validated view for sources known to be
/// UTF-8. Conversion checks each field and reports which one failed.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct StringRow(Row);

impl StringRow {
    /// Create a new empty `StringRow`.
    pub fn new() -> StringRow {
        StringRow(Row::new())
    }

    /// Create a new `StringRow` from a `Row`.
    ///
    /// If the given row does not contain valid UTF-8, this returns an
    /// error that includes the failing field index and the original row.
    pub fn from_row(row: Row) -> result::Result<StringRow, FromUtf8Error> {
        match row.validate() {
            Ok(()) => Ok(StringRow(row)),
            Err(err) => Err(new_from_utf8_error(row, err)),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(|field| {
            // SAFETY: from_row validated every field, and no mutation
            // short of replacing the whole row is possible afterwards.
            unsafe { str::from_utf8_unchecked(field) }
        })
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> StringRowIter {
        StringRowIter(self.0.iter())
    }

    /// Convert this `StringRow` back into a `Row`.
    pub fn into_row(self) -> Row {
        self.0
    }

    /// Borrow the underlying `Row`.
    pub fn as_row(&self) -> &Row {
        &self.0
    }
}

impl fmt::Debug for StringRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<&str> = self.iter().collect();
        write!(f, "StringRow({:?})", fields)
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for StringRow {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.iter().eq(other.iter().map(|field| field.as_ref()))
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for StringRow {
    fn eq(&self, other: &[T]) -> bool {
        self.iter().eq(other.iter().map(|field| field.as_ref()))
    }
}

impl ops::Index<usize> for StringRow {
    type Output = str;
    fn index(&self, i: usize) -> &str {
        self.get(i).unwrap()
    }
}

impl<'a> IntoIterator for &'a StringRow {
    type IntoIter = StringRowIter<'a>;
    type Item = &'a str;
    fn into_iter(self) -> StringRowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a `StringRow`.
pub struct StringRowIter<'a>(RowIter<'a>);

impl<'a> Iterator for StringRowIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(|field| {
            // SAFETY: see StringRow::get.
            unsafe { str::from_utf8_unchecked(field) }
        })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StringRow {
    /// Serialize this row as a sequence of strings.
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for field in self {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::StringRow;
    use crate::row::Row;

    #[test]
    fn from_valid_row() {
        let mut row = Row::new();
        row.push_field(b"foo");
        row.push_field("héllo".as_bytes());

        let row = StringRow::from_row(row).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some("foo"));
        assert_eq!(row.get(1), Some("héllo"));
        assert_eq!(row.get(2), None);
        assert_eq!(&row[0], "foo");
        assert_eq!(row, vec!["foo", "héllo"]);
    }

    #[test]
    fn utf8_error_1() {
        let mut row = Row::new();
        row.push_field(b"foo");
        row.push_field(b"b\xFFar");

        let err = StringRow::from_row(row).unwrap_err();
        assert_eq!(err.utf8_error().field(), 1);
        assert_eq!(err.utf8_error().valid_up_to(), 1);
    }

    #[test]
    fn utf8_error_2() {
        let mut row = Row::new();
        row.push_field(b"\xFF");

        let err = StringRow::from_row(row).unwrap_err();
        assert_eq!(err.utf8_error().field(), 0);
        assert_eq!(err.utf8_error().valid_up_to(), 0);
    }

    #[test]
    fn utf8_error_3() {
        let mut row = Row::new();
        row.push_field(b"a");
        row.push_field(b"b");
        row.push_field(b"xyz\xFF");

        let err = StringRow::from_row(row).unwrap_err();
        assert_eq!(err.utf8_error().field(), 2);
        assert_eq!(err.utf8_error().valid_up_to(), 3);
    }

    // A single field may be invalid even though the concatenation of all
    // fields is valid UTF-8; validation must be per field.
    #[test]
    fn utf8_error_split_codepoint() {
        let mut row = Row::new();
        row.push_field(b"a\xc9");
        row.push_field(b"\x91b");

        let err = StringRow::from_row(row).unwrap_err();
        assert_eq!(err.utf8_error().field(), 0);
        assert_eq!(err.utf8_error().valid_up_to(), 1);
    }

    #[test]
    fn error_returns_row() {
        let mut row = Row::new();
        row.push_field(b"\xFF");

        let err = StringRow::from_row(row).unwrap_err();
        let row = err.into_row();
        assert_eq!(row.get(0), Some(&b"\xFF"[..]));
    }

    #[test]
    fn into_row_round_trip() {
        let mut row = Row::new();
        row.push_field(b"a");
        let srow = StringRow::from_row(row.clone()).unwrap();
        assert_eq!(srow.into_row(), row);
    }
}
