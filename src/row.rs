use std::cmp;
use std::fmt;
use std::ops;
use std::result;
use std::str;

use bstr::{BStr, ByteSlice};

use crate::error::{new_utf8_error, Utf8Error};

/// A single row stored as raw bytes.
///
/// A row is an ordered sequence of fields, where a field is a possibly
/// empty byte string. Rows carry no schema: two rows from the same source
/// may have different numbers of fields. Field data is stored in one
/// contiguous buffer alongside the end offset of each field, so a row
/// costs two allocations regardless of how many fields it has, and its
/// buffers are reused when it is passed back to
/// [`read_row`](crate::Reader::read_row).
///
/// Rows returned by a reader are owned by the caller and remain valid
/// after the reader is gone.
#[derive(Clone)]
pub struct Row {
    /// All fields in this row, stored contiguously.
    fields: Vec<u8>,
    /// The number of and location of each field in this row.
    bounds: Bounds,
}

impl Default for Row {
    fn default() -> Row {
        Row::new()
    }
}

impl Row {
    /// Create a new empty `Row`.
    pub fn new() -> Row {
        Row::with_capacity(0)
    }

    /// Create a new empty `Row` with the given field buffer capacity.
    pub fn with_capacity(capacity: usize) -> Row {
        Row { fields: vec![0; capacity], bounds: Bounds::default() }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.bounds.get(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.bounds.len
    }

    /// Clear this row so that it has zero fields.
    ///
    /// Clearing keeps the underlying buffers, so a cleared row can be
    /// refilled without reallocating.
    pub fn clear(&mut self) {
        self.bounds.len = 0;
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter {
        RowIter { row: self, start: 0, i: 0 }
    }

    /// Append a field to this row.
    pub fn push_field(&mut self, field: &[u8]) {
        let (start, end) = (self.bounds.end(), self.bounds.end() + field.len());
        while end > self.fields.len() {
            self.expand_fields();
        }
        self.fields[start..end].copy_from_slice(field);
        self.bounds.add(end);
    }

    /// Retrieve the underlying buffers that the tokenizer writes into.
    pub(crate) fn as_parts(&mut self) -> (&mut [u8], &mut [usize]) {
        (&mut self.fields, &mut self.bounds.ends)
    }

    /// Set the number of fields in this row.
    pub(crate) fn set_len(&mut self, len: usize) {
        self.bounds.len = len;
    }

    /// Expand the capacity for storing field data.
    pub(crate) fn expand_fields(&mut self) {
        let new_len = self.fields.len().checked_mul(2).unwrap();
        self.fields.resize(cmp::max(128, new_len), 0);
    }

    /// Expand the capacity for storing field end positions.
    pub(crate) fn expand_ends(&mut self) {
        self.bounds.expand();
    }

    /// Validate the contents of this row as UTF-8.
    ///
    /// This never modifies the row.
    pub(crate) fn validate(&self) -> result::Result<(), Utf8Error> {
        // If the entire buffer is ASCII, the per-field checks cannot fail.
        if self.fields[..self.bounds.end()].iter().all(|&b| b <= 0x7F) {
            return Ok(());
        }
        for (i, field) in self.iter().enumerate() {
            if let Err(err) = str::from_utf8(field) {
                return Err(new_utf8_error(i, err.valid_up_to()));
            }
        }
        Ok(())
    }
}

/// The bounds of fields in a single row.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Bounds {
    /// The ending index of each field.
    ends: Vec<usize>,
    /// The number of fields in this row.
    ///
    /// `ends` doubles as slice storage for the tokenizer, so its length
    /// is a capacity; this is the count of positions actually in use.
    len: usize,
}

impl Bounds {
    /// Returns the bounds of field `i`.
    fn get(&self, i: usize) -> Option<ops::Range<usize>> {
        if i >= self.len {
            return None;
        }
        let end = match self.ends.get(i) {
            None => return None,
            Some(&end) => end,
        };
        let start = match i.checked_sub(1).and_then(|i| self.ends.get(i)) {
            None => 0,
            Some(&start) => start,
        };
        Some(ops::Range { start, end })
    }

    /// Returns a slice of the end positions of all fields in use.
    fn ends(&self) -> &[usize] {
        &self.ends[..self.len]
    }

    /// Return the end position of the last field.
    ///
    /// If there are no fields, this returns `0`.
    fn end(&self) -> usize {
        self.ends().last().copied().unwrap_or(0)
    }

    /// Expand the capacity for storing field end positions.
    fn expand(&mut self) {
        let new_len = self.ends.len().checked_mul(2).unwrap();
        self.ends.resize(cmp::max(8, new_len), 0);
    }

    /// Add a new field with the given ending position.
    fn add(&mut self, pos: usize) {
        if self.len >= self.ends.len() {
            self.expand();
        }
        self.ends[self.len] = pos;
        self.len += 1;
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<&BStr> = self.iter().map(|field| field.as_bstr()).collect();
        write!(f, "Row({:?})", fields)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Row) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for Row {}

impl<T: AsRef<[u8]>> PartialEq<Vec<T>> for Row {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.iter().eq(other.iter().map(|field| field.as_ref()))
    }
}

impl<T: AsRef<[u8]>> PartialEq<[T]> for Row {
    fn eq(&self, other: &[T]) -> bool {
        self.iter().eq(other.iter().map(|field| field.as_ref()))
    }
}

impl ops::Index<usize> for Row {
    type Output = [u8];
    fn index(&self, i: usize) -> &[u8] {
        self.get(i).unwrap()
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = &'a [u8];
    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a row.
pub struct RowIter<'a> {
    row: &'a Row,
    start: usize,
    i: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        match self.row.bounds.ends().get(self.i) {
            None => None,
            Some(&end) => {
                let field = &self.row.fields[self.start..end];
                self.start = end;
                self.i += 1;
                Some(field)
            }
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Row {
    /// Serialize this row as a sequence of fields, each one a string when
    /// it is valid UTF-8 and a byte sequence otherwise.
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for field in self {
            match str::from_utf8(field) {
                Ok(text) => seq.serialize_element(text)?,
                Err(_) => seq.serialize_element(field)?,
            }
        }
        seq.end()
    }
}
