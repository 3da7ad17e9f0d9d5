use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};

use dsv_core::{resolve_delimiter, TokenizeResult, Tokenizer, TokenizerBuilder};

use crate::row::Row;

/// Builds a reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter and header
/// handling. Once a [`Reader`] is built, its configuration cannot be
/// changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    delimiter: u8,
    has_headers: bool,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { delimiter: b',', has_headers: true }
    }
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use, given as a byte string.
    ///
    /// Only the first byte is used. An empty configuration, or one whose
    /// first byte is a line feed, carriage return, double quote or NUL,
    /// silently resolves to `b','`. The default is `b","`.
    pub fn delimiter(&mut self, delim: &[u8]) -> &mut ReaderBuilder {
        self.delimiter = resolve_delimiter(delim);
        self
    }

    /// Whether to treat the first row as a special header row.
    ///
    /// By default this is enabled. When enabled, the first non-skippable
    /// line of the input is cached as the header and excluded from
    /// [`Reader::next_row`] and friends; it can be retrieved with
    /// [`Reader::headers`] at any time.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }

    /// Build a reader for the file at the given path.
    ///
    /// The file is not opened here. It is opened by the first read, and
    /// an open failure is indistinguishable from an empty input: the
    /// reader reports no header and no rows, and stays in that state.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Reader<LazyFile> {
        let path = path.as_ref().to_path_buf();
        Reader::make(LazyFile::new(path.clone()), Some(path), self)
    }

    /// Build a reader from an arbitrary `io::Read` source.
    ///
    /// The source is buffered internally.
    pub fn from_reader<R: Read>(&self, rdr: R) -> Reader<R> {
        Reader::make(rdr, None, self)
    }
}

/// A streaming reader of delimiter-separated rows.
///
/// The reader advances through its input one physical line at a time,
/// skipping blank lines and `#` comments, and hands each remaining line
/// to the field tokenizer. Rows are delivered strictly in input order;
/// the optional header row, when enabled, is always consumed before the
/// first data row whether or not [`headers`](Reader::headers) is called.
///
/// There is no error type on this surface. End of input, an unreadable
/// file and an I/O failure mid-stream all present the same way: no more
/// rows. A caller that needs to distinguish a missing file from an empty
/// one can check [`line_no`](Reader::line_no) after draining, which
/// counts every physical line read, skipped or not.
///
/// # Example
///
/// ```
/// use dsv::Reader;
///
/// let data = "\
/// city,pop
/// ## estimates
/// Boston,4628910
/// Concord,42695
/// ";
///
/// let mut rdr = Reader::from_reader(data.as_bytes());
/// assert_eq!(rdr.headers().unwrap(), &vec!["city", "pop"]);
/// for row in rdr.rows() {
///     assert_eq!(row.len(), 2);
/// }
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    /// The buffered input source.
    rdr: io::BufReader<R>,
    /// The line tokenizer.
    core: Tokenizer,
    /// Where the input came from, for diagnostics only.
    path: Option<PathBuf>,
    /// Whether the first non-skippable line is a header.
    has_headers: bool,
    /// The cached header row. Immutable once materialized.
    header: Option<Row>,
    /// Number of physical lines consumed, including skipped ones.
    line_no: u64,
    /// Set once the input is exhausted or unreadable.
    done: bool,
    /// Scratch buffer holding the current logical line.
    lbuf: Vec<u8>,
}

impl Reader<LazyFile> {
    /// Create a reader for the file at the given path, with the default
    /// configuration.
    ///
    /// This never touches the file system; see
    /// [`ReaderBuilder::from_path`] for the lazy-open contract.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dsv::Reader;
    ///
    /// let mut rdr = Reader::from_path("measurements.csv");
    /// while let Some(row) = rdr.next_row() {
    ///     println!("{:?}", row);
    /// }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Reader<LazyFile> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: Read> Reader<R> {
    /// Create a reader from an arbitrary `io::Read` source, with the
    /// default configuration.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    fn make(rdr: R, path: Option<PathBuf>, builder: &ReaderBuilder) -> Reader<R> {
        Reader {
            rdr: io::BufReader::new(rdr),
            core: TokenizerBuilder::new().delimiter(&[builder.delimiter]).build(),
            path,
            has_headers: builder.has_headers,
            header: None,
            line_no: 0,
            done: false,
            lbuf: Vec::new(),
        }
    }

    /// Return the header row, reading it on demand.
    ///
    /// Returns `None` when the reader was configured without headers, or
    /// when the input has no non-skippable lines at all. Otherwise this
    /// returns the first non-skippable line of the input, reading it if
    /// necessary and answering from the cache on every later call, before
    /// or after any number of data rows have been drawn.
    pub fn headers(&mut self) -> Option<&Row> {
        if !self.has_headers {
            return None;
        }
        if self.header.is_none() {
            self.read_header();
        }
        self.header.as_ref()
    }

    /// Return the next data row, or `None` when the input is exhausted.
    ///
    /// When headers are enabled and not yet consumed, the header line is
    /// read and cached first, so the first call still yields the first
    /// *data* row.
    pub fn next_row(&mut self) -> Option<Row> {
        let mut row = Row::new();
        if self.read_row(&mut row) {
            Some(row)
        } else {
            None
        }
    }

    /// Read the next data row into `row`, reusing its buffers.
    ///
    /// Returns false when the input is exhausted, in which case `row` is
    /// left cleared. This is the amortized-allocation flavor of
    /// [`next_row`](Reader::next_row).
    pub fn read_row(&mut self, row: &mut Row) -> bool {
        if self.has_headers && self.header.is_none() {
            self.read_header();
        }
        if !self.next_line() {
            row.clear();
            return false;
        }
        self.tokenize_line_into(row);
        true
    }

    /// Returns an iterator over the data rows of this reader.
    pub fn rows(&mut self) -> Rows<R> {
        Rows { rdr: self }
    }

    /// The number of physical lines read so far, including skipped blank
    /// and comment lines. Starts at 0.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// The delimiter byte in use, after resolution.
    pub fn delimiter(&self) -> u8 {
        self.core.delimiter()
    }

    /// The path this reader was created from, if any. Informational only.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true once the input is exhausted (or unavailable). All
    /// further row reads return nothing.
    pub fn done(&self) -> bool {
        self.done
    }

    /// Read and cache the header row, if there is one to read.
    fn read_header(&mut self) {
        if !self.next_line() {
            return;
        }
        let mut row = Row::new();
        self.tokenize_line_into(&mut row);
        self.header = Some(row);
    }

    /// Advance to the next non-skippable physical line, leaving its
    /// contents, without the trailing `LF` or `CRLF`, in `self.lbuf`.
    ///
    /// Returns false at end of input. I/O failures, including a failure
    /// to open the underlying file, collapse to end of input; the reader
    /// stays drainable.
    fn next_line(&mut self) -> bool {
        if self.done {
            return false;
        }
        loop {
            self.lbuf.clear();
            match self.rdr.read_until(b'\n', &mut self.lbuf) {
                Ok(0) => {
                    self.done = true;
                    return false;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!(
                        "read error on {:?} after line {}: {}",
                        self.path,
                        self.line_no,
                        err
                    );
                    self.done = true;
                    return false;
                }
            }
            self.line_no += 1;
            if self.lbuf.last() == Some(&b'\n') {
                self.lbuf.pop();
                if self.lbuf.last() == Some(&b'\r') {
                    self.lbuf.pop();
                }
            }
            if !is_skippable(&self.lbuf) {
                return true;
            }
            log::trace!("skipping line {} (blank or comment)", self.line_no);
        }
    }

    /// Tokenize the line in `self.lbuf` into `row`, growing the row's
    /// buffers as the tokenizer reports them full.
    fn tokenize_line_into(&mut self, row: &mut Row) {
        row.clear();
        let (mut pos, mut outlen, mut endlen) = (0, 0, 0);
        loop {
            let (res, nin, nout, nend) = {
                let (fields, ends) = row.as_parts();
                self.core.tokenize_line(
                    &self.lbuf[pos..],
                    &mut fields[outlen..],
                    &mut ends[endlen..],
                )
            };
            pos += nin;
            outlen += nout;
            endlen += nend;
            match res {
                TokenizeResult::OutputFull => row.expand_fields(),
                TokenizeResult::OutputEndsFull => row.expand_ends(),
                TokenizeResult::Line => {
                    row.set_len(endlen);
                    return;
                }
            }
        }
    }
}

/// The portable whitespace set: space, tab, carriage return, line feed,
/// vertical tab and form feed. Note that this is wider than
/// `u8::is_ascii_whitespace`, which excludes the vertical tab.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C)
}

/// True for lines the reader skips: empty after leading whitespace, or
/// with `#` as the first non-whitespace byte. The check never mutates the
/// line; data lines keep their leading whitespace.
fn is_skippable(line: &[u8]) -> bool {
    match line.iter().find(|&&b| !is_space(b)) {
        None => true,
        Some(&b) => b == b'#',
    }
}

/// An iterator over the data rows of a reader.
///
/// Yields owned [`Row`]s; the rows remain valid after the iterator and
/// the reader are gone.
pub struct Rows<'r, R> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: Read> Iterator for Rows<'r, R> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rdr.next_row()
    }
}

/// A file that is opened on first read.
///
/// [`Reader::from_path`] constructs its reader around one of these, so
/// that building a reader never touches the file system. The first read
/// opens the file; if the open fails, the failure is reported as the read
/// error and remembered, and every later read fails the same way.
#[derive(Debug)]
pub struct LazyFile {
    path: PathBuf,
    file: Option<fs::File>,
    opened: bool,
}

impl LazyFile {
    fn new(path: PathBuf) -> LazyFile {
        LazyFile { path, file: None, opened: false }
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.opened {
            self.opened = true;
            self.file = Some(fs::File::open(&self.path)?);
        }
        match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "source file previously failed to open",
            )),
        }
    }
}
