/*!
The `dsv` crate provides a streaming reader for delimiter-separated text
records ("CSV-like" data), reading from a file path or any `io::Read`
source.

The reader implements the common quoting and escape semantics of RFC
4180: fields may be enclosed in double quotes, and an embedded double
quote is written as two consecutive double quotes. It is deliberately
*not* strict about the rest of that grammar, because data seen in the
wild rarely is. In particular:

* `LF` and `CRLF` line endings are both accepted.
* Blank lines and lines whose first non-whitespace byte is `#` are
  skipped (and still counted by [`Reader::line_no`]).
* Records may have varying numbers of fields.
* A quote only opens a quoted field at the start of a field; quotes
  appearing after field content are literal bytes.
* Bytes following a closing quote start a new unquoted field instead of
  being rejected.
* A quoted field left unterminated at end of line yields its
  accumulated contents; nothing is an error.

Quoted fields spanning multiple lines are not supported: the line
terminator always ends the record, whatever the quoting state. Parsing
is byte oriented and encoding agnostic; see [`StringRow`] for a
validated UTF-8 view of a [`Row`].

# Example

Read a small document with a header row:

```
use dsv::Reader;

let data = "\
## inventory dump
name,qty
widget,12
\"odd, name\",3
";

let mut rdr = Reader::from_reader(data.as_bytes());
assert_eq!(rdr.headers().unwrap(), &vec!["name", "qty"]);

let rows: Vec<_> = rdr.rows().collect();
assert_eq!(rows[0], vec!["widget", "12"]);
assert_eq!(rows[1], vec!["odd, name", "3"]);
assert_eq!(rdr.line_no(), 4);
```

Reading from a file goes through [`Reader::from_path`], which defers
opening the file to the first read. There is no error type anywhere on
the streaming surface: an unreadable file behaves like an empty one.
*/

pub use dsv_core::{
    resolve_delimiter, TokenizeResult, Tokenizer, TokenizerBuilder,
};

pub use crate::error::{FromUtf8Error, Utf8Error};
pub use crate::reader::{LazyFile, Reader, ReaderBuilder, Rows};
pub use crate::row::{Row, RowIter};
pub use crate::string_row::{StringRow, StringRowIter};

mod error;
mod reader;
mod row;
mod string_row;
