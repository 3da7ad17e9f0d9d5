use core::cmp;

use memchr::{memchr, memchr3};

/// Resolve a delimiter configuration to a concrete delimiter byte.
///
/// Only the first byte of the configuration is significant. An empty
/// configuration resolves to `b','`, as does any byte that can never act
/// as a field delimiter: line feed, carriage return, the double quote and
/// NUL. Misconfiguration is a policy decision here, not an error, so that
/// it never surfaces as a runtime failure.
///
/// # Example
///
/// ```
/// use dsv_core::resolve_delimiter;
///
/// assert_eq!(resolve_delimiter(b";"), b';');
/// assert_eq!(resolve_delimiter(b""), b',');
/// assert_eq!(resolve_delimiter(b"\n"), b',');
/// ```
pub fn resolve_delimiter(config: &[u8]) -> u8 {
    match config.first() {
        None => b',',
        Some(&b'\n') | Some(&b'\r') | Some(&b'"') | Some(&0) => b',',
        Some(&delim) => delim,
    }
}

/// A tokenizer for one logical line of delimiter-separated text.
///
/// The tokenizer splits a line (a byte string with its trailing `LF` or
/// `CRLF` already removed) into fields using a three-state machine.
/// Fields may be quoted with double quotes; a doubled quote inside a
/// quoted field is an escaped quote. The tokenizer is deliberately
/// lenient and can never fail:
///
/// * A quote only opens a quoted field when it is the first byte of that
///   field. Quotes appearing after field content are literal bytes.
/// * Bytes following a closing quote begin a new unquoted field rather
///   than being rejected.
/// * A quoted field left unterminated at the end of the line yields
///   everything after the opening quote as the field's content.
///
/// Every line tokenizes to at least one field; the empty line yields a
/// single empty field.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    /// The byte that separates fields.
    delimiter: u8,
    /// The current state, persisted across resumed calls.
    state: State,
    /// Total bytes written to the caller's logical output buffer by
    /// previous calls for the line in progress. Field end positions are
    /// offsets into that logical buffer.
    output_pos: usize,
}

impl Default for Tokenizer {
    fn default() -> Tokenizer {
        Tokenizer {
            delimiter: b',',
            state: State::StartField,
            output_pos: 0,
        }
    }
}

/// Builds a tokenizer with a configured delimiter.
#[derive(Debug, Default)]
pub struct TokenizerBuilder {
    tok: Tokenizer,
}

impl TokenizerBuilder {
    /// Create a new builder.
    pub fn new() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// The field delimiter to use, given as a byte string.
    ///
    /// Only the first byte is used. Empty or disallowed configurations
    /// silently resolve to `b','`; see [`resolve_delimiter`].
    pub fn delimiter(&mut self, delim: &[u8]) -> &mut TokenizerBuilder {
        self.tok.delimiter = resolve_delimiter(delim);
        self
    }

    /// Build a tokenizer from this configuration.
    pub fn build(&self) -> Tokenizer {
        self.tok.clone()
    }
}

/// The result of tokenizing at most one logical line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenizeResult {
    /// The caller provided output buffer was filled before the line was
    /// finished. Grow (or drain) the output buffer and resume with the
    /// unconsumed remainder of the line.
    OutputFull,
    /// The caller provided buffer of field end positions was filled
    /// before the line was finished. Grow it and resume with the
    /// unconsumed remainder of the line.
    OutputEndsFull,
    /// The line has been fully tokenized and the final field emitted.
    /// The tokenizer is reset and ready for the next line.
    Line,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// At the start of a field, nothing accumulated yet. A quote seen
    /// here opens a quoted field.
    StartField,
    /// Inside an unquoted field. Quotes seen here are literal data.
    InField,
    /// Inside a quoted field.
    InQuotedField,
    /// Just saw a quote inside a quoted field; the next byte decides
    /// whether it was an escape or the end of the quoted field.
    AfterQuote,
    /// A field just ended at a delimiter.
    EndFieldDelim,
    /// The line ended at an embedded terminator byte.
    EndLine,
}

impl State {
    fn is_field_final(&self) -> bool {
        matches!(*self, State::EndFieldDelim | State::EndLine)
    }
}

impl Tokenizer {
    /// Create a new tokenizer with the default configuration (comma
    /// delimited).
    pub fn new() -> Tokenizer {
        TokenizerBuilder::new().build()
    }

    /// Return the delimiter byte in use.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Tokenize the logical line in `input`, copying unescaped field data
    /// to `output` and recording the end position of each field in `ends`.
    ///
    /// Exhausting `input` ends the line: the field in progress is emitted,
    /// so a complete line must be presented across one run of calls. The
    /// return values are the result along with the number of bytes
    /// consumed from `input`, the number of bytes written to `output` and
    /// the number of positions written to `ends`.
    ///
    /// When the result is [`TokenizeResult::OutputFull`] or
    /// [`TokenizeResult::OutputEndsFull`], the caller should grow the
    /// corresponding buffer and resume with `&input[nin..]`, passing the
    /// unwritten portions of `output` and `ends`. End positions are
    /// offsets into the caller's logical output buffer accumulated across
    /// such resumed calls.
    ///
    /// Field `i` occupies `output[ends[i - 1]..ends[i]]` (with `ends[-1]`
    /// taken to be `0`). There is always at least one field, even for an
    /// empty line.
    pub fn tokenize_line(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        ends: &mut [usize],
    ) -> (TokenizeResult, usize, usize, usize) {
        if !input.is_empty() {
            if output.is_empty() {
                return (TokenizeResult::OutputFull, 0, 0, 0);
            }
            if ends.is_empty() {
                return (TokenizeResult::OutputEndsFull, 0, 0, 0);
            }
        }
        let (mut nin, mut nout, mut nend) = (0, 0, 0);
        let mut state = self.state;
        while nin < input.len() && nout < output.len() && nend < ends.len() {
            let (next, consume, copy) = self.transition(state, input[nin]);
            if copy {
                output[nout] = input[nin];
                nout += 1;
            }
            if consume {
                nin += 1;
            }
            state = next;
            if state.is_field_final() {
                ends[nend] = self.output_pos + nout;
                nend += 1;
                if state == State::EndLine {
                    break;
                }
            } else if state == State::InField {
                // Bulk-copy the run of ordinary bytes; only the delimiter
                // and embedded terminators need the state machine.
                let rest = &input[nin..];
                let run = memchr3(self.delimiter, b'\r', b'\n', rest)
                    .unwrap_or(rest.len());
                let run = cmp::min(run, output.len() - nout);
                output[nout..nout + run].copy_from_slice(&input[nin..nin + run]);
                nin += run;
                nout += run;
            } else if state == State::InQuotedField {
                // Same, but inside quotes only the quote byte is special.
                let rest = &input[nin..];
                let run = memchr(b'"', rest).unwrap_or(rest.len());
                let run = cmp::min(run, output.len() - nout);
                output[nout..nout + run].copy_from_slice(&input[nin..nin + run]);
                nin += run;
                nout += run;
            }
        }
        if state == State::EndLine {
            // The line ended at an embedded terminator byte; whatever
            // follows it belongs to no field.
            self.state = State::StartField;
            self.output_pos = 0;
            return (TokenizeResult::Line, nin, nout, nend);
        }
        if nin < input.len() {
            self.state = state;
            self.output_pos += nout;
            if nout >= output.len() {
                return (TokenizeResult::OutputFull, nin, nout, nend);
            }
            return (TokenizeResult::OutputEndsFull, nin, nout, nend);
        }
        // Input exhausted: the line is complete. Emit the final field.
        // For an unterminated quoted field this is everything accumulated
        // since the opening quote.
        if state == State::EndFieldDelim {
            state = State::StartField;
        }
        if nend >= ends.len() {
            self.state = state;
            self.output_pos += nout;
            return (TokenizeResult::OutputEndsFull, nin, nout, nend);
        }
        ends[nend] = self.output_pos + nout;
        nend += 1;
        self.state = State::StartField;
        self.output_pos = 0;
        (TokenizeResult::Line, nin, nout, nend)
    }

    /// A single state transition. Returns the next state, whether the
    /// input byte was consumed and whether it was copied to the output.
    ///
    /// `AfterQuote` on an ordinary byte transitions to `EndFieldDelim`
    /// without consuming: the quoted field is complete, and the byte is
    /// re-dispatched from `StartField` as the start of a new unquoted
    /// field.
    #[inline]
    fn transition(&self, state: State, c: u8) -> (State, bool, bool) {
        use self::State::*;
        match state {
            StartField => {
                if c == self.delimiter {
                    (EndFieldDelim, true, false)
                } else if c == b'"' {
                    (InQuotedField, true, false)
                } else if c == b'\r' || c == b'\n' {
                    (EndLine, true, false)
                } else {
                    (InField, true, true)
                }
            }
            EndFieldDelim => (StartField, false, false),
            InField => {
                if c == self.delimiter {
                    (EndFieldDelim, true, false)
                } else if c == b'\r' || c == b'\n' {
                    (EndLine, true, false)
                } else {
                    (InField, true, true)
                }
            }
            InQuotedField => {
                if c == b'"' {
                    (AfterQuote, true, false)
                } else {
                    (InQuotedField, true, true)
                }
            }
            AfterQuote => {
                if c == b'"' {
                    (InQuotedField, true, true)
                } else if c == self.delimiter {
                    (EndFieldDelim, true, false)
                } else if c == b'\r' || c == b'\n' || c == 0 {
                    (EndLine, true, false)
                } else {
                    (EndFieldDelim, false, false)
                }
            }
            EndLine => (EndLine, false, false),
        }
    }
}
