/*!
`dsv-core` provides the field tokenizer underpinning the `dsv` crate: a
small state machine that splits one logical line of delimiter-separated
text into fields, honouring double-quote escaping.

This crate is `no_std` and never allocates. Callers provide the buffers
that field data and field boundaries are written to, and grow them when the
tokenizer reports that they are full. For reading whole files, use the
`dsv` crate instead.

# Example: tokenize one line

This example splits a line into three fields, using a fixed output buffer.

```
use dsv_core::{Tokenizer, TokenizeResult};

let mut tok = Tokenizer::new();
let mut output = [0; 64];
let mut ends = [0; 8];

let (res, _, nout, nend) =
    tok.tokenize_line(b"a,\"b,c\",d", &mut output, &mut ends);
assert_eq!(res, TokenizeResult::Line);
assert_eq!(nend, 3);
assert_eq!(&output[..nout], b"ab,cd");
assert_eq!(&ends[..nend], &[1, 4, 5]);
```
*/

#![cfg_attr(not(test), no_std)]

pub use crate::tokenizer::{
    resolve_delimiter, TokenizeResult, Tokenizer, TokenizerBuilder,
};

mod tokenizer;
