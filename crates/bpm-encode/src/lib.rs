//! HCL encoder/decoder for the two manifest files and the ignore file.
//!
//! Round-trip is the only contract this crate promises: `decode(encode(x))`
//! is structurally equal to `x` for the declaration file, the lock file,
//! and the ignore file.

mod codec;
mod schema;

pub use codec::{
    decode_declaration_file, decode_ignore_file, decode_lock_file, encode_declaration_file,
    encode_ignore_file, encode_lock_file,
};
