//! Stream filters needed by the document core.
//!
//! Object streams and content streams are almost always Flate-compressed,
//! so the core carries FlateDecode (and the cheap ASCIIHexDecode) even
//! though general codec support lives with downstream consumers. Filters
//! can be chained; the `/Filter` entry of a stream dictionary names them
//! in application order.

use crate::error::{Error, Result};
use crate::object::Object;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// A PDF stream filter implementation.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Filter name as it appears in stream dictionaries.
    fn name(&self) -> &'static str;
}

/// FlateDecode (zlib/deflate).
///
/// Tries standard zlib first. On failure, keeps any bytes decoded before
/// the error (truncated streams from bad producers are common), then
/// retries as raw deflate for data whose zlib header is corrupt.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(err) => {
                if !output.is_empty() {
                    log::warn!(
                        "FlateDecode partial recovery: {} bytes before corruption: {}",
                        output.len(),
                        err
                    );
                    return Ok(output);
                }
            }
        }

        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => Ok(output),
            Err(err) => {
                if !output.is_empty() {
                    log::warn!(
                        "raw deflate partial recovery: {} bytes before corruption",
                        output.len()
                    );
                    Ok(output)
                } else {
                    Err(Error::Decode(format!("FlateDecode failed: {}", err)))
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "FlateDecode"
    }
}

/// ASCIIHexDecode.
///
/// Pairs of hex digits; whitespace ignored; decoding stops at `>`; an odd
/// trailing nibble is padded with zero.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() / 2);
        let mut pending: Option<u8> = None;

        for &byte in input {
            if byte == b'>' {
                break;
            }
            if byte.is_ascii_whitespace() || byte == 0 {
                continue;
            }
            let nibble = (byte as char).to_digit(16).ok_or_else(|| {
                Error::Decode(format!("invalid hex digit 0x{:02x} in ASCIIHexDecode data", byte))
            })? as u8;
            match pending.take() {
                Some(hi) => out.push(hi << 4 | nibble),
                None => pending = Some(nibble),
            }
        }
        if let Some(hi) = pending {
            out.push(hi << 4);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "ASCIIHexDecode"
    }
}

/// Extract the filter names from a stream dictionary's `/Filter` entry,
/// which may be a single name or an array of names. The caller resolves
/// indirect references first.
pub fn filter_names(filter: &Object) -> Vec<String> {
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(array) => array
            .items()
            .iter()
            .filter_map(|item| item.as_name().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Run data through a filter pipeline in order.
///
/// # Errors
///
/// Returns `Err` for filters the core does not implement and for data a
/// filter cannot decode.
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for filter in filters {
        let decoder: &dyn StreamDecoder = match filter.as_str() {
            "FlateDecode" | "Fl" => &FlateDecoder,
            "ASCIIHexDecode" | "AHx" => &AsciiHexDecoder,
            other => {
                return Err(Error::Decode(format!("unsupported filter: {}", other)));
            }
        };
        current = decoder.decode(&current)?;
    }
    Ok(current)
}
