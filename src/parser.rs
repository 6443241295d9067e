//! Direct-object parser.
//!
//! Recursive descent over [`lexer`](crate::lexer) tokens, producing
//! [`Object`] values for everything that can appear in object position:
//! null, booleans, numbers, strings, names, arrays, dictionaries, and
//! indirect references. Stream payloads are a file-structure concern and
//! are handled by the file parser, which owns the byte cursor and the
//! scratch file.
//!
//! An integer may begin an indirect reference (`12 0 R`), so integers are
//! parsed with a two-token lookahead that falls back to the plain number
//! when the reference shape does not complete.

use crate::error::{Error, Result};
use crate::lexer::{Token, token};
use crate::object::{Array, Dictionary, Object, ObjectKey, StringKind};
use nom::IResult;

/// Decode backslash escape sequences in a literal string.
///
/// Handles the single-character escapes (`\n \r \t \b \f \( \) \\`),
/// octal escapes of one to three digits, and line continuations (a
/// backslash directly before an end of line). Unknown escapes keep their
/// backslash, which is the tolerant reading of PDF Ref 1.7, 3.2.3.
pub fn decode_literal_string(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            out.push(raw[i]);
            i += 1;
            continue;
        }

        i += 1;
        match raw[i] {
            b'n' => {
                out.push(b'\n');
                i += 1;
            }
            b'r' => {
                out.push(b'\r');
                i += 1;
            }
            b't' => {
                out.push(b'\t');
                i += 1;
            }
            b'b' => {
                out.push(0x08);
                i += 1;
            }
            b'f' => {
                out.push(0x0C);
                i += 1;
            }
            b'(' | b')' | b'\\' => {
                out.push(raw[i]);
                i += 1;
            }
            // Line continuation: the backslash and the EOL vanish
            b'\n' => {
                i += 1;
            }
            b'\r' => {
                i += 1;
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            digit @ b'0'..=b'7' => {
                let mut value = (digit - b'0') as u32;
                i += 1;
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                // High octal values wrap into a byte
                out.push((value & 0xFF) as u8);
            }
            _ => {
                // Unknown escape, keep the backslash literal
                out.push(b'\\');
            }
        }
    }

    out
}

/// Decode a hex string's content to bytes.
///
/// Whitespace between digits is ignored; an odd trailing nibble is padded
/// with zero. Bytes that are neither hex digits nor whitespace are an
/// error.
pub fn decode_hex_string(raw: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len() / 2 + 1);
    let mut pending: Option<u8> = None;

    for &byte in raw {
        if byte.is_ascii_whitespace() || byte == 0 {
            continue;
        }
        let nibble = (byte as char).to_digit(16).ok_or_else(|| Error::Parse {
            offset: 0,
            reason: format!("invalid hex digit 0x{:02x} in hex string", byte),
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

/// Parse one direct object from the input.
///
/// # Example
///
/// ```
/// use pdf_carousel::parser::parse_direct_object;
///
/// let (_, obj) = parse_direct_object(b"<< /Type /Page /Rotate 90 >>").unwrap();
/// let dict = obj.as_dict().unwrap();
/// assert_eq!(dict.get_int("Rotate", 0), 90);
/// ```
///
/// # Errors
///
/// Returns `Err` when the input does not start with a valid object or a
/// composite is malformed beyond the documented tolerances (unclosed
/// arrays and dictionaries at end of input yield their partial contents).
pub fn parse_direct_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, tok) = token(input)?;

    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::True => Ok((rest, Object::Boolean(true))),
        Token::False => Ok((rest, Object::Boolean(false))),
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::Name(n) => Ok((rest, Object::Name(n))),

        Token::Integer(i) => {
            // Lookahead for "gen R" completing an indirect reference
            if let Ok((after_gen, Token::Integer(generation))) = token(rest) {
                if let Ok((after_r, Token::R)) = token(after_gen) {
                    if i >= 0 && (0..=u16::MAX as i64).contains(&generation) {
                        let key = ObjectKey::new(i as u32, generation as u16);
                        return Ok((after_r, Object::Reference(key)));
                    }
                }
            }
            Ok((rest, Object::Integer(i)))
        }

        Token::LiteralString(raw) => Ok((
            rest,
            Object::String(decode_literal_string(raw), StringKind::Literal),
        )),

        Token::HexString(raw) => match decode_hex_string(raw) {
            Ok(bytes) => Ok((rest, Object::String(bytes, StringKind::Hex))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Fail,
            ))),
        },

        Token::ArrayStart => parse_array_body(rest),
        Token::DictStart => parse_dictionary_body(rest),

        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parse array elements up to the closing `]`.
///
/// An array left unclosed at end of input yields the elements collected
/// so far.
fn parse_array_body(input: &[u8]) -> IResult<&[u8], Object> {
    let array = Array::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::ArrayEnd)) => return Ok((rest, Object::Array(array))),
            Ok(_) => match parse_direct_object(remaining) {
                Ok((rest, item)) => {
                    array.push(item);
                    remaining = rest;
                }
                Err(err) => {
                    if remaining.is_empty() {
                        return Ok((remaining, Object::Array(array)));
                    }
                    return Err(err);
                }
            },
            Err(_) if remaining_is_blank(remaining) => {
                return Ok((b"", Object::Array(array)));
            }
            Err(err) => return Err(err),
        }
    }
}

/// Parse dictionary entries up to the closing `>>`.
///
/// Keys must be names. A dictionary left unclosed at end of input yields
/// the entries collected so far.
fn parse_dictionary_body(input: &[u8]) -> IResult<&[u8], Object> {
    let dict = Dictionary::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::DictEnd)) => return Ok((rest, Object::Dictionary(dict))),
            Ok((rest, Token::Name(key))) => match parse_direct_object(rest) {
                Ok((rest, value)) => {
                    dict.set(key, value);
                    remaining = rest;
                }
                Err(err) => {
                    if rest.is_empty() {
                        return Ok((rest, Object::Dictionary(dict)));
                    }
                    return Err(err);
                }
            },
            Ok(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Tag,
                )));
            }
            Err(_) if remaining_is_blank(remaining) => {
                return Ok((b"", Object::Dictionary(dict)));
            }
            Err(err) => return Err(err),
        }
    }
}

/// True when nothing but whitespace and comments remains.
fn remaining_is_blank(input: &[u8]) -> bool {
    input
        .iter()
        .all(|&b| b.is_ascii_whitespace() || b == 0 || b == b'%')
}

/// Parse a direct object, mapping tokenizer errors into crate errors with
/// an absolute offset computed against the full input.
pub fn parse_direct_object_at(full_input_len: usize, input: &[u8]) -> Result<(usize, Object)> {
    match parse_direct_object(input) {
        Ok((rest, object)) => Ok((rest.len(), object)),
        Err(err) => Err(Error::Parse {
            offset: full_input_len - input.len(),
            reason: match err {
                nom::Err::Incomplete(_) => "unexpected end of input".to_string(),
                nom::Err::Error(e) | nom::Err::Failure(e) => {
                    format!("no valid object ({:?})", e.code)
                }
            },
        }),
    }
}
