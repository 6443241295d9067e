//! COS tokenizer.
//!
//! Low-level tokenization of PDF byte slices: numbers, literal and hex
//! strings, names, keywords, and delimiters. Whitespace (space, tab, CR,
//! LF, NUL, form feed) and comments (`%` to end of line) are skipped
//! between tokens.
//!
//! Escape handling is split between layers the same way the file format
//! splits it: `#xx` escapes in names are decoded here, while backslash
//! escapes in literal strings are left raw for the object parser to
//! decode.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::char,
    combinator::value,
    sequence::preceded,
};

/// Token types recognized by the tokenizer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g. `42`, `-123`, `+17`)
    Integer(i64),
    /// Real number (e.g. `3.5`, `-.002`, `5.`)
    Real(f64),
    /// Literal string content, escapes not yet decoded
    LiteralString(&'a [u8]),
    /// Hex string content between `<` and `>`, not yet decoded
    HexString(&'a [u8]),
    /// Name without the leading `/`, `#xx` escapes decoded
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `obj`
    ObjBegin,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamBegin,
    /// `endstream`
    StreamEnd,
    /// `R`, the indirect-reference marker
    R,
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_name_terminator(byte: u8) -> bool {
    is_whitespace(byte)
        || matches!(
            byte,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
}

/// Skip whitespace and comments before a token.
fn skip_padding(input: &[u8]) -> &[u8] {
    let mut remaining = input;
    loop {
        let trimmed = match remaining.first() {
            Some(&b) if is_whitespace(b) => {
                let mut i = 1;
                while i < remaining.len() && is_whitespace(remaining[i]) {
                    i += 1;
                }
                &remaining[i..]
            }
            Some(b'%') => {
                let (rest, _) =
                    take_till::<_, _, nom::error::Error<&[u8]>>(|c| c == b'\r' || c == b'\n')(
                        remaining,
                    )
                    .unwrap_or((&[][..], remaining));
                rest
            }
            _ => return remaining,
        };
        remaining = trimmed;
    }
}

/// Parse an integer or real number.
///
/// Signs are optional and numbers may start or end with the decimal
/// point. Exponents are not part of the grammar (PDF Ref 1.7, 3.2.2).
fn number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let mut i = 0;
    let negative = match input.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < input.len() && input[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    if input.get(i) != Some(&b'.') {
        if int_digits == 0 {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Digit,
            )));
        }
        let mut magnitude: i64 = 0;
        for &digit in &input[int_start..i] {
            magnitude = magnitude
                .saturating_mul(10)
                .saturating_add((digit - b'0') as i64);
        }
        let number = if negative { -magnitude } else { magnitude };
        return Ok((&input[i..], Token::Integer(number)));
    }

    // Real: digits '.' digits, either side may be empty but not both
    i += 1;
    let frac_start = i;
    while i < input.len() && input[i].is_ascii_digit() {
        i += 1;
    }
    if int_digits == 0 && i == frac_start {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }

    // The matched span is ASCII sign/digits/dot, which f64 parsing
    // accepts directly (including "5." and ".5")
    let number: f64 = std::str::from_utf8(&input[..i])
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?;
    Ok((&input[i..], Token::Real(number)))
}

/// Parse a literal string in balanced parentheses.
///
/// The returned slice is the raw content between the outer parentheses;
/// backslash escapes are decoded by the object parser, but they are
/// honored here so an escaped parenthesis does not unbalance the scan.
fn literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (content, _) = char::<_, nom::error::Error<&[u8]>>('(')(input)?;

    let mut depth = 1usize;
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'\\' => {
                // Skip the escaped byte so \( and \) do not count
                i += 2;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&content[i + 1..], Token::LiteralString(&content[..i])));
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    // Unbalanced string
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

/// Parse a hex string between `<` and `>`.
///
/// `<<` is a dictionary start, not a hex string.
fn hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    let (rest, _) = char::<_, nom::error::Error<&[u8]>>('<')(input)?;
    let (rest, content) = take_while(|c: u8| c != b'>')(rest)?;
    let (rest, _) = char::<_, nom::error::Error<&[u8]>>('>')(rest)?;
    Ok((rest, Token::HexString(content)))
}

/// Decode `#xx` escape sequences in a raw name.
///
/// Invalid sequences keep their bytes verbatim, which is what most
/// tolerant readers do with names from broken producers.
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' {
            let hex = raw.get(i + 1..i + 3);
            let decoded = hex.and_then(|pair| {
                let hi = (pair[0] as char).to_digit(16)?;
                let lo = (pair[1] as char).to_digit(16)?;
                Some((hi * 16 + lo) as u8)
            });
            if let Some(byte) = decoded {
                bytes.push(byte);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse a name starting with `/`.
fn name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, raw) = preceded(char('/'), take_while(|c: u8| !is_name_terminator(c)))(input)?;
    Ok((rest, Token::Name(decode_name_escapes(raw))))
}

/// Parse keywords and delimiters.
///
/// Longer keywords are tried before their prefixes (`endstream` before
/// `stream`, `<<` before a hex string's `<`).
fn keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::False, tag(b"false")),
        value(Token::True, tag(b"true")),
        value(Token::Null, tag(b"null")),
        value(Token::ObjEnd, tag(b"endobj")),
        value(Token::StreamEnd, tag(b"endstream")),
        value(Token::StreamBegin, tag(b"stream")),
        value(Token::ObjBegin, tag(b"obj")),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::R, tag(b"R")),
    ))(input)
}

/// Parse a single token, skipping leading whitespace and comments.
///
/// # Errors
///
/// Returns `Err` if the input does not start with a valid token after
/// padding is skipped.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_padding(input);
    alt((keyword, name, number, literal_string, hex_string))(input)
}
