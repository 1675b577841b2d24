//! PDF object parser.
//!
//! Combines tokens from the lexer into complete objects via recursive
//! descent: read a token, dispatch on its type, recurse for composites.
//!
//! Two notable behaviors at this layer:
//!
//! - `N G R` reference sequences use bounded lookahead of two tokens from a
//!   saved cursor; on mismatch the cursor rewinds and the first integer
//!   stands alone. Lexing is pure, so re-lexing the same slice is free.
//! - Stream payloads are length-delimited by a /Length that must be a
//!   literal integer in the stream's own dictionary. An indirect /Length
//!   fails with [`Error::UnsupportedStreamLength`]; there is no scan-for-
//!   endstream fallback.

use crate::error::{Error, Result};
use crate::lexer::{Token, skip_whitespace, token};
use crate::object::{IndirectObject, Object, ObjectRef};
use nom::IResult;
use std::collections::HashMap;

/// Decode escape sequences in PDF literal strings.
///
/// Literal strings (enclosed in parentheses) support escape sequences per
/// ISO 32000-1, 7.3.4.2:
///
/// - `\n` `\r` `\t` `\b` `\f` control characters
/// - `\(` `\)` `\\` escaped delimiters
/// - `\ddd` character with octal code (1-3 digits, overflow wraps mod 256)
/// - `\<newline>` line continuation (removed)
/// - any other `\x` keeps the backslash literally
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            match raw[i + 1] {
                b'n' => {
                    result.push(b'\n');
                    i += 2;
                },
                b'r' => {
                    result.push(b'\r');
                    i += 2;
                },
                b't' => {
                    result.push(b'\t');
                    i += 2;
                },
                b'b' => {
                    result.push(8);
                    i += 2;
                },
                b'f' => {
                    result.push(12);
                    i += 2;
                },
                b'(' => {
                    result.push(b'(');
                    i += 2;
                },
                b')' => {
                    result.push(b')');
                    i += 2;
                },
                b'\\' => {
                    result.push(b'\\');
                    i += 2;
                },
                // Line continuation: backslash followed by EOL is removed
                b'\n' => {
                    i += 2;
                },
                b'\r' => {
                    i += 2;
                    if i < raw.len() && raw[i] == b'\n' {
                        i += 1;
                    }
                },
                c if c.is_ascii_digit() && c < b'8' => {
                    let start = i + 1;
                    let mut octal_value = 0u32;
                    let mut octal_len = 0;

                    for j in 0..3 {
                        match raw.get(start + j) {
                            Some(&d) if (b'0'..b'8').contains(&d) => {
                                octal_value = octal_value * 8 + (d - b'0') as u32;
                                octal_len += 1;
                            },
                            _ => break,
                        }
                    }

                    result.push((octal_value & 0xFF) as u8);
                    i += 1 + octal_len;
                },
                // Unknown escape: keep backslash literal
                _ => {
                    result.push(b'\\');
                    i += 1;
                },
            }
        } else {
            result.push(raw[i]);
            i += 1;
        }
    }

    result
}

/// Decode a hex string to bytes.
///
/// Whitespace is ignored. An odd number of hex digits pads the last digit
/// with a trailing zero nibble.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let hex_str: Vec<u8> = hex_bytes
        .iter()
        .filter(|&&c| !c.is_ascii_whitespace())
        .copied()
        .collect();

    if hex_str.is_empty() {
        return Ok(Vec::new());
    }

    fn nibble(c: u8) -> Result<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(Error::ParseError {
                offset: 0,
                reason: format!("Invalid hex digit: {:?}", c as char),
            }),
        }
    }

    let mut result = Vec::with_capacity(hex_str.len() / 2 + 1);
    for chunk in hex_str.chunks(2) {
        let hi = nibble(chunk[0])?;
        let lo = if chunk.len() == 2 { nibble(chunk[1])? } else { 0 };
        result.push((hi << 4) | lo);
    }

    Ok(result)
}

/// Parse a PDF object from input bytes.
///
/// Handles all object types: primitives (null, boolean, integer, real,
/// string, name), composites (array, dictionary, stream) and indirect
/// references (`10 0 R`).
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),

        Token::Integer(i) => {
            // Bounded two-token lookahead for "N G R"; rewind on mismatch
            if i >= 0 {
                if let Ok((input2, Token::Integer(gen))) = token(input) {
                    if (0..=u16::MAX as i64).contains(&gen) {
                        if let Ok((input3, Token::R)) = token(input2) {
                            return Ok((
                                input3,
                                Object::Reference(ObjectRef::new(i as u32, gen as u16)),
                            ));
                        }
                    }
                }
            }

            Ok((input, Object::Integer(i)))
        },

        Token::Real(r) => Ok((input, Object::Real(r))),

        Token::LiteralString(bytes) => {
            let decoded = decode_literal_string_escapes(bytes);
            Ok((input, Object::String(decoded)))
        },

        Token::HexString(hex_bytes) => match decode_hex(hex_bytes) {
            Ok(decoded) => Ok((input, Object::String(decoded))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Fail,
            ))),
        },

        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::ArrayStart => parse_array(input),

        Token::DictStart => {
            let (remaining, dict) = parse_dictionary(input)?;

            // A dictionary followed by the stream keyword is a stream object
            if let Ok((stream_input, Token::StreamStart)) = token(remaining) {
                let (final_input, stream_data) = parse_stream_data(stream_input, &dict)?;

                return Ok((
                    final_input,
                    Object::Stream {
                        dict,
                        data: bytes::Bytes::from(stream_data),
                    },
                ));
            }

            Ok((remaining, Object::Dictionary(dict)))
        },

        _ => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

/// Parse stream data after the `stream` keyword.
///
/// The keyword must be followed by CRLF or LF (not CR alone), then exactly
/// /Length bytes of payload, then the `endstream` keyword. /Length must be
/// a literal integer in the stream dictionary itself; this layer has no
/// access to the xref table, so an indirect /Length is a Failure (mapped to
/// [`Error::UnsupportedStreamLength`] by callers).
fn parse_stream_data<'a>(
    input: &'a [u8],
    dict: &HashMap<String, Object>,
) -> IResult<&'a [u8], Vec<u8>> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") {
        &input[1..]
    } else {
        // CR alone or no EOL at all violates ISO 32000-1 7.3.8.1
        log::warn!("stream keyword not followed by CRLF or LF; treating next byte as payload");
        input
    };

    let length = match dict.get("Length") {
        Some(Object::Integer(n)) if *n >= 0 => *n as usize,
        _ => {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::LengthValue,
            )));
        },
    };

    if input.len() < length {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)));
    }

    let stream_data = input[..length].to_vec();
    let remaining = &input[length..];

    // The endstream keyword must follow (possibly after an EOL)
    match token(remaining) {
        Ok((remaining, Token::StreamEnd)) => Ok((remaining, stream_data)),
        _ => Err(nom::Err::Failure(nom::error::Error::new(
            remaining,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parse a PDF array: `[ obj1 obj2 ... objN ]`
///
/// EOF before the closing `]` is a hard error.
fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::ArrayEnd)) => {
                return Ok((inp, Object::Array(objects)));
            },
            Ok(_) => match parse_object(remaining) {
                Ok((inp, obj)) => {
                    objects.push(obj);
                    remaining = inp;
                },
                Err(e) => {
                    if skip_whitespace(remaining).is_empty() {
                        return Err(eof_failure(remaining));
                    }
                    return Err(e);
                },
            },
            Err(nom::Err::Incomplete(_)) | Err(nom::Err::Error(_))
                if skip_whitespace(remaining).is_empty() =>
            {
                return Err(eof_failure(remaining));
            },
            Err(e) => return Err(e),
        }
    }
}

/// Parse a PDF dictionary body after `<<`: `/Key1 value1 ... >>`
///
/// Keys must be names. A repeated key keeps the last value. EOF before
/// the closing `>>` is a hard error.
fn parse_dictionary(input: &[u8]) -> IResult<&[u8], HashMap<String, Object>> {
    let mut dict = HashMap::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::DictEnd)) => {
                return Ok((inp, dict));
            },
            Ok((inp, Token::Name(key))) => match parse_object(inp) {
                Ok((inp, value)) => {
                    dict.insert(key, value);
                    remaining = inp;
                },
                Err(e) => {
                    if skip_whitespace(inp).is_empty() {
                        return Err(eof_failure(inp));
                    }
                    return Err(e);
                },
            },
            Ok(_) => {
                // Key must be a name
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Tag,
                )));
            },
            Err(nom::Err::Incomplete(_)) | Err(nom::Err::Error(_))
                if skip_whitespace(remaining).is_empty() =>
            {
                return Err(eof_failure(remaining));
            },
            Err(e) => return Err(e),
        }
    }
}

/// Hard failure for input that ends inside an unclosed container.
fn eof_failure(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Eof))
}

/// Parse an indirect object: `N G obj <object> endobj`
///
/// `offset` is the position of `input` within the file; it only feeds error
/// messages. A stream following the body dictionary is folded into the
/// returned object.
pub fn parse_indirect_object(input: &[u8], offset: usize) -> Result<IndirectObject> {
    let parse_err = |reason: &str| Error::ParseError {
        offset,
        reason: reason.to_string(),
    };

    let (input, id) = match token(input) {
        Ok((rest, Token::Integer(n))) if n >= 0 => (rest, n as u32),
        _ => return Err(parse_err("expected object number")),
    };

    let (input, gen) = match token(input) {
        Ok((rest, Token::Integer(n))) if (0..=u16::MAX as i64).contains(&n) => (rest, n as u16),
        _ => return Err(parse_err("expected generation number")),
    };

    let input = match token(input) {
        Ok((rest, Token::ObjStart)) => rest,
        _ => return Err(parse_err("expected obj keyword")),
    };

    let (input, object) = parse_object(input).map_err(|e| match e {
        nom::Err::Failure(inner)
            if inner.code == nom::error::ErrorKind::LengthValue =>
        {
            Error::UnsupportedStreamLength(format!("object {} {}", id, gen))
        },
        nom::Err::Failure(inner) if inner.code == nom::error::ErrorKind::Eof => {
            Error::UnexpectedEof
        },
        _ => parse_err("malformed object body"),
    })?;

    match token(input) {
        Ok((_, Token::ObjEnd)) => {},
        _ => return Err(parse_err("expected endobj keyword")),
    }

    Ok(IndirectObject { id, gen, object })
}
