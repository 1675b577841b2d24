//! PDF lexer (tokenizer).
//!
//! Low-level tokenization of PDF byte streams. Recognizes numbers, strings,
//! names, keywords, and delimiters.
//!
//! # PDF Syntax Overview
//!
//! PDF uses a PostScript-like syntax with the following token types:
//! - Numbers: integers (42, -123) and reals (3.14, -2.5, .5)
//! - Strings: literal ((Hello)) and hexadecimal (<48656C6C6F>)
//! - Names: identifiers starting with / (/Type, /Pages)
//! - Keywords: true, false, null, obj/endobj, stream/endstream, R,
//!   xref, trailer, startxref
//! - Delimiters: `[`, `]`, `<<`, `>>`
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are
//! skipped before every token.
//!
//! The lexer threads a `&[u8]` slice through every call: the remaining
//! slice *is* the cursor. Pushback is re-parsing from a saved slice, and
//! raw stream payloads are read by slicing N bytes off the same remainder,
//! so token reads and byte reads never diverge.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    sequence::{delimited, preceded},
};

/// Token types recognized by the PDF lexer.
///
/// Tokens are the atomic units of PDF syntax. The parser combines tokens
/// into higher-level objects (dictionaries, arrays, streams).
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),

    /// Real (floating-point) number (e.g., 3.14, -2.5, .5)
    Real(f64),

    /// Literal string bytes (content of "(Hello)").
    /// Escape sequences are NOT decoded at lexer level.
    LiteralString(&'a [u8]),

    /// Hexadecimal string bytes (content of "<48656C6C6F>").
    /// Whitespace is preserved; decoding happens at parser level.
    HexString(&'a [u8]),

    /// Name (e.g., "Type" from "/Type").
    /// # escape sequences ARE decoded at lexer level per PDF spec.
    Name(String),

    /// Boolean true keyword
    True,

    /// Boolean false keyword
    False,

    /// Null keyword
    Null,

    /// Array start delimiter [
    ArrayStart,

    /// Array end delimiter ]
    ArrayEnd,

    /// Dictionary start delimiter <<
    DictStart,

    /// Dictionary end delimiter >>
    DictEnd,

    /// Indirect object start keyword "obj"
    ObjStart,

    /// Indirect object end keyword "endobj"
    ObjEnd,

    /// Stream start keyword "stream"
    StreamStart,

    /// Stream end keyword "endstream"
    StreamEnd,

    /// Reference keyword "R" (used in "10 0 R")
    R,

    /// Cross-reference section keyword "xref"
    Xref,

    /// Trailer keyword "trailer"
    Trailer,

    /// Startxref keyword "startxref"
    StartXref,
}

/// Parse at least one PDF whitespace character.
///
/// PDF whitespace: space (0x20), tab (0x09), CR (0x0D), LF (0x0A),
/// null (0x00), form feed (0x0C).
fn whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    let (remaining, ws) =
        take_while(|c| matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C))(input)?;

    if ws.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Space)));
    }

    Ok((remaining, ()))
}

/// Parse a comment (% to end of line).
fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments before a token.
fn skip_ws(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let mut remaining = input;

    loop {
        if let Ok((rest, _)) = whitespace(remaining) {
            remaining = rest;
            continue;
        }
        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
            continue;
        }
        break;
    }

    Ok((remaining, input))
}

/// Parse an integer or real number.
///
/// PDF numbers allow leading +/- signs and can start or end with the
/// decimal point: 42, -123, +17, 3.14, .5, 0., -.002.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    if int_part.is_none() && frac_part.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    if frac_part.is_some() {
        let mut num_str = String::new();
        if sign == Some('-') {
            num_str.push('-');
        }
        match int_part {
            Some(int) => num_str.push_str(std::str::from_utf8(int).map_err(|_| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
            })?),
            None => num_str.push('0'), // .5 becomes 0.5
        }
        num_str.push('.');
        if let Some(Some(frac)) = frac_part {
            num_str.push_str(std::str::from_utf8(frac).map_err(|_| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
            })?);
        } else {
            num_str.push('0'); // 5. becomes 5.0
        }

        let num: f64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((input, Token::Real(num)))
    } else {
        let int_bytes = int_part.ok_or_else(|| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        let int_str = std::str::from_utf8(int_bytes).map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        let mut num: i64 = int_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        if sign == Some('-') {
            num = -num;
        }
        Ok((input, Token::Integer(num)))
    }
}

/// Parse a literal string enclosed in parentheses.
///
/// Literal strings can contain balanced nested parentheses and escape
/// sequences (`\n \r \t \b \f \\ \( \)` plus `\ddd` octal). The raw bytes
/// including escape sequences are returned; decoding happens in the parser.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (mut remaining, _) = char('(')(input)?;
    let mut depth = 1;
    let mut pos = 0;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => {
                pos += 1;
                if pos < remaining.len() {
                    if remaining[pos].is_ascii_digit() {
                        // Octal escape is 1-3 digits
                        pos += 1;
                        if pos < remaining.len() && remaining[pos].is_ascii_digit() {
                            pos += 1;
                        }
                        if pos < remaining.len() && remaining[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    } else {
                        pos += 1;
                    }
                }
            },
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => {
                pos += 1;
            },
        }
    }

    if depth != 0 {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    let content = &remaining[..pos - 1];
    remaining = &remaining[pos..];

    Ok((remaining, Token::LiteralString(content)))
}

/// Parse a hexadecimal string enclosed in angle brackets.
///
/// Whitespace inside is ignored; an odd number of digits is padded with a
/// trailing zero nibble at decode time (parser level).
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    // Must not be a dictionary start (<<)
    if input.len() >= 2 && input[0] == b'<' && input[1] == b'<' {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || c.is_ascii_whitespace()),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode #XX escape sequences in PDF names.
///
/// Name objects can contain arbitrary characters encoded as #XX where XX is
/// a two-digit hex code; /A#20B becomes "A B". Invalid sequences are kept
/// literally.
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '#' {
            let hex1 = chars.next();
            let hex2 = chars.next();

            if let (Some(h1), Some(h2)) = (hex1, hex2) {
                let hex_str = format!("{}{}", h1, h2);
                if let Ok(byte) = u8::from_str_radix(&hex_str, 16) {
                    result.push(byte as char);
                    continue;
                }
                result.push('#');
                result.push(h1);
                result.push(h2);
            } else if let Some(h1) = hex1 {
                result.push('#');
                result.push(h1);
            } else {
                result.push('#');
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Parse a name starting with /.
///
/// Names run until whitespace or a delimiter; #XX escapes are decoded here.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| {
                !matches!(
                    c,
                    b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C | // Whitespace
                    b'/' | b'%' | // Start of name/comment
                    b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' // Delimiters
                )
            }),
            |bytes| {
                let name_str = std::str::from_utf8(bytes).unwrap_or("");
                Token::Name(decode_name_escapes(name_str))
            },
        ),
    )(input)
}

/// Parse PDF keywords and delimiters.
///
/// Order matters: multi-character keywords before their prefixes
/// ("endstream" before "stream") and << before <.
fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::False, tag(b"false")),
        value(Token::True, tag(b"true")),
        value(Token::Null, tag(b"null")),
        value(Token::ObjStart, tag(b"obj")),
        value(Token::ObjEnd, tag(b"endobj")),
        value(Token::StreamEnd, tag(b"endstream")),
        value(Token::StreamStart, tag(b"stream")),
        value(Token::StartXref, tag(b"startxref")),
        value(Token::Xref, tag(b"xref")),
        value(Token::Trailer, tag(b"trailer")),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::R, tag(b"R")),
    ))(input)
}

/// Parse a single PDF token.
///
/// This is the main entry point for the lexer. It skips whitespace and
/// comments, then tries each token class in priority order (keywords,
/// names, numbers, strings).
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;

    alt((
        parse_keyword,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
    ))(input)
}

/// Skip whitespace/comments and return the remaining input.
///
/// Used where the parser needs the raw cursor position (e.g. before
/// reading a stream payload) without consuming a token.
pub fn skip_whitespace(input: &[u8]) -> &[u8] {
    skip_ws(input).map(|(rest, _)| rest).unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integers() {
        assert_eq!(token(b"42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"-123"), Ok((&b""[..], Token::Integer(-123))));
        assert_eq!(token(b"0"), Ok((&b""[..], Token::Integer(0))));
    }

    #[test]
    fn test_parse_reals() {
        assert_eq!(token(b"-2.5"), Ok((&b""[..], Token::Real(-2.5))));
        assert_eq!(token(b".5"), Ok((&b""[..], Token::Real(0.5))));
        assert_eq!(token(b"5."), Ok((&b""[..], Token::Real(5.0))));
        assert_eq!(token(b"-.002"), Ok((&b""[..], Token::Real(-0.002))));
    }

    #[test]
    fn test_parse_literal_string() {
        assert_eq!(token(b"(Hello)"), Ok((&b""[..], Token::LiteralString(b"Hello"))));
        assert_eq!(
            token(b"(Hello (nested) World)"),
            Ok((&b""[..], Token::LiteralString(b"Hello (nested) World")))
        );
        assert_eq!(token(b"()"), Ok((&b""[..], Token::LiteralString(b""))));
    }

    #[test]
    fn test_parse_literal_string_with_escaped_paren() {
        assert_eq!(
            token(b"(Open \\( Close \\))"),
            Ok((&b""[..], Token::LiteralString(b"Open \\( Close \\)")))
        );
    }

    #[test]
    fn test_parse_hex_string() {
        assert_eq!(token(b"<48656C6C6F>"), Ok((&b""[..], Token::HexString(b"48656C6C6F"))));
        assert_eq!(
            token(b"<48 65 6C 6C 6F>"),
            Ok((&b""[..], Token::HexString(b"48 65 6C 6C 6F")))
        );
        assert_eq!(token(b"<>"), Ok((&b""[..], Token::HexString(b""))));
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(token(b"/Type"), Ok((&b""[..], Token::Name("Type".to_string()))));
        assert_eq!(
            token(b"/A;Name_With-Various***Characters"),
            Ok((&b""[..], Token::Name("A;Name_With-Various***Characters".to_string())))
        );
    }

    #[test]
    fn test_parse_name_with_hex_escape() {
        assert_eq!(token(b"/A#20B"), Ok((&b""[..], Token::Name("A B".to_string()))));
        assert_eq!(token(b"/A#20B#23C"), Ok((&b""[..], Token::Name("A B#C".to_string()))));
        // Invalid hex keeps the # literal
        assert_eq!(token(b"/A#ZZ"), Ok((&b""[..], Token::Name("A#ZZ".to_string()))));
    }

    #[test]
    fn test_decode_name_escapes_directly() {
        assert_eq!(decode_name_escapes("Type"), "Type");
        assert_eq!(decode_name_escapes("A#20B"), "A B");
        assert_eq!(decode_name_escapes("A#"), "A#");
        assert_eq!(decode_name_escapes("A#2"), "A#2");
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(token(b"true"), Ok((&b""[..], Token::True)));
        assert_eq!(token(b"false"), Ok((&b""[..], Token::False)));
        assert_eq!(token(b"null"), Ok((&b""[..], Token::Null)));
        assert_eq!(token(b"obj"), Ok((&b""[..], Token::ObjStart)));
        assert_eq!(token(b"endobj"), Ok((&b""[..], Token::ObjEnd)));
        assert_eq!(token(b"stream"), Ok((&b""[..], Token::StreamStart)));
        assert_eq!(token(b"endstream"), Ok((&b""[..], Token::StreamEnd)));
        assert_eq!(token(b"R"), Ok((&b""[..], Token::R)));
        assert_eq!(token(b"xref"), Ok((&b""[..], Token::Xref)));
        assert_eq!(token(b"trailer"), Ok((&b""[..], Token::Trailer)));
        assert_eq!(token(b"startxref"), Ok((&b""[..], Token::StartXref)));
    }

    #[test]
    fn test_parse_delimiters() {
        assert_eq!(token(b"["), Ok((&b""[..], Token::ArrayStart)));
        assert_eq!(token(b"]"), Ok((&b""[..], Token::ArrayEnd)));
        assert_eq!(token(b"<<"), Ok((&b""[..], Token::DictStart)));
        assert_eq!(token(b">>"), Ok((&b""[..], Token::DictEnd)));
    }

    #[test]
    fn test_skip_whitespace_and_comments() {
        assert_eq!(token(b"  \n\t42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"% comment\n42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"  % a\n  \t% b\n  42"), Ok((&b""[..], Token::Integer(42))));
    }

    #[test]
    fn test_dict_vs_hex_string() {
        assert_eq!(token(b"<<"), Ok((&b""[..], Token::DictStart)));
        assert_eq!(token(b"<ABC>"), Ok((&b""[..], Token::HexString(b"ABC"))));
    }

    #[test]
    fn test_reference_token_sequence() {
        let input = b"2 0 R";
        let (input, t1) = token(input).unwrap();
        let (input, t2) = token(input).unwrap();
        let (input, t3) = token(input).unwrap();
        assert_eq!(t1, Token::Integer(2));
        assert_eq!(t2, Token::Integer(0));
        assert_eq!(t3, Token::R);
        assert!(input.is_empty());
    }

    #[test]
    fn test_complex_pdf_snippet() {
        let mut input: &[u8] = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj";
        let expected = [
            Token::Integer(1),
            Token::Integer(0),
            Token::ObjStart,
            Token::DictStart,
            Token::Name("Type".to_string()),
            Token::Name("Catalog".to_string()),
            Token::Name("Pages".to_string()),
            Token::Integer(2),
            Token::Integer(0),
            Token::R,
            Token::DictEnd,
            Token::ObjEnd,
        ];
        for want in &expected {
            let (rest, got) = token(input).unwrap();
            assert_eq!(&got, want);
            input = rest;
        }
        assert!(input.is_empty());
    }
}
