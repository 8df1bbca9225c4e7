//! STEP Physical File Parser
//!
//! Parses ISO-10303-21 exchange structures, the text encoding IFC models are
//! shipped in. This module only knows the file syntax; `model` gives the
//! entities their IFC meaning.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace1, one_of, satisfy},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ModelError;

// ============================================================================
// STEP Data Types
// ============================================================================

/// A complete STEP exchange structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFile {
    pub header: StepHeader,
    /// Entity instances from every DATA section, in file order.
    pub entities: Vec<StepEntity>,
}

/// STEP file header section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepHeader {
    pub file_description: Vec<String>,
    pub file_name: String,
    pub file_schema: Vec<String>,
}

/// A STEP entity instance (`#12=IFCWALL(...);`)
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u64,
    /// Entity keyword, upper-cased as STEP writers emit it.
    pub type_name: String,
    pub attributes: Vec<StepValue>,
}

/// STEP attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// `$`
    Null,
    /// `*` (value derived in a supertype)
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    Enum(String),
    Binary(String),
    Reference(u64),
    List(Vec<StepValue>),
    /// `IFCLABEL('x')`
    Typed(String, Vec<StepValue>),
}

impl StepValue {
    /// String content, looking through single-argument typed values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            StepValue::Typed(_, inner) if inner.len() == 1 => inner[0].as_str(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// `$` and `*` both mean "no value here".
    pub fn is_unset(&self) -> bool {
        matches!(self, StepValue::Null | StepValue::Derived)
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Parse a complete STEP file.
pub fn parse_step(input: &str) -> Result<StepFile, ModelError> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    match parse_exchange(text) {
        Ok((_, file)) => Ok(file),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let rest = e.input.trim_start();
            let consumed = text.len() - rest.len();
            let line = text[..consumed].matches('\n').count() + 1;
            let snippet: String = rest.lines().next().unwrap_or("").chars().take(60).collect();
            Err(ModelError::Parse {
                line,
                message: if snippet.is_empty() {
                    "unexpected end of file".to_string()
                } else {
                    format!("unexpected input `{snippet}`")
                },
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ModelError::Parse {
            line: text.lines().count(),
            message: "unexpected end of file".to_string(),
        }),
    }
}

// ============================================================================
// Parser Implementation
// ============================================================================

fn parse_exchange(input: &str) -> IResult<&str, StepFile> {
    let (input, _) = preceded(ws, tag("ISO-10303-21;"))(input)?;
    let (input, header) = parse_header(input)?;
    let (input, sections) = many1(parse_data_section)(input)?;
    let (input, _) = preceded(ws, tag("END-ISO-10303-21;"))(input)?;

    Ok((
        input,
        StepFile {
            header,
            entities: sections.into_iter().flatten().collect(),
        },
    ))
}

/// Whitespace and `/* ... */` comments.
fn ws(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment))))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Parse header section
fn parse_header(input: &str) -> IResult<&str, StepHeader> {
    let (input, _) = preceded(ws, tag_no_case("HEADER;"))(input)?;
    let (input, records) = many0(preceded(
        ws,
        terminated(parse_simple_record, preceded(ws, char(';'))),
    ))(input)?;
    let (input, _) = preceded(ws, tag_no_case("ENDSEC;"))(input)?;

    let mut header = StepHeader::default();
    for (keyword, args) in records {
        let first = args.first();
        match keyword.as_str() {
            "FILE_DESCRIPTION" => header.file_description = string_list(first),
            "FILE_NAME" => {
                header.file_name = first.and_then(StepValue::as_str).unwrap_or_default().to_string()
            }
            "FILE_SCHEMA" => header.file_schema = string_list(first),
            _ => {}
        }
    }

    Ok((input, header))
}

fn string_list(value: Option<&StepValue>) -> Vec<String> {
    value
        .and_then(StepValue::as_list)
        .map(|items| items.iter().filter_map(StepValue::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Parse data section
fn parse_data_section(input: &str) -> IResult<&str, Vec<StepEntity>> {
    let (input, _) = preceded(ws, tag_no_case("DATA"))(input)?;
    // Edition 3 allows `DATA('name', ('SCHEMA'));`
    let (input, _) = opt(preceded(ws, parse_list))(input)?;
    let (input, _) = preceded(ws, char(';'))(input)?;
    let (input, entities) = many0(parse_entity)(input)?;
    let (input, _) = preceded(ws, tag_no_case("ENDSEC;"))(input)?;

    Ok((input, entities))
}

/// Parse a single entity instance
fn parse_entity(input: &str) -> IResult<&str, StepEntity> {
    let (input, _) = preceded(ws, char('#'))(input)?;
    let (input, id) = map_res(digit1, |s: &str| s.parse::<u64>())(input)?;
    let (input, _) = preceded(ws, char('='))(input)?;
    let (input, _) = ws(input)?;
    let (input, (type_name, attributes)) = alt((parse_simple_record, parse_complex_record))(input)?;
    let (input, _) = preceded(ws, char(';'))(input)?;

    Ok((input, StepEntity { id, type_name, attributes }))
}

/// `KEYWORD(args)`
fn parse_simple_record(input: &str) -> IResult<&str, (String, Vec<StepValue>)> {
    let (input, keyword) = parse_identifier(input)?;
    let (input, args) = preceded(ws, parse_list)(input)?;
    Ok((input, (keyword.to_ascii_uppercase(), args)))
}

/// `(A(args) B(args))`: the instance is reported under its first partial
/// keyword, with the partial attribute lists concatenated.
fn parse_complex_record(input: &str) -> IResult<&str, (String, Vec<StepValue>)> {
    let (input, parts) = delimited(
        char('('),
        many1(preceded(ws, parse_simple_record)),
        preceded(ws, char(')')),
    )(input)?;

    let type_name = parts[0].0.clone();
    let attributes = parts.into_iter().flat_map(|(_, args)| args).collect();
    Ok((input, (type_name, attributes)))
}

/// Parse an identifier
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse a STEP value
fn parse_value(input: &str) -> IResult<&str, StepValue> {
    preceded(
        ws,
        alt((
            value(StepValue::Null, char('$')),
            value(StepValue::Derived, char('*')),
            map(parse_reference, StepValue::Reference),
            map(parse_step_string, StepValue::String),
            map(parse_enum, StepValue::Enum),
            map(parse_binary, StepValue::Binary),
            map(parse_list, StepValue::List),
            map(parse_simple_record, |(name, args)| StepValue::Typed(name, args)),
            map(parse_real, StepValue::Real),
            map(parse_integer, StepValue::Integer),
        )),
    )(input)
}

/// Parse a reference #123
fn parse_reference(input: &str) -> IResult<&str, u64> {
    preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u64>()))(input)
}

/// Parse a STEP string 'text'. A doubled quote stands for one quote.
fn parse_step_string(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut raw = String::new();
    loop {
        let Some(pos) = rest.find('\'') else {
            return Err(nom::Err::Error(nom::error::Error::new(
                rest,
                nom::error::ErrorKind::Char,
            )));
        };
        raw.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        match rest.strip_prefix('\'') {
            Some(after) => {
                raw.push('\'');
                rest = after;
            }
            None => break,
        }
    }
    Ok((rest, decode_step_string(&raw)))
}

/// Parse an enum .VALUE.
fn parse_enum(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        |s: &str| s.to_ascii_uppercase(),
    )(input)
}

/// Parse a binary "0FF"
fn parse_binary(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c: char| c.is_ascii_hexdigit()), char('"')),
        str::to_string,
    )(input)
}

/// Parse a list (a, b, c)
fn parse_list(input: &str) -> IResult<&str, Vec<StepValue>> {
    delimited(
        char('('),
        separated_list0(preceded(ws, char(',')), parse_value),
        preceded(ws, char(')')),
    )(input)
}

/// Parse an integer
fn parse_integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| s.parse::<i64>())(input)
}

/// Parse a real number. STEP requires the decimal point but not the
/// fraction digits (`1.`, `0.E0`).
fn parse_real(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            digit0,
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

// ============================================================================
// String decoding
// ============================================================================

/// Resolve the ISO-10303-21 string control directives: `\\`, `\S\c`,
/// `\X\hh`, `\X2\hhhh…\X0\`, `\X4\hhhhhhhh…\X0\`, and `\P?\` code pages
/// (ignored).
pub(crate) fn decode_step_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            let units: Vec<u16> = hex_chunks(&tail[..end], 4)
                .filter_map(|h| u16::from_str_radix(h, 16).ok())
                .collect();
            out.push_str(&String::from_utf16_lossy(&units));
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X4\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            out.extend(
                hex_chunks(&tail[..end], 8)
                    .filter_map(|h| u32::from_str_radix(h, 16).ok())
                    .filter_map(char::from_u32),
            );
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            match tail.chars().next() {
                Some(c) => {
                    out.push(char::from_u32(c as u32 + 128).unwrap_or(c));
                    rest = &tail[c.len_utf8()..];
                }
                None => rest = tail,
            }
        } else if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
            rest = &rest[4..];
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

fn hex_chunks(hex: &str, width: usize) -> impl Iterator<Item = &str> {
    hex.as_bytes()
        .chunks(width)
        .filter(move |chunk| chunk.len() == width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
}

// ============================================================================
// Tests
// ============================================================================
