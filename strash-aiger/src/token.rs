use flussab::{
    text::{self, LineColumn, LineReader},
    Parsed::{self, Fallthrough, Res},
};
use num_traits::{
    ops::overflowing::{OverflowingAdd, OverflowingMul},
    FromPrimitive, Zero,
};

use crate::error::{InnerReadError, ReadError};

#[cold]
pub fn unexpected(input: &mut LineReader, expected: &str) -> ReadError {
    let mut unexpected_bytes = vec![];

    if text::newline(input.reader(), 0) != 0 {
        return input.give_up(format!("expected {expected}, found end of line"));
    } else if input.reader.is_at_end() {
        return input.give_up(format!("expected {expected}, found end of file"));
    }

    while unexpected_bytes.len() < 60 {
        match input.reader.request_byte_at_offset(unexpected_bytes.len()) {
            Some(b'\n') | Some(b'\r') | Some(b'\t') | Some(b' ')
                if !unexpected_bytes.is_empty() =>
            {
                break
            }
            None => break,
            Some(byte) => unexpected_bytes.push(byte),
        }
    }

    input.give_up(format!(
        "expected {}, found {:?}",
        expected,
        String::from_utf8_lossy(&unexpected_bytes)
    ))
}

fn location_at(input: &LineReader, position: usize) -> LineColumn {
    LineColumn {
        line: input.line,
        column: position - input.line_start + 1,
    }
}

/// A binary encoded value ended early or does not fit the value range. The
/// reported location is the marked start of the value.
#[cold]
pub fn malformed_varint(input: &mut LineReader) -> ReadError {
    if let Err(err) = input.reader.check_io_error() {
        return err.into();
    }
    Box::new(InnerReadError::MalformedVarint {
        location: location_at(input, input.reader.mark()),
    })
}

/// The input ended although the declared counts require more data.
#[cold]
pub fn truncated(input: &mut LineReader, expected: &'static str) -> ReadError {
    if let Err(err) = input.reader.check_io_error() {
        return err.into();
    }
    Box::new(InnerReadError::TruncatedStream {
        location: location_at(input, input.reader.position()),
        expected,
    })
}

#[cold]
pub fn header_error(input: &mut LineReader, position: usize, msg: String) -> ReadError {
    if let Err(err) = input.reader.check_io_error() {
        return err.into();
    }
    Box::new(InnerReadError::HeaderInconsistent {
        location: location_at(input, position),
        msg,
    })
}

#[cold]
pub fn unsupported(input: &mut LineReader, position: usize, msg: String) -> ReadError {
    if let Err(err) = input.reader.check_io_error() {
        return err.into();
    }
    Box::new(InnerReadError::UnsupportedFeature {
        location: location_at(input, position),
        msg,
    })
}

#[cold]
pub fn dangling(input: &mut LineReader, position: usize, msg: String) -> ReadError {
    if let Err(err) = input.reader.check_io_error() {
        return err.into();
    }
    Box::new(InnerReadError::DanglingReference {
        location: location_at(input, position),
        msg,
    })
}

/// Parses a fixed sequence of bytes without consuming any following spaces.
#[inline]
pub fn fixed(input: &mut LineReader, fixed: &[u8]) -> Parsed<(), ReadError> {
    let offset = text::fixed(input.reader(), 0, fixed);
    if offset != 0 {
        input.reader.advance(offset);
        Res(Ok(()))
    } else {
        Fallthrough
    }
}

/// Parses a fixed sequence of bytes unless the token would end the line.
#[inline]
pub fn fixed_not_eol(input: &mut LineReader, fixed: &[u8]) -> Parsed<(), ReadError> {
    let offset = text::fixed(input.reader(), 0, fixed);
    if offset != 0 && !matches!(input.reader().request_byte_at_offset(offset), Some(b'\n')) {
        input.reader.advance(offset);
        Res(Ok(()))
    } else {
        Fallthrough
    }
}

/// Parses a single space.
#[inline]
pub fn space(input: &mut LineReader) -> Parsed<(), ReadError> {
    if matches!(input.reader.request_byte(), Some(b' ')) {
        input.reader.advance(1);
        Res(Ok(()))
    } else {
        Fallthrough
    }
}

/// Parses a required single space.
#[inline]
pub fn required_space(input: &mut LineReader) -> Result<(), ReadError> {
    space(input).or_give_up(|| unexpected(input, "a space character"))
}

/// Parses a single newline.
#[inline]
pub fn newline(input: &mut LineReader) -> Parsed<(), ReadError> {
    if matches!(input.reader.request_byte(), Some(b'\n')) {
        input.reader.advance(1);
        input.line_at_offset(0);
        Res(Ok(()))
    } else {
        Fallthrough
    }
}

/// Parses a required single newline.
#[inline]
pub fn required_newline(input: &mut LineReader) -> Result<(), ReadError> {
    newline(input).or_give_up(|| unexpected(input, "a newline"))
}

/// Parses a required single space between header fields. A malformed
/// header line is a header inconsistency, not a generic syntax error.
#[inline]
pub fn header_space(input: &mut LineReader) -> Result<(), ReadError> {
    space(input).or_give_up(|| {
        header_error(
            input,
            input.reader.position(),
            "expected a space between header fields".into(),
        )
    })
}

/// Parses the required newline terminating the header line.
#[inline]
pub fn header_newline(input: &mut LineReader) -> Result<(), ReadError> {
    newline(input).or_give_up(|| {
        header_error(
            input,
            input.reader.position(),
            "expected a newline terminating the header line".into(),
        )
    })
}

/// Parses a required single newline or space within the header line,
/// returns whether a space was found.
#[inline]
pub fn header_newline_or_space(input: &mut LineReader) -> Result<bool, ReadError> {
    let byte = input.reader.request_byte();
    if matches!(byte, Some(b'\n' | b' ')) {
        input.reader.advance(1);
        if matches!(byte, Some(b'\n')) {
            input.line_at_offset(0);
            Ok(false)
        } else {
            Ok(true)
        }
    } else {
        Err(header_error(
            input,
            input.reader.position(),
            "expected a space or newline after a header field".into(),
        ))
    }
}

/// Parses a non-negative integer without leading zeros.
///
/// The error value carries the offending digit string, which either has a
/// leading zero or overflows `T`.
#[inline]
pub fn uint<T>(input: &mut LineReader) -> Parsed<T, String>
where
    T: Zero + FromPrimitive + OverflowingAdd + OverflowingMul,
{
    let (value, offset) = text::ascii_digits_multi(input.reader(), 0);
    if offset != 0 {
        if input.reader.buf()[0] != b'0' || offset == 1 {
            if let Some(value) = value {
                input.reader.advance(offset);
                return Res(Ok(value));
            }
        }

        Res(Err(std::str::from_utf8(&input.reader.buf()[..offset])
            .unwrap()
            .to_owned()))
    } else {
        Fallthrough
    }
}

/// Parses one decimal header field.
///
/// Every way this can fail is a malformed header, so all errors map to
/// [`HeaderInconsistent`][InnerReadError::HeaderInconsistent].
#[inline]
pub fn header_field(input: &mut LineReader, name: &str) -> Result<usize, ReadError> {
    input.reader.set_mark();
    match uint::<usize>(input) {
        Res(Ok(value)) => Ok(value),
        Res(Err(digits)) => Err(header_error(
            input,
            input.reader.mark(),
            format!("{name} {digits} has leading zeros or is out of range"),
        )),
        Fallthrough => Err(header_error(
            input,
            input.reader.mark(),
            format!("expected {name}"),
        )),
    }
}

/// Parses one ASCII driver literal line (without its newline).
///
/// Out-of-range literals are dangling references to variables the file
/// never defines; a missing line is a truncated stream.
pub fn co_lit(input: &mut LineReader, name: &'static str, max_lit: u32) -> Result<u32, ReadError> {
    input.reader.set_mark();
    match uint::<u64>(input) {
        Res(Ok(value)) => {
            if value > max_lit as u64 {
                return Err(dangling(
                    input,
                    input.reader.mark(),
                    format!(
                        "{name} {value} references a variable past the last declared variable {}",
                        max_lit >> 1
                    ),
                ));
            }
            Ok(value as u32)
        }
        Res(Err(digits)) => {
            if digits.len() > 1 && digits.starts_with('0') {
                Err(input.give_up_at(
                    input.reader.mark(),
                    format!("{name} {digits} has leading zeros which are not allowed in AIGER files"),
                ))
            } else {
                Err(dangling(
                    input,
                    input.reader.mark(),
                    format!("{name} {digits} is out of range"),
                ))
            }
        }
        Fallthrough => {
            if input.reader.is_at_end() {
                Err(truncated(input, name))
            } else {
                Err(unexpected(input, name))
            }
        }
    }
}

/// Decodes one gate delta and subtracts it from its reference literal.
///
/// A delta exceeding the reference would name a variable that does not
/// exist yet, violating the strict ordering of the gate section.
#[inline]
pub fn gate_delta(
    input: &mut LineReader,
    reference: u32,
    target: &'static str,
    reference_name: &'static str,
) -> Result<u32, ReadError> {
    let delta = crate::varint::read_uint(input, target)?;
    if delta > reference {
        return Err(dangling(
            input,
            input.reader.mark(),
            format!("encoded delta {delta} for {target} exceeds the {reference_name} {reference}"),
        ));
    }
    Ok(reference - delta)
}

/// Parses the decimal index of a symbol table entry.
#[inline]
pub fn symbol_index(input: &mut LineReader, name: &str, count: usize) -> Result<usize, ReadError> {
    input.reader.set_mark();
    uint::<usize>(input)
        .map_err(|digits| symbol_index_err(input, name, &digits, count))
        .and_also(|&mut index| {
            if index >= count {
                Err(symbol_index_err(input, name, &index.to_string(), count))
            } else {
                Ok(())
            }
        })
        .or_give_up(|| unexpected(input, name))
}

#[cold]
#[inline(never)]
fn symbol_index_err(input: &mut LineReader, name: &str, value: &str, count: usize) -> ReadError {
    input.give_up_at(
        input.reader.mark(),
        format!("{name} {value} exceeds the declared count {count}"),
    )
}

/// Returns the rest of the current line and consumes its newline.
pub fn remaining_line_content(input: &mut LineReader) -> Result<String, ReadError> {
    let mut offset = 0;
    while !matches!(
        input.reader.request_byte_at_offset(offset),
        Some(b'\n') | None
    ) {
        offset += 1;
    }

    if input.reader.request_byte_at_offset(offset).is_none() {
        input.reader.advance(offset);
        return Err(unexpected(input, "a newline"));
    }

    let bytes = input.reader.buf()[..offset].to_vec();
    match String::from_utf8(bytes) {
        Ok(line) => {
            input.line_at_offset(offset + 1);
            input.reader.advance(offset + 1);
            Ok(line)
        }
        Err(err) => {
            input.reader.advance(err.utf8_error().valid_up_to());
            Err(unexpected(input, "a valid utf-8 character"))
        }
    }
}

/// Returns all remaining input up to the final newline.
pub fn remaining_file_content(input: &mut LineReader) -> Result<String, ReadError> {
    while input
        .reader
        .request_byte_at_offset(input.reader.buf_len())
        .is_some()
    {}

    let bytes = input.reader.buf().to_vec();
    match String::from_utf8(bytes) {
        Ok(mut content) => {
            if content.is_empty() || content.ends_with('\n') {
                let len = input.reader.buf_len();
                input.reader.advance(len);
                content.pop();
                Ok(content)
            } else {
                advance_lines(input, content.len());
                Err(unexpected(input, "a final newline"))
            }
        }
        Err(err) => {
            advance_lines(input, err.utf8_error().valid_up_to());
            Err(unexpected(input, "a valid utf-8 character"))
        }
    }
}

/// Advances over already buffered bytes while keeping line tracking
/// accurate, for error locations inside multi-line content.
fn advance_lines(input: &mut LineReader, len: usize) {
    for _ in 0..len {
        match input.reader.request_byte() {
            Some(b'\n') => {
                input.reader.advance(1);
                input.line_at_offset(0);
            }
            Some(_) => input.reader.advance(1),
            None => break,
        }
    }
}

/// Matches the end of the input.
#[inline]
pub fn eof(input: &mut LineReader) -> Parsed<(), ReadError> {
    if input.reader.request_byte().is_none() && input.reader.io_error().is_none() {
        Res(Ok(()))
    } else {
        Fallthrough
    }
}
