use nom::{
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, line_ending, not_line_ending, space0},
    combinator::{map_res, opt},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use super::{LoadError, Span};

/// Lexes one byte written as a binary literal of at most 8 digits, with an optional `0b` prefix.
pub fn lex_byte(inp: Span) -> IResult<Span, u8> {
    map_res(
        preceded(
            opt(tag("0b")),
            take_while_m_n(1, 8, |c: char| c == '0' || c == '1'),
        ),
        |s: Span| u8::from_str_radix(s.fragment(), 2),
    )(inp)
}

/// Lexes a `#` comment up to (not including) the end of the line.
pub fn lex_comment(inp: Span) -> IResult<Span, Span> {
    preceded(char('#'), not_line_ending)(inp)
}

/// Lexes the contents of a single line, without its line ending.
///
/// Yields `None` for blank and comment-only lines.
pub fn lex_line(inp: Span) -> IResult<Span, Option<u8>> {
    terminated(
        preceded(space0, opt(lex_byte)),
        tuple((space0, opt(lex_comment))),
    )(inp)
}

fn malformed(program: &str, at: Span) -> LoadError {
    let line = at.location_line() as usize;
    LoadError::MalformedLine {
        line,
        column: at.get_utf8_column(),
        text: program
            .lines()
            .nth(line - 1)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

fn error_input<'a>(e: nom::Err<nom::error::Error<Span<'a>>>, whole: Span<'a>) -> Span<'a> {
    match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => whole,
    }
}

/// Lexes program text into the bytes it describes, one per non-blank line.
pub fn lex_program(program: &str) -> Result<Vec<u8>, LoadError> {
    let span = Span::new(program);
    let (rest, mut bytes) = many0(terminated(lex_line, line_ending))(span)
        .map_err(|e| malformed(program, error_input(e, span)))?;
    let (garbage, last) =
        lex_line(rest).map_err(|e| malformed(program, error_input(e, span)))?;
    if !garbage.is_empty() {
        return Err(malformed(program, garbage));
    }
    bytes.push(last);
    Ok(bytes.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_byte() {
        let (rest, b) = lex_byte(Span::new("10000010 # LDI")).unwrap();
        assert_eq!(b, 0b1000_0010);
        assert_eq!(*rest.fragment(), " # LDI");

        assert_eq!(lex_byte(Span::new("0b101")).unwrap().1, 5);
        assert_eq!(lex_byte(Span::new("1")).unwrap().1, 1);
        let (rest, b) = lex_byte(Span::new("100000000")).unwrap();
        assert_eq!(b, 0b1000_0000);
        assert_eq!(*rest.fragment(), "0");
        assert!(lex_byte(Span::new("LDI")).is_err());
    }

    #[test]
    fn test_lex_program() {
        let prog = "
# print8.ls8
10000010 # LDI R0,8
00000000
00001000
   01000111\t# PRN R0
00000000

00000001 # HLT";
        assert_eq!(
            lex_program(prog).unwrap(),
            [0x82, 0x00, 0x08, 0x47, 0x00, 0x01]
        );
    }

    #[test]
    fn test_lex_program_crlf_and_trailing_newline() {
        let prog = "10000010\r\n00000001\r\n00000010\r\n";
        assert_eq!(lex_program(prog).unwrap(), [0x82, 0x01, 0x02]);
    }

    #[test]
    fn test_lex_empty_program() {
        assert!(lex_program("").unwrap().is_empty());
        assert!(lex_program("# nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line() {
        let prog = "10000010\n00000000\n0000100x # oops\n00000001\n";
        let err = lex_program(prog).unwrap_err();
        assert_eq!(
            err,
            LoadError::MalformedLine {
                line: 3,
                column: 8,
                text: "0000100x # oops".to_string(),
            }
        );
    }

    #[test]
    fn test_too_many_digits() {
        let err = lex_program("00000001\n100000000\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedLine {
                line: 2,
                column: 9,
                ..
            }
        ));
    }
}
