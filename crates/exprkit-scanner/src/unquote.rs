use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnquoteError {
    #[error("literal is not quoted")]
    NotQuoted,
    #[error("literal is not terminated")]
    Unterminated,
    #[error("unescaped quote inside literal")]
    UnescapedQuote,
    #[error("newline in quoted literal")]
    Newline,
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    #[error("invalid code point {0:#x}")]
    InvalidCodePoint(u32),
}

/// Decodes a quoted literal as returned by the scanner.
///
/// `"…"` and `'…'` literals interpret the usual backslash escapes
/// (`\n`, `\t`, `\\`, `\xHH`, `\uHHHH`, `\UHHHHHHHH`, three-digit octal and
/// the literal's own quote). `` `…` `` literals are raw: only carriage
/// returns are dropped.
///
/// # Examples
///
/// ```
/// use exprkit_scanner::unquote;
///
/// assert_eq!(unquote(r#""a\tb""#).unwrap(), "a\tb");
/// assert_eq!(unquote("'it\\'s'").unwrap(), "it's");
/// assert_eq!(unquote(r"`C:\dir`").unwrap(), r"C:\dir");
/// ```
pub fn unquote(text: &str) -> Result<String, UnquoteError> {
    let quote = match text.chars().next() {
        Some(q @ ('"' | '\'' | '`')) => q,
        _ => return Err(UnquoteError::NotQuoted),
    };
    if text.len() < 2 || !text.ends_with(quote) {
        return Err(UnquoteError::Unterminated);
    }
    let body = &text[1..text.len() - 1];

    if quote == '`' {
        if body.contains('`') {
            return Err(UnquoteError::UnescapedQuote);
        }
        return Ok(body.replace('\r', ""));
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(unescape(&mut chars, quote)?),
            '\n' => return Err(UnquoteError::Newline),
            c if c == quote => return Err(UnquoteError::UnescapedQuote),
            c => out.push(c),
        }
    }
    Ok(out)
}

fn unescape(chars: &mut Chars<'_>, quote: char) -> Result<char, UnquoteError> {
    let c = chars.next().ok_or(UnquoteError::Unterminated)?;
    let decoded = match c {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        '\\' => '\\',
        c if c == quote => c,
        'x' => code_point(chars, 2, 16, c)?,
        'u' => code_point(chars, 4, 16, c)?,
        'U' => code_point(chars, 8, 16, c)?,
        '0'..='7' => {
            let value = c.to_digit(8).unwrap_or(0) * 64 + digits(chars, 2, 8, c)?;
            if value > 0xff {
                return Err(UnquoteError::InvalidCodePoint(value));
            }
            char::from_u32(value).ok_or(UnquoteError::InvalidCodePoint(value))?
        }
        other => return Err(UnquoteError::InvalidEscape(other)),
    };
    Ok(decoded)
}

fn code_point(chars: &mut Chars<'_>, count: usize, radix: u32, escape: char) -> Result<char, UnquoteError> {
    let value = digits(chars, count, radix, escape)?;
    char::from_u32(value).ok_or(UnquoteError::InvalidCodePoint(value))
}

fn digits(chars: &mut Chars<'_>, count: usize, radix: u32, escape: char) -> Result<u32, UnquoteError> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|d| d.to_digit(radix))
            .ok_or(UnquoteError::InvalidEscape(escape))?;
        value = value * radix + digit;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_simple() {
        assert_eq!(unquote("\"hello\"").unwrap(), "hello");
        assert_eq!(unquote("''").unwrap(), "");
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""line1\nline2""#).unwrap(), "line1\nline2");
        assert_eq!(unquote(r#""say \"hi\"""#).unwrap(), "say \"hi\"");
        assert_eq!(unquote(r#""\x41\u00e9\U0001F600""#).unwrap(), "Aé😀");
        assert_eq!(unquote(r#""\101""#).unwrap(), "A");
    }

    #[test]
    fn test_unquote_raw_keeps_backslashes() {
        assert_eq!(unquote("`a\\nb`").unwrap(), "a\\nb");
        assert_eq!(unquote("`a\r\nb`").unwrap(), "a\nb");
    }

    #[test]
    fn test_unquote_errors() {
        assert_eq!(unquote("abc"), Err(UnquoteError::NotQuoted));
        assert_eq!(unquote("\"abc"), Err(UnquoteError::Unterminated));
        assert_eq!(unquote("\""), Err(UnquoteError::Unterminated));
        assert_eq!(unquote(r#""a\qb""#), Err(UnquoteError::InvalidEscape('q')));
        assert_eq!(unquote("\"a\nb\""), Err(UnquoteError::Newline));
        assert_eq!(unquote(r#""\'""#), Err(UnquoteError::InvalidEscape('\'')));
        assert_eq!(unquote(r#""\777""#), Err(UnquoteError::InvalidCodePoint(0o777)));
    }
}
