//! Flat `key=value` properties text
//!
//! Reads and writes the same dialect as the favorites files produced by
//! earlier releases: `#`/`!` comments, `=`, `:` or whitespace between key
//! and value, backslash escapes and `\uXXXX` code units, and a trailing
//! backslash continuing a line.

/// Parse properties text into `(key, value)` pairs in file order
pub fn parse(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut lines = text.lines();

    while let Some(first) = lines.next() {
        let trimmed = first.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        pairs.push(split_pair(&logical));
    }

    pairs
}

/// Render pairs as properties text, one per line, after a comment header
pub fn render<'a, I>(header: &str, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for line in header.lines() {
        out.push('#');
        out.push_str(line);
        out.push('\n');
    }
    for (key, value) in pairs {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

/// An odd number of trailing backslashes means the line continues
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_pair(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut key_end = chars.len();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => i += 1,
        }
    }
    let key_end = key_end.min(chars.len());

    let mut value_start = key_end;
    while value_start < chars.len() && chars[value_start].is_whitespace() {
        value_start += 1;
    }
    if value_start < chars.len() && matches!(chars[value_start], '=' | ':') {
        value_start += 1;
        while value_start < chars.len() && chars[value_start].is_whitespace() {
            value_start += 1;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start..].iter().collect();
    (unescape(&key), unescape(&value))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_units(&mut units, &mut out);
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => push_plain(&mut units, &mut out, '\t'),
            Some('n') => push_plain(&mut units, &mut out, '\n'),
            Some('r') => push_plain(&mut units, &mut out, '\r'),
            Some('f') => push_plain(&mut units, &mut out, '\u{0C}'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next_if(|h| h.is_ascii_hexdigit())).collect();
                match u16::from_str_radix(&hex, 16) {
                    Ok(unit) if hex.len() == 4 => units.push(unit),
                    _ => {
                        push_plain(&mut units, &mut out, 'u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => push_plain(&mut units, &mut out, other),
            None => {}
        }
    }
    flush_units(&mut units, &mut out);
    out
}

fn push_plain(units: &mut Vec<u16>, out: &mut String, c: char) {
    flush_units(units, out);
    out.push(c);
}

/// Pending `\u` escapes may form surrogate pairs, so they decode together
fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)));
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for (i, c) in raw.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0C}' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_parse_separators_and_comments() {
        let text = "#comment\n! also comment\n\napp1=C\\:\\\\chrome.exe\ndevice1 : DevA\napp2 b\n";
        assert_eq!(
            parse(text),
            vec![
                pair("app1", r"C:\chrome.exe"),
                pair("device1", "DevA"),
                pair("app2", "b"),
            ]
        );
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse(r"k=a\tb\u0041\=")[0], pair("k", "a\tbA="));
        assert_eq!(parse(r"k=\uD83D\uDE00")[0], pair("k", "\u{1F600}"));
        assert_eq!(parse(r"my\ key=v")[0], pair("my key", "v"));
    }

    #[test]
    fn test_parse_continuation() {
        let text = "device1=one\\\n    two\n";
        assert_eq!(parse(text), vec![pair("device1", "onetwo")]);
    }

    #[test]
    fn test_parse_empty_value() {
        assert_eq!(parse("app1=\n"), vec![pair("app1", "")]);
        assert_eq!(parse("app1\n"), vec![pair("app1", "")]);
    }

    #[test]
    fn test_render_then_parse_preserves_special_characters() {
        let value = r"C:\Program Files\App #1\a=b:c!.exe";
        let device = "{0.0.0.00000000}.{d2c4-ffee}";
        let text = render("favorites", [("app1", value), ("device1", device), ("app2", " lead")]);

        assert!(text.starts_with("#favorites\n"));
        assert_eq!(
            parse(&text),
            vec![pair("app1", value), pair("device1", device), pair("app2", " lead")]
        );
    }

    #[test]
    fn test_render_escapes_backslashes() {
        let text = render("", [("app1", r"C:\chrome.exe")]);
        assert_eq!(text, "app1=C\\:\\\\chrome.exe\n");
    }
}
