/// Resolves the escape sequences of a raw string or template chunk.
///
/// Unknown escapes yield the escaped character itself, and a backslash
/// followed by a line terminator is a line continuation.
pub fn cook_string(raw: &str) -> String {
    let mut cooked = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            cooked.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => break,
        };
        match escaped {
            'n' => cooked.push('\n'),
            't' => cooked.push('\t'),
            'r' => cooked.push('\r'),
            'b' => cooked.push('\u{8}'),
            'f' => cooked.push('\u{c}'),
            'v' => cooked.push('\u{b}'),
            '0' => cooked.push('\0'),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut cooked, &hex, 'x');
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|ch| *ch != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut cooked, &hex, 'u');
            }
            other => cooked.push(other),
        }
    }
    cooked
}

fn push_code_point(cooked: &mut String, hex: &str, marker: char) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(ch) => cooked.push(ch),
        None => {
            cooked.push(marker);
            cooked.push_str(hex);
        }
    }
}

/// Parses a numeric literal as written in source.
pub fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    text.parse::<f64>().ok()
}

/// Formats a number the way script code sees it when converted to a string.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}
