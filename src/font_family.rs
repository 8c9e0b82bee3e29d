/// Splits a CSS `font-family` list into family names.
///
/// Commas inside single or double quotes do not separate names, a backslash
/// escapes the next character, and whitespace around unquoted names is
/// dropped.
pub fn parse_font_family(value: &str) -> Vec<String> {
    let mut fonts: Vec<String> = Vec::new();
    let mut current: Option<usize> = None;
    let mut in_quote: Option<char> = None;
    let mut in_escape = false;

    for c in value.chars() {
        if in_escape {
            in_escape = false;
            push_char(&mut fonts, &mut current, c);
        } else if c == ',' && in_quote.is_none() {
            current = None;
        } else if Some(c) == in_quote {
            in_quote = None;
        } else if in_quote.is_none() && (c == '"' || c == '\'') {
            in_quote = Some(c);
        } else if c == '\\' {
            in_escape = true;
        } else if current.is_none() && c.is_whitespace() {
            // Leading whitespace.
        } else {
            push_char(&mut fonts, &mut current, c);
        }
    }

    fonts
        .into_iter()
        .map(|font| font.trim_end().to_string())
        .collect()
}

fn push_char(fonts: &mut Vec<String>, current: &mut Option<usize>, c: char) {
    match current {
        Some(index) => fonts[*index].push(c),
        None => {
            fonts.push(c.to_string());
            *current = Some(fonts.len() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_quotes_and_escaping() {
        let cases: &[(&str, &[&str])] = &[
            ("", &[]),
            ("font", &["font"]),
            ("font name, other font", &["font name", "other font"]),
            ("'font name', other font", &["font name", "other font"]),
            ("'font, name', other font", &["font, name", "other font"]),
            ("\"font name\", other font", &["font name", "other font"]),
            ("\"font, name\", other font", &["font, name", "other font"]),
            ("weird \\\" name", &["weird \" name"]),
            ("weird\\, name", &["weird, name"]),
            (" stupid , spacing ", &["stupid", "spacing"]),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_font_family(input), *expected, "{input:?}");
        }
    }
}
