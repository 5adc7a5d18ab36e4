//! Free-text sanitization.

/// Trim, drop control characters and HTML-escape markup characters.
///
/// Only for free text (names, descriptions, aliases, ...). Identifiers, hashes
/// and URLs must not go through here.
pub fn string_sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

pub fn sanitize_in_place(item: &mut String) {
    *item = string_sanitize(item);
}

pub fn sanitize_list(items: &mut [String]) {
    items.iter_mut().for_each(sanitize_in_place);
}

pub fn sanitize_opt(item: &mut Option<String>) {
    if let Some(s) = item {
        sanitize_in_place(s);
    }
}
