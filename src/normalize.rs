/// Canonical comparison key for a place name. Never displayed.
///
/// Dashes become spaces, the name is trimmed and lowercased, a `saint` / `st.` / `st`
/// word followed by another word collapses to `st`, one trailing `city` word is
/// dropped, and whitespace runs collapse to a single space.
pub fn normalize_city(raw: &str) -> String {
    let dashed: String = raw
        .chars()
        .map(|c| match c {
            '-' | '\u{2013}' | '\u{2014}' => ' ',
            other => other,
        })
        .collect();
    let lowered = dashed.trim().to_lowercase();

    let words: Vec<&str> = lowered.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    let mut out: Vec<&str> = words
        .iter()
        .enumerate()
        .map(|(i, w)| match *w {
            "saint" | "st." | "st" if i < last => "st",
            other => other,
        })
        .collect();
    // A bare "city" also ends up empty; two such places compare equal.
    if out.last() == Some(&"city") {
        out.pop();
    }
    out.join(" ")
}

/// Title-case a name: a letter is uppercased when the preceding character is not a
/// letter, lowercased otherwise ("o'neill" -> "O'Neill", "ST. LOUIS" -> "St. Louis").
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Trimmed, uppercased two-letter state code.
pub fn normalize_state(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Ingest cleanup shared by both tables: always trim, optionally title-case.
pub fn tidy_name(input: &str, title: bool) -> String {
    let s = input.trim();
    if title { title_case(s) } else { s.to_string() }
}
