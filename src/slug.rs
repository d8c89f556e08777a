/// Lowercases `s` and collapses every run of non-alphanumeric characters into a
/// single `-`, with no leading or trailing hyphen.
///
/// Characters are classified after lowercasing, so a letter whose lowercase
/// form carries a combining mark (`İ` -> `i̇`) keeps only its alphanumeric part.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Inverse of [`slugify`] for display purposes: hyphens become spaces and each
/// word is title-cased (`"ab-hospital"` -> `"Ab Hospital"`).
pub fn deslugify(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out = String::with_capacity(word.len());
    out.push(upper_if_reversible(first));
    out.extend(chars);
    out
}

// `ß` -> `SS` or `ŉ` -> `ʼN` would not slugify back to the same word.
fn upper_if_reversible(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) if u.to_lowercase().eq([ch]) => u,
        _ => ch,
    }
}
