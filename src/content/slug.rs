/// Convert a card name to a URL-safe slug.
///
/// Lowercases, turns every run of non-alphanumeric ASCII into a single `-`
/// and drops leading and trailing separators.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
