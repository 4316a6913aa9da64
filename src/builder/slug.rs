use regex::Regex;

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Derive a URL-safe slug from a human-readable name.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    SEPARATOR_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}
