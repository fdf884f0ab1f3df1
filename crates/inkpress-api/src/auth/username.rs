//! Username generation
//!
//! Registration derives a username from the display name: lowercase the
//! name, keep alphanumerics, then append a random 4-digit suffix. Collisions
//! against the unique index are retried with a fresh suffix a bounded number
//! of times.

use rand::Rng;

/// Attempts made against the unique username index before giving up
pub const MAX_USERNAME_ATTEMPTS: usize = 5;

/// Lowercased alphanumeric base derived from a display name
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if slug.is_empty() {
        "user".to_string()
    } else {
        slug
    }
}

/// A username candidate: slug plus a random 4-digit suffix
pub fn candidate(name: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{}{}", slugify(name), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_drops_non_alphanumerics() {
        assert_eq!(slugify("Ann Lee"), "annlee");
        assert_eq!(slugify("Jean-Luc O'Brien"), "jeanlucobrien");
        assert_eq!(slugify("User 42"), "user42");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify("!!!"), "user");
        assert_eq!(slugify(""), "user");
    }

    #[test]
    fn test_candidate_has_numeric_suffix() {
        let c = candidate("Ann Lee");
        assert!(c.starts_with("annlee"));
        let suffix = &c["annlee".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|ch| ch.is_ascii_digit()));
    }
}
