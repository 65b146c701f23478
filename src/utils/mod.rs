pub mod jalali;
pub mod password;

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// URL slug that keeps Persian letters and digits.
///
/// Word characters survive, runs of whitespace and hyphens become one `-`,
/// everything else is dropped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// `bytes` random bytes from the OS, hex encoded.
pub fn generate_secure_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Local redirect target only: `/path` but not `//host`.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

/// Truncate to `max` characters for log lines and e-mail previews.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &value[..idx]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_keeps_persian() {
        assert_eq!(slugify("آموزش  پایتون"), "آموزش-پایتون");
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  -- Rust -- 2024 --"), "rust-2024");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn secure_token_is_hex() {
        let token = generate_secure_token(16);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_secure_token(16));
    }

    #[test]
    fn next_must_be_local() {
        assert!(is_safe_next("/user/"));
        assert!(!is_safe_next("//evil.example"));
        assert!(!is_safe_next("https://evil.example"));
        assert!(!is_safe_next("/\\evil.example"));
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("سلام دنیا", 4), "سلام…");
        assert_eq!(truncate_chars("abc", 5), "abc");
    }
}
