//! Deterministic name sanitization and shortening, grounded in
//! `helpers/string_helper.go` of the original implementation.

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encodes the raw bytes of an MD5 digest as a lowercase base36 string.
fn md5_base36(value: &str) -> String {
    let digest = md5::compute(value.as_bytes());
    let mut n = u128::from_be_bytes(digest.0);
    if n == 0 {
        return "0".to_owned();
    }
    let mut chars = Vec::new();
    while n > 0 {
        let rem = (n % 36) as usize;
        chars.push(BASE36_ALPHABET[rem]);
        n /= 36;
    }
    chars.reverse();
    String::from_utf8(chars).expect("base36 alphabet is ascii")
}

/// Strips the value to a safe database identifier: `-` becomes `_`, and
/// anything outside `[A-Za-z0-9_]` is removed.
pub fn sanitize_db(value: &str) -> String {
    let replaced = value.replace('-', "_");
    replaced
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// [`sanitize_db`], falling back to a 10-character base36 MD5 digest when the
/// sanitized value still exceeds `max_length`.
pub fn sanitize_and_shorten(value: &str, max_length: usize) -> String {
    let value = sanitize_db(value);
    if value.len() > max_length {
        md5_base36(&value)[0..10].to_owned()
    } else {
        value
    }
}

/// Returns `value` unchanged if it fits in `max_length` bytes; otherwise
/// truncates it and appends `-` plus a 10-character base36 MD5 digest of the
/// full original value, keeping the result within `max_length`.
pub fn shorten_readable(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_owned();
    }
    let hash = md5_base36(value);
    let prefix_len = max_length.saturating_sub(11);
    format!("{}-{}", &value[0..prefix_len], &hash[0..10])
}

/// Joins `base_name` with `-`-separated `suffixes`, shortening the base name
/// so that the whole result fits within the 63-byte Kubernetes DNS label cap.
pub fn make_object_name(base_name: &str, suffixes: &[&str]) -> String {
    let suffix: String = suffixes.iter().map(|s| format!("-{s}")).collect();
    format!("{}{}", shorten_readable(base_name, 63 - suffix.len()), suffix)
}

/// `site.dbName + "_" + service.shortName`, sanitized/shortened to the
/// 63-byte database-name limit with a final `-` -> `_` pass (the hash
/// fallback in [`sanitize_and_shorten`] never emits a dash, but this mirrors
/// the original's belt-and-braces replacement after the shortening step).
pub fn make_database_name(site_db_name: &str, service_short_name: &str) -> String {
    sanitize_and_shorten(&format!("{site_db_name}_{service_short_name}"), 63).replace('-', "_")
}

/// `site.username + "_" + service.shortName`, sanitized/shortened to the
/// 16-byte username limit MySQL/Mongo accept.
pub fn make_username(site_username: &str, service_short_name: &str) -> String {
    sanitize_and_shorten(&format!("{site_username}_{service_short_name}"), 16)
}

#[cfg(test)]
mod per_service_naming_tests {
    use super::*;

    #[test]
    fn make_database_name_is_deterministic_and_bounded() {
        let a = make_database_name("stg_feature_123", "web");
        let b = make_database_name("stg_feature_123", "web");
        assert_eq!(a, b);
        assert!(a.len() <= 63);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn make_username_is_bounded_to_sixteen_bytes() {
        let name = make_username("a_very_long_staging_username", "worker");
        assert!(name.len() <= 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_db_replaces_dashes_and_strips_symbols() {
        assert_eq!(sanitize_db("feature-123!db"), "feature_123db");
    }

    #[test]
    fn shorten_readable_passes_through_short_values() {
        assert_eq!(shorten_readable("short-name", 63), "short-name");
    }

    #[test]
    fn shorten_readable_truncates_and_suffixes_long_values() {
        let long = "a".repeat(100);
        let shortened = shorten_readable(&long, 63);
        assert_eq!(shortened.len(), 63);
        assert!(shortened.starts_with(&"a".repeat(52)));
        assert_eq!(shortened.as_bytes()[52], b'-');
    }

    #[test]
    fn make_object_name_accounts_for_suffix_length() {
        let name = make_object_name("my-staging-site", &["dbinit"]);
        assert!(name.ends_with("-dbinit"));
        assert!(name.len() <= 63);
    }

    #[test]
    fn sanitize_and_shorten_falls_back_to_hash_when_too_long() {
        let long = "x".repeat(100);
        let shortened = sanitize_and_shorten(&long, 32);
        assert_eq!(shortened.len(), 10);
    }
}
