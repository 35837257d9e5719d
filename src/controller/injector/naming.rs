//! # Secret Naming
//!
//! Generated secret names: `<prefix>-<pod name>-<random>`, at most 63 characters.

use crate::constants::{MAX_SECRET_NAME_BASE_LENGTH, RANDOM_SUFFIX_LENGTH};
use rand::Rng;

/// Alphabet the API server uses for `generateName` suffixes (no vowels, no confusable digits)
const NAME_SUFFIX_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Build the deterministic part of a secret name for a pod name or `generateName`
///
/// Bases longer than the limit are cut and given a trailing `-` so the random suffix
/// stays visually separate. A cut never leaves `.` or `-` in front of that separator.
pub fn secret_name_base(prefix: &str, pod_name: &str) -> String {
    let base = format!("{prefix}-{}-", pod_name.trim_end_matches(NAME_SEPARATORS));
    if base.chars().count() > MAX_SECRET_NAME_BASE_LENGTH {
        let truncated: String = base.chars().take(MAX_SECRET_NAME_BASE_LENGTH).collect();
        let mut truncated = truncated.trim_end_matches(NAME_SEPARATORS).to_string();
        truncated.push('-');
        truncated
    } else {
        base
    }
}

/// Characters a DNS-1123 subdomain segment may not end with
const NAME_SEPARATORS: [char; 2] = ['-', '.'];

/// Append a random suffix to `base`
pub fn append_random_suffix<R: Rng + ?Sized>(base: &str, rng: &mut R) -> String {
    let mut name = String::with_capacity(base.len() + RANDOM_SUFFIX_LENGTH);
    name.push_str(base);
    for _ in 0..RANDOM_SUFFIX_LENGTH {
        let index = rng.gen_range(0..NAME_SUFFIX_ALPHABET.len());
        name.push(char::from(NAME_SUFFIX_ALPHABET[index]));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_RESOURCE_NAME_LENGTH;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_short_name_keeps_pod_name() {
        assert_eq!(
            secret_name_base("telegraf-config", "web-0"),
            "telegraf-config-web-0-"
        );
        assert_eq!(
            secret_name_base("telegraf-config", "web-7d9f8-"),
            "telegraf-config-web-7d9f8-"
        );
    }

    #[test]
    fn test_long_name_is_truncated() {
        let pod_name = "a".repeat(80);
        let base = secret_name_base("telegraf-config", &pod_name);
        assert_eq!(base.len(), MAX_SECRET_NAME_BASE_LENGTH + 1);
        assert!(base.ends_with("a-"));

        let mut rng = StdRng::seed_from_u64(7);
        let name = append_random_suffix(&base, &mut rng);
        assert_eq!(name.len(), MAX_RESOURCE_NAME_LENGTH);
    }

    #[test]
    fn test_truncation_never_ends_segment_with_separator() {
        let dns_subdomain = regex::Regex::new(
            r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$",
        )
        .expect("valid regex");
        let mut rng = StdRng::seed_from_u64(11);

        for cut in 1..60 {
            let dotted = format!("{}.{}", "a".repeat(cut), "b".repeat(60));
            let dashed = format!("{}-{}", "c".repeat(cut), "d".repeat(60));
            for pod_name in [dotted, dashed] {
                let name = append_random_suffix(
                    &secret_name_base("telegraf-config", &pod_name),
                    &mut rng,
                );
                assert!(name.len() <= MAX_RESOURCE_NAME_LENGTH, "{name}");
                assert!(!name.contains(".-"), "{name}");
                assert!(!name.contains("--"), "{name}");
                assert!(dns_subdomain.is_match(&name), "{name}");
            }
        }
    }

    #[test]
    fn test_suffix_uses_name_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let name = append_random_suffix("prefix-pod-", &mut rng);
        let suffix = &name["prefix-pod-".len()..];
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LENGTH);
        assert!(suffix.bytes().all(|b| NAME_SUFFIX_ALPHABET.contains(&b)));
    }
}
