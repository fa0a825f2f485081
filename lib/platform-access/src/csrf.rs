//! CSRF protection for the login round trip.
//!
//! Login issues a fresh state and nonce and stores each in two cookie
//! generations: a strict one marked for cross-site delivery and a compat one
//! with only the baseline attributes, for user agents that drop the strict
//! combination. The callback is accepted only if every generation that made
//! it back matches the submitted values.

use crate::error::ValidationError;
use rand::Rng;
use rootcause::prelude::Report;
use tracing::warn;

/// Number of random bytes behind each token.
const TOKEN_BYTES: usize = 16;

/// Base names of the state and nonce cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfKeys {
    state_key: String,
    nonce_key: String,
}

impl Default for CsrfKeys {
    fn default() -> Self {
        Self::new("state", "nonce")
    }
}

impl CsrfKeys {
    #[must_use]
    pub fn new(state_key: impl Into<String>, nonce_key: impl Into<String>) -> Self {
        Self {
            state_key: state_key.into(),
            nonce_key: nonce_key.into(),
        }
    }

    #[must_use]
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    #[must_use]
    pub fn nonce_key(&self) -> &str {
        &self.nonce_key
    }

    /// Returns all four cookie names, strict generation first.
    #[must_use]
    pub fn cookie_names(&self) -> Vec<String> {
        CookieGeneration::ALL
            .iter()
            .flat_map(|generation| {
                [
                    generation.cookie_name(&self.state_key),
                    generation.cookie_name(&self.nonce_key),
                ]
            })
            .collect()
    }
}

/// One of the two cookie generations each token is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookieGeneration {
    /// `SameSite=None; Secure` in addition to the baseline attributes.
    Strict,
    /// Baseline attributes only, name suffixed with `_compat`.
    Compat,
}

impl CookieGeneration {
    pub const ALL: [Self; 2] = [Self::Strict, Self::Compat];

    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Strict => "",
            Self::Compat => "_compat",
        }
    }

    /// Returns the cookie name of this generation for a base name.
    #[must_use]
    pub fn cookie_name(&self, base: &str) -> String {
        format!("{base}{}", self.suffix())
    }

    /// Returns true if cookies of this generation must be deliverable on
    /// cross-site requests, i.e. carry `SameSite=None` and `Secure`.
    #[must_use]
    pub fn is_cross_site(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// A freshly generated state and nonce.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfTokenPair {
    state: String,
    nonce: String,
}

impl std::fmt::Debug for CsrfTokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokenPair").finish_non_exhaustive()
    }
}

impl CsrfTokenPair {
    /// Generates a new pair, each value 16 random bytes hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            state: random_token(),
            nonce: random_token(),
        }
    }

    #[must_use]
    pub fn new(state: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            nonce: nonce.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}

fn random_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Checks the CSRF cookies of a login callback.
///
/// `cookie` looks up a request cookie by name. Empty cookies count as
/// absent, and an absent generation is not an error. The nonce cookies are
/// compared with the identity token's nonce claim first, then the state
/// cookies with the submitted state.
///
/// # Errors
///
/// Returns `ValidationError::NonceMismatch` or `ValidationError::StateMismatch`
/// for the first present cookie that differs from its expected value.
pub fn verify_callback<F>(
    keys: &CsrfKeys,
    cookie: F,
    token_nonce: Option<&str>,
    submitted_state: Option<&str>,
) -> Result<(), Report<ValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(generation) = first_mismatch(keys.nonce_key(), &cookie, token_nonce) {
        warn!(cookie_generation = ?generation, "nonce cookie does not match identity token");
        return Err(ValidationError::NonceMismatch.into());
    }

    if let Some(generation) = first_mismatch(keys.state_key(), &cookie, submitted_state) {
        warn!(cookie_generation = ?generation, "state cookie does not match submitted state");
        return Err(ValidationError::StateMismatch.into());
    }

    Ok(())
}

fn first_mismatch<F>(base: &str, cookie: &F, expected: Option<&str>) -> Option<CookieGeneration>
where
    F: Fn(&str) -> Option<String>,
{
    CookieGeneration::ALL.into_iter().find(|generation| {
        cookie(&generation.cookie_name(base))
            .filter(|value| !value.is_empty())
            .is_some_and(|value| Some(value.as_str()) != expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn jar(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn verify(pairs: &[(&str, &str)], nonce: Option<&str>, state: Option<&str>) -> Result<(), ValidationError> {
        verify_callback(&CsrfKeys::default(), jar(pairs), nonce, state)
            .map_err(|report| *report.current_context())
    }

    #[test]
    fn generated_tokens_are_32_hex_chars() {
        let pair = CsrfTokenPair::generate();
        for value in [pair.state(), pair.nonce()] {
            assert_eq!(value.len(), 32);
            assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn generated_tokens_differ() {
        let a = CsrfTokenPair::generate();
        let b = CsrfTokenPair::generate();
        assert_ne!(a.state(), a.nonce());
        assert_ne!(a.state(), b.state());
    }

    #[test]
    fn debug_does_not_leak_tokens() {
        let pair = CsrfTokenPair::new("state-value", "nonce-value");
        let debug = format!("{pair:?}");
        assert!(!debug.contains("state-value"));
        assert!(!debug.contains("nonce-value"));
    }

    #[test]
    fn cookie_names_cover_both_generations() {
        let keys = CsrfKeys::new("st", "no");
        assert_eq!(
            keys.cookie_names(),
            vec!["st", "no", "st_compat", "no_compat"]
        );
    }

    #[test]
    fn only_strict_generation_is_cross_site() {
        assert!(CookieGeneration::Strict.is_cross_site());
        assert!(!CookieGeneration::Compat.is_cross_site());
    }

    #[test]
    fn all_cookies_matching_passes() {
        let cookies = [
            ("state", "s1"),
            ("nonce", "n1"),
            ("state_compat", "s1"),
            ("nonce_compat", "n1"),
        ];
        assert_eq!(verify(&cookies, Some("n1"), Some("s1")), Ok(()));
    }

    #[test]
    fn no_cookies_passes() {
        assert_eq!(verify(&[], Some("n1"), Some("s1")), Ok(()));
        assert_eq!(verify(&[], None, None), Ok(()));
    }

    #[test]
    fn one_surviving_generation_is_enough() {
        let compat_only = [("state_compat", "s1"), ("nonce_compat", "n1")];
        assert_eq!(verify(&compat_only, Some("n1"), Some("s1")), Ok(()));

        let strict_only = [("state", "s1"), ("nonce", "n1")];
        assert_eq!(verify(&strict_only, Some("n1"), Some("s1")), Ok(()));
    }

    #[test]
    fn any_present_mismatch_fails() {
        let cookies = [("nonce", "n1"), ("nonce_compat", "other")];
        assert_eq!(
            verify(&cookies, Some("n1"), Some("s1")),
            Err(ValidationError::NonceMismatch)
        );

        let cookies = [("state", "other"), ("state_compat", "s1")];
        assert_eq!(
            verify(&cookies, Some("n1"), Some("s1")),
            Err(ValidationError::StateMismatch)
        );
    }

    #[test]
    fn nonce_is_checked_before_state() {
        let cookies = [("state", "bad"), ("nonce", "bad")];
        assert_eq!(
            verify(&cookies, Some("n1"), Some("s1")),
            Err(ValidationError::NonceMismatch)
        );
    }

    #[test]
    fn missing_claim_with_cookie_present_fails() {
        let cookies = [("nonce", "n1")];
        assert_eq!(
            verify(&cookies, None, Some("s1")),
            Err(ValidationError::NonceMismatch)
        );

        let cookies = [("state", "s1")];
        assert_eq!(
            verify(&cookies, Some("n1"), None),
            Err(ValidationError::StateMismatch)
        );
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let cookies = [("nonce", ""), ("state_compat", "")];
        assert_eq!(verify(&cookies, Some("n1"), Some("s1")), Ok(()));
    }

    #[test]
    fn custom_keys_are_honoured() {
        let keys = CsrfKeys::new("console_state", "console_nonce");
        let cookies = jar(&[("console_state_compat", "s1"), ("state", "ignored")]);
        assert!(verify_callback(&keys, cookies, Some("n1"), Some("s1")).is_ok());
    }
}
