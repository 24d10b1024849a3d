use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// The base58 alphabet: alphanumerics without the look-alike glyphs `0`, `O`,
/// `I` and `l`.
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Every short code has exactly this many characters.
pub const CODE_LENGTH: usize = 6;

/// A validated short code identifying a shortened URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Parses a short code, accepting only [`CODE_LENGTH`] base58 characters.
    pub fn parse(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let code = code.as_ref();
        if code.len() != CODE_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be {}, got {}",
                CODE_LENGTH,
                code.len()
            )));
        }

        if bs58::decode(code).into_vec().is_err() {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only base58 characters: '{}'",
                code
            )));
        }

        Ok(Self(SmolStr::new(code)))
    }

    /// Builds a code from alphabet indices produced by a generator.
    ///
    /// Indices are reduced modulo the alphabet size, so any `usize` yields a
    /// valid character.
    pub fn from_indices(indices: [usize; CODE_LENGTH]) -> Self {
        let code = indices
            .iter()
            .map(|&i| ALPHABET[i % ALPHABET.len()] as char)
            .collect::<String>();
        Self(SmolStr::new(code))
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/d/{}", base_url.trim_end_matches('/'), self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_excludes_ambiguous_glyphs() {
        for glyph in [b'0', b'O', b'I', b'l'] {
            assert!(!ALPHABET.contains(&glyph));
        }
        let mut unique = ALPHABET.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 58);
    }

    #[test]
    fn valid_codes() {
        assert!(ShortCode::parse("abc123").is_ok());
        assert!(ShortCode::parse("ZZZZZZ").is_ok());
        assert!(ShortCode::parse("111111").is_ok());
    }

    #[test]
    fn wrong_length() {
        assert!(ShortCode::parse("").is_err());
        assert!(ShortCode::parse("abc12").is_err());
        assert!(ShortCode::parse("abc1234").is_err());
        assert!(ShortCode::parse("doesnotexist").is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(ShortCode::parse("abc0de").is_err());
        assert!(ShortCode::parse("abcOde").is_err());
        assert!(ShortCode::parse("abcIde").is_err());
        assert!(ShortCode::parse("abclde").is_err());
        assert!(ShortCode::parse("ab/cde").is_err());
    }

    #[test]
    fn from_indices_wraps_into_alphabet() {
        let code = ShortCode::from_indices([0, 1, 57, 58, 59, 115]);
        assert_eq!(code.as_str(), "12z12z");
    }

    #[test]
    fn to_url_points_at_resolution_route() {
        let code = ShortCode::parse("abc123").unwrap();
        assert_eq!(code.to_url("https://dl.example"), "https://dl.example/d/abc123");
        assert_eq!(code.to_url("https://dl.example/"), "https://dl.example/d/abc123");
    }

    #[test]
    fn try_from_string_validates() {
        let code = ShortCode::try_from("abc123".to_string()).unwrap();
        assert_eq!(String::from(code), "abc123");
        assert!(ShortCode::try_from("nope".to_string()).is_err());
    }
}
