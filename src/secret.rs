use std::fmt;

use data_encoding::Encoding;
use data_encoding_macro::new_encoding;

use crate::OtpError;

const BASE32_BLOCK: usize = 8;

/// Padded base32 that folds lowercase input and, like most authenticator
/// apps, ignores non-zero trailing bits.
const BASE32_LENIENT: Encoding = new_encoding! {
    symbols: "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567",
    translate_from: "abcdefghijklmnopqrstuvwxyz",
    translate_to: "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    padding: '=',
    check_trailing_bits: false,
};

/// A shared TOTP secret as typed by the user, RFC4648 base32 encoded.
///
/// The value is never printed by `Debug`, so a secret cannot end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps an already normalized secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Builds a secret from a chat message, dropping every whitespace
    /// character. Authenticator apps show secrets in groups of four
    /// (`JBSW Y3DP EHPK 3PXP`), and users paste them that way.
    pub fn from_message(text: &str) -> Self {
        Self(text.chars().filter(|c| !c.is_whitespace()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the secret into the HMAC key.
    ///
    /// Decoding is case-insensitive and padding is optional. Padding that is
    /// present must be well formed.
    pub fn decode(&self) -> Result<Vec<u8>, OtpError> {
        let mut padded = self.0.clone();
        if !padded.ends_with('=') {
            let missing = (BASE32_BLOCK - padded.len() % BASE32_BLOCK) % BASE32_BLOCK;
            padded.extend(std::iter::repeat('=').take(missing));
        }

        let key = BASE32_LENIENT
            .decode(padded.as_bytes())
            .map_err(OtpError::InvalidSecret)?;

        if key.is_empty() {
            return Err(OtpError::EmptySecret);
        }

        Ok(key)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} chars>)", self.0.len())
    }
}

impl From<String> for Secret {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}
