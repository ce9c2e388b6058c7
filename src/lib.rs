pub mod cancel;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod gate;
pub mod secret;
pub mod session;
pub mod sink;
pub mod totp;
pub(crate) mod uri;

use core::num;
use std::{fmt::Display, str::FromStr};

use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

pub use cancel::{CancelHandle, CancelSignal};
pub use clock::{Clock, SystemClock};
pub use config::{BotConfig, ConfigError};
pub use countdown::{Countdown, CountdownOutcome, RenderState};
pub use secret::Secret;
pub use sink::{DisplaySink, SinkError};
pub use totp::{IssuedCode, Totp};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Secret is not valid base32")]
    InvalidSecret(#[source] data_encoding::DecodeError),
    #[error("Secret decodes to an empty key")]
    EmptySecret,
    #[error("Key length rejected by the HMAC")]
    InvalidKeyLength,
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("Invalid period, found {0}. Expected between 1 and 60 seconds")]
    InvalidPeriod(u64),
    #[error("Invalid digit count, found {0}. Expected a value between 6 and 8")]
    InvalidDigits(u32),
    #[error("The provided URI is not valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(#[source] url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(#[source] num::ParseIntError, String),
}

impl OtpError {
    /// Whether the error means the user handed over a secret no code can be
    /// derived from. These are the errors answered with a rejection message.
    pub fn is_invalid_secret(&self) -> bool {
        matches!(
            self,
            Self::InvalidSecret(_) | Self::EmptySecret | Self::InvalidKeyLength
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

/// A truncated one-time code. Displays zero-padded to its digit count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn new(code: u32, digits: u32) -> Self {
        Self { code, digits }
    }

    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

fn sign<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, OtpError> {
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| OtpError::InvalidKeyLength)?;
    mac.update(data);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Calculates the HMAC digest of a moving factor for the given key.
pub(crate) fn calc_digest(
    key: &[u8],
    algorithm: OtpHashAlgorithm,
    moving_factor: u64,
) -> Result<Vec<u8>, OtpError> {
    let data = moving_factor.to_be_bytes();

    match algorithm {
        OtpHashAlgorithm::SHA1 => sign::<Hmac<Sha1>>(key, &data),
        OtpHashAlgorithm::SHA256 => sign::<Hmac<Sha256>>(key, &data),
        OtpHashAlgorithm::SHA512 => sign::<Hmac<Sha512>>(key, &data),
    }
}

/// Encodes the HMAC digest into a truncated integer (RFC 4226, section 5.3).
pub(crate) fn encode_digest_truncated(
    digest: &[u8],
    target_digits_count: u32,
) -> Result<u32, OtpError> {
    // While sometimes this is a hardcoded 19
    // the last byte tells us the offset for any algorithm
    let offset = match digest.last() {
        Some(x) => (*x & 0xf) as usize,
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    // Gets the 4 bytes that will compose the code
    let code_bytes: [u8; 4] = match digest.get(offset..offset + 4).map(<[u8; 4]>::try_from) {
        Some(Ok(x)) => x,
        _ => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    let code = u32::from_be_bytes(code_bytes);
    let truncation_factor = u32::pow(10, target_digits_count);

    Ok((code & 0x7fffffff) % truncation_factor)
}
