use crate::{
    calc_digest, encode_digest_truncated, secret::Secret, uri, OtpCode, OtpError,
    OtpHashAlgorithm,
};

pub const DEFAULT_PERIOD: u64 = 30;
pub const DEFAULT_DIGITS: u32 = 6;
/// Longest accepted window. Authenticators use 30 or 60 seconds.
pub const MAX_PERIOD: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    pub(crate) secret: Secret,
    pub(crate) algorithm: OtpHashAlgorithm,
    pub(crate) period: u64,
    pub(crate) digits: u32,
}

/// A code together with the window it was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: OtpCode,
    pub time_step: u64,
    pub issued_at: u64,
    /// First second at which the code is no longer valid.
    pub expires_at: u64,
    pub seconds_remaining: u64,
}

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given an RFC4648 base32 encoded secret.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a period of 30 seconds
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: OtpHashAlgorithm::SHA1,
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
        }
    }

    /// Reads the config from an `otpauth://totp/` provisioning URI
    pub fn from_uri(uri: &str) -> Result<Self, OtpError> {
        uri::totp_from_uri(uri)
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Index of the window containing `seconds_since_epoch`
    pub fn time_step(&self, seconds_since_epoch: u64) -> u64 {
        seconds_since_epoch / self.period.max(1)
    }

    /// Seconds until the window containing `seconds_since_epoch` ends, in `1..=period`
    pub fn remaining_seconds(&self, seconds_since_epoch: u64) -> u64 {
        let period = self.period.max(1);
        period - seconds_since_epoch % period
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    /// truncated to the specified number of digits
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, OtpError> {
        self.validate()?;

        let key = self.secret.decode()?;
        let digest = calc_digest(&key, self.algorithm, self.time_step(seconds_since_epoch))?;
        let code = encode_digest_truncated(&digest, self.digits)?;

        Ok(OtpCode::new(code, self.digits))
    }

    /// Generates the code for `seconds_since_epoch` along with its validity window
    pub fn issue(&self, seconds_since_epoch: u64) -> Result<IssuedCode, OtpError> {
        let code = self.generate(seconds_since_epoch)?;
        let time_step = self.time_step(seconds_since_epoch);

        Ok(IssuedCode {
            code,
            time_step,
            issued_at: seconds_since_epoch,
            expires_at: (time_step + 1) * self.period,
            seconds_remaining: self.remaining_seconds(seconds_since_epoch),
        })
    }

    fn validate(&self) -> Result<(), OtpError> {
        if !(1..=MAX_PERIOD).contains(&self.period) {
            return Err(OtpError::InvalidPeriod(self.period));
        }

        if !(6..=8).contains(&self.digits) {
            return Err(OtpError::InvalidDigits(self.digits));
        }

        Ok(())
    }
}
