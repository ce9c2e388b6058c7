use std::str::FromStr;

use crate::{
    secret::Secret,
    totp::{Totp, DEFAULT_DIGITS, DEFAULT_PERIOD, MAX_PERIOD},
    OtpError, OtpHashAlgorithm,
};

pub(crate) const URI_SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const URI_SECRET_QUERY: &str = "secret";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

/// Parses an `otpauth://totp/Label?secret=...` provisioning URI as produced
/// by most QR-code based enrollments.
pub(crate) fn totp_from_uri(uri: &str) -> Result<Totp, OtpError> {
    let uri = url::Url::parse(uri).map_err(OtpError::UriParseError)?;

    if uri.scheme() != URI_SCHEME {
        return Err(OtpError::InvalidUriType(
            uri.scheme().into(),
            URI_SCHEME.into(),
        ));
    }

    let otp_type = uri.host_str();
    if otp_type != Some(TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            otp_type.unwrap_or("None").into(),
            TOTP_TYPE.into(),
        ));
    }

    let mut secret = String::new();
    let mut algorithm = OtpHashAlgorithm::default();
    let mut period = DEFAULT_PERIOD;
    let mut digits = DEFAULT_DIGITS;

    for (key, value) in uri.query_pairs() {
        match key.as_ref() {
            URI_SECRET_QUERY => secret = value.chars().filter(|c| !c.is_whitespace()).collect(),
            URI_HASH_QUERY => algorithm = OtpHashAlgorithm::from_str(value.as_ref())?,
            URI_PERIOD_QUERY => {
                period = u64::from_str(value.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?
            }
            URI_DIGITS_QUERY => {
                digits = u32::from_str(value.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    if !(1..=MAX_PERIOD).contains(&period) {
        return Err(OtpError::InvalidPeriod(period));
    }

    Ok(Totp {
        secret: Secret::new(secret),
        algorithm,
        period,
        digits,
    })
}
