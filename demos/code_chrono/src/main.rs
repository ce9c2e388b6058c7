use chrono::{offset, TimeZone};
use totpbot::{countdown::render::group_digits, session::parse_totp};

pub fn main() -> anyhow::Result<()> {
    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "HXDMVJECJJWSRB3HWIZR4IFUGFTMXBOZ".into());

    // Accepts a bare secret or an otpauth:// link
    let totp = parse_totp(&input)?;

    // Get seconds since Unix Epoch
    let now = offset::Local::now().timestamp();

    let issued = totp.issue(now as u64)?;
    let expires_at = offset::Local
        .timestamp_opt(issued.expires_at as i64, 0)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();

    println!(
        "Code: {}, Remaining time: {}s (valid until {})",
        group_digits(&issued.code),
        issued.seconds_remaining,
        expires_at
    );

    Ok(())
}
