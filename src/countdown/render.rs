//! Human readable text for render states.
//!
//! Codes go inside a Markdown code span so chat clients show them in a
//! monospace font and copy them with a tap.

use crate::OtpCode;

use super::RenderState;

pub const BAR_CELLS: u64 = 10;

const FILLED_CELL: char = '█';
const EMPTY_CELL: char = '░';
const EXPIRES_PREFIX: &str = "Expires in ";

pub fn render(state: &RenderState) -> String {
    let code = group_digits(&state.code);

    if state.is_expired {
        return format!("⌛ Code `{code}` has expired.\nSend your secret again for a new one.");
    }

    format!(
        "🔑 Your code: `{code}`\n⏳ {EXPIRES_PREFIX}{}s\n{}",
        state.seconds_remaining,
        progress_bar(state.seconds_remaining, state.period)
    )
}

/// Splits the code in two halves, `123456` becomes `123 456`.
pub fn group_digits(code: &OtpCode) -> String {
    let digits = code.to_string();
    let (head, tail) = digits.split_at(digits.len().div_ceil(2));

    format!("{head} {tail}")
}

/// A bar of [`BAR_CELLS`] cells where `floor(cells * remaining / period)` are filled.
pub fn progress_bar(seconds_remaining: u64, period: u64) -> String {
    let filled = u128::from(BAR_CELLS) * u128::from(seconds_remaining.min(period))
        / u128::from(period.max(1));
    let filled = filled as usize;
    let empty = BAR_CELLS as usize - filled;

    let mut bar = String::with_capacity((filled + empty) * FILLED_CELL.len_utf8());
    bar.extend(std::iter::repeat(FILLED_CELL).take(filled));
    bar.extend(std::iter::repeat(EMPTY_CELL).take(empty));
    bar
}

/// Reads the remaining seconds back from an active render.
pub fn parse_seconds(text: &str) -> Option<u64> {
    let start = text.find(EXPIRES_PREFIX)? + EXPIRES_PREFIX.len();
    let rest = &text[start..];
    let end = rest.find('s')?;

    rest[..end].parse().ok()
}
