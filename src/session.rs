//! Handling of one inbound message: turn the text into a code and keep its
//! countdown on screen.

use std::time::Duration;

use tracing::{info, warn};

use crate::{
    cancel::CancelSignal,
    clock::Clock,
    config::BotConfig,
    countdown::{Countdown, CountdownOutcome},
    secret::Secret,
    sink::DisplaySink,
    totp::{IssuedCode, Totp},
    uri::URI_SCHEME,
    OtpError,
};

pub const START_REPLY: &str = "👋 *TOTP bot is online!*\n\n\
    Send me a 2FA secret key (Base32) or an `otpauth://` link and I will generate the code.";

pub const INVALID_SECRET_REPLY: &str =
    "❌ *Invalid key.*\nPlease check your secret key and try again.";

pub const INVALID_LINK_REPLY: &str =
    "❌ *Invalid link.*\nOnly `otpauth://totp/` links with a secret are supported.";

/// Builds the TOTP config for a message: either an `otpauth://` link or a
/// bare secret, with whitespace removed.
pub fn parse_totp(text: &str) -> Result<Totp, OtpError> {
    let trimmed = text.trim();

    if trimmed
        .get(..URI_SCHEME.len() + 3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("otpauth://"))
    {
        return Totp::from_uri(trimmed);
    }

    Ok(Totp::new(Secret::from_message(text)))
}

/// The reply for a message that could not be turned into a code.
pub fn error_reply(error: &OtpError) -> &'static str {
    if error.is_invalid_secret() {
        INVALID_SECRET_REPLY
    } else {
        INVALID_LINK_REPLY
    }
}

pub struct Session<C> {
    tick_interval: Duration,
    clock: C,
}

impl<C: Clock> Session<C> {
    pub fn new(config: &BotConfig, clock: C) -> Self {
        Self {
            tick_interval: config.tick_interval,
            clock,
        }
    }

    /// Generates the current code for `text`.
    pub fn issue(&self, text: &str) -> Result<(Totp, IssuedCode), OtpError> {
        let totp = parse_totp(text)?;
        let issued = totp.issue(self.clock.now())?;

        Ok((totp, issued))
    }

    /// Issues a code for `text` and runs its countdown on `sink`.
    ///
    /// A rejected secret returns the error before anything is displayed; the
    /// caller answers it with [`error_reply`].
    pub async fn handle_message<S>(
        &self,
        text: &str,
        sink: &mut S,
        cancel: CancelSignal,
    ) -> Result<CountdownOutcome, OtpError>
    where
        S: DisplaySink,
    {
        let (totp, issued) = self.issue(text).map_err(|error| {
            warn!(%error, "rejected secret");
            error
        })?;

        info!(
            seconds_remaining = issued.seconds_remaining,
            period = totp.period(),
            "code issued"
        );

        let countdown = Countdown::for_totp(&totp, self.tick_interval);
        Ok(countdown.run(&issued, sink, &self.clock, cancel).await)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tokio::time::Instant;

    use super::*;
    use crate::{cancel, countdown::RenderState, sink::SinkError, OtpHashAlgorithm};

    const WINDOW_START: u64 = 1_700_000_010;

    struct PausedClock {
        origin_unix: u64,
        origin: Instant,
    }

    impl Clock for PausedClock {
        fn now(&self) -> u64 {
            self.origin_unix + self.origin.elapsed().as_secs()
        }
    }

    #[derive(Default)]
    struct TextSink(Vec<String>);

    impl DisplaySink for TextSink {
        async fn display(&mut self, state: &RenderState) -> Result<(), SinkError> {
            let text = state.to_text();
            if self.0.last() == Some(&text) {
                return Err(SinkError::Unchanged);
            }
            self.0.push(text);
            Ok(())
        }
    }

    #[fixture]
    fn config() -> BotConfig {
        BotConfig {
            token: "token".to_string(),
            gate_channel: None,
            tick_interval: Duration::from_secs(3),
        }
    }

    fn session(config: &BotConfig, at: u64) -> Session<PausedClock> {
        Session::new(
            config,
            PausedClock {
                origin_unix: at,
                origin: Instant::now(),
            },
        )
    }

    #[rstest]
    #[case("JBSWY3DPEHPK3PXP")]
    #[case("  jbsw y3dp ehpk 3pxp \n")]
    #[case("otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP")]
    #[case("OTPAUTH://totp/alice?secret=JBSW%20Y3DP%20EHPK%203PXP")]
    fn equivalent_inputs_give_the_same_code(#[case] text: &str) {
        let expected = Totp::new("JBSWY3DPEHPK3PXP".to_string()).generate(59).unwrap();

        assert_eq!(expected, parse_totp(text).unwrap().generate(59).unwrap());
    }

    #[test]
    fn uri_settings_are_kept() {
        let totp =
            parse_totp("otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&algorithm=SHA256&period=60")
                .unwrap();

        assert_eq!(OtpHashAlgorithm::SHA256, totp.algorithm());
        assert_eq!(60, totp.period());
    }

    #[rstest]
    #[case("JBSWY3DPEHPK1PXP", INVALID_SECRET_REPLY)]
    #[case("hello there!", INVALID_SECRET_REPLY)]
    #[case("otpauth://hotp/a?secret=JBSWY3DPEHPK3PXP", INVALID_LINK_REPLY)]
    #[case("otpauth://totp/a?issuer=x", INVALID_LINK_REPLY)]
    #[case("otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&period=86400", INVALID_LINK_REPLY)]
    fn rejected_input_gets_a_reply(#[case] text: &str, #[case] reply: &str) {
        let err = parse_totp(text).and_then(|t| t.generate(59)).unwrap_err();

        assert_eq!(reply, error_reply(&err));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn message_runs_countdown_to_expiry(config: BotConfig) {
        let session = session(&config, WINDOW_START + 21);
        let (_handle, signal) = cancel::pair();
        let mut sink = TextSink::default();

        let outcome = session
            .handle_message("JBSWY3DPEHPK3PXP", &mut sink, signal)
            .await
            .unwrap();

        assert_eq!(CountdownOutcome::Expired { ticks: 3 }, outcome);
        assert_eq!(4, sink.0.len());
        assert!(sink.0[0].contains("Expires in 9s"));
        assert!(sink.0[3].contains("has expired"));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn invalid_secret_displays_nothing(config: BotConfig) {
        let session = session(&config, WINDOW_START);
        let (_handle, signal) = cancel::pair();
        let mut sink = TextSink::default();

        let err = session
            .handle_message("NOT-BASE32!", &mut sink, signal)
            .await
            .unwrap_err();

        assert!(err.is_invalid_secret());
        assert!(sink.0.is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn oversized_period_starts_no_countdown(config: BotConfig) {
        let session = session(&config, WINDOW_START);
        let (_handle, signal) = cancel::pair();
        let mut sink = TextSink::default();

        let err = session
            .handle_message(
                "otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&period=18446744073709551615",
                &mut sink,
                signal,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OtpError::InvalidPeriod(p) if p == u64::MAX));
        assert!(sink.0.is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn longer_period_from_link_is_counted_down(config: BotConfig) {
        let session = session(&config, WINDOW_START + 10);
        let (_handle, signal) = cancel::pair();
        let mut sink = TextSink::default();

        let outcome = session
            .handle_message(
                "otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&period=60",
                &mut sink,
                signal,
            )
            .await
            .unwrap();

        // 1_700_000_020 is 40s into a 60s window
        assert!(sink.0[0].contains("Expires in 20s"));
        assert_eq!(CountdownOutcome::Expired { ticks: 7 }, outcome);
    }
}
