use std::io::Write;

use totpbot::{
    cancel,
    countdown::RenderState,
    session::{error_reply, Session, START_REPLY},
    BotConfig, DisplaySink, SinkError, SystemClock,
};
use tracing_subscriber::EnvFilter;

/// Redraws the countdown in place on the terminal
struct TerminalSink {
    last: Option<String>,
}

impl DisplaySink for TerminalSink {
    async fn display(&mut self, state: &RenderState) -> Result<(), SinkError> {
        let text = state.to_text();
        if self.last.as_ref() == Some(&text) {
            return Err(SinkError::Unchanged);
        }

        let mut stdout = std::io::stdout().lock();
        // Clear the screen and move the cursor home before redrawing
        writeln!(stdout, "\x1b[2J\x1b[H{text}")
            .and_then(|_| stdout.flush())
            .map_err(|e| SinkError::Other(e.to_string()))?;

        self.last = Some(text);
        Ok(())
    }
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // The countdown only needs the tick interval, so a token is optional here
    let config = BotConfig::from_vars(|key| match key {
        totpbot::config::TOKEN_VAR => Some("unused".to_string()),
        _ => std::env::var(key).ok(),
    })?;

    let Some(secret) = std::env::args().nth(1) else {
        println!("{START_REPLY}");
        return Ok(());
    };

    let session = Session::new(&config, SystemClock);
    let mut sink = TerminalSink { last: None };

    // Ctrl+C stops the countdown
    let (handle, signal) = cancel::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    match session.handle_message(&secret, &mut sink, signal).await {
        Ok(outcome) => tracing::info!(?outcome, "countdown finished"),
        Err(error) => println!("{}", error_reply(&error)),
    }

    Ok(())
}
