use std::future::Future;

use crate::countdown::RenderState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The display already shows this content. Not a failure.
    #[error("Message content is unchanged")]
    Unchanged,
    #[error("Display failed: {0}")]
    Other(String),
}

/// Where render states end up, typically a chat message that is sent once
/// and then edited in place on every tick.
pub trait DisplaySink {
    fn display(
        &mut self,
        state: &RenderState,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
