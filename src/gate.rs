//! "Join our channel first" gate.
//!
//! Looking a user up in a channel is the transport's job; this module only
//! decides what a lookup result means.

use std::future::Future;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    /// Restricted users may or may not still be in the channel.
    Restricted { is_member: bool },
    Left,
    Kicked,
}

impl MemberStatus {
    pub fn is_member(&self) -> bool {
        match self {
            Self::Creator | Self::Administrator | Self::Member => true,
            Self::Restricted { is_member } => *is_member,
            Self::Left | Self::Kicked => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Membership lookup failed: {0}")]
    Lookup(String),
}

pub trait MembershipLookup {
    fn member_status(
        &self,
        channel: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<MemberStatus, GateError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    JoinRequired { channel: String },
}

/// Decides whether `user_id` may use the bot.
///
/// Without a configured channel everyone is allowed. A failed lookup counts as
/// "not a member", so the user is asked to join rather than let through.
pub async fn check_membership<L>(lookup: &L, channel: Option<&str>, user_id: i64) -> GateDecision
where
    L: MembershipLookup,
{
    let Some(channel) = channel else {
        return GateDecision::Allowed;
    };

    match lookup.member_status(channel, user_id).await {
        Ok(status) if status.is_member() => GateDecision::Allowed,
        Ok(_) => GateDecision::JoinRequired {
            channel: channel.to_string(),
        },
        Err(error) => {
            warn!(%error, channel, user_id, "membership lookup failed");
            GateDecision::JoinRequired {
                channel: channel.to_string(),
            }
        }
    }
}

pub fn join_prompt(channel: &str) -> String {
    let name = channel.trim_start_matches('@');

    format!(
        "🔒 Please join {channel} to use this bot.\n\nhttps://t.me/{name}\n\nOnce you have joined, send your secret again."
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    struct FixedLookup(Result<MemberStatus, String>);

    impl MembershipLookup for FixedLookup {
        async fn member_status(
            &self,
            _channel: &str,
            _user_id: i64,
        ) -> Result<MemberStatus, GateError> {
            self.0.clone().map_err(GateError::Lookup)
        }
    }

    #[rstest]
    #[case(MemberStatus::Creator, true)]
    #[case(MemberStatus::Administrator, true)]
    #[case(MemberStatus::Member, true)]
    #[case(MemberStatus::Restricted { is_member: true }, true)]
    #[case(MemberStatus::Restricted { is_member: false }, false)]
    #[case(MemberStatus::Left, false)]
    #[case(MemberStatus::Kicked, false)]
    #[tokio::test]
    async fn status_decides_access(#[case] status: MemberStatus, #[case] allowed: bool) {
        let decision = check_membership(&FixedLookup(Ok(status)), Some("@channel"), 42).await;

        let expected = if allowed {
            GateDecision::Allowed
        } else {
            GateDecision::JoinRequired {
                channel: "@channel".to_string(),
            }
        };
        assert_eq!(expected, decision);
    }

    #[tokio::test]
    async fn no_channel_means_no_gate() {
        let lookup = FixedLookup(Err("should not be called".to_string()));

        assert_eq!(GateDecision::Allowed, check_membership(&lookup, None, 42).await);
    }

    #[tokio::test]
    async fn failed_lookup_requires_joining() {
        let lookup = FixedLookup(Err("user not found".to_string()));

        assert_eq!(
            GateDecision::JoinRequired {
                channel: "@channel".to_string()
            },
            check_membership(&lookup, Some("@channel"), 42).await
        );
    }

    #[test]
    fn prompt_links_the_channel() {
        assert!(join_prompt("@my_channel").contains("https://t.me/my_channel"));
    }
}
