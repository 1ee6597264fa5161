//! Invitation lifecycle state machine
//!
//! Invitations move through a small lifecycle: they are created pending,
//! and from there can be accepted, declined, or expired. Expiry is lazy:
//! nothing flips the row at the deadline, the transition is applied the
//! next time the invitation is read on a path that cares. An expired
//! invitation can be revived by a resend, which rotates the token and
//! restarts the clock.

use std::fmt;

use postdeck_common::StateError;
use serde::{Deserialize, Serialize};

/// Stored lifecycle status of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Declined => write!(f, "declined"),
            InvitationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Events that drive invitation transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationEvent {
    Accept,
    Decline,
    Expire,
    Resend,
}

impl fmt::Display for InvitationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationEvent::Accept => write!(f, "accept"),
            InvitationEvent::Decline => write!(f, "decline"),
            InvitationEvent::Expire => write!(f, "expire"),
            InvitationEvent::Resend => write!(f, "resend"),
        }
    }
}

/// Runtime facts the state machine needs to evaluate guards
#[derive(Debug, Clone, Copy)]
pub struct InvitationGuardContext {
    /// Whether the invitation's deadline has passed
    pub is_expired: bool,
}

/// Pure transition table for the invitation lifecycle.
///
/// Accepted and declined are terminal. Expired admits only a resend,
/// which puts the invitation back to pending.
pub struct InvitationStateMachine;

impl InvitationStateMachine {
    pub fn transition(
        current: InvitationStatus,
        event: InvitationEvent,
        guard: &InvitationGuardContext,
    ) -> Result<InvitationStatus, StateError> {
        use InvitationEvent::*;
        use InvitationStatus::*;

        match (current, event) {
            (Accepted, _) | (Declined, _) => Err(StateError::TerminalState(current.to_string())),

            (Pending, Accept) => {
                if guard.is_expired {
                    Err(StateError::GuardFailed(
                        "invitation has expired".to_string(),
                    ))
                } else {
                    Ok(Accepted)
                }
            }
            (Pending, Decline) => Ok(Declined),
            (Pending, Expire) => Ok(Expired),
            (Pending, Resend) => Ok(Pending),

            (Expired, Resend) => Ok(Pending),

            (from, event) => {
                let to = match event {
                    Accept => Accepted,
                    Decline => Declined,
                    Expire => Expired,
                    Resend => Pending,
                };
                Err(StateError::InvalidTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                    event: event.to_string(),
                })
            }
        }
    }

    pub fn can_transition(
        current: InvitationStatus,
        event: InvitationEvent,
        guard: &InvitationGuardContext,
    ) -> bool {
        Self::transition(current, event, guard).is_ok()
    }
}
