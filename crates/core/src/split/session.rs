//! Split dialog state for one subscription.
//!
//! A session starts with a single empty participant and keeps the shares in
//! step with the participant count. Shares may be edited by hand afterwards;
//! [`SplitSession::validate`] then re-checks the balance before anything is
//! handed to the messaging channel.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtally_shared::AppError;
use subtally_shared::config::SplitConfig;
use subtally_shared::types::Money;
use thiserror::Error;
use tracing::{info, warn};

use super::allocation::{SplitAllocation, SplitAllocator, SplitError};
use super::handoff::{DispatchReport, FailedHandoff, MessagingHandoff, ShareRequest};
use crate::subscription::Subscription;

/// Default maximum number of friends in one split.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 5;

/// Split rules shared by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPolicy {
    /// Allocator carrying the split fraction.
    pub allocator: SplitAllocator,
    /// Maximum participants per split.
    pub max_participants: usize,
}

impl SplitPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(fraction: Decimal, max_participants: usize) -> Self {
        Self {
            allocator: SplitAllocator::new(fraction),
            max_participants,
        }
    }

    /// Allocates `total` across `participant_count` friends, rejecting counts
    /// above the participant limit before any shares are built.
    #[must_use]
    pub fn allocate(&self, total: Decimal, participant_count: usize) -> SplitAllocation {
        if participant_count > self.max_participants {
            return SplitAllocation::rejected(SplitError::TooManyParticipants {
                max: self.max_participants,
            });
        }
        self.allocator.allocate(total, participant_count)
    }
}

impl From<&SplitConfig> for SplitPolicy {
    fn from(config: &SplitConfig) -> Self {
        Self::new(config.fraction, config.max_participants)
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            allocator: SplitAllocator::default(),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}

/// A friend taking part in a split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitParticipant {
    /// Phone number as typed by the user.
    pub phone_number: String,
    /// Whether the friend has paid. Tracked only.
    #[serde(default)]
    pub has_paid: bool,
}

impl SplitParticipant {
    /// Creates an unpaid participant.
    #[must_use]
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            has_paid: false,
        }
    }
}

/// Errors from editing or sending a split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Adding would exceed the participant limit.
    #[error("a split can have at most {max} participants")]
    TooManyParticipants {
        /// Configured limit.
        max: usize,
    },

    /// The last participant cannot be removed.
    #[error("a split needs at least one participant")]
    LastParticipant,

    /// Index out of range.
    #[error("no participant at position {0}")]
    NoSuchParticipant(usize),

    /// The split failed validation.
    #[error("split is not ready: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Transient state of one split dialog.
#[derive(Debug, Clone)]
pub struct SplitSession {
    subscription: Subscription,
    policy: SplitPolicy,
    participants: Vec<SplitParticipant>,
    shares: Vec<Decimal>,
    allocation_error: Option<SplitError>,
}

impl SplitSession {
    /// Opens a session with one empty participant.
    #[must_use]
    pub fn new(subscription: Subscription, policy: SplitPolicy) -> Self {
        let mut session = Self {
            subscription,
            policy,
            participants: vec![SplitParticipant::default()],
            shares: Vec::new(),
            allocation_error: None,
        };
        session.recalculate();
        session
    }

    /// Opens a session with the given participants.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LastParticipant` for an empty list and
    /// `SessionError::TooManyParticipants` above the policy limit.
    pub fn with_participants(
        subscription: Subscription,
        policy: SplitPolicy,
        participants: Vec<SplitParticipant>,
    ) -> Result<Self, SessionError> {
        if participants.is_empty() {
            return Err(SessionError::LastParticipant);
        }
        if participants.len() > policy.max_participants {
            return Err(SessionError::TooManyParticipants {
                max: policy.max_participants,
            });
        }

        let mut session = Self::new(subscription, policy);
        session.participants = participants;
        session.recalculate();
        Ok(session)
    }

    /// Returns the subscription being split.
    #[must_use]
    pub const fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Returns the participants in order.
    #[must_use]
    pub fn participants(&self) -> &[SplitParticipant] {
        &self.participants
    }

    /// Returns the current shares; empty when the allocation was rejected.
    #[must_use]
    pub fn shares(&self) -> &[Decimal] {
        &self.shares
    }

    /// Returns why the last allocation was rejected, if it was.
    #[must_use]
    pub const fn allocation_error(&self) -> Option<SplitError> {
        self.allocation_error
    }

    /// Adds an empty participant.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TooManyParticipants` at the policy limit.
    pub fn add_participant(&mut self) -> Result<(), SessionError> {
        if self.participants.len() >= self.policy.max_participants {
            return Err(SessionError::TooManyParticipants {
                max: self.policy.max_participants,
            });
        }
        self.participants.push(SplitParticipant::default());
        self.recalculate();
        Ok(())
    }

    /// Removes the participant at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LastParticipant` when only one remains and
    /// `SessionError::NoSuchParticipant` for a bad index.
    pub fn remove_participant(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.participants.len() {
            return Err(SessionError::NoSuchParticipant(index));
        }
        if self.participants.len() == 1 {
            return Err(SessionError::LastParticipant);
        }
        self.participants.remove(index);
        self.recalculate();
        Ok(())
    }

    /// Sets a participant's phone number.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSuchParticipant` for a bad index.
    pub fn update_phone(
        &mut self,
        index: usize,
        phone_number: impl Into<String>,
    ) -> Result<(), SessionError> {
        let participant = self
            .participants
            .get_mut(index)
            .ok_or(SessionError::NoSuchParticipant(index))?;
        participant.phone_number = phone_number.into();
        Ok(())
    }

    /// Records whether a participant has paid.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSuchParticipant` for a bad index.
    pub fn set_paid(&mut self, index: usize, has_paid: bool) -> Result<(), SessionError> {
        let participant = self
            .participants
            .get_mut(index)
            .ok_or(SessionError::NoSuchParticipant(index))?;
        participant.has_paid = has_paid;
        Ok(())
    }

    /// Overrides one share by hand.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSuchParticipant` when there is no share at `index`.
    pub fn set_share(&mut self, index: usize, amount: Decimal) -> Result<(), SessionError> {
        let share = self
            .shares
            .get_mut(index)
            .ok_or(SessionError::NoSuchParticipant(index))?;
        *share = amount;
        Ok(())
    }

    /// Replaces every share by hand.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` when the count does not match the participants.
    pub fn set_shares(&mut self, shares: Vec<Decimal>) -> Result<(), SessionError> {
        if shares.len() != self.participants.len() {
            return Err(SessionError::Invalid(vec![format!(
                "Expected {} amounts, got {}",
                self.participants.len(),
                shares.len()
            )]));
        }
        self.shares = shares;
        Ok(())
    }

    /// Back to one empty participant with freshly allocated shares.
    pub fn reset(&mut self) {
        self.participants = vec![SplitParticipant::default()];
        self.recalculate();
    }

    fn recalculate(&mut self) {
        let allocation = self
            .policy
            .allocate(self.subscription.amount, self.participants.len());

        if allocation.valid {
            self.shares = allocation.shares;
            self.allocation_error = None;
        } else {
            warn!(
                subscription_id = %self.subscription.id,
                error = ?allocation.error,
                "Split allocation rejected"
            );
            self.shares = Vec::new();
            self.allocation_error = allocation.error;
        }
    }

    /// Lists every problem preventing the split from being sent.
    ///
    /// Friends are numbered from 1 in the messages.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(error) = self.allocation_error {
            errors.push(error.to_string());
        }

        if !self
            .policy
            .allocator
            .is_balanced(self.subscription.amount, &self.shares)
        {
            errors.push("Split amounts do not match the total subscription amount".to_string());
        }

        for (index, participant) in self.participants.iter().enumerate() {
            let friend = index + 1;
            if participant.phone_number.trim().is_empty() {
                errors.push(format!("Enter phone number for Friend {friend}"));
            }
            let share = self.shares.get(index).copied().unwrap_or_default();
            if share <= Decimal::ZERO {
                errors.push(format!("Enter valid amount for Friend {friend}"));
            }
        }

        errors
    }

    /// Builds the reminder sent when no custom message is given.
    #[must_use]
    pub fn default_message(&self, share: Decimal) -> String {
        let currency = self.subscription.currency;
        format!(
            "Payment Reminder: {}\n\nTotal Amount: {}\nYour Share: {}\n\nPlease send your payment when possible. Thank you!",
            self.subscription.name,
            Money::new(self.subscription.amount, currency).display(),
            Money::new(share, currency).display(),
        )
    }

    /// Builds one request per participant.
    ///
    /// A blank `custom_message` falls back to [`Self::default_message`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` with every validation problem.
    pub fn share_requests(
        &self,
        custom_message: Option<&str>,
    ) -> Result<Vec<ShareRequest>, SessionError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SessionError::Invalid(errors));
        }

        let custom = custom_message.map(str::trim).filter(|m| !m.is_empty());

        Ok(self
            .participants
            .iter()
            .zip(&self.shares)
            .map(|(participant, share)| ShareRequest {
                phone_number: participant.phone_number.trim().to_string(),
                amount: *share,
                currency: self.subscription.currency,
                message: custom.map_or_else(|| self.default_message(*share), str::to_string),
            })
            .collect())
    }

    /// Plain-text split details, one block per friend.
    #[must_use]
    pub fn summary(&self) -> String {
        let currency = self.subscription.currency;
        let blocks: Vec<String> = self
            .participants
            .iter()
            .enumerate()
            .map(|(index, participant)| {
                let share = self.shares.get(index).copied().unwrap_or_default();
                format!(
                    "Friend {}\nPhone: {}\nAmount: {}\n",
                    index + 1,
                    participant.phone_number,
                    Money::new(share, currency).display()
                )
            })
            .collect();

        format!(
            "Split Details for {}\n\n{}",
            self.subscription.name,
            blocks.join("\n\n")
        )
    }

    /// Validates the split, then hands every request to `handoff`.
    ///
    /// One failed hand-off does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` before anything is sent if validation fails.
    pub async fn dispatch(
        &self,
        handoff: &dyn MessagingHandoff,
        custom_message: Option<&str>,
    ) -> Result<DispatchReport, SessionError> {
        let requests = self.share_requests(custom_message)?;
        let mut report = DispatchReport::default();

        for request in &requests {
            match handoff.hand_off(request).await {
                Ok(()) => report.delivered.push(request.phone_number.clone()),
                Err(e) => {
                    warn!(
                        subscription_id = %self.subscription.id,
                        phone = %request.phone_number,
                        error = %e,
                        "Failed to hand off split request"
                    );
                    report.failed.push(FailedHandoff {
                        phone_number: request.phone_number.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            subscription_id = %self.subscription.id,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Split requests dispatched"
        );

        Ok(report)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
