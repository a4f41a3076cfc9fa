//! Splitting a subscription's cost with friends.

pub mod allocation;
pub mod handoff;
pub mod link;
pub mod session;

#[cfg(test)]
mod props;

pub use allocation::{BALANCE_TOLERANCE, SplitAllocation, SplitAllocator, SplitError};
pub use handoff::{DispatchReport, FailedHandoff, HandoffError, MessagingHandoff, ShareRequest};
pub use link::{DEFAULT_COUNTRY_CODE, LinkHandoff};
pub use session::{
    DEFAULT_MAX_PARTICIPANTS, SessionError, SplitParticipant, SplitPolicy, SplitSession,
};

#[cfg(test)]
pub use handoff::MockMessagingHandoff;
