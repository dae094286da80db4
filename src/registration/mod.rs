//! Authority registration submission
//!
//! Flow:
//! 1. Create the email/password identity
//! 2. Store manually entered hierarchy levels, outermost first
//! 3. Store the authority profile with verification pending
//! 4. Store the user record
//! 5. Send the registration notice in the background
//! 6. End the identity's session and point the user at the status page

mod error;
mod workflow;

pub use error::{RegistrationError, FALLBACK_MESSAGE};
pub use workflow::{RegistrationOutcome, RegistrationService, RegistrationSettings};
