// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const VERIFY_INCOMPLETE_MESSAGE: &str =
    "Please enter a complete address (Street, City, State, ZIP)";
pub const VERIFY_REJECTED_MESSAGE: &str =
    "Address could not be verified. Please check and try again.";
pub const VERIFY_UNAVAILABLE_MESSAGE: &str =
    "Failed to verify address. Please check the address format.";
pub const SUBMIT_REJECTED_MESSAGE: &str = "Failed to schedule pickup.";
pub const SUBMIT_UNAVAILABLE_MESSAGE: &str = "Failed to schedule pickup. Please try again.";

/// Local rule violations. Only the first violated rule is ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select both a pickup date and time window.")]
    MissingDateOrWindow,
    #[error("Please enter a valid contact name.")]
    InvalidContactName,
    #[error("Please enter a valid phone number.")]
    InvalidContactPhone,
    #[error("Please enter a complete pickup address.")]
    IncompleteAddress,
    #[error("Please verify your pickup address before scheduling.")]
    AddressNotVerified,
    #[error("Pickup date cannot be in the past.")]
    DateInPast,
    #[error("Pickup date must be within the next 30 days.")]
    DateTooFarOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{}", VERIFY_INCOMPLETE_MESSAGE)]
    IncompleteAddress,
    #[error("address verification is already in progress")]
    InProgress,
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unavailable(String),
}

impl VerificationError {
    pub fn rejected(message: Option<&str>) -> Self {
        Self::Rejected(non_empty(message).unwrap_or(VERIFY_REJECTED_MESSAGE).to_owned())
    }

    pub fn unavailable(failure: &ServiceFailure) -> Self {
        Self::Unavailable(
            failure
                .server_message()
                .unwrap_or(VERIFY_UNAVAILABLE_MESSAGE)
                .to_owned(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a pickup request is already being submitted")]
    Busy,
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unavailable(String),
}

impl SubmissionError {
    pub fn rejected(message: Option<&str>) -> Self {
        Self::Rejected(non_empty(message).unwrap_or(SUBMIT_REJECTED_MESSAGE).to_owned())
    }

    pub fn unavailable(failure: &ServiceFailure) -> Self {
        Self::Unavailable(
            failure
                .server_message()
                .unwrap_or(SUBMIT_UNAVAILABLE_MESSAGE)
                .to_owned(),
        )
    }
}

/// ZIP lookups are an affordance; these never reach the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutofillError {
    #[error("zip lookup returned no city/state")]
    Incomplete,
    #[error("zip lookup failed: {0}")]
    Lookup(#[from] ServiceFailure),
}

/// Failure talking to one of the backend services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceFailure {
    #[error("cannot reach {0}")]
    Unreachable(String),
    #[error("server returned {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("decode response: {0}")]
    Decode(String),
}

impl ServiceFailure {
    /// The backend's own `error` string, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => non_empty(message.as_deref()),
            Self::Unreachable(_) | Self::Decode(_) => None,
        }
    }
}

fn non_empty(message: Option<&str>) -> Option<&str> {
    message.filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        SUBMIT_REJECTED_MESSAGE, SUBMIT_UNAVAILABLE_MESSAGE, ServiceFailure, SubmissionError,
        VERIFY_REJECTED_MESSAGE, VERIFY_UNAVAILABLE_MESSAGE, ValidationError, VerificationError,
    };

    #[test]
    fn verification_prefers_server_message() {
        assert_eq!(
            VerificationError::rejected(Some("Address not found")).to_string(),
            "Address not found"
        );
        assert_eq!(
            VerificationError::rejected(None).to_string(),
            VERIFY_REJECTED_MESSAGE
        );
        assert_eq!(
            VerificationError::rejected(Some("  ")).to_string(),
            VERIFY_REJECTED_MESSAGE
        );
    }

    #[test]
    fn transport_failures_fall_back_to_generic_copy() {
        let unreachable = ServiceFailure::Unreachable("http://localhost:1".to_owned());
        assert_eq!(
            VerificationError::unavailable(&unreachable).to_string(),
            VERIFY_UNAVAILABLE_MESSAGE
        );
        assert_eq!(
            SubmissionError::unavailable(&unreachable).to_string(),
            SUBMIT_UNAVAILABLE_MESSAGE
        );

        let rejected = ServiceFailure::Rejected {
            status: 409,
            message: Some("Quote already picked up".to_owned()),
        };
        assert_eq!(
            SubmissionError::unavailable(&rejected).to_string(),
            "Quote already picked up"
        );
    }

    #[test]
    fn submission_rejection_without_message_uses_default() {
        assert_eq!(
            SubmissionError::rejected(None).to_string(),
            SUBMIT_REJECTED_MESSAGE
        );
    }

    #[test]
    fn invalid_submission_displays_validation_message() {
        let error = SubmissionError::from(ValidationError::DateInPast);
        assert_eq!(error.to_string(), "Pickup date cannot be in the past.");
    }
}
