// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::{
    MIN_CONTACT_NAME_CHARS, MIN_CONTACT_PHONE_CHARS, ScheduleDraft, ValidationError,
    latest_bookable_date,
};

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Pre-submit gate. Checks run in a fixed order and the first failure wins.
/// `today` must be the caller's current local date, computed per call.
pub fn validate_draft(
    draft: &ScheduleDraft,
    address_verified: bool,
    today: Date,
) -> ValidationResult<()> {
    let (Some(scheduled_date), Some(_)) = (draft.scheduled_date, draft.pickup_window) else {
        return Err(ValidationError::MissingDateOrWindow);
    };
    if trimmed_len(&draft.contact_name) < MIN_CONTACT_NAME_CHARS {
        return Err(ValidationError::InvalidContactName);
    }
    if trimmed_len(&draft.contact_phone) < MIN_CONTACT_PHONE_CHARS {
        return Err(ValidationError::InvalidContactPhone);
    }
    if !draft.address.is_complete() {
        return Err(ValidationError::IncompleteAddress);
    }
    if !address_verified {
        return Err(ValidationError::AddressNotVerified);
    }
    if scheduled_date < today {
        return Err(ValidationError::DateInPast);
    }
    if scheduled_date > latest_bookable_date(today) {
        return Err(ValidationError::DateTooFarOut);
    }
    Ok(())
}

fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}
