// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::{
    AddressField, AddressType, ContactDefaults, MAX_CONTACT_PHONE_CHARS,
    MAX_SPECIAL_INSTRUCTIONS_CHARS, PickupAddress, PickupWindow,
};

/// The uncommitted pickup form. Verification status is tracked by the
/// workflow's verifier, not here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScheduleDraft {
    pub scheduled_date: Option<Date>,
    pub pickup_window: Option<PickupWindow>,
    pub special_instructions: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub address: PickupAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    ScheduledDate(Option<Date>),
    PickupWindow(Option<PickupWindow>),
    SpecialInstructions(String),
    ContactName(String),
    ContactPhone(String),
    AddressType(AddressType),
    Address(AddressField, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftChange {
    Unchanged,
    Changed,
    Address(AddressField),
}

impl ScheduleDraft {
    pub fn seeded(contact: ContactDefaults) -> Self {
        Self {
            contact_name: contact.name,
            contact_phone: truncate_chars(contact.phone, MAX_CONTACT_PHONE_CHARS),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) -> DraftChange {
        match edit {
            DraftEdit::ScheduledDate(date) => replace(&mut self.scheduled_date, date),
            DraftEdit::PickupWindow(window) => replace(&mut self.pickup_window, window),
            DraftEdit::SpecialInstructions(text) => replace(
                &mut self.special_instructions,
                truncate_chars(text, MAX_SPECIAL_INSTRUCTIONS_CHARS),
            ),
            DraftEdit::ContactName(name) => replace(&mut self.contact_name, name),
            DraftEdit::ContactPhone(phone) => replace(
                &mut self.contact_phone,
                truncate_chars(phone, MAX_CONTACT_PHONE_CHARS),
            ),
            DraftEdit::AddressType(kind) => replace(&mut self.address.address_type, kind),
            DraftEdit::Address(field, value) => {
                if self.address.set_field(field, value) {
                    DraftChange::Address(field)
                } else {
                    DraftChange::Unchanged
                }
            }
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> DraftChange {
    if *slot == value {
        return DraftChange::Unchanged;
    }
    *slot = value;
    DraftChange::Changed
}

fn truncate_chars(value: String, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => value[..cut].to_owned(),
        None => value,
    }
}
