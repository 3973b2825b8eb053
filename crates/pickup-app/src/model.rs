// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::macros::format_description;
use time::{Date, Duration};

pub const PICKUP_SCHEDULED_STATUS: &str = "pickup_scheduled";
pub const ZIP_CODE_LEN: usize = 5;
pub const MIN_CONTACT_NAME_CHARS: usize = 2;
pub const MIN_CONTACT_PHONE_CHARS: usize = 8;
pub const MAX_CONTACT_PHONE_CHARS: usize = 20;
pub const MAX_SPECIAL_INSTRUCTIONS_CHARS: usize = 500;
pub const BOOKING_HORIZON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupWindow {
    Morning,
    Afternoon,
    Evening,
}

impl PickupWindow {
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning (8:00 AM - 12:00 PM)",
            Self::Afternoon => "Afternoon (12:00 PM - 4:00 PM)",
            Self::Evening => "Evening (4:00 PM - 9:00 PM)",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    #[default]
    Residence,
    Business,
}

impl AddressType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Residence => "residence",
            Self::Business => "business",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "residence" => Some(Self::Residence),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    City,
    State,
    ZipCode,
}

impl AddressField {
    pub const ALL: [Self; 4] = [Self::Street, Self::City, Self::State, Self::ZipCode];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zipCode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickupAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub address_type: AddressType,
}

impl PickupAddress {
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::ZipCode => &self.zip_code,
        }
    }

    /// Returns whether the stored value actually changed.
    pub fn set_field(&mut self, field: AddressField, value: String) -> bool {
        let slot = match field {
            AddressField::Street => &mut self.street,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::ZipCode => &mut self.zip_code,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn is_complete(&self) -> bool {
        AddressField::ALL
            .into_iter()
            .all(|field| !self.field(field).is_empty())
    }

    pub fn formatted(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zip_code
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupDetails {
    /// Whatever the backend stored; only its truthiness is read here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only snapshot of the quote a pickup is scheduled against. Fields
/// this workflow does not read are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub access_token: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<ContactRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_info: Option<ContactRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_details: Option<PickupDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Quote {
    pub fn has_existing_schedule(&self) -> bool {
        self.pickup_details
            .as_ref()
            .and_then(|details| details.scheduled_date.as_ref())
            .is_some_and(is_truthy)
    }

    pub fn is_pickup_scheduled(&self) -> bool {
        self.status == PICKUP_SCHEDULED_STATUS
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The updated quote is handed back to the caller as-is. An object the typed
/// view cannot read is kept whole in `extra`.
fn passthrough_quote<'de, D>(deserializer: D) -> Result<Option<Quote>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(fields)) => Some(
            serde_json::from_value(Value::Object(fields.clone())).unwrap_or(Quote {
                extra: fields,
                ..Quote::default()
            }),
        ),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactDefaults {
    pub name: String,
    pub phone: String,
}

/// Seeds the contact fields: customer first, then seller, then empty.
/// Name and phone fall back independently, and an empty string counts as
/// absent.
pub fn resolve_contact_defaults(quote: &Quote) -> ContactDefaults {
    let sources = [quote.customer.as_ref(), quote.seller_info.as_ref()];
    ContactDefaults {
        name: first_present(
            sources
                .into_iter()
                .map(|source| source.and_then(|record| record.name.as_deref())),
        ),
        phone: first_present(
            sources
                .into_iter()
                .map(|source| source.and_then(|record| record.phone.as_deref())),
        ),
    }
}

fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Schedule,
    Reschedule,
}

impl ScheduleMode {
    pub fn for_quote(quote: &Quote) -> Self {
        if quote.has_existing_schedule() && quote.is_pickup_scheduled() {
            Self::Reschedule
        } else {
            Self::Schedule
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Schedule => "Schedule Pickup",
            Self::Reschedule => "Reschedule Pickup",
        }
    }

    pub const fn busy_label(self) -> &'static str {
        match self {
            Self::Schedule => "Scheduling...",
            Self::Reschedule => "Rescheduling...",
        }
    }

    pub const fn outcome(self) -> ScheduleOutcome {
        match self {
            Self::Schedule => ScheduleOutcome::Scheduled,
            Self::Reschedule => ScheduleOutcome::Rescheduled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled,
    Rescheduled,
}

impl ScheduleOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Scheduled => "Pickup scheduled successfully",
            Self::Rescheduled => "Pickup rescheduled successfully",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub earliest: Date,
    pub latest: Date,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.earliest <= date && date <= self.latest
    }
}

/// Dates a picker may offer, computed fresh from `today` each time.
pub fn allowed_date_range(today: Date) -> DateRange {
    DateRange {
        earliest: today.saturating_add(Duration::days(1)),
        latest: latest_bookable_date(today),
    }
}

pub fn latest_bookable_date(today: Date) -> Date {
    today.saturating_add(Duration::days(BOOKING_HORIZON_DAYS))
}

pub fn format_wire_date(date: Date) -> String {
    date.format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_wire_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub access_token: String,
    pub scheduled_date: String,
    pub pickup_window: PickupWindow,
    pub special_instructions: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub pickup_address: String,
    pub address_type: AddressType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAddressRequest {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZipLookup {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl ZipLookup {
    /// City and state, only when both came back non-empty.
    pub fn resolved(&self) -> Option<(&str, &str)> {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) if !city.is_empty() && !state.is_empty() => {
                Some((city, state))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(
        default,
        deserialize_with = "passthrough_quote",
        skip_serializing_if = "Option::is_none"
    )]
    pub quote: Option<Quote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reschedule: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
