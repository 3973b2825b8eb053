// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use pickup_app::{
    AddressType, ContactRecord, PICKUP_SCHEDULED_STATUS, PickupAddress, PickupDetails,
    PickupServices, PickupWindow, Quote, ScheduleRequest, ScheduleResponse, ServiceFailure,
    VerificationResponse, ZipLookup, allowed_date_range, format_wire_date,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration as StdDuration;
use time::{Date, Duration, Month};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

// Paired by index so generated addresses stay plausible.
const CITIES: [(&str, &str, &str); 10] = [
    ("Portland", "OR", "97205"),
    ("Seattle", "WA", "98101"),
    ("Austin", "TX", "78701"),
    ("Denver", "CO", "80202"),
    ("Madison", "WI", "53703"),
    ("Raleigh", "NC", "27601"),
    ("Boise", "ID", "83702"),
    ("Phoenix", "AZ", "85004"),
    ("Nashville", "TN", "37203"),
    ("Omaha", "NE", "68102"),
];
const STREET_NAMES: [&str; 12] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
    "Valley", "Meadow",
];
const STREET_SUFFIXES: [&str; 4] = ["St", "Ave", "Blvd", "Ln"];
const INSTRUCTION_WORDS: [&str; 16] = [
    "gate", "code", "side", "door", "ring", "bell", "garage", "porch", "leave", "box", "call",
    "arrival", "dog", "in", "yard", "upstairs",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for quotes, contacts and pickup addresses.
pub struct PickupFaker {
    rng: DeterministicRng,
}

impl PickupFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn contact(&mut self) -> ContactRecord {
        ContactRecord {
            name: Some(format!(
                "{} {}",
                self.pick(&FIRST_NAMES),
                self.pick(&LAST_NAMES)
            )),
            phone: Some(self.phone()),
            extra: Map::new(),
        }
    }

    pub fn phone(&mut self) -> String {
        format!(
            "{}-555-{:04}",
            self.int_range(201, 989),
            self.int_range(100, 9999)
        )
    }

    pub fn address(&mut self) -> PickupAddress {
        let (city, state, zip) = CITIES[self.rng.int_n(CITIES.len())];
        PickupAddress {
            street: format!(
                "{} {} {}",
                self.int_range(100, 9999),
                self.pick(&STREET_NAMES),
                self.pick(&STREET_SUFFIXES)
            ),
            city: city.to_owned(),
            state: state.to_owned(),
            zip_code: zip.to_owned(),
            address_type: if self.rng.bool() {
                AddressType::Residence
            } else {
                AddressType::Business
            },
        }
    }

    /// An accepted quote awaiting its first pickup.
    pub fn quote(&mut self) -> Quote {
        let mut seller_info = None;
        if self.rng.bool() {
            seller_info = Some(self.contact());
        }
        let mut extra = Map::new();
        extra.insert(
            "totalCents".to_owned(),
            Value::from(self.int_range(10_000, 2_000_000)),
        );
        Quote {
            access_token: format!("q_{:016x}", self.rng.next_u64()),
            status: "accepted".to_owned(),
            customer: Some(self.contact()),
            seller_info,
            pickup_details: None,
            extra,
        }
    }

    /// A quote that already has a pickup on the books.
    pub fn scheduled_quote(&mut self, today: Date) -> Quote {
        let date = self.pickup_date(today);
        Quote {
            status: PICKUP_SCHEDULED_STATUS.to_owned(),
            pickup_details: Some(PickupDetails {
                scheduled_date: Some(Value::from(format_wire_date(date))),
                extra: Map::new(),
            }),
            ..self.quote()
        }
    }

    /// A date inside the bookable range for `today`.
    pub fn pickup_date(&mut self, today: Date) -> Date {
        let range = allowed_date_range(today);
        let span = (range.latest - range.earliest).whole_days();
        range.earliest + Duration::days(self.int_range(0, span))
    }

    pub fn window(&mut self) -> PickupWindow {
        PickupWindow::ALL[self.rng.int_n(PickupWindow::ALL.len())]
    }

    pub fn instructions(&mut self) -> String {
        let count = self.int_range(3, 10) as usize;
        let words: Vec<&str> = (0..count)
            .map(|_| self.pick(&INSTRUCTION_WORDS))
            .collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

/// One call observed by [`ScriptedServices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    ZipLookup(String),
    VerifyAddress(String),
    SchedulePickup(ScheduleRequest),
}

struct Script {
    zips: BTreeMap<String, ZipLookup>,
    verify: Result<VerificationResponse, ServiceFailure>,
    schedule: Result<ScheduleResponse, ServiceFailure>,
    calls: Vec<RecordedCall>,
}

/// In-memory backend with canned answers. Unknown ZIP codes answer 404,
/// addresses verify, and schedule requests succeed unless scripted
/// otherwise.
pub struct ScriptedServices {
    script: Mutex<Script>,
    latency: StdDuration,
}

impl Default for ScriptedServices {
    fn default() -> Self {
        Self {
            script: Mutex::new(Script {
                zips: BTreeMap::new(),
                verify: Ok(VerificationResponse {
                    verified: true,
                    normalized_address: None,
                    error: None,
                }),
                schedule: Ok(ScheduleResponse {
                    success: true,
                    ..ScheduleResponse::default()
                }),
                calls: Vec::new(),
            }),
            latency: StdDuration::ZERO,
        }
    }
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zip(self, zip: &str, city: &str, state: &str) -> Self {
        self.lock().zips.insert(
            zip.to_owned(),
            ZipLookup {
                city: Some(city.to_owned()),
                state: Some(state.to_owned()),
            },
        );
        self
    }

    pub fn verify_with(self, result: Result<VerificationResponse, ServiceFailure>) -> Self {
        self.lock().verify = result;
        self
    }

    pub fn schedule_with(self, result: Result<ScheduleResponse, ServiceFailure>) -> Self {
        self.lock().schedule = result;
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn record(&self, call: RecordedCall) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        self.lock().calls.push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PickupServices for ScriptedServices {
    fn lookup_zip(&self, zip: &str) -> Result<ZipLookup, ServiceFailure> {
        self.record(RecordedCall::ZipLookup(zip.to_owned()));
        self.lock()
            .zips
            .get(zip)
            .cloned()
            .ok_or_else(|| ServiceFailure::Rejected {
                status: 404,
                message: Some("ZIP code not found".to_owned()),
            })
    }

    fn verify_address(&self, address: &str) -> Result<VerificationResponse, ServiceFailure> {
        self.record(RecordedCall::VerifyAddress(address.to_owned()));
        self.lock().verify.clone()
    }

    fn schedule_pickup(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ScheduleResponse, ServiceFailure> {
        self.record(RecordedCall::SchedulePickup(request.clone()));
        self.lock().schedule.clone()
    }
}

pub fn fixture_today() -> Date {
    Date::from_calendar_date(2026, Month::February, 19).expect("valid fixture date")
}

/// Writes `quote` as JSON into a fresh temp dir.
pub fn temp_quote_file(quote: &Quote) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("quote.json");
    let body = serde_json::to_string_pretty(quote).context("encode quote")?;
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
