//! Core record types for rshare.
//!
//! These are the flat records persisted by the storage layer. Field names on
//! the wire are camelCase and timestamps are epoch milliseconds, so the stored
//! JSON stays readable by anything that wrote the same keys before.

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix for rider request ids.
pub const RIDER_REQUEST_PREFIX: &str = "rq";

/// Prefix for driver post ids.
pub const DRIVER_POST_PREFIX: &str = "dp";

/// Prefix for driver profile ids.
pub const DRIVER_PROFILE_PREFIX: &str = "drv";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The current time, truncated to the millisecond precision records are stored with.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generate a new record id of the form `<prefix>_<base36 millis>_<6 random chars>`.
///
/// Ids are only probabilistically unique.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();

    format!("{prefix}_{}_{suffix}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = usize::try_from(value % 36).unwrap_or_default();
        digits.push(BASE36[digit]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Lifecycle state of a rider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RideStatus {
    /// Waiting for a driver.
    #[default]
    Pending,
    /// A driver has accepted but not yet completed the ride.
    Accepted,
    /// The ride is done.
    Completed,
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// A ride-needed posting created by a rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderRequest {
    /// Record id (`rq_...`).
    pub id: String,
    /// Pickup location.
    pub from: String,
    /// Drop-off location.
    pub to: String,
    /// Rider name.
    pub name: String,
    /// Phone number or email.
    pub contact: String,
    /// Identity document reference.
    #[serde(rename = "idinfo")]
    pub id_document: String,
    /// Estimated fare; zero when unknown.
    #[serde(default)]
    pub fare: u32,
    /// Lifecycle state.
    #[serde(default)]
    pub status: RideStatus,
    /// When the request was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
    /// Driver that accepted the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_driver_id: Option<String>,
    /// When the ride was completed.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Rating given on completion.
    #[serde(
        default,
        deserialize_with = "optional_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<String>,
}

impl RiderRequest {
    /// Create a new pending request stamped with the current time.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        name: impl Into<String>,
        contact: impl Into<String>,
        id_document: impl Into<String>,
        fare: u32,
    ) -> Self {
        Self {
            id: new_id(RIDER_REQUEST_PREFIX),
            from: from.into(),
            to: to.into(),
            name: name.into(),
            contact: contact.into(),
            id_document: id_document.into(),
            fare,
            status: RideStatus::Pending,
            created: now(),
            matched_driver_id: None,
            completed_at: None,
            rating: None,
        }
    }

    /// Build the archived history entry for this request.
    ///
    /// Returns `None` until the request has a completion time.
    #[must_use]
    pub fn to_history_entry(&self) -> Option<HistoryEntry> {
        self.completed_at.map(|completed_at| HistoryEntry {
            id: self.id.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            completed_at,
            rating: self.rating.clone().unwrap_or_default(),
        })
    }
}

/// An empty-ride-offered posting created by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPost {
    /// Record id (`dp_...`).
    pub id: String,
    /// Id of the owning driver profile.
    pub driver_id: String,
    /// Driver display name.
    pub driver_name: String,
    /// Vehicle description.
    #[serde(default)]
    pub driver_vehicle: String,
    /// Departure location.
    pub from: String,
    /// Destination.
    pub to: String,
    /// When the post was published.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
}

impl DriverPost {
    /// Create a post owned by `driver`.
    ///
    /// The vehicle field is filled from the driver's licence number.
    #[must_use]
    pub fn new(driver: &DriverProfile, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: new_id(DRIVER_POST_PREFIX),
            driver_id: driver.id.clone(),
            driver_name: driver.name.clone(),
            driver_vehicle: driver.licence.clone(),
            from: from.into(),
            to: to.into(),
            created: now(),
        }
    }
}

/// An archived record of a completed ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Id of the request that was completed.
    pub id: String,
    /// Pickup location.
    pub from: String,
    /// Drop-off location.
    pub to: String,
    /// Completion time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
    /// Free-text rating, possibly empty.
    #[serde(default, deserialize_with = "rating")]
    pub rating: String,
}

/// The single locally stored driver identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// Record id (`drv_...`).
    pub id: String,
    /// Full name.
    pub name: String,
    /// Phone number or email.
    pub contact: String,
    /// Driving licence number.
    pub licence: String,
}

impl DriverProfile {
    /// Create a profile with a fresh id.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        contact: impl Into<String>,
        licence: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(DRIVER_PROFILE_PREFIX),
            name: name.into(),
            contact: contact.into(),
            licence: licence.into(),
        }
    }
}

/// Ratings were historically stored as either strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRating {
    Text(String),
    Number(serde_json::Number),
    Missing(()),
}

impl From<RawRating> for Option<String> {
    fn from(raw: RawRating) -> Self {
        match raw {
            RawRating::Text(text) => Some(text),
            RawRating::Number(number) => Some(number.to_string()),
            RawRating::Missing(()) => None,
        }
    }
}

fn rating<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawRating::deserialize(deserializer)?;
    Ok(Option::<String>::from(raw).unwrap_or_default())
}

fn optional_rating<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    RawRating::deserialize(deserializer).map(Into::into)
}
