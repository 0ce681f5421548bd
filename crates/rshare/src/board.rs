//! The shared ride board.
//!
//! Every operation is a read-modify-write of a whole list: read the list from
//! storage, change it in memory, write it back. Nothing here coordinates with
//! other processes; the last write wins.

use tracing::{debug, info};

use crate::config::FareConfig;
use crate::error::{Error, Result};
use crate::fare::estimate_fare;
use crate::ride::{self, DriverPost, DriverProfile, HistoryEntry, RideStatus, RiderRequest};
use crate::storage::{keys, Storage};

/// Fields a rider fills in to request a ride.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiderForm {
    /// Pickup location.
    pub from: String,
    /// Drop-off location.
    pub to: String,
    /// Rider name.
    pub name: String,
    /// Phone number or email.
    pub contact: String,
    /// Identity document reference.
    pub id_document: String,
}

/// Fields a driver fills in to sign up.
///
/// A field left as `None` keeps the value of the existing profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    /// Full name.
    pub name: Option<String>,
    /// Phone number or email.
    pub contact: Option<String>,
    /// Driving licence number.
    pub licence: Option<String>,
}

/// Trim `value` and reject it if nothing is left.
fn required(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::missing_field(field));
    }
    Ok(trimmed.to_string())
}

/// Resolve a profile field from the form, falling back to the existing value.
fn profile_field(
    given: Option<&String>,
    existing: Option<&String>,
    field: &'static str,
) -> Result<String> {
    let value = given.or(existing).map_or("", String::as_str);
    required(value, field)
}

/// Rider requests, driver posts, completed rides and the driver profile.
#[derive(Debug)]
pub struct Board {
    storage: Storage,
    fares: FareConfig,
}

impl Board {
    /// Create a board over `storage` using the given fare rates.
    #[must_use]
    pub fn new(storage: Storage, fares: FareConfig) -> Self {
        Self { storage, fares }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// All active rider requests, newest first.
    #[must_use]
    pub fn rider_requests(&self) -> Vec<RiderRequest> {
        self.storage.get_list(keys::RIDER_REQUESTS)
    }

    /// All driver posts, newest first.
    #[must_use]
    pub fn driver_posts(&self) -> Vec<DriverPost> {
        self.storage.get_list(keys::DRIVER_POSTS)
    }

    /// Completed rides, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.storage.get_list(keys::HISTORY)
    }

    /// The local driver profile, if signed up.
    #[must_use]
    pub fn profile(&self) -> Option<DriverProfile> {
        self.storage.get_one(keys::PROFILE)
    }

    /// Put `request` at the front of the rider request list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn add_rider_request(&self, request: RiderRequest) -> Result<()> {
        let mut requests = self.rider_requests();
        debug!("Adding rider request {}", request.id);
        requests.insert(0, request);
        self.storage.set_list(keys::RIDER_REQUESTS, &requests)
    }

    /// Remove every rider request with the given id.
    ///
    /// Returns `true` if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn remove_rider_request(&self, id: &str) -> Result<bool> {
        let mut requests = self.rider_requests();
        let before = requests.len();
        requests.retain(|r| r.id != id);
        self.storage.set_list(keys::RIDER_REQUESTS, &requests)?;

        let removed = requests.len() != before;
        if removed {
            info!("Closed rider request {}", id);
        }
        Ok(removed)
    }

    /// Put `post` at the front of the driver post list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn add_driver_post(&self, post: DriverPost) -> Result<()> {
        let mut posts = self.driver_posts();
        debug!("Adding driver post {}", post.id);
        posts.insert(0, post);
        self.storage.set_list(keys::DRIVER_POSTS, &posts)
    }

    /// Remove every driver post with the given id.
    ///
    /// Returns `true` if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn remove_driver_post(&self, id: &str) -> Result<bool> {
        let mut posts = self.driver_posts();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        self.storage.set_list(keys::DRIVER_POSTS, &posts)?;

        let removed = posts.len() != before;
        if removed {
            info!("Removed driver post {}", id);
        }
        Ok(removed)
    }

    /// Put `entry` at the front of the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn move_to_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut history = self.history();
        history.insert(0, entry);
        self.storage.set_list(keys::HISTORY, &history)
    }

    /// Validate a rider form and post the request with an estimated fare.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for the first blank field, or a storage error.
    pub fn submit_request(&self, form: &RiderForm) -> Result<RiderRequest> {
        let from = required(&form.from, "from")?;
        let to = required(&form.to, "to")?;
        let name = required(&form.name, "name")?;
        let contact = required(&form.contact, "contact")?;
        let id_document = required(&form.id_document, "id document")?;

        let fare = estimate_fare(&from, &to, &self.fares);
        let request = RiderRequest::new(from, to, name, contact, id_document, fare);
        self.add_rider_request(request.clone())?;

        info!(
            "Rider request {} posted: {} -> {} (fare {})",
            request.id, request.from, request.to, request.fare
        );
        Ok(request)
    }

    /// Add a ready-made demo request.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn quick_sample(&self) -> Result<RiderRequest> {
        let request = RiderRequest::new(
            "Central Square",
            "City Mall",
            "Demo Rider",
            "99990011",
            "PAN-XYZ",
            45,
        );
        self.add_rider_request(request.clone())?;
        Ok(request)
    }

    /// Look up an active rider request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no request has this id.
    pub fn find_rider_request(&self, id: &str) -> Result<RiderRequest> {
        self.rider_requests()
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found("rider request", id))
    }

    /// Look up a driver post.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no post has this id.
    pub fn find_driver_post(&self, id: &str) -> Result<DriverPost> {
        self.driver_posts()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("driver post", id))
    }

    /// Create or update the driver profile.
    ///
    /// An existing profile keeps its id. Fields missing from the form keep
    /// their previous values; a field that ends up blank aborts the sign-up.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank field, or a storage error.
    pub fn sign_up(&self, form: &ProfileForm) -> Result<DriverProfile> {
        let existing = self.profile();
        let name = profile_field(
            form.name.as_ref(),
            existing.as_ref().map(|p| &p.name),
            "name",
        )?;
        let contact = profile_field(
            form.contact.as_ref(),
            existing.as_ref().map(|p| &p.contact),
            "contact",
        )?;
        let licence = profile_field(
            form.licence.as_ref(),
            existing.as_ref().map(|p| &p.licence),
            "licence",
        )?;

        let profile = match existing {
            Some(mut profile) => {
                profile.name = name;
                profile.contact = contact;
                profile.licence = licence;
                profile
            }
            None => DriverProfile::new(name, contact, licence),
        };

        self.storage.set_one(keys::PROFILE, &profile)?;
        info!("Driver profile {} saved", profile.id);
        Ok(profile)
    }

    /// Forget the driver profile.
    ///
    /// Returns `true` if there was one.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be removed.
    pub fn log_out(&self) -> Result<bool> {
        self.storage.remove(keys::PROFILE)
    }

    fn require_profile(&self) -> Result<DriverProfile> {
        self.profile().ok_or(Error::NotSignedUp)
    }

    /// Publish an empty ride for the signed-up driver.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedUp` without a profile, `MissingField` for a blank
    /// location, or a storage error.
    pub fn publish(&self, from: &str, to: &str) -> Result<DriverPost> {
        let driver = self.require_profile()?;
        let from = required(from, "from")?;
        let to = required(to, "to")?;

        let post = DriverPost::new(&driver, from, to);
        self.add_driver_post(post.clone())?;
        info!("Driver {} published {}", driver.id, post.id);
        Ok(post)
    }

    /// Posts published by the signed-up driver, or `None` without a profile.
    #[must_use]
    pub fn my_posts(&self) -> Option<Vec<DriverPost>> {
        let me = self.profile()?;
        let mut posts = self.driver_posts();
        posts.retain(|p| p.driver_id == me.id);
        Some(posts)
    }

    /// Accept a rider request for the signed-up driver without completing it.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedUp` without a profile, `NotFound` for an unknown id,
    /// or a storage error.
    pub fn accept(&self, id: &str) -> Result<RiderRequest> {
        let driver = self.require_profile()?;
        let mut requests = self.rider_requests();
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found("rider request", id))?;

        request.status = RideStatus::Accepted;
        request.matched_driver_id = Some(driver.id.clone());
        let accepted = request.clone();

        self.storage.set_list(keys::RIDER_REQUESTS, &requests)?;
        info!("Driver {} accepted {}", driver.id, id);
        Ok(accepted)
    }

    /// Complete a pending or accepted rider request.
    ///
    /// The request leaves the active list and one entry is added to the front
    /// of the history.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedUp` without a profile, `NotFound` for an unknown id,
    /// or a storage error.
    pub fn complete(&self, id: &str, rating: Option<&str>) -> Result<HistoryEntry> {
        let driver = self.require_profile()?;
        let mut requests = self.rider_requests();
        let index = requests
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::not_found("rider request", id))?;

        let mut request = requests.remove(index);
        request.status = RideStatus::Completed;
        if request.matched_driver_id.is_none() {
            request.matched_driver_id = Some(driver.id.clone());
        }
        request.completed_at = Some(ride::now());
        request.rating = Some(rating.map(str::trim).unwrap_or_default().to_string());

        let entry = request
            .to_history_entry()
            .ok_or_else(|| Error::internal("completed request without completion time"))?;

        self.move_to_history(entry.clone())?;
        self.storage.set_list(keys::RIDER_REQUESTS, &requests)?;
        info!("Driver {} completed {}", driver.id, id);
        Ok(entry)
    }

    /// Empty the completed-ride history.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn clear_history(&self) -> Result<()> {
        self.storage
            .set_list::<HistoryEntry>(keys::HISTORY, &[])?;
        info!("History cleared");
        Ok(())
    }
}
