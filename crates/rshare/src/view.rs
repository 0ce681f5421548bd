//! Rider and driver views of the board.
//!
//! A view is a snapshot of everything one page shows. It is rebuilt from
//! storage in full every time it is rendered.

use std::fmt;
use std::io;

use serde::Serialize;
use tracing::{debug, warn};

use crate::board::Board;
use crate::error::Result;
use crate::export::local_timestamp;
use crate::ride::{DriverPost, HistoryEntry, RiderRequest};
use crate::sync::ChangeHandler;

/// Hide all but the last four characters of a contact.
#[must_use]
pub fn mask_contact(contact: &str) -> String {
    let count = contact.chars().count();
    if count > 4 {
        let tail: String = contact.chars().skip(count - 4).collect();
        format!("•••{tail}")
    } else {
        contact.to_string()
    }
}

/// Two-letter badge for a rider.
#[must_use]
pub fn initials(name: &str) -> String {
    let name = if name.is_empty() { "R" } else { name };
    name.chars().take(2).collect::<String>().to_uppercase()
}

fn fare_label(fare: u32, currency: &str) -> String {
    if fare == 0 {
        "—".to_string()
    } else {
        format!("{currency}{fare}")
    }
}

fn rating_label(rating: &str) -> &str {
    if rating.is_empty() {
        "—"
    } else {
        rating
    }
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    line(out, title);
    line(out, &"-".repeat(title.chars().count()));
}

fn empty_line(out: &mut String, message: &str) {
    line(out, &format!("  {message}"));
}

fn history_section(out: &mut String, history: &[HistoryEntry]) {
    section(out, "Completed rides");
    if history.is_empty() {
        empty_line(out, "No completed rides");
    }
    for entry in history {
        let text = format!(
            "  {} → {}  {}  Rating: {}",
            entry.from,
            entry.to,
            local_timestamp(entry.completed_at),
            rating_label(&entry.rating)
        );
        line(out, &text);
    }
}

fn request_line(out: &mut String, request: &RiderRequest, currency: &str, with_badge: bool) {
    let badge = if with_badge {
        format!("[{}] ", initials(&request.name))
    } else {
        String::new()
    };
    let text = format!(
        "  {badge}{} → {}  {}  {} • {}  {}  ({})",
        request.from,
        request.to,
        fare_label(request.fare, currency),
        request.name,
        mask_contact(&request.contact),
        request.status,
        request.id
    );
    line(out, &text);
}

/// Everything the rider page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderView {
    /// Active rider requests.
    pub requests: Vec<RiderRequest>,
    /// Empty rides offered by drivers.
    pub driver_posts: Vec<DriverPost>,
    /// Completed rides.
    pub history: Vec<HistoryEntry>,
}

impl RiderView {
    /// Read the current state of the board.
    #[must_use]
    pub fn load(board: &Board) -> Self {
        Self {
            requests: board.rider_requests(),
            driver_posts: board.driver_posts(),
            history: board.history(),
        }
    }

    /// Render as plain text.
    #[must_use]
    pub fn render(&self, currency: &str) -> String {
        let mut out = String::new();

        section(&mut out, "Rider requests");
        if self.requests.is_empty() {
            empty_line(&mut out, "No active rider requests");
        }
        for request in &self.requests {
            request_line(&mut out, request, currency, true);
        }

        section(&mut out, "Available rides");
        if self.driver_posts.is_empty() {
            empty_line(&mut out, "No empty rides posted");
        }
        for post in &self.driver_posts {
            let text = format!(
                "  {} → {}  Driver: {}  ({})",
                post.from, post.to, post.driver_name, post.id
            );
            line(&mut out, &text);
        }

        history_section(&mut out, &self.history);
        out
    }
}

/// Everything the driver page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverView {
    /// Active rider requests.
    pub requests: Vec<RiderRequest>,
    /// Posts of the signed-up driver, `None` when nobody is signed up.
    pub published: Option<Vec<DriverPost>>,
    /// Completed rides.
    pub history: Vec<HistoryEntry>,
}

impl DriverView {
    /// Read the current state of the board.
    #[must_use]
    pub fn load(board: &Board) -> Self {
        Self {
            requests: board.rider_requests(),
            published: board.my_posts(),
            history: board.history(),
        }
    }

    /// Render as plain text.
    #[must_use]
    pub fn render(&self, currency: &str) -> String {
        let mut out = String::new();

        section(&mut out, "Rider requests");
        if self.requests.is_empty() {
            empty_line(&mut out, "No rider requests");
        }
        for request in &self.requests {
            request_line(&mut out, request, currency, false);
        }

        section(&mut out, "Published rides");
        match &self.published {
            None => empty_line(&mut out, "Sign up to publish"),
            Some(posts) if posts.is_empty() => empty_line(&mut out, "No published rides"),
            Some(posts) => {
                for post in posts {
                    let text = format!("  {} → {}  Published  ({})", post.from, post.to, post.id);
                    line(&mut out, &text);
                }
            }
        }

        history_section(&mut out, &self.history);
        out
    }
}

/// Render the completed-ride history on its own.
#[must_use]
pub fn render_history(history: &[HistoryEntry]) -> String {
    let mut out = String::new();
    history_section(&mut out, history);
    out
}

/// Full details of a rider request.
#[must_use]
pub fn review_request(request: &RiderRequest, currency: &str) -> String {
    format!(
        "Rider: {}\nContact: {}\nID: {}\nRoute: {} → {}\nFare: {}",
        request.name,
        request.contact,
        request.id_document,
        request.from,
        request.to,
        fare_label(request.fare, currency)
    )
}

/// Full details of a driver post.
#[must_use]
pub fn review_post(post: &DriverPost) -> String {
    let vehicle = if post.driver_vehicle.is_empty() {
        "-"
    } else {
        &post.driver_vehicle
    };
    format!(
        "Driver: {}\nVehicle: {}\nRoute: {} → {}",
        post.driver_name, vehicle, post.from, post.to
    )
}

/// Which page to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Requests, driver posts and history.
    Rider,
    /// Requests, the driver's own posts and history.
    Driver,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rider => write!(f, "rider"),
            Self::Driver => write!(f, "driver"),
        }
    }
}

/// Load and render one page, as plain text or pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_page(board: &Board, kind: PageKind, currency: &str, json: bool) -> Result<String> {
    let text = match (kind, json) {
        (PageKind::Rider, false) => RiderView::load(board).render(currency),
        (PageKind::Driver, false) => DriverView::load(board).render(currency),
        (PageKind::Rider, true) => serde_json::to_string_pretty(&RiderView::load(board))?,
        (PageKind::Driver, true) => serde_json::to_string_pretty(&DriverView::load(board))?,
    };
    Ok(text)
}

/// A page that re-renders into `out` whenever the shared lists change.
#[derive(Debug)]
pub struct LivePage<'a, W: io::Write> {
    board: &'a Board,
    kind: PageKind,
    currency: &'a str,
    json: bool,
    out: W,
}

impl<'a, W: io::Write> LivePage<'a, W> {
    /// Create a live page writing to `out`.
    pub fn new(board: &'a Board, kind: PageKind, currency: &'a str, json: bool, out: W) -> Self {
        Self {
            board,
            kind,
            currency,
            json,
            out,
        }
    }

    /// Render the page once.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn refresh(&mut self) -> Result<()> {
        let text = render_page(self.board, self.kind, self.currency, self.json)?;
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Consume the page and return its writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> ChangeHandler for LivePage<'_, W> {
    fn on_shared_data_change(&mut self, key: &str) {
        debug!("Re-rendering {} page after change to {}", self.kind, key);
        if let Err(e) = self.refresh() {
            warn!("Failed to render {} page: {}", self.kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ProfileForm;
    use crate::config::FareConfig;
    use crate::ride::DriverProfile;
    use crate::storage::Storage;

    fn create_test_board() -> Board {
        Board::new(Storage::open_in_memory().unwrap(), FareConfig::default())
    }

    #[test]
    fn test_mask_contact() {
        assert_eq!(mask_contact(""), "");
        assert_eq!(mask_contact("1234"), "1234");
        assert_eq!(mask_contact("99990011"), "•••0011");
        assert_eq!(mask_contact("ann@example.com"), "•••.com");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("demo rider"), "DE");
        assert_eq!(initials("a"), "A");
        assert_eq!(initials(""), "R");
    }

    #[test]
    fn test_rider_view_empty_states() {
        let board = create_test_board();
        let text = RiderView::load(&board).render("₹");

        assert!(text.contains("No active rider requests"));
        assert!(text.contains("No empty rides posted"));
        assert!(text.contains("No completed rides"));
    }

    #[test]
    fn test_render_history_layout() {
        assert_eq!(
            render_history(&[]),
            "Completed rides\n---------------\n  No completed rides\n"
        );
    }

    #[test]
    fn test_rider_view_lists_everything() {
        let board = create_test_board();
        let request = board.quick_sample().unwrap();
        let driver = DriverProfile::new("Dee", "555-0199", "KA-01");
        board
            .add_driver_post(DriverPost::new(&driver, "Airport", "Station"))
            .unwrap();

        let view = RiderView::load(&board);
        assert_eq!(view.requests.len(), 1);
        assert_eq!(view.driver_posts.len(), 1);

        let text = view.render("₹");
        assert!(text.contains("[DE] Central Square → City Mall  ₹45  Demo Rider • •••0011"));
        assert!(text.contains(&request.id));
        assert!(text.contains("Airport → Station  Driver: Dee"));
    }

    #[test]
    fn test_driver_view_requires_sign_up_to_publish() {
        let board = create_test_board();
        let text = DriverView::load(&board).render("₹");

        assert!(text.contains("No rider requests"));
        assert!(text.contains("Sign up to publish"));
    }

    #[test]
    fn test_driver_view_after_sign_up() {
        let board = create_test_board();
        board
            .sign_up(&ProfileForm {
                name: Some("Dee".to_string()),
                contact: Some("555".to_string()),
                licence: Some("KA-01".to_string()),
            })
            .unwrap();

        let text = DriverView::load(&board).render("₹");
        assert!(text.contains("No published rides"));

        let post = board.publish("Airport", "Station").unwrap();
        let text = DriverView::load(&board).render("₹");
        assert!(text.contains(&format!("Airport → Station  Published  ({})", post.id)));
    }

    #[test]
    fn test_history_rating_placeholder() {
        let board = create_test_board();
        board
            .sign_up(&ProfileForm {
                name: Some("Dee".to_string()),
                contact: Some("555".to_string()),
                licence: Some("KA-01".to_string()),
            })
            .unwrap();
        let request = board.quick_sample().unwrap();
        board.complete(&request.id, None).unwrap();

        let text = RiderView::load(&board).render("₹");
        assert!(text.contains("Rating: —"));
    }

    #[test]
    fn test_review_request() {
        let board = create_test_board();
        let request = board.quick_sample().unwrap();

        assert_eq!(
            review_request(&request, "₹"),
            "Rider: Demo Rider\nContact: 99990011\nID: PAN-XYZ\nRoute: Central Square → City Mall\nFare: ₹45"
        );
    }

    #[test]
    fn test_review_post_without_vehicle() {
        let driver = DriverProfile::new("Dee", "555", "");
        let post = DriverPost::new(&driver, "Airport", "Station");
        assert_eq!(
            review_post(&post),
            "Driver: Dee\nVehicle: -\nRoute: Airport → Station"
        );
    }

    #[test]
    fn test_render_page_json() {
        let board = create_test_board();
        board.quick_sample().unwrap();

        let json = render_page(&board, PageKind::Rider, "₹", true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["requests"][0]["name"], "Demo Rider");
        assert_eq!(value["driverPosts"], serde_json::json!([]));
    }

    #[test]
    fn test_live_page_rerenders_on_change() {
        let board = create_test_board();
        let mut page = LivePage::new(&board, PageKind::Driver, "₹", false, Vec::new());

        page.on_shared_data_change(crate::storage::keys::RIDER_REQUESTS);
        board.quick_sample().unwrap();
        page.on_shared_data_change(crate::storage::keys::RIDER_REQUESTS);

        let written = String::from_utf8(page.into_inner()).unwrap();
        assert_eq!(written.matches("Rider requests").count(), 2);
        assert!(written.contains("No rider requests"));
        assert!(written.contains("Central Square → City Mall"));
    }

    #[test]
    fn test_page_kind_display() {
        assert_eq!(PageKind::Rider.to_string(), "rider");
        assert_eq!(PageKind::Driver.to_string(), "driver");
    }

    #[test]
    fn test_driver_view_json_shape() {
        let board = create_test_board();
        board.quick_sample().unwrap();

        let value = serde_json::to_value(DriverView::load(&board)).unwrap();
        assert_eq!(value["requests"][0]["idinfo"], "PAN-XYZ");
        assert!(value["published"].is_null());
        assert_eq!(value["history"], serde_json::json!([]));
    }
}
