use serde::Serialize;

/// Colour of the status dot on an info card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Red,
    Amber,
    Green,
}

/// Quick-facts card shown when an animal is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesInfo {
    pub title: String,
    pub status: String,
    pub blurb: String,
    pub link: String,
}

impl SpeciesInfo {
    pub fn new(title: &str, status: &str, blurb: &str, link: &str) -> Self {
        SpeciesInfo {
            title: title.to_string(),
            status: status.to_string(),
            blurb: blurb.to_string(),
            link: link.to_string(),
        }
    }

    pub fn badge(&self) -> StatusBadge {
        badge_for_status(&self.status)
    }
}

/// Endangered statuses are red, threatened ones amber, anything else green.
pub fn badge_for_status(status: &str) -> StatusBadge {
    let s = status.to_lowercase();
    if s.contains("endangered") {
        StatusBadge::Red
    } else if s.contains("threat") {
        StatusBadge::Amber
    } else {
        StatusBadge::Green
    }
}
