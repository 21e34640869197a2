//! Participant search form and result list

use neuvontajono_core::{
    SessionId,
    statistics::SearchParticipant,
    types::REMOTE_LOCATION,
};
use serde::{Deserialize, Serialize};

/// Form fields posted by the participant search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Always `search`
    pub action: String,
    /// CSRF token of the page
    #[serde(rename = "_csrf")]
    pub csrf: String,
    /// Moment-style pattern the date was typed in
    #[serde(rename = "dateFormat")]
    pub date_format: String,
    /// Session to search
    pub session: SessionId,
    /// Date of the session occurrence
    pub date: String,
}

/// One row of the result table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantRow {
    /// Full name
    pub name: String,
    /// Comma separated locations with the remote sentinel translated
    pub locations: String,
}

/// What the result area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No search has been made yet
    NotSearched,
    /// A search returned nothing
    NoResults,
    /// Rows to list
    Results(Vec<ParticipantRow>),
}

/// Search state of the statistics view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantSearch {
    searched: bool,
    participants: Vec<SearchParticipant>,
}

impl ParticipantSearch {
    /// Replace the results with a search response
    pub fn set_participants(&mut self, participants: Vec<SearchParticipant>) {
        self.searched = true;
        self.participants = participants;
    }

    /// Whether a search has completed
    #[must_use]
    pub const fn searched(&self) -> bool {
        self.searched
    }

    /// Current results
    #[must_use]
    pub fn participants(&self) -> &[SearchParticipant] {
        &self.participants
    }

    /// Result area contents with `remote_label` in place of the remote sentinel
    #[must_use]
    pub fn outcome(&self, remote_label: &str) -> SearchOutcome {
        if !self.searched {
            return SearchOutcome::NotSearched;
        }
        if self.participants.is_empty() {
            return SearchOutcome::NoResults;
        }

        SearchOutcome::Results(
            self.participants
                .iter()
                .map(|participant| ParticipantRow {
                    name: format!("{} {}", participant.name.first, participant.name.last),
                    locations: display_locations(&participant.locations, remote_label),
                })
                .collect(),
        )
    }
}

/// Join locations and replace the remote sentinel with `remote_label`
#[must_use]
pub fn display_locations(locations: &[String], remote_label: &str) -> String {
    locations.join(", ").replace(REMOTE_LOCATION, remote_label)
}
