//! Message lookup and date formatting used by the view

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::NaiveDate;

/// Source of localized interface strings
pub trait Messages: Send + Sync + fmt::Debug {
    /// Text for a message id, falling back to the id itself
    fn message(&self, id: &str) -> String;

    /// Text for a message id with `{name}` placeholders filled in
    fn format(&self, id: &str, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(self.message(id), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

/// Formats dates for display and for the search form
pub type DateFormatter = Arc<dyn Fn(NaiveDate) -> String + Send + Sync>;

/// Date formatter using a moment-style pattern such as `D.M.YYYY`
#[must_use]
pub fn pattern_formatter(pattern: &str) -> DateFormatter {
    let pattern = pattern.to_string();
    Arc::new(move |date| neuvontajono_core::utils::format_localized_date(date, &pattern))
}

const ENGLISH: &[(&str, &str)] = &[
    ("statistics-participants", "Participants"),
    ("statistics-participants-lead", "Number of distinct participants in each session."),
    ("statistics-queue-length", "Maximum queue length"),
    ("statistics-queue-length-lead", "Longest queue seen during each session."),
    ("statistics-queue-graph", "Queue length"),
    ("statistics-queue-graph-lead", "Move the mouse over a number to see the queue length during the session."),
    ("statistics-week", "Week {week}"),
    ("statistics-most-active-title", "Most active participants"),
    ("statistics-most-active-info", "This information is only visible to course staff."),
    ("statistics-most-active-main", "Participants who have attended the most sessions."),
    ("statistics-th-active-position", "Position"),
    ("statistics-th-active-name", "Name"),
    ("statistics-th-active-visits", "Visits"),
    ("statistics-session-participants-title", "Session participants"),
    ("statistics-session-participants-main", "Search for the participants of a single session."),
    ("statistics-session-date", "Date"),
    ("statistics-no-search-results", "No participants found."),
    ("queue-group", "Session"),
    ("queue-remote", "Remote"),
    ("manage-th-location", "Location"),
    ("modify-date-help", "Date of the session"),
    ("ordinal-value", "{position}."),
    ("date-input-format", "D.M.YYYY"),
    ("search", "Search"),
];

const FINNISH: &[(&str, &str)] = &[
    ("statistics-participants", "Osallistujat"),
    ("statistics-participants-lead", "Eri osallistujien määrä kussakin ryhmässä."),
    ("statistics-queue-length", "Jonon enimmäispituus"),
    ("statistics-queue-length-lead", "Pisin jono kunkin ryhmän aikana."),
    ("statistics-queue-graph", "Jonon pituus"),
    ("statistics-queue-graph-lead", "Vie hiiri luvun päälle nähdäksesi jonon pituuden ryhmän aikana."),
    ("statistics-week", "Viikko {week}"),
    ("statistics-most-active-title", "Aktiivisimmat osallistujat"),
    ("statistics-most-active-info", "Tämä tieto näkyy vain kurssin henkilökunnalle."),
    ("statistics-most-active-main", "Osallistujat, jotka ovat käyneet useimmissa ryhmissä."),
    ("statistics-th-active-position", "Sija"),
    ("statistics-th-active-name", "Nimi"),
    ("statistics-th-active-visits", "Käyntejä"),
    ("statistics-session-participants-title", "Ryhmän osallistujat"),
    ("statistics-session-participants-main", "Hae yksittäisen ryhmän osallistujat."),
    ("statistics-session-date", "Päivämäärä"),
    ("statistics-no-search-results", "Osallistujia ei löytynyt."),
    ("queue-group", "Ryhmä"),
    ("queue-remote", "Etä"),
    ("manage-th-location", "Sijainti"),
    ("modify-date-help", "Ryhmän päivämäärä"),
    ("ordinal-value", "{position}."),
    ("date-input-format", "D.M.YYYY"),
    ("search", "Hae"),
];

/// Built-in message catalog
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    /// Catalog for a UI language; unknown languages get English
    #[must_use]
    pub fn for_language(language: &str) -> Self {
        let table = if language.eq_ignore_ascii_case("fi") {
            FINNISH
        } else {
            ENGLISH
        };

        Self {
            messages: table
                .iter()
                .map(|(id, text)| ((*id).to_string(), (*text).to_string()))
                .collect(),
        }
    }

    /// Override or add a message
    #[must_use]
    pub fn with_message(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(id.into(), text.into());
        self
    }
}

impl Messages for MessageCatalog {
    fn message(&self, id: &str) -> String {
        self.messages
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}
