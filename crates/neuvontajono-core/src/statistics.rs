//! Data shared between the statistics page builder and its renderer

use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Queue length samples attached to a table cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleSeries {
    /// Encoded `"M|L"` samples
    Samples(Vec<String>),
    /// Placeholder shown when nothing was recorded, usually `"-"`
    Placeholder(String),
}

impl SampleSeries {
    /// Samples available for a graph, `None` for placeholders and empty series
    #[must_use]
    pub fn samples(&self) -> Option<&[String]> {
        match self {
            Self::Samples(samples) if !samples.is_empty() => Some(samples),
            _ => None,
        }
    }
}

/// One cell of the statistics table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatCell {
    /// Week number or session name heading
    Label(String),
    /// Values per dataset plus the queue samples of that occurrence
    Data {
        /// One value per dataset, in dataset order
        values: Vec<String>,
        /// Queue length samples
        samples: SampleSeries,
    },
}

impl StatCell {
    /// Text to show for the given dataset
    #[must_use]
    pub fn display(&self, dataset: usize) -> &str {
        match self {
            Self::Label(text) => text,
            Self::Data { values, .. } => values.get(dataset).map_or("", String::as_str),
        }
    }

    /// Samples of a data cell
    #[must_use]
    pub fn samples(&self) -> Option<&[String]> {
        match self {
            Self::Label(_) => None,
            Self::Data { samples, .. } => samples.samples(),
        }
    }
}

/// A row in the most active participants table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentParticipant {
    /// Rank, ties share a rank
    pub position: usize,
    /// Participant's full name
    pub name: String,
    /// Number of visits
    pub visits: i64,
}

/// Option of the session selector in the participant search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOption {
    /// Session id
    pub id: SessionId,
    /// Session name
    pub name: String,
}

/// Everything the statistics page needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsViewModel {
    /// Message ids of the selectable datasets
    pub dataset_names: Vec<String>,
    /// Table cells, row 0 holds week headings and column 0 session names
    pub stats: Vec<Vec<StatCell>>,
    /// Colour token per cell, `None` for no colour
    pub colors: Vec<Vec<Option<String>>>,
    /// Most active participants, omitted when not shown
    pub most_frequent: Option<Vec<FrequentParticipant>>,
    /// Sessions for the participant search
    pub session_names: Vec<SessionOption>,
    /// CSRF token echoed back by the search form
    pub csrf: String,
    /// Interface language
    #[serde(rename = "UILanguage")]
    pub ui_language: String,
    /// Participant count at which cells turn red
    pub red_limit: i64,
    /// Participant count at which cells turn yellow
    pub yellow_limit: i64,
    /// Viewer is course staff
    pub teacher: bool,
    /// Hovering a cell shows the queue length graph
    pub show_graph: bool,
    /// Participant search is available
    pub show_participants: bool,
    /// Moment-style date pattern of the search form
    pub date_format: String,
}

/// First and last name of a search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    /// Given name
    pub first: String,
    /// Family name
    pub last: String,
}

/// A participant found by the participant search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParticipant {
    /// Participant's name
    pub name: PersonName,
    /// Distinct locations the participant used, may contain the remote sentinel
    pub locations: Vec<String>,
}

/// Body returned by the participant search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching participants
    pub participants: Vec<SearchParticipant>,
}
