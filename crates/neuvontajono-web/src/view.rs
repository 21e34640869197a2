//! Statistics page component

use std::{fmt, sync::Arc};

use askama::Template;
use chrono::NaiveDate;
use neuvontajono_core::{
    SessionId,
    statistics::{SearchParticipant, SessionOption, StatisticsViewModel},
};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{ViewError, ViewResult},
    i18n::{DateFormatter, Messages},
    participants::{ParticipantRow, ParticipantSearch, SearchOutcome, SearchRequest},
    table::{TableCell, build_rows},
    tooltip::{CursorPosition, TooltipState},
};

/// Option of the dataset selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOption {
    /// `"index|name"`
    pub value: String,
    /// Localized dataset name
    pub label: String,
    /// Currently selected
    pub selected: bool,
}

/// Row of the most active participants table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequentRow {
    /// Localized ordinal
    pub position: String,
    /// Participant name
    pub name: String,
    /// Number of visits
    pub visits: i64,
}

/// Interactive statistics page
///
/// Holds the view model received from the server plus the page state: the
/// selected dataset, the hover tooltip and the participant search results.
pub struct StatisticsView {
    model: StatisticsViewModel,
    messages: Arc<dyn Messages>,
    format_date: DateFormatter,
    search_action: String,
    selected: usize,
    tooltip: TooltipState,
    search: ParticipantSearch,
}

impl fmt::Debug for StatisticsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticsView")
            .field("model", &self.model)
            .field("messages", &self.messages)
            .field("search_action", &self.search_action)
            .field("selected", &self.selected)
            .field("tooltip", &self.tooltip)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl StatisticsView {
    /// Create the view with the first dataset selected
    #[must_use]
    pub fn new(
        model: StatisticsViewModel,
        messages: Arc<dyn Messages>,
        format_date: DateFormatter,
    ) -> Self {
        Self {
            model,
            messages,
            format_date,
            search_action: "#".to_string(),
            selected: 0,
            tooltip: TooltipState::Hidden,
            search: ParticipantSearch::default(),
        }
    }

    /// URL the participant search posts to
    #[must_use]
    pub fn with_search_action(mut self, action: impl Into<String>) -> Self {
        self.search_action = action.into();
        self
    }

    /// URL the participant search posts to
    #[must_use]
    pub fn search_action(&self) -> &str {
        &self.search_action
    }

    /// View model being shown
    #[must_use]
    pub const fn model(&self) -> &StatisticsViewModel {
        &self.model
    }

    /// Index of the selected dataset
    #[must_use]
    pub const fn selected_dataset(&self) -> usize {
        self.selected
    }

    /// Handle a change of the dataset selector
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not `"index|name"` with an index inside the datasets.
    pub fn select_dataset(&mut self, value: &str) -> ViewResult<()> {
        let invalid = || ViewError::InvalidDataset {
            value: value.to_string(),
        };
        let index = value
            .split('|')
            .next()
            .and_then(|index| index.trim().parse::<usize>().ok())
            .ok_or_else(invalid)?;

        if index >= self.model.dataset_names.len() {
            return Err(invalid());
        }
        self.selected = index;
        Ok(())
    }

    /// Handle the cursor entering a table cell
    ///
    /// Does nothing when graphs are disabled or the cell is a heading.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no cell at the coordinates.
    pub fn show_tooltip(&mut self, row: usize, col: usize, cursor: CursorPosition) -> ViewResult<()> {
        let cell = self
            .model
            .stats
            .get(row)
            .and_then(|cells| cells.get(col))
            .ok_or(ViewError::NoSuchCell { row, col })?;

        if !self.model.show_graph || crate::table::is_header(row, col) {
            return Ok(());
        }

        self.tooltip = TooltipState::show(cell.samples(), cursor);
        debug!(row, col, shown = self.tooltip.is_shown(), "Tooltip updated");
        Ok(())
    }

    /// Handle the cursor leaving a table cell
    pub fn hide_tooltip(&mut self) {
        self.tooltip = TooltipState::Hidden;
    }

    /// Current tooltip state
    #[must_use]
    pub const fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    /// Store the participants returned by a search
    pub fn set_participants(&mut self, participants: Vec<SearchParticipant>) {
        self.search.set_participants(participants);
    }

    /// Participant search state
    #[must_use]
    pub const fn search(&self) -> &ParticipantSearch {
        &self.search
    }

    /// Form contents for searching the participants of `session` on `date`
    #[must_use]
    pub fn search_request(&self, session: SessionId, date: NaiveDate) -> SearchRequest {
        SearchRequest {
            action: "search".to_string(),
            csrf: self.model.csrf.clone(),
            date_format: self.model.date_format.clone(),
            session,
            date: (self.format_date)(date),
        }
    }

    /// Table cells for the selected dataset
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<TableCell>> {
        build_rows(&self.model, self.selected)
    }

    /// Options of the dataset selector
    #[must_use]
    pub fn dataset_options(&self) -> Vec<DatasetOption> {
        self.model
            .dataset_names
            .iter()
            .enumerate()
            .map(|(index, name)| DatasetOption {
                value: format!("{index}|{name}"),
                label: self.messages.message(name),
                selected: index == self.selected,
            })
            .collect()
    }

    /// Most active participants, shown to staff when there are any
    #[must_use]
    pub fn frequent_rows(&self) -> Option<Vec<FrequentRow>> {
        if !self.model.teacher {
            return None;
        }
        let most_frequent = self.model.most_frequent.as_ref()?;
        if most_frequent.is_empty() {
            return None;
        }

        Some(
            most_frequent
                .iter()
                .map(|participant| {
                    let position = participant.position.to_string();
                    FrequentRow {
                        position: self
                            .messages
                            .format("ordinal-value", &[("position", position.as_str())]),
                        name: participant.name.clone(),
                        visits: participant.visits,
                    }
                })
                .collect(),
        )
    }

    /// Whether the participant search is available
    #[must_use]
    pub const fn shows_search(&self) -> bool {
        self.model.teacher && self.model.show_participants
    }

    /// Render the whole component
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render or the view model cannot be encoded.
    pub fn render(&self) -> ViewResult<String> {
        let dataset = self
            .model
            .dataset_names
            .get(self.selected)
            .cloned()
            .unwrap_or_default();
        let remote_label = self.messages.message("queue-remote");
        let (searched, search_rows) = match self.search.outcome(&remote_label) {
            SearchOutcome::NotSearched => (false, Vec::new()),
            SearchOutcome::NoResults => (true, Vec::new()),
            SearchOutcome::Results(rows) => (true, rows),
        };

        let template = StatisticsTemplate {
            view: self,
            title: self.messages.message(&dataset),
            lead: self.messages.message(&format!("{dataset}-lead")),
            options: self.dataset_options(),
            rows: self.rows(),
            frequent: self.frequent_rows(),
            sessions: &self.model.session_names,
            searched,
            search_rows,
            tooltip: self
                .tooltip
                .render(&self.messages.message("statistics-queue-graph"))?,
            model_json: script_safe_json(&self.model)?,
        };

        Ok(template.render()?)
    }

    /// Localized message, used by the template
    #[must_use]
    pub fn t(&self, id: &str) -> String {
        self.messages.message(id)
    }
}

/// JSON that can be embedded in a `<script>` element
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn script_safe_json<T: Serialize>(value: &T) -> ViewResult<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

#[derive(Template)]
#[template(path = "statistics.html")]
struct StatisticsTemplate<'a> {
    view: &'a StatisticsView,
    title: String,
    lead: String,
    options: Vec<DatasetOption>,
    rows: Vec<Vec<TableCell>>,
    frequent: Option<Vec<FrequentRow>>,
    sessions: &'a [SessionOption],
    searched: bool,
    search_rows: Vec<ParticipantRow>,
    tooltip: Option<String>,
    model_json: String,
}
