//! Statistics view for the neuvontajono help queue
//!
//! Renders the colour-coded participant table, the queue length graph shown
//! when hovering a cell, the most active participants and the participant
//! search. Page state lives in [`StatisticsView`]; markup comes from `askama`
//! templates.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod chart;
pub mod error;
pub mod i18n;
pub mod participants;
pub mod table;
pub mod tooltip;
pub mod view;

pub use chart::{ChartGeometry, LineChart};
pub use error::{ViewError, ViewResult};
pub use i18n::{DateFormatter, MessageCatalog, Messages, pattern_formatter};
pub use participants::{ParticipantSearch, SearchRequest};
pub use table::CellColor;
pub use tooltip::{CursorPosition, TooltipState};
pub use view::{StatisticsView, script_safe_json};
