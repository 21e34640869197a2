//! Statistics page and participant search

use crate::{
    error::{ApiError, ApiResult},
    extractors::CourseContext,
    state::AppState,
};
use askama::Template;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::Html,
};
use chrono::{Datelike, NaiveDate};
use neuvontajono_core::{
    CourseId, Result, SessionId, UserId,
    config::StatisticsConfig,
    statistics::{
        FrequentParticipant, PersonName, SampleSeries, SearchParticipant, SearchResponse,
        SessionOption, StatCell, StatisticsViewModel,
    },
    utils::{parse_localized_date, parse_sample},
};
use neuvontajono_database::{FrequentUser, ParticipantRecord, QueueStore};
use neuvontajono_web::{
    CellColor, MessageCatalog, Messages, SearchRequest, StatisticsView, pattern_formatter,
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tracing::debug;

/// Dataset shown first: distinct participants per session occurrence
pub const PARTICIPANTS_DATASET: &str = "statistics-participants";
/// Second dataset: longest queue seen during the occurrence
pub const QUEUE_LENGTH_DATASET: &str = "statistics-queue-length";

const NO_DATA: &str = "-";

type WeekKey = (i32, u32);

fn week_key(date: NaiveDate) -> WeekKey {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// Who is asking for the statistics
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Course staff see the frequency table and the search
    pub staff: bool,
    /// Token embedded in the search form
    pub csrf: String,
    /// Occurrences after this date have no data yet
    pub today: NaiveDate,
}

/// Build the statistics page data of a course
///
/// Rows are sessions, columns are the weeks the course runs. Each data cell
/// holds the participant count, the longest queue and the queue samples of the
/// session's occurrence in that week; cells are coloured by participant count.
///
/// # Errors
///
/// Returns an error if a store lookup fails.
pub async fn build_view_model(
    store: &dyn QueueStore,
    config: &StatisticsConfig,
    messages: &dyn Messages,
    course_id: CourseId,
    viewer: Viewer,
) -> Result<StatisticsViewModel> {
    let sessions = store.list_sessions(course_id).await?;

    let counts: HashMap<(SessionId, NaiveDate), i64> = store
        .participant_counts(course_id)
        .await?
        .into_iter()
        .map(|count| ((count.session_id, count.date), count.count))
        .collect();
    let samples: HashMap<(SessionId, NaiveDate), Vec<String>> = store
        .session_stats(course_id)
        .await?
        .into_iter()
        .map(|stats| ((stats.session_id, stats.date), stats.samples))
        .collect();

    let occurrences: Vec<Vec<NaiveDate>> = sessions.iter().map(|s| s.occurrences()).collect();
    let weeks: BTreeSet<WeekKey> = occurrences
        .iter()
        .flatten()
        .map(|date| week_key(*date))
        .collect();

    let mut header = vec![StatCell::Label(String::new())];
    header.extend(weeks.iter().map(|(_, week)| {
        StatCell::Label(messages.format("statistics-week", &[("week", week.to_string().as_str())]))
    }));
    let mut stats = vec![header];
    let mut colors = vec![vec![None; weeks.len() + 1]];

    for (session, dates) in sessions.iter().zip(&occurrences) {
        let mut row = vec![StatCell::Label(session.name.clone())];
        let mut row_colors = vec![None];

        for week in &weeks {
            let date = dates
                .iter()
                .copied()
                .find(|date| week_key(*date) == *week && *date <= viewer.today);
            let Some(date) = date else {
                row.push(StatCell::Label(NO_DATA.to_string()));
                row_colors.push(None);
                continue;
            };

            let count = counts.get(&(session.id, date)).copied().unwrap_or(0);
            let day_samples = samples.get(&(session.id, date)).cloned().unwrap_or_default();
            let max_length = day_samples
                .iter()
                .filter_map(|sample| parse_sample(sample))
                .map(|(_, length)| length)
                .max()
                .unwrap_or(0);

            row.push(StatCell::Data {
                values: vec![count.to_string(), max_length.to_string()],
                samples: if day_samples.is_empty() {
                    SampleSeries::Placeholder(NO_DATA.to_string())
                } else {
                    SampleSeries::Samples(day_samples)
                },
            });
            row_colors.push(Some(
                CellColor::for_count(count, config.yellow_limit, config.red_limit)
                    .token()
                    .to_string(),
            ));
        }

        stats.push(row);
        colors.push(row_colors);
    }

    let most_frequent = if viewer.staff {
        Some(rank_participants(
            store
                .most_frequent(course_id, config.most_frequent_limit)
                .await?,
        ))
    } else {
        None
    };

    debug!(%course_id, sessions = sessions.len(), weeks = weeks.len(), "Built statistics");

    Ok(StatisticsViewModel {
        dataset_names: vec![
            PARTICIPANTS_DATASET.to_string(),
            QUEUE_LENGTH_DATASET.to_string(),
        ],
        stats,
        colors,
        most_frequent,
        session_names: sessions
            .iter()
            .map(|session| SessionOption {
                id: session.id,
                name: session.name.clone(),
            })
            .collect(),
        csrf: viewer.csrf,
        ui_language: config.ui_language.clone(),
        red_limit: config.red_limit,
        yellow_limit: config.yellow_limit,
        teacher: viewer.staff,
        show_graph: config.show_graph,
        show_participants: viewer.staff,
        date_format: config.date_format.clone(),
    })
}

/// Number the users by visits; users with equal visits share a position
#[must_use]
pub fn rank_participants(users: Vec<FrequentUser>) -> Vec<FrequentParticipant> {
    let mut ranked: Vec<FrequentParticipant> = Vec::with_capacity(users.len());
    for (index, user) in users.into_iter().enumerate() {
        let position = match ranked.last() {
            Some(previous) if previous.visits == user.visits => previous.position,
            _ => index + 1,
        };
        ranked.push(FrequentParticipant {
            position,
            name: format!("{} {}", user.first_name, user.last_name),
            visits: user.visits,
        });
    }
    ranked
}

/// Collapse attendance records into one entry per user with distinct locations
#[must_use]
pub fn group_participants(records: Vec<ParticipantRecord>) -> Vec<SearchParticipant> {
    let mut order: Vec<UserId> = Vec::new();
    let mut grouped: HashMap<UserId, SearchParticipant> = HashMap::new();

    for record in records {
        let user_id = record.participant.user_id;
        let entry = grouped.entry(user_id).or_insert_with(|| {
            order.push(user_id);
            SearchParticipant {
                name: PersonName {
                    first: record.first_name.clone(),
                    last: record.last_name.clone(),
                },
                locations: Vec::new(),
            }
        });
        if !entry.locations.contains(&record.participant.location) {
            entry.locations.push(record.participant.location);
        }
    }

    order
        .into_iter()
        .filter_map(|user_id| grouped.remove(&user_id))
        .collect()
}

/// Participants of one session occurrence
///
/// # Errors
///
/// Returns an error if the date does not match its pattern, the session is not
/// part of the course or the store fails.
pub async fn search_participants(
    store: &dyn QueueStore,
    course_id: CourseId,
    request: &SearchRequest,
) -> ApiResult<SearchResponse> {
    if request.action != "search" {
        return Err(ApiError::UnknownAction(request.action.clone()));
    }
    let date = parse_localized_date(&request.date, &request.date_format)?;
    let session = store.find_session(course_id, request.session).await?;
    let records = store.participants(course_id, Some(session.id), date).await?;

    Ok(SearchResponse {
        participants: group_participants(records),
    })
}

/// Statistics page
///
/// # Errors
///
/// Store failures are answered with `{"error": true}`, rendering failures with 500.
pub async fn statistics_page(
    State(state): State<Arc<AppState>>,
    ctx: CourseContext,
) -> ApiResult<Html<String>> {
    let config = &state.config.statistics;
    let messages: Arc<dyn Messages> = Arc::new(MessageCatalog::for_language(&config.ui_language));

    let model = build_view_model(
        state.store.as_ref(),
        config,
        messages.as_ref(),
        ctx.course.id,
        Viewer {
            staff: ctx.staff,
            csrf: ctx.csrf_token(),
            today: state.now().date(),
        },
    )
    .await?;

    let view = StatisticsView::new(model, messages, pattern_formatter(&config.date_format))
        .with_search_action(statistics_path(ctx.course.id));
    let page = StatisticsPageTemplate {
        title: &ctx.course.name,
        content: view.render()?,
    };
    Ok(Html(page.render()?))
}

/// Participant search posted from the statistics page, staff only
///
/// # Errors
///
/// Any failure is answered with `{"error": true}`.
pub async fn post_search(
    State(state): State<Arc<AppState>>,
    ctx: CourseContext,
    body: Bytes,
) -> ApiResult<Json<SearchResponse>> {
    if !ctx.staff {
        return Err(ApiError::Forbidden);
    }
    let request: SearchRequest = serde_urlencoded::from_bytes(&body)?;
    if !ctx.csrf_matches(Some(request.csrf.as_str())) {
        return Err(ApiError::Csrf);
    }

    let response = search_participants(state.store.as_ref(), ctx.course.id, &request).await?;
    debug!(
        course_id = %ctx.course.id,
        session_id = %request.session,
        found = response.participants.len(),
        "Participant search"
    );
    Ok(Json(response))
}

/// Path of the statistics page of a course
#[must_use]
pub fn statistics_path(course_id: CourseId) -> String {
    format!("/course/{course_id}/statistics")
}

#[derive(Template)]
#[template(path = "statistics_page.html")]
struct StatisticsPageTemplate<'a> {
    title: &'a str,
    content: String,
}
