//! Course summary shown on the queue page

use chrono::NaiveDateTime;
use neuvontajono_core::{
    Result,
    types::{Course, CourseSummary, ParticipantView, QueueEntryView, SessionSummary, User},
    utils::format_clock,
};
use neuvontajono_database::QueueStore;
use std::collections::HashSet;

/// Build the summary of `course` as seen by `user` at `now`
///
/// Staff see the whole queue and every participant of the sessions open now;
/// students only see their own queue entry and attendance.
///
/// # Errors
///
/// Returns an error if any store lookup fails.
pub async fn build_summary(
    store: &dyn QueueStore,
    course: &Course,
    user: &User,
    staff: bool,
    now: NaiveDateTime,
) -> Result<CourseSummary> {
    let open_sessions: Vec<_> = store
        .list_sessions(course.id)
        .await?
        .into_iter()
        .filter(|session| session.is_open(now))
        .collect();

    let records = store.queue_for_course(course.id).await?;
    let my_position = records
        .iter()
        .position(|record| record.entry.user_id == user.id)
        .map(|index| index + 1);

    let queue = records
        .iter()
        .enumerate()
        .filter(|(_, record)| staff || record.entry.user_id == user.id)
        .map(|(index, record)| QueueEntryView {
            position: index + 1,
            name: format!("{} {}", record.first_name, record.last_name),
            entry: record.entry.clone(),
        })
        .collect();

    let open_ids: HashSet<_> = open_sessions.iter().map(|session| session.id).collect();
    let participants = store
        .participants(course.id, None, now.date())
        .await?
        .into_iter()
        .filter(|record| {
            if staff {
                open_ids.contains(&record.participant.session_id)
            } else {
                record.participant.user_id == user.id
            }
        })
        .map(|record| ParticipantView {
            name: format!("{} {}", record.first_name, record.last_name),
            session_id: record.participant.session_id,
            location: record.participant.location,
            signed_up: record.participant.signed_up,
        })
        .collect();

    let sessions = open_sessions
        .into_iter()
        .map(|session| SessionSummary {
            id: session.id,
            name: session.name,
            locations: session.locations,
            language: session.language,
            start_time: format_clock(session.start_time),
            end_time: format_clock(session.end_time),
        })
        .collect();

    Ok(CourseSummary {
        course_id: course.id,
        course_name: course.name.clone(),
        staff,
        sessions,
        queue_length: records.len(),
        my_position,
        queue,
        participants,
        previous_location: user.previous_location.clone(),
    })
}
