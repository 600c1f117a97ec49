// src/progress.rs

use crate::constants::{FALLBACK_TOTAL_LESSONS, PERCENT_MAX};
use crate::error::{AppError, AppResult};
use crate::models::{now_ms, Course, CourseProgress, ProgressSummary};
use crate::repository::{courses, progress as store};
use log::{debug, info, warn};
use rusqlite::Connection;

/// Positional lesson key, `"{section}-{lesson}"`.
pub fn lesson_key(section: u32, lesson: u32) -> String {
    format!("{section}-{lesson}")
}

/// Share of completed lessons, 0..=100.
///
/// A missing or non-positive lesson count reports 0. A stale count smaller
/// than the completed set is capped at 100.
pub fn percentage(progress: &CourseProgress) -> u32 {
    let total = match progress.total_lessons {
        Some(t) if t > 0 => t,
        _ => return 0,
    };
    let done = progress.completed_lessons.len() as f64;
    let pct = (done / total as f64 * 100.0).round() as u32;
    pct.min(PERCENT_MAX)
}

pub fn is_completed(progress: &CourseProgress) -> bool {
    let total = match progress.total_lessons {
        Some(t) if t > 0 => t,
        _ => FALLBACK_TOTAL_LESSONS,
    };
    progress.completed_lessons.len() as i64 >= total
}

pub fn summarize(progress: CourseProgress) -> ProgressSummary {
    ProgressSummary {
        percentage: percentage(&progress),
        is_completed: is_completed(&progress),
        progress,
    }
}

fn load_or_new(conn: &Connection, user_id: &str, course_id: &str) -> AppResult<CourseProgress> {
    Ok(store::get_progress(conn, user_id, course_id)?
        .unwrap_or_else(|| CourseProgress::new(user_id, course_id)))
}

/// Completion key for a lesson: its stable id when the course is known and the
/// lesson has one, else the positional key.
fn completion_key(course: Option<&Course>, section: u32, lesson: u32) -> AppResult<String> {
    let Some(course) = course else {
        return Ok(lesson_key(section, lesson));
    };
    let found = course.lesson_at(section, lesson).ok_or_else(|| {
        AppError::not_found(
            "Lesson",
            format!("{} at {}", course.id, lesson_key(section, lesson)),
        )
    })?;
    if found.id.is_empty() {
        Ok(lesson_key(section, lesson))
    } else {
        Ok(found.id.clone())
    }
}

// --- Public Interface ---

/// Marks a lesson done and moves the resume point to the next lesson of the
/// same section. Repeating the call for the same lesson changes nothing but
/// the timestamp.
pub fn mark_lesson_complete(
    conn: &Connection,
    user_id: &str,
    course_id: &str,
    section: u32,
    lesson: u32,
) -> AppResult<ProgressSummary> {
    let course = courses::get_course(conn, course_id)?;
    if course.is_none() {
        warn!(
            "Course {} not found, recording positional progress only",
            course_id
        );
    }

    let key = completion_key(course.as_ref(), section, lesson)?;
    let mut progress = load_or_new(conn, user_id, course_id)?;

    let newly_done = progress.completed_lessons.insert(key.clone());
    if let Some(course) = &course {
        progress.total_lessons = Some(course.total_lessons() as i64);
    }
    progress.current_section = section;
    progress.current_lesson = lesson.saturating_add(1);
    progress.updated_at = now_ms();

    store::upsert_progress(conn, &progress)?;

    let summary = summarize(progress);
    if newly_done {
        info!(
            "[Progress] {} completed {} in {} ({}%)",
            user_id, key, course_id, summary.percentage
        );
    } else {
        debug!(
            "[Progress] {} already completed {} in {}",
            user_id, key, course_id
        );
    }
    Ok(summary)
}

/// Moves the resume point without touching completion.
pub fn update_course_position(
    conn: &Connection,
    user_id: &str,
    course_id: &str,
    section: u32,
    lesson: u32,
) -> AppResult<ProgressSummary> {
    let mut progress = load_or_new(conn, user_id, course_id)?;
    if let Some(course) = courses::get_course(conn, course_id)? {
        progress.total_lessons = Some(course.total_lessons() as i64);
    }
    progress.current_section = section;
    progress.current_lesson = lesson;
    progress.updated_at = now_ms();

    store::upsert_progress(conn, &progress)?;
    debug!(
        "[Progress] {} resumes {} at {}",
        user_id,
        course_id,
        lesson_key(section, lesson)
    );
    Ok(summarize(progress))
}

pub fn course_progress(
    conn: &Connection,
    user_id: &str,
    course_id: &str,
) -> AppResult<Option<ProgressSummary>> {
    Ok(store::get_progress(conn, user_id, course_id)?.map(summarize))
}

pub fn list_progress(conn: &Connection, user_id: &str) -> AppResult<Vec<ProgressSummary>> {
    let records = store::list_progress_for_user(conn, user_id)?;
    for p in records.iter().filter(|p| p.total_lessons.map_or(true, |t| t <= 0)) {
        warn!(
            "Progress calculation: total_lessons is missing or invalid for course {}",
            p.course_id
        );
    }
    Ok(records.into_iter().map(summarize).collect())
}
