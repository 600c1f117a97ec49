// src/catalog.rs

use crate::error::{AppError, AppResult};
use crate::models::{
    normalize_skills, now_ms, Course, CourseDraft, CourseListing, MatchStatus, UserProfile,
};
use crate::notifier::{CourseEvent, CourseRefreshNotifier};
use crate::repository::{courses, matches, users};
use log::{debug, info};
use rusqlite::Connection;
use std::collections::HashMap;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Gives every section and lesson that lacks one a fresh id; existing ids are kept.
fn assign_stable_ids(course: &mut Course) {
    for section in &mut course.sections {
        if section.id.trim().is_empty() {
            section.id = new_id();
        }
        for lesson in &mut section.lessons {
            if lesson.id.trim().is_empty() {
                lesson.id = new_id();
            }
        }
    }
}

/// Creates a course (`draft.id == None`) or edits one the instructor owns.
/// Another instructor's course id is reported as not found.
pub fn save_course(
    conn: &Connection,
    notifier: &CourseRefreshNotifier,
    instructor_id: &str,
    draft: CourseDraft,
) -> AppResult<Course> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("course title is required"));
    }
    if !users::user_exists(conn, instructor_id)? {
        return Err(AppError::not_found("User", instructor_id));
    }

    let now = now_ms();
    let existing = match &draft.id {
        Some(id) => Some(owned_course(conn, instructor_id, id)?),
        None => None,
    };

    let mut course = Course {
        id: existing.as_ref().map(|c| c.id.clone()).unwrap_or_else(new_id),
        instructor_id: instructor_id.to_string(),
        title,
        description: draft.description,
        level: draft.level,
        duration: draft.duration,
        is_public: draft.is_public,
        tags: normalize_skills(draft.tags),
        sections: draft.sections,
        created_at: existing.as_ref().map_or(now, |c| c.created_at),
        updated_at: now,
    };
    assign_stable_ids(&mut course);

    courses::save_course(conn, &course)?;
    info!(
        "Saved course {} '{}' ({} lessons) for {}",
        course.id,
        course.title,
        course.total_lessons(),
        instructor_id
    );

    notifier.notify(&CourseEvent::Saved {
        course_id: course.id.clone(),
        instructor_id: instructor_id.to_string(),
    });
    Ok(course)
}

fn owned_course(conn: &Connection, instructor_id: &str, course_id: &str) -> AppResult<Course> {
    courses::get_course(conn, course_id)?
        .filter(|c| c.instructor_id == instructor_id)
        .ok_or_else(|| AppError::not_found("Course", course_id))
}

/// Removes an owned course. Learners' progress records are kept.
pub fn delete_course(
    conn: &Connection,
    notifier: &CourseRefreshNotifier,
    instructor_id: &str,
    course_id: &str,
) -> AppResult<()> {
    let course = owned_course(conn, instructor_id, course_id)?;
    courses::delete_course(conn, &course.id)?;
    info!("Deleted course {} of {}", course.id, instructor_id);

    notifier.notify(&CourseEvent::Deleted {
        course_id: course.id,
        instructor_id: instructor_id.to_string(),
    });
    Ok(())
}

pub fn get_course(conn: &Connection, course_id: &str) -> AppResult<Course> {
    courses::get_course(conn, course_id)?.ok_or_else(|| AppError::not_found("Course", course_id))
}

pub fn courses_by_instructor(conn: &Connection, instructor_id: &str) -> AppResult<Vec<Course>> {
    if !users::user_exists(conn, instructor_id)? {
        return Err(AppError::not_found("User", instructor_id));
    }
    Ok(courses::list_courses_by_instructors(conn, &[instructor_id.to_string()])?)
}

fn with_instructors(
    conn: &Connection,
    list: Vec<Course>,
    from_connection: bool,
) -> AppResult<Vec<CourseListing>> {
    let mut profiles: HashMap<String, Option<UserProfile>> = HashMap::new();
    let mut listings = Vec::with_capacity(list.len());

    for course in list {
        if !profiles.contains_key(&course.instructor_id) {
            let profile = users::get_user(conn, &course.instructor_id)?;
            profiles.insert(course.instructor_id.clone(), profile);
        }
        let (instructor_name, instructor_bio) = match profiles.get(&course.instructor_id) {
            Some(Some(p)) => (p.name.clone(), p.bio.clone()),
            _ => ("Unknown Instructor".to_string(), String::new()),
        };
        listings.push(CourseListing {
            course,
            instructor_name,
            instructor_bio,
            from_connection,
        });
    }
    Ok(listings)
}

/// Every public course, newest first.
pub fn list_public_courses(conn: &Connection) -> AppResult<Vec<CourseListing>> {
    let public = courses::list_public_courses(conn)?;
    debug!("Listing {} public courses", public.len());
    with_instructors(conn, public, false)
}

/// All courses, private ones included, of users the caller is connected with.
pub fn connected_courses(conn: &Connection, user_id: &str) -> AppResult<Vec<CourseListing>> {
    let mut partners: Vec<String> = matches::list_matches_for_user(conn, user_id)?
        .iter()
        .filter(|m| matches!(m.status, MatchStatus::Connected | MatchStatus::InSession))
        .filter_map(|m| m.partner_of(user_id).map(str::to_string))
        .collect();
    partners.sort();
    partners.dedup();

    if partners.is_empty() {
        return Ok(Vec::new());
    }

    let list = courses::list_courses_by_instructors(conn, &partners)?;
    debug!(
        "Listing {} courses from {} connections of {}",
        list.len(),
        partners.len(),
        user_id
    );
    with_instructors(conn, list, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections;
    use crate::database::open_in_memory;
    use crate::models::{Lesson, Section};
    use crate::progress;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn setup() -> Connection {
        let conn = open_in_memory().unwrap();
        for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
            users::insert_user(&conn, &UserProfile::new(id, name)).unwrap();
        }
        conn
    }

    fn draft(title: &str, public: bool) -> CourseDraft {
        CourseDraft {
            title: title.into(),
            is_public: public,
            tags: vec!["Music".into()],
            sections: vec![Section {
                title: "Basics".into(),
                lessons: vec![
                    Lesson {
                        title: "Chords".into(),
                        ..Default::default()
                    },
                    Lesson {
                        title: "Strumming".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn save_assigns_ids_and_keeps_them_on_edit() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        let created = save_course(&conn, &notifier, "alice", draft("Guitar", true)).unwrap();
        let lesson_id = created.sections[0].lessons[0].id.clone();
        assert!(!lesson_id.is_empty());
        assert!(created.tags.contains("music"));

        let mut edit = draft("Guitar 101", true);
        edit.id = Some(created.id.clone());
        edit.sections = created.sections.clone();
        edit.sections[0].lessons.push(Lesson {
            title: "Solo".into(),
            ..Default::default()
        });
        let edited = save_course(&conn, &notifier, "alice", edit).unwrap();

        assert_eq!(edited.id, created.id);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(edited.sections[0].lessons[0].id, lesson_id);
        assert_eq!(edited.total_lessons(), 3);
        assert_eq!(get_course(&conn, &created.id).unwrap(), edited);
    }

    #[test]
    fn only_owner_can_edit_or_delete() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        let created = save_course(&conn, &notifier, "alice", draft("Guitar", true)).unwrap();

        let mut hijack = draft("Mine now", true);
        hijack.id = Some(created.id.clone());
        assert!(matches!(
            save_course(&conn, &notifier, "bob", hijack),
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            delete_course(&conn, &notifier, "bob", &created.id),
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            save_course(&conn, &notifier, "alice", draft("  ", true)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn notifier_hears_saves_and_deletes() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        let events = Arc::new(AtomicUsize::new(0));
        let e = Arc::clone(&events);
        notifier.subscribe(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });

        let created = save_course(&conn, &notifier, "alice", draft("Guitar", true)).unwrap();
        delete_course(&conn, &notifier, "alice", &created.id).unwrap();
        assert_eq!(events.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deleting_a_course_keeps_progress() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        let created = save_course(&conn, &notifier, "alice", draft("Guitar", true)).unwrap();
        progress::mark_lesson_complete(&conn, "bob", &created.id, 0, 0).unwrap();

        delete_course(&conn, &notifier, "alice", &created.id).unwrap();
        let kept = progress::course_progress(&conn, "bob", &created.id).unwrap().unwrap();
        assert_eq!(kept.percentage, 50);
    }

    #[test]
    fn public_listing_hides_private_courses() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        save_course(&conn, &notifier, "alice", draft("Public", true)).unwrap();
        save_course(&conn, &notifier, "alice", draft("Private", false)).unwrap();

        let listed = list_public_courses(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].course.title, "Public");
        assert_eq!(listed[0].instructor_name, "Alice");
        assert_eq!(courses_by_instructor(&conn, "alice").unwrap().len(), 2);
        assert!(matches!(
            courses_by_instructor(&conn, "ghost"),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn connected_courses_include_private_ones_of_partners_only() {
        let conn = setup();
        let notifier = CourseRefreshNotifier::new();
        save_course(&conn, &notifier, "bob", draft("Bob private", false)).unwrap();
        save_course(&conn, &notifier, "carol", draft("Carol public", true)).unwrap();

        assert!(connected_courses(&conn, "alice").unwrap().is_empty());

        let req = connections::create_match_request(&conn, "alice", "bob").unwrap();
        connections::accept_match_request(&conn, &req.id).unwrap();
        // A merely pending match does not share courses.
        connections::create_match(&conn, "alice", "carol").unwrap();

        let listed = connected_courses(&conn, "alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].course.title, "Bob private");
        assert!(listed[0].from_connection);
    }
}
