// src/repository/progress.rs

use crate::models::CourseProgress;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::collections::BTreeSet;

fn progress_from_row(row: &Row<'_>) -> Result<CourseProgress> {
    Ok(CourseProgress {
        user_id: row.get(0)?,
        course_id: row.get(1)?,
        completed_lessons: BTreeSet::new(),
        current_section: row.get(2)?,
        current_lesson: row.get(3)?,
        total_lessons: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn completed_keys(conn: &Connection, user_id: &str, course_id: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT lesson_key FROM completed_lessons WHERE user_id = ? AND course_id = ?",
    )?;
    let keys = stmt
        .query_map([user_id, course_id], |row| row.get(0))?
        .collect::<Result<BTreeSet<String>>>()?;
    Ok(keys)
}

pub fn get_progress(
    conn: &Connection,
    user_id: &str,
    course_id: &str,
) -> Result<Option<CourseProgress>> {
    let progress = conn
        .query_row(
            "SELECT user_id, course_id, current_section, current_lesson, total_lessons, updated_at
             FROM course_progress WHERE user_id = ? AND course_id = ?",
            [user_id, course_id],
            progress_from_row,
        )
        .optional()?;

    match progress {
        Some(mut p) => {
            p.completed_lessons = completed_keys(conn, user_id, course_id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

/// Writes position and lesson count, and adds any completed keys not yet stored.
/// Completed keys are never removed here.
pub fn upsert_progress(conn: &Connection, progress: &CourseProgress) -> Result<()> {
    conn.execute(
        "INSERT INTO course_progress (user_id, course_id, current_section, current_lesson,
                                      total_lessons, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id, course_id) DO UPDATE SET
            current_section = excluded.current_section,
            current_lesson = excluded.current_lesson,
            total_lessons = excluded.total_lessons,
            updated_at = excluded.updated_at",
        params![
            progress.user_id,
            progress.course_id,
            progress.current_section,
            progress.current_lesson,
            progress.total_lessons,
            progress.updated_at
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO completed_lessons (user_id, course_id, lesson_key, completed_at)
         VALUES (?, ?, ?, ?)",
    )?;
    for key in &progress.completed_lessons {
        stmt.execute(params![
            progress.user_id,
            progress.course_id,
            key,
            progress.updated_at
        ])?;
    }

    debug!(
        "[DB] Saved progress {}/{}: {} lessons complete",
        progress.user_id,
        progress.course_id,
        progress.completed_lessons.len()
    );
    Ok(())
}

pub fn list_progress_for_user(conn: &Connection, user_id: &str) -> Result<Vec<CourseProgress>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, course_id, current_section, current_lesson, total_lessons, updated_at
         FROM course_progress WHERE user_id = ?
         ORDER BY updated_at DESC, rowid DESC",
    )?;
    let mut records = stmt
        .query_map([user_id], progress_from_row)?
        .collect::<Result<Vec<_>>>()?;

    for p in &mut records {
        p.completed_lessons = completed_keys(conn, &p.user_id, &p.course_id)?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    #[test]
    fn upsert_merges_completed_keys() {
        let conn = open_in_memory().unwrap();
        let mut p = CourseProgress::new("alice", "c1");
        p.completed_lessons.insert("l1".into());
        p.total_lessons = Some(4);
        upsert_progress(&conn, &p).unwrap();

        let mut second = CourseProgress::new("alice", "c1");
        second.completed_lessons.insert("l2".into());
        second.current_section = 1;
        second.total_lessons = Some(4);
        upsert_progress(&conn, &second).unwrap();

        let stored = get_progress(&conn, "alice", "c1").unwrap().unwrap();
        assert_eq!(stored.completed_lessons.len(), 2);
        assert_eq!(stored.current_section, 1);
        assert_eq!(stored.total_lessons, Some(4));
    }

    #[test]
    fn list_is_scoped_to_user() {
        let conn = open_in_memory().unwrap();
        upsert_progress(&conn, &CourseProgress::new("alice", "c1")).unwrap();
        upsert_progress(&conn, &CourseProgress::new("alice", "c2")).unwrap();
        upsert_progress(&conn, &CourseProgress::new("bob", "c1")).unwrap();

        assert_eq!(list_progress_for_user(&conn, "alice").unwrap().len(), 2);
        assert!(get_progress(&conn, "carol", "c1").unwrap().is_none());
        assert!(get_progress(&conn, "bob", "c1").unwrap().unwrap().total_lessons.is_none());
    }
}
