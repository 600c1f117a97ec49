// src/repository/courses.rs

use super::{json_column, placeholders, to_json};
use crate::models::Course;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

const COURSE_COLUMNS: &str = "id, instructor_id, title, description, level, duration, is_public,
     tags, sections, created_at, updated_at";

fn course_from_row(row: &Row<'_>) -> Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        instructor_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        level: row.get(4)?,
        duration: row.get(5)?,
        is_public: row.get(6)?,
        tags: json_column(row, 7)?,
        sections: json_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Inserts or fully replaces a course. `created_at` of an existing row is kept.
pub fn save_course(conn: &Connection, course: &Course) -> Result<()> {
    conn.execute(
        "INSERT INTO courses (id, instructor_id, title, description, level, duration, is_public,
                              tags, sections, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            level = excluded.level,
            duration = excluded.duration,
            is_public = excluded.is_public,
            tags = excluded.tags,
            sections = excluded.sections,
            updated_at = excluded.updated_at",
        params![
            course.id,
            course.instructor_id,
            course.title,
            course.description,
            course.level,
            course.duration,
            course.is_public,
            to_json(&course.tags)?,
            to_json(&course.sections)?,
            course.created_at,
            course.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_course(conn: &Connection, course_id: &str) -> Result<Option<Course>> {
    conn.query_row(
        &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"),
        [course_id],
        course_from_row,
    )
    .optional()
}

pub fn delete_course(conn: &Connection, course_id: &str) -> Result<usize> {
    conn.execute("DELETE FROM courses WHERE id = ?", [course_id])
}

pub fn list_public_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE is_public = 1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let courses = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(courses)
}

/// Courses authored by any of `instructor_ids`, public or not, newest first.
pub fn list_courses_by_instructors(
    conn: &Connection,
    instructor_ids: &[String],
) -> Result<Vec<Course>> {
    if instructor_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE instructor_id IN ({})
         ORDER BY created_at DESC, rowid DESC",
        placeholders(instructor_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let courses = stmt
        .query_map(params_from_iter(instructor_ids.iter()), course_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;
    use crate::models::{CourseLevel, Lesson, Section, UserProfile};
    use crate::repository::users::insert_user;
    use std::collections::BTreeSet;

    fn course(id: &str, instructor: &str, public: bool, created_at: i64) -> Course {
        Course {
            id: id.into(),
            instructor_id: instructor.into(),
            title: format!("Course {id}"),
            description: String::new(),
            level: CourseLevel::Intermediate,
            duration: "2h".into(),
            is_public: public,
            tags: BTreeSet::from(["music".to_string()]),
            sections: vec![Section {
                id: "s1".into(),
                title: "One".into(),
                lessons: vec![Lesson {
                    id: "l1".into(),
                    title: "First".into(),
                    ..Default::default()
                }],
            }],
            created_at,
            updated_at: created_at,
        }
    }

    fn setup() -> Connection {
        let conn = open_in_memory().unwrap();
        insert_user(&conn, &UserProfile::new("alice", "Alice")).unwrap();
        insert_user(&conn, &UserProfile::new("bob", "Bob")).unwrap();
        conn
    }

    #[test]
    fn save_round_trips_json_columns() {
        let conn = setup();
        let c = course("c1", "alice", true, 5);
        save_course(&conn, &c).unwrap();
        assert_eq!(get_course(&conn, "c1").unwrap(), Some(c));
    }

    #[test]
    fn resave_keeps_created_at() {
        let conn = setup();
        save_course(&conn, &course("c1", "alice", true, 5)).unwrap();
        let mut edited = course("c1", "alice", false, 99);
        edited.title = "Renamed".into();
        save_course(&conn, &edited).unwrap();

        let stored = get_course(&conn, "c1").unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.created_at, 5);
        assert_eq!(stored.updated_at, 99);
        assert!(!stored.is_public);
    }

    #[test]
    fn listings_filter_and_order() {
        let conn = setup();
        save_course(&conn, &course("old", "alice", true, 1)).unwrap();
        save_course(&conn, &course("new", "bob", true, 3)).unwrap();
        save_course(&conn, &course("private", "bob", false, 2)).unwrap();

        let public: Vec<_> = list_public_courses(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(public, vec!["new", "old"]);

        let bobs: Vec<_> = list_courses_by_instructors(&conn, &["bob".to_string()])
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(bobs, vec!["new", "private"]);
        assert!(list_courses_by_instructors(&conn, &[]).unwrap().is_empty());

        assert_eq!(delete_course(&conn, "old").unwrap(), 1);
        assert!(get_course(&conn, "old").unwrap().is_none());
    }
}
