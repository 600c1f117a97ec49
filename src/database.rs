// src/database.rs

use log::debug;
use rusqlite::{Connection, Result};
use std::path::Path;

pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    debug!("init_db: Checking database schema...");

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS user_skills (
            user_id TEXT NOT NULL REFERENCES users(id),
            kind TEXT NOT NULL CHECK (kind IN ('have','learn')),
            skill TEXT NOT NULL,
            PRIMARY KEY (user_id, kind, skill)
        );
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            instructor_id TEXT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            level TEXT NOT NULL CHECK (level IN ('Beginner','Intermediate','Advanced','Expert')),
            duration TEXT NOT NULL DEFAULT '',
            is_public INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            sections TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_courses_instructor ON courses(instructor_id);
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            user_a TEXT NOT NULL,
            user_b TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending','accepted','connected','in_session')),
            session_mode TEXT,
            last_session_at INTEGER,
            total_sessions INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_user_a ON matches(user_a);
        CREATE INDEX IF NOT EXISTS idx_matches_user_b ON matches(user_b);
        CREATE TABLE IF NOT EXISTS match_requests (
            id TEXT PRIMARY KEY,
            requester_id TEXT NOT NULL,
            target_id TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending','accepted','rejected')),
            is_read INTEGER NOT NULL DEFAULT 0,
            match_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_one_pending_request
            ON match_requests(requester_id, target_id) WHERE status = 'pending';
        CREATE TABLE IF NOT EXISTS course_progress (
            user_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            current_section INTEGER NOT NULL DEFAULT 0,
            current_lesson INTEGER NOT NULL DEFAULT 0,
            total_lessons INTEGER,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, course_id)
        );
        CREATE TABLE IF NOT EXISTS completed_lessons (
            user_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            lesson_key TEXT NOT NULL,
            completed_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, course_id, lesson_key)
        );
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL REFERENCES matches(id),
            sender_id TEXT NOT NULL,
            body TEXT NOT NULL,
            kind TEXT NOT NULL,
            sent_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_match ON messages(match_id, sent_at);
        ",
    )?;

    Ok(())
}
