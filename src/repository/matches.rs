// src/repository/matches.rs

use crate::models::{Match, MatchStatus};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

const MATCH_COLUMNS: &str = "id, user_a, user_b, status, session_mode, last_session_at,
     total_sessions, created_at, updated_at";

fn match_from_row(row: &Row<'_>) -> Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        users: [row.get(1)?, row.get(2)?],
        status: row.get(3)?,
        session_mode: row.get(4)?,
        last_session_at: row.get(5)?,
        total_sessions: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert_match(conn: &Connection, m: &Match) -> Result<()> {
    conn.execute(
        "INSERT INTO matches (id, user_a, user_b, status, session_mode, last_session_at,
                              total_sessions, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            m.id,
            m.users[0],
            m.users[1],
            m.status,
            m.session_mode,
            m.last_session_at,
            m.total_sessions,
            m.created_at,
            m.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_match(conn: &Connection, match_id: &str) -> Result<Option<Match>> {
    conn.query_row(
        &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?"),
        [match_id],
        match_from_row,
    )
    .optional()
}

/// Matches in which the user is either side, most recently updated first.
pub fn list_matches_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Match>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE user_a = ?1 OR user_b = ?1
         ORDER BY updated_at DESC, rowid DESC"
    ))?;
    let matches = stmt
        .query_map([user_id], match_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(matches)
}

pub fn update_match_status(
    conn: &Connection,
    match_id: &str,
    status: MatchStatus,
    now: i64,
) -> Result<usize> {
    conn.execute(
        "UPDATE matches SET status = ?, updated_at = ? WHERE id = ?",
        params![status, now, match_id],
    )
}

/// Persists status plus the session bookkeeping fields.
pub fn save_session_state(conn: &Connection, m: &Match) -> Result<usize> {
    conn.execute(
        "UPDATE matches
         SET status = ?, session_mode = ?, last_session_at = ?, total_sessions = ?, updated_at = ?
         WHERE id = ?",
        params![
            m.status,
            m.session_mode,
            m.last_session_at,
            m.total_sessions,
            m.updated_at,
            m.id
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;
    use crate::models::SessionMode;

    fn new_match(id: &str, a: &str, b: &str, updated_at: i64) -> Match {
        Match {
            id: id.into(),
            users: [a.into(), b.into()],
            status: MatchStatus::Pending,
            session_mode: None,
            last_session_at: None,
            total_sessions: 0,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn list_matches_covers_both_sides() {
        let conn = open_in_memory().unwrap();
        insert_match(&conn, &new_match("m1", "alice", "bob", 1)).unwrap();
        insert_match(&conn, &new_match("m2", "carol", "alice", 2)).unwrap();
        insert_match(&conn, &new_match("m3", "bob", "carol", 3)).unwrap();

        let ids: Vec<_> = list_matches_for_user(&conn, "alice")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m2", "m1"]);
    }

    #[test]
    fn session_state_is_persisted() {
        let conn = open_in_memory().unwrap();
        let mut m = new_match("m1", "alice", "bob", 1);
        insert_match(&conn, &m).unwrap();

        m.status = MatchStatus::InSession;
        m.session_mode = Some(SessionMode::Video);
        m.last_session_at = Some(7);
        m.total_sessions = 1;
        m.updated_at = 7;
        assert_eq!(save_session_state(&conn, &m).unwrap(), 1);
        assert_eq!(get_match(&conn, "m1").unwrap(), Some(m));

        assert_eq!(
            update_match_status(&conn, "m1", MatchStatus::Connected, 9).unwrap(),
            1
        );
        assert_eq!(
            get_match(&conn, "m1").unwrap().unwrap().status,
            MatchStatus::Connected
        );
        assert_eq!(
            update_match_status(&conn, "nope", MatchStatus::Connected, 9).unwrap(),
            0
        );
    }
}
