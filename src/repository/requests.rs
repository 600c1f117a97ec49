// src/repository/requests.rs

use crate::models::{MatchRequest, RequestStatus};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

const REQUEST_COLUMNS: &str =
    "id, requester_id, target_id, status, is_read, match_id, created_at, updated_at";

fn request_from_row(row: &Row<'_>) -> Result<MatchRequest> {
    Ok(MatchRequest {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        target_id: row.get(2)?,
        status: row.get(3)?,
        read: row.get(4)?,
        match_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn insert_request(conn: &Connection, req: &MatchRequest) -> Result<()> {
    conn.execute(
        "INSERT INTO match_requests (id, requester_id, target_id, status, is_read, match_id,
                                     created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            req.id,
            req.requester_id,
            req.target_id,
            req.status,
            req.read,
            req.match_id,
            req.created_at,
            req.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_request(conn: &Connection, request_id: &str) -> Result<Option<MatchRequest>> {
    conn.query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM match_requests WHERE id = ?"),
        [request_id],
        request_from_row,
    )
    .optional()
}

/// The pending request for an ordered (requester, target) pair, if one exists.
pub fn find_pending_request(
    conn: &Connection,
    requester_id: &str,
    target_id: &str,
) -> Result<Option<MatchRequest>> {
    conn.query_row(
        &format!(
            "SELECT {REQUEST_COLUMNS} FROM match_requests
             WHERE requester_id = ? AND target_id = ? AND status = 'pending'"
        ),
        [requester_id, target_id],
        request_from_row,
    )
    .optional()
}

pub fn list_pending_for_target(conn: &Connection, target_id: &str) -> Result<Vec<MatchRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM match_requests
         WHERE target_id = ? AND status = 'pending'
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let requests = stmt
        .query_map([target_id], request_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(requests)
}

/// Pending requests in either direction for a user.
pub fn list_pending_involving(conn: &Connection, user_id: &str) -> Result<Vec<MatchRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM match_requests
         WHERE (requester_id = ?1 OR target_id = ?1) AND status = 'pending'"
    ))?;
    let requests = stmt
        .query_map([user_id], request_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(requests)
}

pub fn update_request_status(
    conn: &Connection,
    request_id: &str,
    status: RequestStatus,
    match_id: Option<&str>,
    now: i64,
) -> Result<usize> {
    conn.execute(
        "UPDATE match_requests
         SET status = ?, match_id = COALESCE(?, match_id), updated_at = ?
         WHERE id = ?",
        params![status, match_id, now, request_id],
    )
}

pub fn mark_read(conn: &Connection, request_id: &str, now: i64) -> Result<usize> {
    conn.execute(
        "UPDATE match_requests SET is_read = 1, updated_at = ? WHERE id = ?",
        params![now, request_id],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    fn pending(id: &str, from: &str, to: &str, created_at: i64) -> MatchRequest {
        MatchRequest {
            id: id.into(),
            requester_id: from.into(),
            target_id: to.into(),
            status: RequestStatus::Pending,
            read: false,
            match_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn schema_allows_one_pending_request_per_pair() {
        let conn = open_in_memory().unwrap();
        insert_request(&conn, &pending("r1", "alice", "bob", 1)).unwrap();
        assert!(insert_request(&conn, &pending("r2", "alice", "bob", 2)).is_err());
        // The reverse direction is a different pair.
        insert_request(&conn, &pending("r3", "bob", "alice", 3)).unwrap();

        update_request_status(&conn, "r1", RequestStatus::Rejected, None, 4).unwrap();
        insert_request(&conn, &pending("r4", "alice", "bob", 5)).unwrap();
    }

    #[test]
    fn pending_queries_ignore_resolved_requests() {
        let conn = open_in_memory().unwrap();
        insert_request(&conn, &pending("r1", "alice", "carol", 1)).unwrap();
        insert_request(&conn, &pending("r2", "bob", "carol", 2)).unwrap();
        insert_request(&conn, &pending("r3", "carol", "dave", 3)).unwrap();
        update_request_status(&conn, "r1", RequestStatus::Accepted, Some("m1"), 4).unwrap();

        let for_carol: Vec<_> = list_pending_for_target(&conn, "carol")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(for_carol, vec!["r2"]);
        assert_eq!(list_pending_involving(&conn, "carol").unwrap().len(), 2);
        assert!(find_pending_request(&conn, "alice", "carol").unwrap().is_none());

        let accepted = get_request(&conn, "r1").unwrap().unwrap();
        assert_eq!(accepted.match_id.as_deref(), Some("m1"));
    }

    #[test]
    fn mark_read_sets_flag() {
        let conn = open_in_memory().unwrap();
        insert_request(&conn, &pending("r1", "alice", "bob", 1)).unwrap();
        assert_eq!(mark_read(&conn, "r1", 2).unwrap(), 1);
        assert!(get_request(&conn, "r1").unwrap().unwrap().read);
    }
}
