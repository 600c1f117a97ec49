// src/connections.rs

use crate::error::{AppError, AppResult};
use crate::models::{
    now_ms, IncomingRequest, Match, MatchRequest, MatchStatus, RequestStatus, SessionMode,
};
use crate::repository::{matches, requests, users};
use log::{debug, info, warn};
use rusqlite::Connection;
use uuid::Uuid;

// --- Match requests ---

pub fn create_match_request(
    conn: &Connection,
    requester_id: &str,
    target_id: &str,
) -> AppResult<MatchRequest> {
    if requester_id == target_id {
        return Err(AppError::validation("cannot send a match request to yourself"));
    }
    for id in [requester_id, target_id] {
        if !users::user_exists(conn, id)? {
            return Err(AppError::not_found("User", id));
        }
    }
    if requests::find_pending_request(conn, requester_id, target_id)?.is_some() {
        warn!("Duplicate match request {} -> {}", requester_id, target_id);
        return Err(AppError::DuplicateRequest);
    }

    let now = now_ms();
    let request = MatchRequest {
        id: Uuid::new_v4().to_string(),
        requester_id: requester_id.to_string(),
        target_id: target_id.to_string(),
        status: RequestStatus::Pending,
        read: false,
        match_id: None,
        created_at: now,
        updated_at: now,
    };
    requests::insert_request(conn, &request)?;

    info!(
        "Match request {} created: {} -> {}",
        request.id, requester_id, target_id
    );
    Ok(request)
}

/// Pending requests addressed to `user_id`, newest first. Requests whose
/// sender no longer has a profile are left out.
pub fn list_pending_requests(
    conn: &Connection,
    user_id: &str,
) -> AppResult<Vec<IncomingRequest>> {
    let mut incoming = Vec::new();
    for request in requests::list_pending_for_target(conn, user_id)? {
        let Some(requester) = users::get_user(conn, &request.requester_id)? else {
            debug!(
                "Skipping request {} from missing user {}",
                request.id, request.requester_id
            );
            continue;
        };
        incoming.push(IncomingRequest {
            request,
            requester_name: requester.name,
            requester_skills_have: requester.skills_have,
            requester_skills_to_learn: requester.skills_to_learn,
        });
    }
    Ok(incoming)
}

fn pending_request(
    conn: &Connection,
    request_id: &str,
    action: &'static str,
) -> AppResult<MatchRequest> {
    let request = requests::get_request(conn, request_id)?
        .ok_or_else(|| AppError::not_found("Match request", request_id))?;
    if request.status != RequestStatus::Pending {
        return Err(AppError::InvalidTransition {
            entity: "match request",
            action,
            state: request.status.to_string(),
        });
    }
    Ok(request)
}

/// Creates a connected match and marks the request accepted, both or neither.
/// A pending request in the opposite direction is settled by the same match.
pub fn accept_match_request(conn: &Connection, request_id: &str) -> AppResult<Match> {
    let request = pending_request(conn, request_id, "accept")?;

    let now = now_ms();
    let new_match = Match {
        id: Uuid::new_v4().to_string(),
        users: [request.requester_id.clone(), request.target_id.clone()],
        status: MatchStatus::Connected,
        session_mode: None,
        last_session_at: None,
        total_sessions: 0,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.unchecked_transaction()?;
    matches::insert_match(&tx, &new_match)?;
    let changed = requests::update_request_status(
        &tx,
        &request.id,
        RequestStatus::Accepted,
        Some(new_match.id.as_str()),
        now,
    )?;
    if changed == 0 {
        // Dropping `tx` rolls the match insert back.
        return Err(AppError::not_found("Match request", request_id));
    }
    if let Some(reverse) =
        requests::find_pending_request(&tx, &request.target_id, &request.requester_id)?
    {
        requests::update_request_status(
            &tx,
            &reverse.id,
            RequestStatus::Accepted,
            Some(new_match.id.as_str()),
            now,
        )?;
        debug!(
            "Reverse request {} settled by match {}",
            reverse.id, new_match.id
        );
    }
    tx.commit()?;

    info!(
        "Match request {} accepted, match {} connected",
        request.id, new_match.id
    );
    Ok(new_match)
}

pub fn reject_match_request(conn: &Connection, request_id: &str) -> AppResult<MatchRequest> {
    let mut request = pending_request(conn, request_id, "reject")?;
    let now = now_ms();
    requests::update_request_status(conn, &request.id, RequestStatus::Rejected, None, now)?;

    request.status = RequestStatus::Rejected;
    request.updated_at = now;
    info!("Match request {} rejected", request.id);
    Ok(request)
}

pub fn mark_request_read(conn: &Connection, request_id: &str) -> AppResult<()> {
    if requests::mark_read(conn, request_id, now_ms())? == 0 {
        return Err(AppError::not_found("Match request", request_id));
    }
    Ok(())
}

// --- Matches ---

/// Creates a bare `pending` match between two users.
pub fn create_match(conn: &Connection, user_a: &str, user_b: &str) -> AppResult<Match> {
    if user_a == user_b {
        return Err(AppError::validation("a match needs two different users"));
    }
    let now = now_ms();
    let m = Match {
        id: Uuid::new_v4().to_string(),
        users: [user_a.to_string(), user_b.to_string()],
        status: MatchStatus::Pending,
        session_mode: None,
        last_session_at: None,
        total_sessions: 0,
        created_at: now,
        updated_at: now,
    };
    matches::insert_match(conn, &m)?;
    debug!("Match {} created between {} and {}", m.id, user_a, user_b);
    Ok(m)
}

pub fn get_match(conn: &Connection, match_id: &str) -> AppResult<Match> {
    matches::get_match(conn, match_id)?.ok_or_else(|| AppError::not_found("Match", match_id))
}

pub fn list_matches(conn: &Connection, user_id: &str) -> AppResult<Vec<Match>> {
    Ok(matches::list_matches_for_user(conn, user_id)?)
}

fn status_rank(status: MatchStatus) -> u8 {
    match status {
        MatchStatus::Pending => 0,
        MatchStatus::Accepted | MatchStatus::Connected => 1,
        MatchStatus::InSession => 2,
    }
}

/// Sets a status directly. Accepting a match stores it as `connected`.
/// Status only moves forward; leaving a session goes through
/// [`end_learning_session`].
pub fn update_match_status(
    conn: &Connection,
    match_id: &str,
    status: MatchStatus,
) -> AppResult<MatchStatus> {
    let stored = match status {
        MatchStatus::Accepted => MatchStatus::Connected,
        other => other,
    };
    let current = get_match(conn, match_id)?.status;
    if status_rank(stored) < status_rank(current) {
        warn!(
            "Refusing to move match {} from {} back to {}",
            match_id, current, stored
        );
        return Err(AppError::InvalidTransition {
            entity: "match",
            action: "move back",
            state: current.to_string(),
        });
    }
    if matches::update_match_status(conn, match_id, stored, now_ms())? == 0 {
        return Err(AppError::not_found("Match", match_id));
    }
    Ok(stored)
}

// --- Learning sessions ---

pub fn start_learning_session(
    conn: &Connection,
    match_id: &str,
    mode: SessionMode,
) -> AppResult<Match> {
    let mut m = get_match(conn, match_id)?;
    if !matches!(m.status, MatchStatus::Accepted | MatchStatus::Connected) {
        return Err(AppError::InvalidTransition {
            entity: "match",
            action: "start a session on",
            state: m.status.to_string(),
        });
    }

    let now = now_ms();
    m.status = MatchStatus::InSession;
    m.session_mode = Some(mode);
    m.last_session_at = Some(now);
    m.total_sessions += 1;
    m.updated_at = now;
    matches::save_session_state(conn, &m)?;

    info!(
        "Session #{} ({}) started on match {}",
        m.total_sessions, mode, m.id
    );
    Ok(m)
}

pub fn end_learning_session(conn: &Connection, match_id: &str) -> AppResult<Match> {
    let mut m = get_match(conn, match_id)?;
    if m.status != MatchStatus::InSession {
        return Err(AppError::InvalidTransition {
            entity: "match",
            action: "end a session on",
            state: m.status.to_string(),
        });
    }

    m.status = MatchStatus::Connected;
    m.updated_at = now_ms();
    matches::save_session_state(conn, &m)?;

    info!("Session ended on match {}", m.id);
    Ok(m)
}
