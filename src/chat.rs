// src/chat.rs

use crate::constants::{MESSAGE_KIND_TEXT, MESSAGE_MAX_CHARS};
use crate::error::{AppError, AppResult};
use crate::models::{now_ms, Message};
use crate::repository::{matches, messages};
use log::debug;
use rusqlite::Connection;
use uuid::Uuid;

pub fn send_message(
    conn: &Connection,
    match_id: &str,
    sender_id: &str,
    body: &str,
) -> AppResult<Message> {
    let m = matches::get_match(conn, match_id)?
        .ok_or_else(|| AppError::not_found("Match", match_id))?;
    if !m.involves(sender_id) {
        return Err(AppError::validation(format!("{sender_id} is not part of match {match_id}")));
    }

    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::validation("message is empty"));
    }
    if body.chars().count() > MESSAGE_MAX_CHARS {
        return Err(AppError::validation(format!(
            "message exceeds {MESSAGE_MAX_CHARS} characters"
        )));
    }

    let msg = Message {
        id: Uuid::new_v4().to_string(),
        match_id: m.id,
        sender_id: sender_id.to_string(),
        body: body.to_string(),
        kind: MESSAGE_KIND_TEXT.to_string(),
        sent_at: now_ms(),
    };
    messages::insert_message(conn, &msg)?;
    debug!("Message {} sent on match {}", msg.id, msg.match_id);
    Ok(msg)
}

pub fn list_messages(conn: &Connection, match_id: &str) -> AppResult<Vec<Message>> {
    if matches::get_match(conn, match_id)?.is_none() {
        return Err(AppError::not_found("Match", match_id));
    }
    Ok(messages::list_messages(conn, match_id)?)
}
