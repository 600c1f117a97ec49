// src/repository/messages.rs

use crate::models::Message;
use rusqlite::{params, Connection, Result};

pub fn insert_message(conn: &Connection, msg: &Message) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, match_id, sender_id, body, kind, sent_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            msg.id,
            msg.match_id,
            msg.sender_id,
            msg.body,
            msg.kind,
            msg.sent_at
        ],
    )?;
    Ok(())
}

/// Messages of one match in the order they were sent.
pub fn list_messages(conn: &Connection, match_id: &str) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, match_id, sender_id, body, kind, sent_at
         FROM messages WHERE match_id = ?
         ORDER BY sent_at ASC, rowid ASC",
    )?;
    let messages = stmt
        .query_map([match_id], |row| {
            Ok(Message {
                id: row.get(0)?,
                match_id: row.get(1)?,
                sender_id: row.get(2)?,
                body: row.get(3)?,
                kind: row.get(4)?,
                sent_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(messages)
}
