// src/repository/users.rs

use crate::constants::{SKILL_KIND_HAVE, SKILL_KIND_LEARN};
use crate::models::UserProfile;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::collections::{BTreeSet, HashMap};

fn profile_from_row(row: &Row<'_>) -> Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        bio: row.get(2)?,
        location: row.get(3)?,
        skills_have: BTreeSet::new(),
        skills_to_learn: BTreeSet::new(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Inserts the profile row and its skills. Callers wanting atomicity pass a transaction.
pub fn insert_user(conn: &Connection, user: &UserProfile) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, bio, location, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            user.id,
            user.name,
            user.bio,
            user.location,
            user.created_at,
            user.updated_at
        ],
    )?;
    replace_skills(conn, &user.id, SKILL_KIND_HAVE, &user.skills_have)?;
    replace_skills(conn, &user.id, SKILL_KIND_LEARN, &user.skills_to_learn)?;
    Ok(())
}

/// Overwrites every stored field of an existing profile. Returns rows touched.
pub fn update_user(conn: &Connection, user: &UserProfile) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE users SET name = ?, bio = ?, location = ?, updated_at = ? WHERE id = ?",
        params![user.name, user.bio, user.location, user.updated_at, user.id],
    )?;
    if changed > 0 {
        replace_skills(conn, &user.id, SKILL_KIND_HAVE, &user.skills_have)?;
        replace_skills(conn, &user.id, SKILL_KIND_LEARN, &user.skills_to_learn)?;
    }
    Ok(changed)
}

fn replace_skills(
    conn: &Connection,
    user_id: &str,
    kind: &str,
    skills: &BTreeSet<String>,
) -> Result<()> {
    conn.execute(
        "DELETE FROM user_skills WHERE user_id = ? AND kind = ?",
        params![user_id, kind],
    )?;
    let mut stmt = conn.prepare("INSERT INTO user_skills (user_id, kind, skill) VALUES (?, ?, ?)")?;
    for skill in skills {
        stmt.execute(params![user_id, kind, skill])?;
    }
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    let user = conn
        .query_row(
            "SELECT id, name, bio, location, created_at, updated_at FROM users WHERE id = ?",
            [user_id],
            profile_from_row,
        )
        .optional()?;

    let Some(mut user) = user else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT kind, skill FROM user_skills WHERE user_id = ?")?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (kind, skill) = row?;
        push_skill(&mut user, &kind, skill);
    }
    Ok(Some(user))
}

pub fn user_exists(conn: &Connection, user_id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)",
        [user_id],
        |r| r.get(0),
    )
}

/// All profiles, newest first. Skills are loaded in one extra query rather than per user.
pub fn list_users(conn: &Connection) -> Result<Vec<UserProfile>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, bio, location, created_at, updated_at
         FROM users
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let mut users = stmt
        .query_map([], profile_from_row)?
        .collect::<Result<Vec<_>>>()?;

    let index: HashMap<String, usize> = users
        .iter()
        .enumerate()
        .map(|(i, u)| (u.id.clone(), i))
        .collect();

    let mut stmt = conn.prepare("SELECT user_id, kind, skill FROM user_skills")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (user_id, kind, skill) = row?;
        if let Some(&i) = index.get(&user_id) {
            push_skill(&mut users[i], &kind, skill);
        }
    }

    debug!("[DB] Loaded {} user profiles", users.len());
    Ok(users)
}

fn push_skill(user: &mut UserProfile, kind: &str, skill: String) {
    match kind {
        SKILL_KIND_HAVE => {
            user.skills_have.insert(skill);
        }
        SKILL_KIND_LEARN => {
            user.skills_to_learn.insert(skill);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    #[test]
    fn insert_then_get_restores_skills() {
        let conn = open_in_memory().unwrap();
        let mut user =
            UserProfile::new("alice", "Alice").with_skills(["python"], ["guitar", "chess"]);
        user.created_at = 10;
        insert_user(&conn, &user).unwrap();

        let loaded = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(loaded, user);
        assert!(user_exists(&conn, "alice").unwrap());
        assert!(get_user(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn update_replaces_skill_sets() {
        let conn = open_in_memory().unwrap();
        let user = UserProfile::new("alice", "Alice").with_skills(["python"], ["guitar"]);
        insert_user(&conn, &user).unwrap();

        let edited =
            UserProfile::new("alice", "Alice B").with_skills(["rust"], Vec::<String>::new());
        assert_eq!(update_user(&conn, &edited).unwrap(), 1);

        let loaded = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(loaded.name, "Alice B");
        assert_eq!(loaded.skills_have.iter().collect::<Vec<_>>(), vec!["rust"]);
        assert!(loaded.skills_to_learn.is_empty());

        let ghost = UserProfile::new("ghost", "Ghost");
        assert_eq!(update_user(&conn, &ghost).unwrap(), 0);
    }

    #[test]
    fn list_users_is_newest_first() {
        let conn = open_in_memory().unwrap();
        for (id, ts) in [("a", 1), ("b", 3), ("c", 2)] {
            let mut u = UserProfile::new(id, id).with_skills([id], Vec::<String>::new());
            u.created_at = ts;
            insert_user(&conn, &u).unwrap();
        }
        let users = list_users(&conn).unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(users[0].skills_have.contains("b"));
    }
}
