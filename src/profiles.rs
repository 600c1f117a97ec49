// src/profiles.rs

use crate::error::{AppError, AppResult};
use crate::models::{normalize_skills, now_ms, ProfileUpdate, UserProfile};
use crate::repository::users;
use log::{debug, info};
use rusqlite::Connection;

pub fn create_profile(conn: &Connection, mut profile: UserProfile) -> AppResult<UserProfile> {
    profile.id = profile.id.trim().to_string();
    profile.name = profile.name.trim().to_string();
    if profile.id.is_empty() {
        return Err(AppError::validation("user id is required"));
    }
    if profile.name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if users::user_exists(conn, &profile.id)? {
        return Err(AppError::validation(format!("user {} already exists", profile.id)));
    }

    profile.skills_have = normalize_skills(&profile.skills_have);
    profile.skills_to_learn = normalize_skills(&profile.skills_to_learn);
    let now = now_ms();
    profile.created_at = now;
    profile.updated_at = now;

    let tx = conn.unchecked_transaction()?;
    users::insert_user(&tx, &profile)?;
    tx.commit()?;

    info!(
        "Created profile {} ({} have, {} to learn)",
        profile.id,
        profile.skills_have.len(),
        profile.skills_to_learn.len()
    );
    Ok(profile)
}

pub fn get_profile(conn: &Connection, user_id: &str) -> AppResult<UserProfile> {
    users::get_user(conn, user_id)?.ok_or_else(|| AppError::not_found("User", user_id))
}

pub fn update_profile(
    conn: &Connection,
    user_id: &str,
    update: ProfileUpdate,
) -> AppResult<UserProfile> {
    let mut profile = get_profile(conn, user_id)?;

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("name cannot be blank"));
        }
        profile.name = name;
    }
    if let Some(bio) = update.bio {
        profile.bio = bio;
    }
    if let Some(location) = update.location {
        profile.location = location;
    }
    if let Some(have) = update.skills_have {
        profile.skills_have = normalize_skills(have);
    }
    if let Some(to_learn) = update.skills_to_learn {
        profile.skills_to_learn = normalize_skills(to_learn);
    }
    profile.updated_at = now_ms();

    let tx = conn.unchecked_transaction()?;
    users::update_user(&tx, &profile)?;
    tx.commit()?;

    debug!("Updated profile {}", profile.id);
    Ok(profile)
}

pub fn list_profiles(conn: &Connection) -> AppResult<Vec<UserProfile>> {
    Ok(users::list_users(conn)?)
}
