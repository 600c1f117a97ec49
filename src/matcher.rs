// src/matcher.rs

use crate::error::{AppError, AppResult};
use crate::models::{PotentialMatch, UserProfile};
use crate::repository::{matches, requests, users};
use log::{debug, info};
use rusqlite::Connection;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

// --- Public Interface ---

/// Ranked partners for `user_id`: people who can teach what the user wants
/// and/or want what the user can teach.
pub fn find_potential_matches(conn: &Connection, user_id: &str) -> AppResult<Vec<PotentialMatch>> {
    let current = users::get_user(conn, user_id)?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    if current.skills_have.is_empty() || current.skills_to_learn.is_empty() {
        debug!("User {} has an empty skill list, nothing to match", user_id);
        return Ok(Vec::new());
    }

    let excluded = already_contacted(conn, user_id)?;
    debug!("Excluding {} already contacted users", excluded.len());

    let everyone = users::list_users(conn)?;
    let ranked = rank_candidates(&current, &everyone, &excluded);

    info!("Found {} potential matches for {}", ranked.len(), user_id);
    Ok(ranked)
}

/// Everyone sharing a match (any status) or a pending request with the user.
pub fn already_contacted(conn: &Connection, user_id: &str) -> AppResult<HashSet<String>> {
    let mut ids = HashSet::new();

    for m in matches::list_matches_for_user(conn, user_id)? {
        if let Some(partner) = m.partner_of(user_id) {
            ids.insert(partner.to_string());
        }
    }
    for r in requests::list_pending_involving(conn, user_id)? {
        let other = if r.requester_id == user_id { r.target_id } else { r.requester_id };
        ids.insert(other);
    }

    Ok(ids)
}

/// Scores every eligible user against `current` and sorts best first.
///
/// Equal scores go to the more recently created profile, then the lower id.
pub fn rank_candidates(
    current: &UserProfile,
    users: &[UserProfile],
    excluded: &HashSet<String>,
) -> Vec<PotentialMatch> {
    if current.skills_have.is_empty() || current.skills_to_learn.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<PotentialMatch> = users
        .iter()
        .filter(|u| u.id != current.id && !excluded.contains(&u.id))
        .filter_map(|candidate| {
            let common_skills_have =
                intersect(&candidate.skills_have, &current.skills_to_learn);
            let common_skills_to_learn =
                intersect(&candidate.skills_to_learn, &current.skills_have);

            if common_skills_have.is_empty() && common_skills_to_learn.is_empty() {
                return None;
            }

            Some(PotentialMatch {
                match_score: common_skills_have.len() + common_skills_to_learn.len(),
                candidate: candidate.clone(),
                common_skills_have,
                common_skills_to_learn,
            })
        })
        .collect();

    found.sort_by(|a, b| {
        let key = |m: &PotentialMatch| (Reverse(m.match_score), Reverse(m.candidate.created_at));
        key(a)
            .cmp(&key(b))
            .then_with(|| a.candidate.id.cmp(&b.candidate.id))
    });
    found
}

fn intersect(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
    a.intersection(b).cloned().collect()
}
