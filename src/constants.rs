// src/constants.rs

// --- Configuration ---
pub const ENV_DB_PATH: &str = "SKILLSWAP_DB_PATH";
pub const ENV_LOG_FILTER: &str = "SKILLSWAP_LOG";
pub const DEFAULT_DB_FILE: &str = "skillswap.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

// --- Skills ---
pub const SKILL_KIND_HAVE: &str = "have";
pub const SKILL_KIND_LEARN: &str = "learn";

// --- Progress ---
pub const PERCENT_MAX: u32 = 100;
// Completion check treats a missing lesson count as a one-lesson course.
pub const FALLBACK_TOTAL_LESSONS: i64 = 1;

// --- Chat ---
pub const MESSAGE_KIND_TEXT: &str = "text";
pub const MESSAGE_MAX_CHARS: usize = 4000;
