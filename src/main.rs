// src/main.rs

use clap::{Args, Parser, Subcommand};
use log::{debug, error};
use serde::Serialize;
use serde_json::Value;
use skillswap_lib::config::Config;
use skillswap_lib::models::{CourseDraft, ProfileUpdate, SessionMode, UserProfile};
use skillswap_lib::{
    catalog, chat, connections, database, matcher, profiles, progress, AppResult, AppState,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::PoisonError;

#[derive(Parser)]
#[command(name = "skillswap")]
#[command(
    about = "Skill exchange: profiles, matching, connections and course progress",
    long_about = None
)]
struct Cli {
    /// SQLite database file (overrides SKILLSWAP_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user profiles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Find and list matches
    Match {
        #[command(subcommand)]
        action: MatchAction,
    },
    /// Send and answer match requests
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },
    /// Start and end learning sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Chat within a match
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Author and browse courses
    Course {
        #[command(subcommand)]
        action: CourseAction,
    },
    /// Track course progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
}

#[derive(Args)]
struct ProfileFields {
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Comma separated skills the user can teach
    #[arg(long, value_delimiter = ',')]
    have: Option<Vec<String>>,
    /// Comma separated skills the user wants to learn
    #[arg(long, value_delimiter = ',')]
    want: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum UserAction {
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: ProfileFields,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ProfileFields,
    },
    Show { id: String },
    List,
}

#[derive(Subcommand)]
enum MatchAction {
    /// Rank potential partners for a user
    Find { user: String },
    List { user: String },
}

#[derive(Subcommand)]
enum RequestAction {
    Send { from: String, to: String },
    /// Pending requests addressed to a user
    List { user: String },
    Accept { id: String },
    Reject { id: String },
    Read { id: String },
}

#[derive(Subcommand)]
enum SessionAction {
    Start {
        match_id: String,
        #[arg(long, default_value = "chat")]
        mode: SessionMode,
    },
    End { match_id: String },
}

#[derive(Subcommand)]
enum ChatAction {
    Send {
        match_id: String,
        sender: String,
        body: String,
    },
    Log { match_id: String },
}

#[derive(Subcommand)]
enum CourseAction {
    /// Create or edit a course from a JSON draft file
    Save { instructor: String, file: PathBuf },
    Delete { instructor: String, course: String },
    Show { course: String },
    /// Public courses of every instructor
    List,
    Mine { instructor: String },
    /// Courses of users you are connected with
    Connected { user: String },
}

#[derive(Subcommand)]
enum ProgressAction {
    Complete {
        user: String,
        course: String,
        section: u32,
        lesson: u32,
    },
    Resume {
        user: String,
        course: String,
        section: u32,
        lesson: u32,
    },
    Show {
        user: String,
        #[arg(long)]
        course: Option<String>,
    },
}

fn json<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn run(state: &AppState, command: Commands) -> AppResult<Value> {
    let conn = state.db.lock().unwrap_or_else(PoisonError::into_inner);

    match command {
        Commands::User { action } => match action {
            UserAction::Add { id, name, fields } => {
                let mut profile = UserProfile::new(id, name).with_skills(
                    fields.have.unwrap_or_default(),
                    fields.want.unwrap_or_default(),
                );
                profile.bio = fields.bio.unwrap_or_default();
                profile.location = fields.location.unwrap_or_default();
                json(profiles::create_profile(&conn, profile)?)
            }
            UserAction::Update { id, name, fields } => {
                let update = ProfileUpdate {
                    name,
                    bio: fields.bio,
                    location: fields.location,
                    skills_have: fields.have,
                    skills_to_learn: fields.want,
                };
                json(profiles::update_profile(&conn, &id, update)?)
            }
            UserAction::Show { id } => json(profiles::get_profile(&conn, &id)?),
            UserAction::List => json(profiles::list_profiles(&conn)?),
        },
        Commands::Match { action } => match action {
            MatchAction::Find { user } => json(matcher::find_potential_matches(&conn, &user)?),
            MatchAction::List { user } => json(connections::list_matches(&conn, &user)?),
        },
        Commands::Request { action } => match action {
            RequestAction::Send { from, to } => {
                json(connections::create_match_request(&conn, &from, &to)?)
            }
            RequestAction::List { user } => json(connections::list_pending_requests(&conn, &user)?),
            RequestAction::Accept { id } => json(connections::accept_match_request(&conn, &id)?),
            RequestAction::Reject { id } => json(connections::reject_match_request(&conn, &id)?),
            RequestAction::Read { id } => json(connections::mark_request_read(&conn, &id)?),
        },
        Commands::Session { action } => match action {
            SessionAction::Start { match_id, mode } => {
                json(connections::start_learning_session(&conn, &match_id, mode)?)
            }
            SessionAction::End { match_id } => {
                json(connections::end_learning_session(&conn, &match_id)?)
            }
        },
        Commands::Chat { action } => match action {
            ChatAction::Send { match_id, sender, body } => {
                json(chat::send_message(&conn, &match_id, &sender, &body)?)
            }
            ChatAction::Log { match_id } => json(chat::list_messages(&conn, &match_id)?),
        },
        Commands::Course { action } => match action {
            CourseAction::Save { instructor, file } => {
                let draft: CourseDraft = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
                json(catalog::save_course(&conn, &state.notifier, &instructor, draft)?)
            }
            CourseAction::Delete { instructor, course } => {
                json(catalog::delete_course(&conn, &state.notifier, &instructor, &course)?)
            }
            CourseAction::Show { course } => json(catalog::get_course(&conn, &course)?),
            CourseAction::List => json(catalog::list_public_courses(&conn)?),
            CourseAction::Mine { instructor } => {
                json(catalog::courses_by_instructor(&conn, &instructor)?)
            }
            CourseAction::Connected { user } => json(catalog::connected_courses(&conn, &user)?),
        },
        Commands::Progress { action } => match action {
            ProgressAction::Complete {
                user,
                course,
                section,
                lesson,
            } => json(progress::mark_lesson_complete(&conn, &user, &course, section, lesson)?),
            ProgressAction::Resume {
                user,
                course,
                section,
                lesson,
            } => json(progress::update_course_position(&conn, &user, &course, section, lesson)?),
            ProgressAction::Show { user, course: Some(course) } => {
                json(progress::course_progress(&conn, &user, &course)?)
            }
            ProgressAction::Show { user, course: None } => {
                json(progress::list_progress(&conn, &user)?)
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load().with_db_path(cli.db);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    config.log_summary();

    let conn = match database::open(&config.db_path) {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to open database: {}", e);
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(conn);
    state
        .notifier
        .subscribe(|event| debug!("Course lists should refresh: {:?}", event));

    match run(&state, cli.command) {
        Ok(value) => {
            let out = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", serde_json::json!({ "error": e }));
            ExitCode::FAILURE
        }
    }
}
