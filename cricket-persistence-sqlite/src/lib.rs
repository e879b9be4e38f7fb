use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use cricket_server_domain::{ServiceError, ServiceResult};

pub mod matches;
pub mod standings;
pub mod stats;
pub mod tournaments;

pub fn create_db_pool() -> Pool<Sqlite> {
    let db_path = std::env::var("CRICKET_DB").expect("CRICKET_DB env var not set");

    let conn_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(conn_options)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tournaments (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        total_matches INTEGER NOT NULL,
        format TEXT NOT NULL,
        win_points INTEGER NOT NULL,
        draw_points INTEGER NOT NULL,
        loss_points INTEGER NOT NULL,
        sponsor TEXT
    )",
    "CREATE TABLE IF NOT EXISTS tournament_teams (
        tournament_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        team_id TEXT NOT NULL,
        PRIMARY KEY (tournament_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS venues (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        city TEXT NOT NULL,
        capacity INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS matches (
        id TEXT PRIMARY KEY,
        tournament_id TEXT NOT NULL,
        team1 TEXT NOT NULL,
        team2 TEXT NOT NULL,
        venue_id TEXT NOT NULL,
        scheduled_at TEXT NOT NULL,
        format TEXT NOT NULL,
        toss_winner TEXT,
        winner_id TEXT,
        match_result TEXT,
        man_of_the_match TEXT
    )",
    "CREATE TABLE IF NOT EXISTS match_umpires (
        match_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        PRIMARY KEY (match_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS points_table (
        tournament_id TEXT NOT NULL,
        team_id TEXT NOT NULL,
        matches_won INTEGER NOT NULL,
        matches_lost INTEGER NOT NULL,
        matches_drawn INTEGER NOT NULL,
        no_result_matches INTEGER NOT NULL,
        net_run_rate REAL NOT NULL,
        PRIMARY KEY (tournament_id, team_id)
    )",
    "CREATE TABLE IF NOT EXISTS points_table_matches (
        tournament_id TEXT NOT NULL,
        team_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        match_id TEXT NOT NULL,
        PRIMARY KEY (tournament_id, team_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS player_match_statistics (
        match_id TEXT NOT NULL,
        player_id TEXT NOT NULL,
        runs_scored INTEGER NOT NULL,
        balls_faced INTEGER NOT NULL,
        fours INTEGER NOT NULL,
        sixes INTEGER NOT NULL,
        overs_bowled TEXT NOT NULL,
        runs_conceded INTEGER NOT NULL,
        maidens INTEGER NOT NULL,
        wickets_taken INTEGER NOT NULL,
        catches INTEGER NOT NULL,
        stumpings INTEGER NOT NULL,
        batting_status TEXT NOT NULL,
        PRIMARY KEY (match_id, player_id)
    )",
    "CREATE TABLE IF NOT EXISTS player_career_stats (
        player_id TEXT PRIMARY KEY,
        matches_played INTEGER NOT NULL,
        total_runs INTEGER NOT NULL,
        highest_score INTEGER NOT NULL,
        total_balls_faced INTEGER NOT NULL,
        number_of_4s INTEGER NOT NULL,
        number_of_6s INTEGER NOT NULL,
        total_wickets INTEGER NOT NULL,
        total_runs_conceded INTEGER NOT NULL,
        total_overs_bowled REAL NOT NULL,
        best_bowling_figures TEXT NOT NULL,
        strike_rate REAL NOT NULL,
        economy_rate REAL NOT NULL,
        number_of_man_of_the_match INTEGER NOT NULL
    )",
];

pub async fn init_schema(pool: &Pool<Sqlite>) -> ServiceResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| ServiceError::Store(e.to_string()))?;
    }
    Ok(())
}

pub(crate) fn store_err(e: sqlx::Error) -> ServiceError {
    ServiceError::Store(e.to_string())
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> ServiceResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|e| ServiceError::Store(format!("corrupt uuid in column {}: {}", column, e)))
}
