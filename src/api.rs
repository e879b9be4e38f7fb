use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use log::info;

use cricket_server_domain::{
    MatchId, PlayerId, ServiceError, TeamId, TournamentId,
    fixture::FixtureScheduler,
    r#match::{Match, MatchOutcome, MatchResultService},
    standings::{PointsTableEntry, PointsTableRepository},
    stats::{CareerStatsService, PlayerCareerStats, StatisticsRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub fixture_scheduler: Arc<dyn FixtureScheduler + Send + Sync + 'static>,
    pub match_result_service: Arc<dyn MatchResultService + Send + Sync + 'static>,
    pub career_stats_service: Arc<dyn CareerStatsService + Send + Sync + 'static>,
    pub points_table_repository: Arc<dyn PointsTableRepository + Send + Sync + 'static>,
    pub statistics_repository: Arc<dyn StatisticsRepository + Send + Sync + 'static>,
}

pub async fn run(state: AppState, shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static) {
    let router = Router::new()
        .route("/tournaments/{id}/fixtures", post(generate_fixtures))
        .route("/tournaments/{id}/points-table", get(get_points_table))
        .route("/matches/{id}/conclude", post(conclude_match))
        .route("/players/{id}/recompute-stats", post(recompute_stats))
        .route("/players/{id}/career-stats", get(get_career_stats));

    let port = std::env::var("CRICKET_HTTP_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("CRICKET_HTTP_PORT must be a valid u16");

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .unwrap();

    info!("API server listening on port {}", port);
    axum::serve(listener, router.with_state(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .unwrap();

    info!("HTTP API shut down gracefully");
}

pub struct ApiServiceError(ServiceError);

impl IntoResponse for ApiServiceError {
    fn into_response(self) -> axum::http::Response<axum::body::Body> {
        let (status, msg) = match self.0 {
            ServiceError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            ServiceError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            ServiceError::NoVenuesAvailable => (
                axum::http::StatusCode::CONFLICT,
                "no venues available".to_string(),
            ),
            ServiceError::Store(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = serde_json::json!({ "error": msg });
        (status, axum::Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiServiceError {
    fn from(value: ServiceError) -> Self {
        ApiServiceError(value)
    }
}

fn parse_path_id(id: &str) -> Result<uuid::Uuid, ApiServiceError> {
    uuid::Uuid::parse_str(id)
        .map_err(|_| ApiServiceError(ServiceError::InvalidInput(format!("invalid id {:?}", id))))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonMatch {
    id: String,
    tournament_id: String,
    team1: String,
    team2: String,
    venue_id: String,
    scheduled_at: String,
    format: String,
    winner_id: Option<String>,
    match_result: Option<String>,
    man_of_the_match_id: Option<String>,
}

impl From<Match> for JsonMatch {
    fn from(m: Match) -> Self {
        Self {
            id: m.id.to_string(),
            tournament_id: m.tournament_id.to_string(),
            team1: m.team1.to_string(),
            team2: m.team2.to_string(),
            venue_id: m.venue_id.to_string(),
            scheduled_at: m.scheduled_at.to_rfc3339(),
            format: m.format.to_string(),
            winner_id: m.winner_id.map(|w| w.to_string()),
            match_result: m.match_result,
            man_of_the_match_id: m.man_of_the_match_id.map(|p| p.to_string()),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPointsTableEntry {
    team_id: String,
    matches_played: Vec<String>,
    matches_won: u32,
    matches_lost: u32,
    matches_drawn: u32,
    no_result_matches: u32,
    net_run_rate: f64,
}

impl From<PointsTableEntry> for JsonPointsTableEntry {
    fn from(entry: PointsTableEntry) -> Self {
        Self {
            team_id: entry.team_id.to_string(),
            matches_played: entry
                .matches_played
                .iter()
                .map(|id| id.to_string())
                .collect(),
            matches_won: entry.matches_won,
            matches_lost: entry.matches_lost,
            matches_drawn: entry.matches_drawn,
            no_result_matches: entry.no_result_matches,
            net_run_rate: entry.net_run_rate,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonCareerStats {
    player_id: String,
    matches_played: u32,
    total_runs: u32,
    highest_score: u32,
    total_balls_faced: u32,
    number_of_4s: u32,
    number_of_6s: u32,
    total_wickets: u32,
    total_runs_conceded: u32,
    total_overs_bowled: f64,
    best_bowling_figures: String,
    strike_rate: f64,
    economy_rate: f64,
    number_of_man_of_the_match: u32,
}

impl From<PlayerCareerStats> for JsonCareerStats {
    fn from(stats: PlayerCareerStats) -> Self {
        Self {
            player_id: stats.player_id.to_string(),
            matches_played: stats.matches_played,
            total_runs: stats.total_runs,
            highest_score: stats.highest_score,
            total_balls_faced: stats.total_balls_faced,
            number_of_4s: stats.number_of_4s,
            number_of_6s: stats.number_of_6s,
            total_wickets: stats.total_wickets,
            total_runs_conceded: stats.total_runs_conceded,
            total_overs_bowled: stats.total_overs_bowled,
            best_bowling_figures: stats.best_bowling_figures,
            strike_rate: stats.strike_rate,
            economy_rate: stats.economy_rate,
            number_of_man_of_the_match: stats.number_of_man_of_the_match,
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcludeMatchRequest {
    winner_id: Option<String>,
    match_result: String,
    man_of_the_match_id: Option<String>,
}

async fn generate_fixtures(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<JsonMatch>>, ApiServiceError> {
    let tournament_id = TournamentId(parse_path_id(&id)?);
    let fixtures = state
        .fixture_scheduler
        .generate_fixtures(tournament_id)
        .await?;
    Ok(Json(fixtures.into_iter().map(JsonMatch::from).collect()))
}

async fn conclude_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConcludeMatchRequest>,
) -> Result<(), ApiServiceError> {
    let match_id = MatchId(parse_path_id(&id)?);
    let winner_id = request
        .winner_id
        .as_deref()
        .map(|w| parse_path_id(w).map(TeamId))
        .transpose()?;
    let man_of_the_match_id = request
        .man_of_the_match_id
        .as_deref()
        .map(|p| parse_path_id(p).map(PlayerId))
        .transpose()?;

    state
        .match_result_service
        .conclude_match(
            match_id,
            MatchOutcome {
                winner_id,
                match_result: request.match_result,
                man_of_the_match_id,
            },
        )
        .await?;
    Ok(())
}

async fn recompute_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), ApiServiceError> {
    let player_id = PlayerId(parse_path_id(&id)?);
    state
        .career_stats_service
        .recompute_career_stats(player_id)
        .await?;
    Ok(())
}

async fn get_points_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<JsonPointsTableEntry>>, ApiServiceError> {
    let tournament_id = TournamentId(parse_path_id(&id)?);
    let entries = state
        .points_table_repository
        .get_entries(tournament_id)
        .await?;
    Ok(Json(
        entries.into_iter().map(JsonPointsTableEntry::from).collect(),
    ))
}

async fn get_career_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonCareerStats>, ApiServiceError> {
    let player_id = PlayerId(parse_path_id(&id)?);
    let Some(stats) = state
        .statistics_repository
        .get_career_stats(player_id)
        .await?
    else {
        return Err(ApiServiceError(ServiceError::NotFound(format!(
            "no career stats for player {}",
            player_id
        ))));
    };
    Ok(Json(JsonCareerStats::from(stats)))
}
