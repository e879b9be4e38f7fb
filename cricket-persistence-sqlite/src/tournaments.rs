use chrono::NaiveDate;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use cricket_server_domain::{
    ServiceError, ServiceResult, TeamId, TournamentId, VenueId,
    tournament::{MatchFormat, Tournament, TournamentRepository, Weightage},
    venue::{Venue, VenueRepository},
};

use crate::{parse_uuid, store_err};

pub struct SqliteTournamentRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTournamentRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn tournament_from_row(row: &SqliteRow, team_ids: Vec<TeamId>) -> ServiceResult<Tournament> {
        let id: String = row.try_get("id").map_err(store_err)?;
        let start_date: String = row.try_get("start_date").map_err(store_err)?;
        let end_date: String = row.try_get("end_date").map_err(store_err)?;
        let format: String = row.try_get("format").map_err(store_err)?;
        let total_matches: i64 = row.try_get("total_matches").map_err(store_err)?;
        let win_points: i64 = row.try_get("win_points").map_err(store_err)?;
        let draw_points: i64 = row.try_get("draw_points").map_err(store_err)?;
        let loss_points: i64 = row.try_get("loss_points").map_err(store_err)?;

        Ok(Tournament {
            id: TournamentId(parse_uuid("id", &id)?),
            name: row.try_get("name").map_err(store_err)?,
            team_ids,
            start_date: parse_date("start_date", &start_date)?,
            end_date: parse_date("end_date", &end_date)?,
            total_matches: total_matches as u32,
            format: MatchFormat::parse(&format)
                .ok_or_else(|| ServiceError::Store(format!("unknown match format {:?}", format)))?,
            weightage: Weightage {
                win_points: win_points as u32,
                draw_points: draw_points as u32,
                loss_points: loss_points as u32,
            },
            sponsor: row.try_get("sponsor").map_err(store_err)?,
        })
    }
}

fn parse_date(column: &str, value: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ServiceError::Store(format!("corrupt date in column {}: {}", column, e)))
}

#[async_trait::async_trait]
impl TournamentRepository for SqliteTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        let row = sqlx::query("SELECT * FROM tournaments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let team_rows = sqlx::query(
            "SELECT team_id FROM tournament_teams WHERE tournament_id = ? ORDER BY position",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        let mut team_ids = Vec::with_capacity(team_rows.len());
        for team_row in &team_rows {
            let team_id: String = team_row.try_get("team_id").map_err(store_err)?;
            team_ids.push(TeamId(parse_uuid("team_id", &team_id)?));
        }

        Self::tournament_from_row(&row, team_ids).map(Some)
    }
}

pub struct SqliteVenueRepository {
    pool: Pool<Sqlite>,
}

impl SqliteVenueRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VenueRepository for SqliteVenueRepository {
    async fn get_venues(&self) -> ServiceResult<Vec<Venue>> {
        let rows = sqlx::query("SELECT * FROM venues ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        let mut venues = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(store_err)?;
            let capacity: i64 = row.try_get("capacity").map_err(store_err)?;
            venues.push(Venue {
                id: VenueId(parse_uuid("id", &id)?),
                name: row.try_get("name").map_err(store_err)?,
                city: row.try_get("city").map_err(store_err)?,
                capacity: capacity as u32,
            });
        }
        Ok(venues)
    }
}
