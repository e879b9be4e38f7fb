use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use cricket_server_domain::{
    MatchId, PlayerId, ServiceError, ServiceResult, TeamId, TournamentId, VenueId,
    r#match::{Match, MatchOutcome, MatchRepository},
    tournament::MatchFormat,
};

use crate::{parse_uuid, store_err};

pub struct SqliteMatchRepository {
    pool: Pool<Sqlite>,
}

impl SqliteMatchRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn match_from_row(row: &SqliteRow, umpires: Vec<String>) -> ServiceResult<Match> {
        let id: String = row.try_get("id").map_err(store_err)?;
        let tournament_id: String = row.try_get("tournament_id").map_err(store_err)?;
        let team1: String = row.try_get("team1").map_err(store_err)?;
        let team2: String = row.try_get("team2").map_err(store_err)?;
        let venue_id: String = row.try_get("venue_id").map_err(store_err)?;
        let scheduled_at: String = row.try_get("scheduled_at").map_err(store_err)?;
        let format: String = row.try_get("format").map_err(store_err)?;
        let toss_winner: Option<String> = row.try_get("toss_winner").map_err(store_err)?;
        let winner_id: Option<String> = row.try_get("winner_id").map_err(store_err)?;
        let man_of_the_match: Option<String> = row.try_get("man_of_the_match").map_err(store_err)?;

        Ok(Match {
            id: MatchId(parse_uuid("id", &id)?),
            tournament_id: TournamentId(parse_uuid("tournament_id", &tournament_id)?),
            team1: TeamId(parse_uuid("team1", &team1)?),
            team2: TeamId(parse_uuid("team2", &team2)?),
            venue_id: VenueId(parse_uuid("venue_id", &venue_id)?),
            scheduled_at: parse_timestamp(&scheduled_at)?,
            format: MatchFormat::parse(&format)
                .ok_or_else(|| ServiceError::Store(format!("unknown match format {:?}", format)))?,
            toss_winner: toss_winner
                .map(|t| parse_uuid("toss_winner", &t).map(TeamId))
                .transpose()?,
            umpires,
            winner_id: winner_id
                .map(|w| parse_uuid("winner_id", &w).map(TeamId))
                .transpose()?,
            match_result: row.try_get("match_result").map_err(store_err)?,
            man_of_the_match_id: man_of_the_match
                .map(|m| parse_uuid("man_of_the_match", &m).map(PlayerId))
                .transpose()?,
        })
    }
}

fn parse_timestamp(value: &str) -> ServiceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ServiceError::Store(format!("corrupt timestamp: {}", e)))
}

#[async_trait::async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn insert_match(&self, r#match: &Match) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO matches (id, tournament_id, team1, team2, venue_id, scheduled_at, \
             format, toss_winner, winner_id, match_result, man_of_the_match) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(r#match.id.to_string())
        .bind(r#match.tournament_id.to_string())
        .bind(r#match.team1.to_string())
        .bind(r#match.team2.to_string())
        .bind(r#match.venue_id.to_string())
        .bind(r#match.scheduled_at.to_rfc3339())
        .bind(r#match.format.to_string())
        .bind(r#match.toss_winner.map(|t| t.to_string()))
        .bind(r#match.winner_id.map(|w| w.to_string()))
        .bind(r#match.match_result.clone())
        .bind(r#match.man_of_the_match_id.map(|m| m.to_string()))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        for (position, name) in r#match.umpires.iter().enumerate() {
            sqlx::query("INSERT INTO match_umpires (match_id, position, name) VALUES (?, ?, ?)")
                .bind(r#match.id.to_string())
                .bind(position as i64)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let umpire_rows =
            sqlx::query("SELECT name FROM match_umpires WHERE match_id = ? ORDER BY position")
                .bind(id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;
        let mut umpires = Vec::with_capacity(umpire_rows.len());
        for umpire_row in &umpire_rows {
            umpires.push(umpire_row.try_get("name").map_err(store_err)?);
        }

        Self::match_from_row(&row, umpires).map(Some)
    }

    async fn update_match_outcome(&self, id: MatchId, outcome: &MatchOutcome) -> ServiceResult<()> {
        let result = sqlx::query(
            "UPDATE matches SET winner_id = ?, match_result = ?, man_of_the_match = ? WHERE id = ?",
        )
        .bind(outcome.winner_id.map(|w| w.to_string()))
        .bind(&outcome.match_result)
        .bind(outcome.man_of_the_match_id.map(|m| m.to_string()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return ServiceError::not_found(format!("match {} does not exist", id));
        }
        Ok(())
    }
}
