use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use cricket_server_domain::{
    MatchId, ServiceResult, TeamId, TournamentId,
    standings::{PointsTableEntry, PointsTableRepository},
};

use crate::{parse_uuid, store_err};

pub struct SqlitePointsTableRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePointsTableRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn entry_from_row(row: &SqliteRow, matches_played: Vec<MatchId>) -> ServiceResult<PointsTableEntry> {
        let tournament_id: String = row.try_get("tournament_id").map_err(store_err)?;
        let team_id: String = row.try_get("team_id").map_err(store_err)?;
        let matches_won: i64 = row.try_get("matches_won").map_err(store_err)?;
        let matches_lost: i64 = row.try_get("matches_lost").map_err(store_err)?;
        let matches_drawn: i64 = row.try_get("matches_drawn").map_err(store_err)?;
        let no_result_matches: i64 = row.try_get("no_result_matches").map_err(store_err)?;

        Ok(PointsTableEntry {
            tournament_id: TournamentId(parse_uuid("tournament_id", &tournament_id)?),
            team_id: TeamId(parse_uuid("team_id", &team_id)?),
            matches_played,
            matches_won: matches_won as u32,
            matches_lost: matches_lost as u32,
            matches_drawn: matches_drawn as u32,
            no_result_matches: no_result_matches as u32,
            net_run_rate: row.try_get("net_run_rate").map_err(store_err)?,
        })
    }

    async fn get_matches_played(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> ServiceResult<Vec<MatchId>> {
        let rows = sqlx::query(
            "SELECT match_id FROM points_table_matches \
             WHERE tournament_id = ? AND team_id = ? ORDER BY position",
        )
        .bind(tournament_id.to_string())
        .bind(team_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut matches_played = Vec::with_capacity(rows.len());
        for row in &rows {
            let match_id: String = row.try_get("match_id").map_err(store_err)?;
            matches_played.push(MatchId(parse_uuid("match_id", &match_id)?));
        }
        Ok(matches_played)
    }

    async fn replace_matches_played(&self, entry: &PointsTableEntry) -> ServiceResult<()> {
        sqlx::query("DELETE FROM points_table_matches WHERE tournament_id = ? AND team_id = ?")
            .bind(entry.tournament_id.to_string())
            .bind(entry.team_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        for (position, match_id) in entry.matches_played.iter().enumerate() {
            sqlx::query(
                "INSERT INTO points_table_matches (tournament_id, team_id, position, match_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(entry.tournament_id.to_string())
            .bind(entry.team_id.to_string())
            .bind(position as i64)
            .bind(match_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PointsTableRepository for SqlitePointsTableRepository {
    async fn get_entry(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> ServiceResult<Option<PointsTableEntry>> {
        let row = sqlx::query("SELECT * FROM points_table WHERE tournament_id = ? AND team_id = ?")
            .bind(tournament_id.to_string())
            .bind(team_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let matches_played = self.get_matches_played(tournament_id, team_id).await?;
        Self::entry_from_row(&row, matches_played).map(Some)
    }

    async fn insert_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO points_table (tournament_id, team_id, matches_won, matches_lost, \
             matches_drawn, no_result_matches, net_run_rate) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.tournament_id.to_string())
        .bind(entry.team_id.to_string())
        .bind(entry.matches_won as i64)
        .bind(entry.matches_lost as i64)
        .bind(entry.matches_drawn as i64)
        .bind(entry.no_result_matches as i64)
        .bind(entry.net_run_rate)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        self.replace_matches_played(entry).await
    }

    async fn update_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE points_table SET matches_won = ?, matches_lost = ?, matches_drawn = ?, \
             no_result_matches = ?, net_run_rate = ? WHERE tournament_id = ? AND team_id = ?",
        )
        .bind(entry.matches_won as i64)
        .bind(entry.matches_lost as i64)
        .bind(entry.matches_drawn as i64)
        .bind(entry.no_result_matches as i64)
        .bind(entry.net_run_rate)
        .bind(entry.tournament_id.to_string())
        .bind(entry.team_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        self.replace_matches_played(entry).await
    }

    async fn get_entries(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PointsTableEntry>> {
        let rows = sqlx::query("SELECT * FROM points_table WHERE tournament_id = ?")
            .bind(tournament_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let team_id: String = row.try_get("team_id").map_err(store_err)?;
            let team_id = TeamId(parse_uuid("team_id", &team_id)?);
            let matches_played = self.get_matches_played(tournament_id, team_id).await?;
            entries.push(Self::entry_from_row(row, matches_played)?);
        }
        Ok(entries)
    }
}
