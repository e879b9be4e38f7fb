use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use cricket_server_domain::{
    MatchId, PlayerId, ServiceResult,
    stats::{PlayerCareerStats, PlayerMatchStatistic, StatisticsRepository},
};

use crate::{parse_uuid, store_err};

pub struct SqliteStatisticsRepository {
    pool: Pool<Sqlite>,
}

impl SqliteStatisticsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn statistic_from_row(row: &SqliteRow) -> ServiceResult<PlayerMatchStatistic> {
        let match_id: String = row.try_get("match_id").map_err(store_err)?;
        let player_id: String = row.try_get("player_id").map_err(store_err)?;
        let runs_scored: i64 = row.try_get("runs_scored").map_err(store_err)?;
        let balls_faced: i64 = row.try_get("balls_faced").map_err(store_err)?;
        let fours: i64 = row.try_get("fours").map_err(store_err)?;
        let sixes: i64 = row.try_get("sixes").map_err(store_err)?;
        let runs_conceded: i64 = row.try_get("runs_conceded").map_err(store_err)?;
        let maidens: i64 = row.try_get("maidens").map_err(store_err)?;
        let wickets_taken: i64 = row.try_get("wickets_taken").map_err(store_err)?;
        let catches: i64 = row.try_get("catches").map_err(store_err)?;
        let stumpings: i64 = row.try_get("stumpings").map_err(store_err)?;

        Ok(PlayerMatchStatistic {
            match_id: MatchId(parse_uuid("match_id", &match_id)?),
            player_id: PlayerId(parse_uuid("player_id", &player_id)?),
            runs_scored: runs_scored as u32,
            balls_faced: balls_faced as u32,
            fours: fours as u32,
            sixes: sixes as u32,
            overs_bowled: row.try_get("overs_bowled").map_err(store_err)?,
            runs_conceded: runs_conceded as u32,
            maidens: maidens as u32,
            wickets_taken: wickets_taken as u32,
            catches: catches as u32,
            stumpings: stumpings as u32,
            batting_status: row.try_get("batting_status").map_err(store_err)?,
        })
    }

    fn career_stats_from_row(row: &SqliteRow) -> ServiceResult<PlayerCareerStats> {
        let player_id: String = row.try_get("player_id").map_err(store_err)?;
        let matches_played: i64 = row.try_get("matches_played").map_err(store_err)?;
        let total_runs: i64 = row.try_get("total_runs").map_err(store_err)?;
        let highest_score: i64 = row.try_get("highest_score").map_err(store_err)?;
        let total_balls_faced: i64 = row.try_get("total_balls_faced").map_err(store_err)?;
        let number_of_4s: i64 = row.try_get("number_of_4s").map_err(store_err)?;
        let number_of_6s: i64 = row.try_get("number_of_6s").map_err(store_err)?;
        let total_wickets: i64 = row.try_get("total_wickets").map_err(store_err)?;
        let total_runs_conceded: i64 = row.try_get("total_runs_conceded").map_err(store_err)?;
        let number_of_man_of_the_match: i64 =
            row.try_get("number_of_man_of_the_match").map_err(store_err)?;

        Ok(PlayerCareerStats {
            player_id: PlayerId(parse_uuid("player_id", &player_id)?),
            matches_played: matches_played as u32,
            total_runs: total_runs as u32,
            highest_score: highest_score as u32,
            total_balls_faced: total_balls_faced as u32,
            number_of_4s: number_of_4s as u32,
            number_of_6s: number_of_6s as u32,
            total_wickets: total_wickets as u32,
            total_runs_conceded: total_runs_conceded as u32,
            total_overs_bowled: row.try_get("total_overs_bowled").map_err(store_err)?,
            best_bowling_figures: row.try_get("best_bowling_figures").map_err(store_err)?,
            strike_rate: row.try_get("strike_rate").map_err(store_err)?,
            economy_rate: row.try_get("economy_rate").map_err(store_err)?,
            number_of_man_of_the_match: number_of_man_of_the_match as u32,
        })
    }
}

#[async_trait::async_trait]
impl StatisticsRepository for SqliteStatisticsRepository {
    async fn get_player_match_statistics(
        &self,
        player_id: PlayerId,
    ) -> ServiceResult<Vec<PlayerMatchStatistic>> {
        let rows = sqlx::query("SELECT * FROM player_match_statistics WHERE player_id = ?")
            .bind(player_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        let mut statistics = Vec::with_capacity(rows.len());
        for row in &rows {
            statistics.push(Self::statistic_from_row(row)?);
        }
        Ok(statistics)
    }

    async fn count_man_of_the_match(&self, player_id: PlayerId) -> ServiceResult<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE man_of_the_match = ?")
                .bind(player_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(count as u32)
    }

    async fn get_career_stats(
        &self,
        player_id: PlayerId,
    ) -> ServiceResult<Option<PlayerCareerStats>> {
        let row = sqlx::query("SELECT * FROM player_career_stats WHERE player_id = ?")
            .bind(player_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(|row| Self::career_stats_from_row(&row)).transpose()
    }

    async fn upsert_career_stats(&self, stats: &PlayerCareerStats) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO player_career_stats (player_id, matches_played, total_runs, \
             highest_score, total_balls_faced, number_of_4s, number_of_6s, total_wickets, \
             total_runs_conceded, total_overs_bowled, best_bowling_figures, strike_rate, \
             economy_rate, number_of_man_of_the_match) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(player_id) DO UPDATE SET \
             matches_played = excluded.matches_played, \
             total_runs = excluded.total_runs, \
             highest_score = excluded.highest_score, \
             total_balls_faced = excluded.total_balls_faced, \
             number_of_4s = excluded.number_of_4s, \
             number_of_6s = excluded.number_of_6s, \
             total_wickets = excluded.total_wickets, \
             total_runs_conceded = excluded.total_runs_conceded, \
             total_overs_bowled = excluded.total_overs_bowled, \
             best_bowling_figures = excluded.best_bowling_figures, \
             strike_rate = excluded.strike_rate, \
             economy_rate = excluded.economy_rate, \
             number_of_man_of_the_match = excluded.number_of_man_of_the_match",
        )
        .bind(stats.player_id.to_string())
        .bind(stats.matches_played as i64)
        .bind(stats.total_runs as i64)
        .bind(stats.highest_score as i64)
        .bind(stats.total_balls_faced as i64)
        .bind(stats.number_of_4s as i64)
        .bind(stats.number_of_6s as i64)
        .bind(stats.total_wickets as i64)
        .bind(stats.total_runs_conceded as i64)
        .bind(stats.total_overs_bowled)
        .bind(&stats.best_bowling_figures)
        .bind(stats.strike_rate)
        .bind(stats.economy_rate)
        .bind(stats.number_of_man_of_the_match as i64)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}
