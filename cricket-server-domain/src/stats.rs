use std::sync::Arc;

use dashmap::DashMap;

use crate::{MatchId, PlayerId, ServiceResult};

/// One player's raw performance in one match. This is input data: it is
/// written by scorekeeping, corrected in place, and never derived.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerMatchStatistic {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub runs_scored: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    /// Decimal text as recorded, e.g. "4.0".
    pub overs_bowled: String,
    pub runs_conceded: u32,
    pub maidens: u32,
    pub wickets_taken: u32,
    pub catches: u32,
    pub stumpings: u32,
    pub batting_status: String,
}

/// Career aggregate, always a pure function of the player's full set of
/// per-match rows plus the man-of-the-match count. Owned exclusively by the
/// aggregator; never patched incrementally.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerCareerStats {
    pub player_id: PlayerId,
    pub matches_played: u32,
    pub total_runs: u32,
    pub highest_score: u32,
    pub total_balls_faced: u32,
    pub number_of_4s: u32,
    pub number_of_6s: u32,
    pub total_wickets: u32,
    pub total_runs_conceded: u32,
    pub total_overs_bowled: f64,
    pub best_bowling_figures: String,
    pub strike_rate: f64,
    pub economy_rate: f64,
    pub number_of_man_of_the_match: u32,
}

#[async_trait::async_trait]
pub trait StatisticsRepository {
    async fn get_player_match_statistics(
        &self,
        player_id: PlayerId,
    ) -> ServiceResult<Vec<PlayerMatchStatistic>>;
    /// Counted against concluded matches, not against the statistic rows.
    async fn count_man_of_the_match(&self, player_id: PlayerId) -> ServiceResult<u32>;
    async fn get_career_stats(&self, player_id: PlayerId)
    -> ServiceResult<Option<PlayerCareerStats>>;
    async fn upsert_career_stats(&self, stats: &PlayerCareerStats) -> ServiceResult<()>;
}

#[async_trait::async_trait]
pub trait CareerStatsService {
    async fn recompute_career_stats(&self, player_id: PlayerId) -> ServiceResult<()>;
}

pub struct CareerStatsServiceImpl<S: StatisticsRepository> {
    statistics_repository: Arc<S>,
}

impl<S: StatisticsRepository> CareerStatsServiceImpl<S> {
    pub fn new(statistics_repository: Arc<S>) -> Self {
        Self {
            statistics_repository,
        }
    }
}

fn round_to_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_overs(player_id: PlayerId, overs: &str) -> f64 {
    match overs.trim().parse::<f64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            log::warn!(
                "unparseable overs value {:?} for player {}, counting as 0.0",
                overs,
                player_id
            );
            0.0
        }
    }
}

/// Folds the full set of raw rows into the career aggregate. Deterministic in
/// the row set, so recomputation is idempotent.
pub fn fold_career_stats(
    player_id: PlayerId,
    rows: &[PlayerMatchStatistic],
    man_of_the_match_count: u32,
) -> PlayerCareerStats {
    let mut total_runs = 0u32;
    let mut highest_score = 0u32;
    let mut total_balls_faced = 0u32;
    let mut number_of_4s = 0u32;
    let mut number_of_6s = 0u32;
    let mut total_wickets = 0u32;
    let mut total_runs_conceded = 0u32;
    let mut total_overs_bowled = 0.0f64;
    let mut best_bowling: Option<(u32, u32)> = None;

    for row in rows {
        total_runs += row.runs_scored;
        highest_score = highest_score.max(row.runs_scored);
        total_balls_faced += row.balls_faced;
        number_of_4s += row.fours;
        number_of_6s += row.sixes;
        total_wickets += row.wickets_taken;
        total_runs_conceded += row.runs_conceded;
        total_overs_bowled += parse_overs(player_id, &row.overs_bowled);

        // Best figures: most wickets, ties broken by fewer runs conceded.
        let candidate = (row.wickets_taken, row.runs_conceded);
        best_bowling = match best_bowling {
            None => Some(candidate),
            Some((wickets, conceded))
                if candidate.0 > wickets || (candidate.0 == wickets && candidate.1 < conceded) =>
            {
                Some(candidate)
            }
            Some(best) => Some(best),
        };
    }

    let strike_rate = if total_balls_faced > 0 {
        round_to_2dp(total_runs as f64 / total_balls_faced as f64 * 100.0)
    } else {
        0.0
    };
    let economy_rate = if total_overs_bowled > 0.0 {
        round_to_2dp(total_runs_conceded as f64 / total_overs_bowled)
    } else {
        0.0
    };
    let best_bowling_figures = match best_bowling {
        Some((wickets, conceded)) => format!("{}/{}", wickets, conceded),
        None => "0/0".to_string(),
    };

    PlayerCareerStats {
        player_id,
        matches_played: rows.len() as u32,
        total_runs,
        highest_score,
        total_balls_faced,
        number_of_4s,
        number_of_6s,
        total_wickets,
        total_runs_conceded,
        total_overs_bowled,
        best_bowling_figures,
        strike_rate,
        economy_rate,
        number_of_man_of_the_match: man_of_the_match_count,
    }
}

#[async_trait::async_trait]
impl<S: StatisticsRepository + Send + Sync + 'static> CareerStatsService
    for CareerStatsServiceImpl<S>
{
    async fn recompute_career_stats(&self, player_id: PlayerId) -> ServiceResult<()> {
        let rows = self
            .statistics_repository
            .get_player_match_statistics(player_id)
            .await?;
        let man_of_the_match_count = self
            .statistics_repository
            .count_man_of_the_match(player_id)
            .await?;

        let stats = fold_career_stats(player_id, &rows, man_of_the_match_count);
        self.statistics_repository
            .upsert_career_stats(&stats)
            .await?;
        log::debug!(
            "recomputed career stats for player {} over {} innings",
            player_id,
            rows.len()
        );
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockStatisticsRepository {
    pub match_statistics: Arc<DashMap<PlayerId, Vec<PlayerMatchStatistic>>>,
    pub man_of_the_match_counts: Arc<DashMap<PlayerId, u32>>,
    pub career_stats: Arc<DashMap<PlayerId, PlayerCareerStats>>,
}

#[allow(unused)]
impl MockStatisticsRepository {
    pub fn add_row(&self, row: PlayerMatchStatistic) {
        self.match_statistics
            .entry(row.player_id)
            .or_default()
            .push(row);
    }

    pub fn get_stored_career_stats(&self, player_id: PlayerId) -> Option<PlayerCareerStats> {
        self.career_stats
            .get(&player_id)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl StatisticsRepository for MockStatisticsRepository {
    async fn get_player_match_statistics(
        &self,
        player_id: PlayerId,
    ) -> ServiceResult<Vec<PlayerMatchStatistic>> {
        Ok(self
            .match_statistics
            .get(&player_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn count_man_of_the_match(&self, player_id: PlayerId) -> ServiceResult<u32> {
        Ok(self
            .man_of_the_match_counts
            .get(&player_id)
            .map(|entry| *entry.value())
            .unwrap_or(0))
    }

    async fn get_career_stats(
        &self,
        player_id: PlayerId,
    ) -> ServiceResult<Option<PlayerCareerStats>> {
        Ok(self
            .career_stats
            .get(&player_id)
            .map(|entry| entry.value().clone()))
    }

    async fn upsert_career_stats(&self, stats: &PlayerCareerStats) -> ServiceResult<()> {
        self.career_stats.insert(stats.player_id, stats.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(player_id: PlayerId) -> PlayerMatchStatistic {
        PlayerMatchStatistic {
            match_id: MatchId::new(),
            player_id,
            runs_scored: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            overs_bowled: "0.0".to_string(),
            runs_conceded: 0,
            maidens: 0,
            wickets_taken: 0,
            catches: 0,
            stumpings: 0,
            batting_status: "Did Not Bat".to_string(),
        }
    }

    fn service() -> (
        CareerStatsServiceImpl<MockStatisticsRepository>,
        MockStatisticsRepository,
    ) {
        let repo = MockStatisticsRepository::default();
        let service = CareerStatsServiceImpl::new(Arc::new(repo.clone()));
        (service, repo)
    }

    #[tokio::test]
    async fn test_recompute_aggregates_all_rows() {
        let (service, repo) = service();
        let player_id = PlayerId(uuid::Uuid::new_v4());

        let mut first = row(player_id);
        first.runs_scored = 50;
        first.balls_faced = 40;
        first.fours = 6;
        first.sixes = 1;
        first.batting_status = "Not Out".to_string();
        repo.add_row(first);

        let mut second = row(player_id);
        second.runs_scored = 12;
        second.balls_faced = 20;
        second.overs_bowled = "4.0".to_string();
        second.runs_conceded = 24;
        second.wickets_taken = 2;
        second.batting_status = "Out".to_string();
        repo.add_row(second);

        repo.man_of_the_match_counts.insert(player_id, 1);

        service
            .recompute_career_stats(player_id)
            .await
            .expect("Failed to recompute career stats");

        let stats = repo
            .get_stored_career_stats(player_id)
            .expect("Career stats should exist");
        assert_eq!(stats.matches_played, 2);
        assert_eq!(stats.total_runs, 62);
        assert_eq!(stats.highest_score, 50);
        assert_eq!(stats.total_balls_faced, 60);
        assert_eq!(stats.number_of_4s, 6);
        assert_eq!(stats.number_of_6s, 1);
        assert_eq!(stats.total_wickets, 2);
        assert_eq!(stats.total_runs_conceded, 24);
        assert_eq!(stats.total_overs_bowled, 4.0);
        assert_eq!(stats.best_bowling_figures, "2/24");
        assert_eq!(stats.strike_rate, 103.33);
        assert_eq!(stats.economy_rate, 6.0);
        assert_eq!(stats.number_of_man_of_the_match, 1);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (service, repo) = service();
        let player_id = PlayerId(uuid::Uuid::new_v4());

        let mut performance = row(player_id);
        performance.runs_scored = 34;
        performance.balls_faced = 29;
        performance.overs_bowled = "3.0".to_string();
        performance.runs_conceded = 17;
        performance.wickets_taken = 1;
        repo.add_row(performance);

        service
            .recompute_career_stats(player_id)
            .await
            .expect("Failed to recompute career stats");
        let first = repo.get_stored_career_stats(player_id).unwrap();

        service
            .recompute_career_stats(player_id)
            .await
            .expect("Failed to recompute career stats");
        let second = repo.get_stored_career_stats(player_id).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_best_bowling_tie_break() {
        let player_id = PlayerId(uuid::Uuid::new_v4());
        let mut first = row(player_id);
        first.wickets_taken = 2;
        first.runs_conceded = 30;
        let mut second = row(player_id);
        second.wickets_taken = 3;
        second.runs_conceded = 20;

        let stats = fold_career_stats(player_id, &[first, second], 0);
        assert_eq!(stats.best_bowling_figures, "3/20");

        let mut third = row(player_id);
        third.wickets_taken = 3;
        third.runs_conceded = 35;
        let mut fourth = row(player_id);
        fourth.wickets_taken = 3;
        fourth.runs_conceded = 15;
        let stats = fold_career_stats(player_id, &[third, fourth], 0);
        assert_eq!(stats.best_bowling_figures, "3/15");
    }

    #[test]
    fn test_strike_rate() {
        let player_id = PlayerId(uuid::Uuid::new_v4());
        let mut scored = row(player_id);
        scored.runs_scored = 50;
        scored.balls_faced = 40;
        let stats = fold_career_stats(player_id, &[scored], 0);
        assert_eq!(stats.strike_rate, 125.0);

        let mut unfaced = row(player_id);
        unfaced.runs_scored = 0;
        unfaced.balls_faced = 0;
        let stats = fold_career_stats(player_id, &[unfaced], 0);
        assert_eq!(stats.strike_rate, 0.0);
    }

    #[test]
    fn test_economy_rate() {
        let player_id = PlayerId(uuid::Uuid::new_v4());
        let mut bowled = row(player_id);
        bowled.overs_bowled = "4.0".to_string();
        bowled.runs_conceded = 24;
        let stats = fold_career_stats(player_id, &[bowled], 0);
        assert_eq!(stats.economy_rate, 6.0);

        let unbowled = row(player_id);
        let stats = fold_career_stats(player_id, &[unbowled], 0);
        assert_eq!(stats.economy_rate, 0.0);
    }

    #[test]
    fn test_empty_history_defaults() {
        let player_id = PlayerId(uuid::Uuid::new_v4());
        let stats = fold_career_stats(player_id, &[], 0);
        assert_eq!(stats.matches_played, 0);
        assert_eq!(stats.highest_score, 0);
        assert_eq!(stats.best_bowling_figures, "0/0");
        assert_eq!(stats.strike_rate, 0.0);
        assert_eq!(stats.economy_rate, 0.0);
    }

    #[test]
    fn test_unparseable_overs_count_as_zero() {
        let player_id = PlayerId(uuid::Uuid::new_v4());
        let mut corrupt = row(player_id);
        corrupt.overs_bowled = "four".to_string();
        corrupt.runs_conceded = 12;
        let mut clean = row(player_id);
        clean.overs_bowled = "2.0".to_string();
        clean.runs_conceded = 10;

        let stats = fold_career_stats(player_id, &[corrupt, clean], 0);
        assert_eq!(stats.total_overs_bowled, 2.0);
        assert_eq!(stats.economy_rate, 11.0);
    }
}
