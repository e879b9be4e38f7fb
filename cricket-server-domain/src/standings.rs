use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::{MatchId, ServiceResult, TeamId, TournamentId, r#match::Match};

/// One team's aggregate record within a tournament. Owned exclusively by the
/// standings engine; CRUD handlers must never write it directly.
#[derive(Clone, Debug, PartialEq)]
pub struct PointsTableEntry {
    pub tournament_id: TournamentId,
    pub team_id: TeamId,
    /// Match ids counted so far, in processing order. Repeat processing of
    /// the same match appends a duplicate; the engine does not deduplicate.
    pub matches_played: Vec<MatchId>,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub matches_drawn: u32,
    pub no_result_matches: u32,
    pub net_run_rate: f64,
}

impl PointsTableEntry {
    pub fn new(tournament_id: TournamentId, team_id: TeamId) -> Self {
        Self {
            tournament_id,
            team_id,
            matches_played: Vec::new(),
            matches_won: 0,
            matches_lost: 0,
            matches_drawn: 0,
            no_result_matches: 0,
            net_run_rate: 0.0,
        }
    }

    fn record(&mut self, match_id: MatchId, outcome: TeamMatchOutcome) {
        self.matches_played.push(match_id);
        match outcome {
            TeamMatchOutcome::Win => self.matches_won += 1,
            TeamMatchOutcome::Loss => self.matches_lost += 1,
            TeamMatchOutcome::Draw => self.matches_drawn += 1,
            TeamMatchOutcome::NoResult => self.no_result_matches += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamMatchOutcome {
    Win,
    Loss,
    Draw,
    NoResult,
}

impl TeamMatchOutcome {
    /// Classifies a concluded match for one team. Categories are evaluated
    /// in order and the first match wins; any unrecognised result string
    /// falls through to the loss bucket.
    pub fn classify(team_id: TeamId, concluded_match: &Match) -> Self {
        if concluded_match.winner_id == Some(team_id) {
            return TeamMatchOutcome::Win;
        }
        match concluded_match.match_result.as_deref() {
            Some("Draw") => TeamMatchOutcome::Draw,
            Some("No Result") => TeamMatchOutcome::NoResult,
            _ => TeamMatchOutcome::Loss,
        }
    }
}

/// Net run rate is a scoring-rate differential whose formula lives outside
/// this engine; the trait is the seam for plugging a real implementation in.
pub trait NetRunRateCalculator {
    fn net_run_rate(&self, entry: &PointsTableEntry, concluded_match: &Match) -> f64;
}

/// Keeps whatever rate the entry already carries (0.0 from insertion).
pub struct FlatNetRunRate;

impl NetRunRateCalculator for FlatNetRunRate {
    fn net_run_rate(&self, entry: &PointsTableEntry, _concluded_match: &Match) -> f64 {
        entry.net_run_rate
    }
}

#[async_trait::async_trait]
pub trait PointsTableRepository {
    async fn get_entry(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> ServiceResult<Option<PointsTableEntry>>;
    async fn insert_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()>;
    async fn update_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()>;
    async fn get_entries(&self, tournament_id: TournamentId)
    -> ServiceResult<Vec<PointsTableEntry>>;
}

#[async_trait::async_trait]
pub trait StandingsService {
    async fn update_team_points(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
        concluded_match: &Match,
    ) -> ServiceResult<()>;
}

pub struct StandingsServiceImpl<P: PointsTableRepository, C: NetRunRateCalculator> {
    points_repository: Arc<P>,
    run_rate_calculator: Arc<C>,
}

impl<P: PointsTableRepository, C: NetRunRateCalculator> StandingsServiceImpl<P, C> {
    pub fn new(points_repository: Arc<P>, run_rate_calculator: Arc<C>) -> Self {
        Self {
            points_repository,
            run_rate_calculator,
        }
    }
}

#[async_trait::async_trait]
impl<
    P: PointsTableRepository + Send + Sync + 'static,
    C: NetRunRateCalculator + Send + Sync + 'static,
> StandingsService for StandingsServiceImpl<P, C>
{
    async fn update_team_points(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
        concluded_match: &Match,
    ) -> ServiceResult<()> {
        let outcome = TeamMatchOutcome::classify(team_id, concluded_match);
        // Read-check-then-write without a transaction; concurrent calls for
        // the same team can race (see DESIGN.md). Repeat calls for the same
        // match double-count.
        match self
            .points_repository
            .get_entry(tournament_id, team_id)
            .await?
        {
            None => {
                let mut entry = PointsTableEntry::new(tournament_id, team_id);
                entry.record(concluded_match.id, outcome);
                self.points_repository.insert_entry(&entry).await?;
                log::debug!(
                    "created points table entry for team {} in tournament {}",
                    team_id,
                    tournament_id
                );
            }
            Some(mut entry) => {
                entry.record(concluded_match.id, outcome);
                entry.net_run_rate = self.run_rate_calculator.net_run_rate(&entry, concluded_match);
                self.points_repository.update_entry(&entry).await?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockPointsTableRepository {
    pub entries: Arc<DashMap<(TournamentId, TeamId), PointsTableEntry>>,
}

#[async_trait::async_trait]
impl PointsTableRepository for MockPointsTableRepository {
    async fn get_entry(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> ServiceResult<Option<PointsTableEntry>> {
        Ok(self
            .entries
            .get(&(tournament_id, team_id))
            .map(|entry| entry.value().clone()))
    }

    async fn insert_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()> {
        self.entries
            .insert((entry.tournament_id, entry.team_id), entry.clone());
        Ok(())
    }

    async fn update_entry(&self, entry: &PointsTableEntry) -> ServiceResult<()> {
        self.entries
            .insert((entry.tournament_id, entry.team_id), entry.clone());
        Ok(())
    }

    async fn get_entries(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PointsTableEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == tournament_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MockStandingsService {
    pub calls: Arc<Mutex<Vec<(TournamentId, TeamId, MatchId)>>>,
    pub fail_for: Arc<Mutex<Option<TeamId>>>,
}

#[allow(unused)]
impl MockStandingsService {
    pub fn get_calls(&self) -> Vec<(TournamentId, TeamId, MatchId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_for_team(&self, team_id: TeamId) {
        *self.fail_for.lock().unwrap() = Some(team_id);
    }
}

#[async_trait::async_trait]
impl StandingsService for MockStandingsService {
    async fn update_team_points(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
        concluded_match: &Match,
    ) -> ServiceResult<()> {
        if *self.fail_for.lock().unwrap() == Some(team_id) {
            return crate::ServiceError::store("simulated points table write failure");
        }
        self.calls
            .lock()
            .unwrap()
            .push((tournament_id, team_id, concluded_match.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{ServiceError, VenueId, r#match::Match, tournament::MatchFormat};

    use super::*;

    fn concluded_match(
        tournament_id: TournamentId,
        team1: TeamId,
        team2: TeamId,
        winner_id: Option<TeamId>,
        match_result: &str,
    ) -> Match {
        Match {
            id: MatchId::new(),
            tournament_id,
            team1,
            team2,
            venue_id: VenueId(uuid::Uuid::new_v4()),
            scheduled_at: Utc::now(),
            format: MatchFormat::T20,
            toss_winner: None,
            umpires: Vec::new(),
            winner_id,
            match_result: Some(match_result.to_string()),
            man_of_the_match_id: None,
        }
    }

    fn service() -> (
        StandingsServiceImpl<MockPointsTableRepository, FlatNetRunRate>,
        MockPointsTableRepository,
    ) {
        let repo = MockPointsTableRepository::default();
        let service = StandingsServiceImpl::new(Arc::new(repo.clone()), Arc::new(FlatNetRunRate));
        (service, repo)
    }

    #[test]
    fn test_classification_order() {
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team1 = TeamId(uuid::Uuid::new_v4());
        let team2 = TeamId(uuid::Uuid::new_v4());

        let won = concluded_match(tournament_id, team1, team2, Some(team1), "Team 1 won");
        assert_eq!(
            TeamMatchOutcome::classify(team1, &won),
            TeamMatchOutcome::Win
        );
        assert_eq!(
            TeamMatchOutcome::classify(team2, &won),
            TeamMatchOutcome::Loss
        );

        // The winner check runs before the result-string checks.
        let won_draw_text = concluded_match(tournament_id, team1, team2, Some(team1), "Draw");
        assert_eq!(
            TeamMatchOutcome::classify(team1, &won_draw_text),
            TeamMatchOutcome::Win
        );
        assert_eq!(
            TeamMatchOutcome::classify(team2, &won_draw_text),
            TeamMatchOutcome::Draw
        );

        let no_result = concluded_match(tournament_id, team1, team2, None, "No Result");
        assert_eq!(
            TeamMatchOutcome::classify(team1, &no_result),
            TeamMatchOutcome::NoResult
        );

        // Unrecognised result strings land in the loss bucket.
        let garbled = concluded_match(tournament_id, team1, team2, None, "abandoned due to rain");
        assert_eq!(
            TeamMatchOutcome::classify(team1, &garbled),
            TeamMatchOutcome::Loss
        );
    }

    #[tokio::test]
    async fn test_first_match_creates_entry() {
        let (service, repo) = service();
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team1 = TeamId(uuid::Uuid::new_v4());
        let team2 = TeamId(uuid::Uuid::new_v4());
        let m = concluded_match(tournament_id, team1, team2, Some(team1), "Team 1 won");

        service
            .update_team_points(tournament_id, team1, &m)
            .await
            .expect("Failed to update team points");

        let entry = repo
            .get_entry(tournament_id, team1)
            .await
            .unwrap()
            .expect("Entry should exist");
        assert_eq!(entry.matches_played, vec![m.id]);
        assert_eq!(entry.matches_won, 1);
        assert_eq!(entry.matches_lost, 0);
        assert_eq!(entry.matches_drawn, 0);
        assert_eq!(entry.no_result_matches, 0);
        assert_eq!(entry.net_run_rate, 0.0);
    }

    #[tokio::test]
    async fn test_win_loss_draw_sequence() {
        let (service, repo) = service();
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team = TeamId(uuid::Uuid::new_v4());
        let other = TeamId(uuid::Uuid::new_v4());

        let won = concluded_match(tournament_id, team, other, Some(team), "won by 5 wickets");
        let lost = concluded_match(tournament_id, team, other, Some(other), "won by 20 runs");
        let drawn = concluded_match(tournament_id, team, other, None, "Draw");

        for m in [&won, &lost, &drawn] {
            service
                .update_team_points(tournament_id, team, m)
                .await
                .expect("Failed to update team points");
        }

        let entry = repo
            .get_entry(tournament_id, team)
            .await
            .unwrap()
            .expect("Entry should exist");
        assert_eq!(entry.matches_won, 1);
        assert_eq!(entry.matches_lost, 1);
        assert_eq!(entry.matches_drawn, 1);
        assert_eq!(entry.no_result_matches, 0);
        assert_eq!(entry.matches_played.len(), 3);
        let mut distinct = entry.matches_played.clone();
        distinct.sort_by_key(|id| id.0);
        distinct.dedup();
        assert_eq!(distinct.len(), 3);
        assert_eq!(
            entry.matches_won + entry.matches_lost + entry.matches_drawn + entry.no_result_matches,
            entry.matches_played.len() as u32
        );
    }

    #[tokio::test]
    async fn test_repeat_call_double_counts() {
        // Pins the documented non-idempotence: processing the same match
        // twice for the same team bumps the counter twice.
        let (service, repo) = service();
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team1 = TeamId(uuid::Uuid::new_v4());
        let team2 = TeamId(uuid::Uuid::new_v4());
        let m = concluded_match(tournament_id, team1, team2, Some(team1), "Team 1 won");

        for _ in 0..2 {
            service
                .update_team_points(tournament_id, team1, &m)
                .await
                .expect("Failed to update team points");
        }

        let entry = repo
            .get_entry(tournament_id, team1)
            .await
            .unwrap()
            .expect("Entry should exist");
        assert_eq!(entry.matches_won, 2);
        assert_eq!(entry.matches_played, vec![m.id, m.id]);
    }

    #[tokio::test]
    async fn test_update_delegates_net_run_rate() {
        struct FixedRate(f64);
        impl NetRunRateCalculator for FixedRate {
            fn net_run_rate(&self, _entry: &PointsTableEntry, _m: &Match) -> f64 {
                self.0
            }
        }

        let repo = MockPointsTableRepository::default();
        let service = StandingsServiceImpl::new(Arc::new(repo.clone()), Arc::new(FixedRate(1.25)));
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team1 = TeamId(uuid::Uuid::new_v4());
        let team2 = TeamId(uuid::Uuid::new_v4());
        let first = concluded_match(tournament_id, team1, team2, Some(team1), "won");
        let second = concluded_match(tournament_id, team1, team2, Some(team2), "lost");

        service
            .update_team_points(tournament_id, team1, &first)
            .await
            .expect("Failed to update team points");
        let inserted = repo.get_entry(tournament_id, team1).await.unwrap().unwrap();
        // Insertion initialises the rate; the calculator only runs on update.
        assert_eq!(inserted.net_run_rate, 0.0);

        service
            .update_team_points(tournament_id, team1, &second)
            .await
            .expect("Failed to update team points");
        let updated = repo.get_entry(tournament_id, team1).await.unwrap().unwrap();
        assert_eq!(updated.net_run_rate, 1.25);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        #[derive(Clone, Default)]
        struct FailingRepository;

        #[async_trait::async_trait]
        impl PointsTableRepository for FailingRepository {
            async fn get_entry(
                &self,
                _tournament_id: TournamentId,
                _team_id: TeamId,
            ) -> ServiceResult<Option<PointsTableEntry>> {
                ServiceError::store("connection lost")
            }
            async fn insert_entry(&self, _entry: &PointsTableEntry) -> ServiceResult<()> {
                ServiceError::store("connection lost")
            }
            async fn update_entry(&self, _entry: &PointsTableEntry) -> ServiceResult<()> {
                ServiceError::store("connection lost")
            }
            async fn get_entries(
                &self,
                _tournament_id: TournamentId,
            ) -> ServiceResult<Vec<PointsTableEntry>> {
                ServiceError::store("connection lost")
            }
        }

        let service =
            StandingsServiceImpl::new(Arc::new(FailingRepository), Arc::new(FlatNetRunRate));
        let tournament_id = TournamentId(uuid::Uuid::new_v4());
        let team1 = TeamId(uuid::Uuid::new_v4());
        let team2 = TeamId(uuid::Uuid::new_v4());
        let m = concluded_match(tournament_id, team1, team2, Some(team1), "won");

        let result = service.update_team_points(tournament_id, team1, &m).await;
        assert!(matches!(result, Err(ServiceError::Store(_))));
    }
}
