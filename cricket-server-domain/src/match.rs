use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{
    MatchId, PlayerId, ServiceError, ServiceResult, TeamId, TournamentId, VenueId,
    standings::StandingsService, tournament::MatchFormat,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub team1: TeamId,
    pub team2: TeamId,
    pub venue_id: VenueId,
    pub scheduled_at: DateTime<Utc>,
    pub format: MatchFormat,
    pub toss_winner: Option<TeamId>,
    pub umpires: Vec<String>,
    pub winner_id: Option<TeamId>,
    pub match_result: Option<String>,
    pub man_of_the_match_id: Option<PlayerId>,
}

impl Match {
    /// A match is concluded once a result text has been recorded; the winner
    /// stays `None` for draws and no-results.
    pub fn is_concluded(&self) -> bool {
        self.match_result.is_some()
    }
}

/// Outcome payload recorded when a match concludes. The winner is not
/// validated against the match's participants and the result text is not
/// checked against the recognised categories; both behaviours are inherited
/// from the source system (see DESIGN.md).
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub winner_id: Option<TeamId>,
    pub match_result: String,
    pub man_of_the_match_id: Option<PlayerId>,
}

#[async_trait::async_trait]
pub trait MatchRepository {
    async fn insert_match(&self, r#match: &Match) -> ServiceResult<()>;
    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>>;
    async fn update_match_outcome(&self, id: MatchId, outcome: &MatchOutcome) -> ServiceResult<()>;
}

#[async_trait::async_trait]
pub trait MatchResultService {
    async fn conclude_match(&self, match_id: MatchId, outcome: MatchOutcome) -> ServiceResult<()>;
}

pub struct MatchResultServiceImpl<M: MatchRepository, S: StandingsService> {
    match_repository: Arc<M>,
    standings_service: Arc<S>,
}

impl<M: MatchRepository, S: StandingsService> MatchResultServiceImpl<M, S> {
    pub fn new(match_repository: Arc<M>, standings_service: Arc<S>) -> Self {
        Self {
            match_repository,
            standings_service,
        }
    }
}

#[async_trait::async_trait]
impl<M: MatchRepository + Send + Sync + 'static, S: StandingsService + Send + Sync + 'static>
    MatchResultService for MatchResultServiceImpl<M, S>
{
    async fn conclude_match(&self, match_id: MatchId, outcome: MatchOutcome) -> ServiceResult<()> {
        let Some(mut concluded) = self.match_repository.get_match(match_id).await? else {
            return ServiceError::not_found(format!("match {} does not exist", match_id));
        };
        if outcome.match_result.trim().is_empty() {
            return ServiceError::invalid_input("match result must not be empty");
        }

        self.match_repository
            .update_match_outcome(match_id, &outcome)
            .await?;
        concluded.winner_id = outcome.winner_id;
        concluded.match_result = Some(outcome.match_result);
        concluded.man_of_the_match_id = outcome.man_of_the_match_id;

        // The match stays concluded even if a standings write fails partway;
        // there is no compensating rollback and the first error surfaces.
        self.standings_service
            .update_team_points(concluded.tournament_id, concluded.team1, &concluded)
            .await?;
        self.standings_service
            .update_team_points(concluded.tournament_id, concluded.team2, &concluded)
            .await?;

        log::info!(
            "match {} concluded: {}",
            match_id,
            concluded.match_result.as_deref().unwrap_or_default()
        );
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockMatchRepository {
    pub matches: Arc<DashMap<MatchId, Match>>,
}

#[allow(unused)]
impl MockMatchRepository {
    pub fn with_match(r#match: Match) -> Self {
        let repo = Self::default();
        repo.matches.insert(r#match.id, r#match);
        repo
    }

    pub fn get_matches(&self) -> Vec<Match> {
        self.matches
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl MatchRepository for MockMatchRepository {
    async fn insert_match(&self, r#match: &Match) -> ServiceResult<()> {
        self.matches.insert(r#match.id, r#match.clone());
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>> {
        Ok(self.matches.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_match_outcome(&self, id: MatchId, outcome: &MatchOutcome) -> ServiceResult<()> {
        let Some(mut stored) = self.matches.get_mut(&id) else {
            return ServiceError::not_found(format!("match {} does not exist", id));
        };
        stored.winner_id = outcome.winner_id;
        stored.match_result = Some(outcome.match_result.clone());
        stored.man_of_the_match_id = outcome.man_of_the_match_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::standings::MockStandingsService;

    use super::*;

    fn unconcluded_match() -> Match {
        Match {
            id: MatchId::new(),
            tournament_id: TournamentId(uuid::Uuid::new_v4()),
            team1: TeamId(uuid::Uuid::new_v4()),
            team2: TeamId(uuid::Uuid::new_v4()),
            venue_id: VenueId(uuid::Uuid::new_v4()),
            scheduled_at: Utc::now(),
            format: MatchFormat::T20,
            toss_winner: None,
            umpires: vec!["A. Dar".to_string(), "R. Tucker".to_string()],
            winner_id: None,
            match_result: None,
            man_of_the_match_id: None,
        }
    }

    #[tokio::test]
    async fn test_conclude_match_updates_and_cascades() {
        let m = unconcluded_match();
        let match_repository = MockMatchRepository::with_match(m.clone());
        let standings_service = MockStandingsService::default();
        let service = MatchResultServiceImpl::new(
            Arc::new(match_repository.clone()),
            Arc::new(standings_service.clone()),
        );

        let man_of_the_match = PlayerId(uuid::Uuid::new_v4());
        service
            .conclude_match(
                m.id,
                MatchOutcome {
                    winner_id: Some(m.team1),
                    match_result: "Team 1 won by 20 runs".to_string(),
                    man_of_the_match_id: Some(man_of_the_match),
                },
            )
            .await
            .expect("Failed to conclude match");

        let stored = match_repository.get_match(m.id).await.unwrap().unwrap();
        assert!(stored.is_concluded());
        assert_eq!(stored.winner_id, Some(m.team1));
        assert_eq!(
            stored.match_result.as_deref(),
            Some("Team 1 won by 20 runs")
        );
        assert_eq!(stored.man_of_the_match_id, Some(man_of_the_match));

        // Standings run for team1, then team2, with the concluded match.
        assert_eq!(
            standings_service.get_calls(),
            vec![
                (m.tournament_id, m.team1, m.id),
                (m.tournament_id, m.team2, m.id)
            ]
        );
    }

    #[tokio::test]
    async fn test_conclude_missing_match() {
        let service = MatchResultServiceImpl::new(
            Arc::new(MockMatchRepository::default()),
            Arc::new(MockStandingsService::default()),
        );

        let result = service
            .conclude_match(
                MatchId::new(),
                MatchOutcome {
                    winner_id: None,
                    match_result: "Draw".to_string(),
                    man_of_the_match_id: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conclude_empty_result() {
        let m = unconcluded_match();
        let standings_service = MockStandingsService::default();
        let service = MatchResultServiceImpl::new(
            Arc::new(MockMatchRepository::with_match(m.clone())),
            Arc::new(standings_service.clone()),
        );

        let result = service
            .conclude_match(
                m.id,
                MatchOutcome {
                    winner_id: None,
                    match_result: "  ".to_string(),
                    man_of_the_match_id: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert!(standings_service.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_reconclude_double_counts() {
        // Regression pin: there is no concluded-state guard, so concluding
        // the same match twice re-runs the standings cascade.
        let m = unconcluded_match();
        let standings_service = MockStandingsService::default();
        let service = MatchResultServiceImpl::new(
            Arc::new(MockMatchRepository::with_match(m.clone())),
            Arc::new(standings_service.clone()),
        );

        let outcome = MatchOutcome {
            winner_id: Some(m.team2),
            match_result: "Team 2 won by 4 wickets".to_string(),
            man_of_the_match_id: None,
        };
        for _ in 0..2 {
            service
                .conclude_match(m.id, outcome.clone())
                .await
                .expect("Failed to conclude match");
        }

        assert_eq!(standings_service.get_calls().len(), 4);
    }

    #[tokio::test]
    async fn test_partial_standings_failure_keeps_match_concluded() {
        let m = unconcluded_match();
        let match_repository = MockMatchRepository::with_match(m.clone());
        let standings_service = MockStandingsService::default();
        standings_service.fail_for_team(m.team2);
        let service = MatchResultServiceImpl::new(
            Arc::new(match_repository.clone()),
            Arc::new(standings_service.clone()),
        );

        let result = service
            .conclude_match(
                m.id,
                MatchOutcome {
                    winner_id: Some(m.team1),
                    match_result: "Team 1 won by 9 wickets".to_string(),
                    man_of_the_match_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Store(_))));
        // Team 1 was counted, team 2 was not, and the match stays concluded.
        assert_eq!(
            standings_service.get_calls(),
            vec![(m.tournament_id, m.team1, m.id)]
        );
        let stored = match_repository.get_match(m.id).await.unwrap().unwrap();
        assert!(stored.is_concluded());
    }
}
