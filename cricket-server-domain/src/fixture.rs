use std::sync::Arc;

use chrono::{Days, NaiveTime};
use rand::seq::IndexedRandom;

use crate::{
    MatchId, ServiceError, ServiceResult, TournamentId,
    r#match::{Match, MatchRepository},
    tournament::TournamentRepository,
    venue::VenueRepository,
};

#[async_trait::async_trait]
pub trait FixtureScheduler {
    async fn generate_fixtures(&self, tournament_id: TournamentId) -> ServiceResult<Vec<Match>>;
}

pub struct FixtureSchedulerImpl<T: TournamentRepository, V: VenueRepository, M: MatchRepository> {
    tournament_repository: Arc<T>,
    venue_repository: Arc<V>,
    match_repository: Arc<M>,
}

impl<T: TournamentRepository, V: VenueRepository, M: MatchRepository>
    FixtureSchedulerImpl<T, V, M>
{
    pub fn new(
        tournament_repository: Arc<T>,
        venue_repository: Arc<V>,
        match_repository: Arc<M>,
    ) -> Self {
        Self {
            tournament_repository,
            venue_repository,
            match_repository,
        }
    }
}

#[async_trait::async_trait]
impl<
    T: TournamentRepository + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
> FixtureScheduler for FixtureSchedulerImpl<T, V, M>
{
    async fn generate_fixtures(&self, tournament_id: TournamentId) -> ServiceResult<Vec<Match>> {
        let Some(tournament) = self
            .tournament_repository
            .get_tournament(tournament_id)
            .await?
        else {
            return ServiceError::not_found(format!(
                "tournament {} does not exist",
                tournament_id
            ));
        };
        let teams = &tournament.team_ids;
        if teams.len() < 2 {
            return ServiceError::invalid_input("fixture generation needs at least two teams");
        }
        let venues = self.venue_repository.get_venues().await?;
        if venues.is_empty() {
            return Err(ServiceError::NoVenuesAvailable);
        }

        let number_of_matches = teams.len() * (teams.len() - 1) / 2;
        // A zero-length window behaves like an unbounded per-day quota,
        // leaving every fixture on the start date.
        let tournament_days = (tournament.end_date - tournament.start_date)
            .num_days()
            .max(1) as usize;
        let matches_per_day = number_of_matches.div_ceil(tournament_days);

        let mut current_date = tournament.start_date;
        let mut scheduled_on_date = 0usize;
        let mut fixtures = Vec::with_capacity(number_of_matches);

        for i in 0..teams.len() {
            for j in (i + 1)..teams.len() {
                let Some(venue) = venues.choose(&mut rand::rng()) else {
                    return Err(ServiceError::NoVenuesAvailable);
                };
                let fixture = Match {
                    id: MatchId::new(),
                    tournament_id,
                    team1: teams[i],
                    team2: teams[j],
                    venue_id: venue.id,
                    scheduled_at: current_date.and_time(NaiveTime::MIN).and_utc(),
                    format: tournament.format,
                    toss_winner: None,
                    umpires: Vec::new(),
                    winner_id: None,
                    match_result: None,
                    man_of_the_match_id: None,
                };
                self.match_repository.insert_match(&fixture).await?;
                fixtures.push(fixture);

                scheduled_on_date += 1;
                if scheduled_on_date >= matches_per_day && current_date < tournament.end_date {
                    current_date = current_date
                        .checked_add_days(Days::new(1))
                        .unwrap_or(current_date);
                    scheduled_on_date = 0;
                }
            }
        }

        log::info!(
            "generated {} fixtures for tournament {} across {} venues",
            fixtures.len(),
            tournament_id,
            venues.len()
        );
        Ok(fixtures)
    }
}
