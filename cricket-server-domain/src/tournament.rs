use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;

use crate::{ServiceResult, TeamId, TournamentId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchFormat {
    T20,
    Odi,
    Test,
}

impl MatchFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "T20" => Some(MatchFormat::T20),
            "ODI" => Some(MatchFormat::Odi),
            "Test" => Some(MatchFormat::Test),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchFormat::T20 => write!(f, "T20"),
            MatchFormat::Odi => write!(f, "ODI"),
            MatchFormat::Test => write!(f, "Test"),
        }
    }
}

/// Points awarded per outcome category when ranking the points table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Weightage {
    pub win_points: u32,
    pub draw_points: u32,
    pub loss_points: u32,
}

impl Default for Weightage {
    fn default() -> Self {
        Self {
            win_points: 2,
            draw_points: 1,
            loss_points: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Participating teams in registration order; pair enumeration for
    /// fixture generation walks this order.
    pub team_ids: Vec<TeamId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_matches: u32,
    pub format: MatchFormat,
    pub weightage: Weightage,
    pub sponsor: Option<String>,
}

#[async_trait::async_trait]
pub trait TournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>>;
}

#[derive(Clone, Default)]
pub struct MockTournamentRepository {
    pub tournaments: Arc<DashMap<TournamentId, Tournament>>,
}

#[allow(unused)]
impl MockTournamentRepository {
    pub fn with_tournament(tournament: Tournament) -> Self {
        let repo = Self::default();
        repo.tournaments.insert(tournament.id, tournament);
        repo
    }
}

#[async_trait::async_trait]
impl TournamentRepository for MockTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        Ok(self.tournaments.get(&id).map(|entry| entry.value().clone()))
    }
}
