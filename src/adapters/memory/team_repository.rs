//! In-memory team repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::Team;
use crate::domain::foundation::{CompetitionId, CoreError, TeamId};
use crate::ports::TeamRepository;

#[derive(Default)]
pub struct InMemoryTeamRepository {
    teams: RwLock<HashMap<TeamId, Team>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn save(&self, team: &Team) -> Result<(), CoreError> {
        let mut teams = self.teams.write().await;
        if teams.contains_key(&team.id) {
            return Err(CoreError::conflict(format!("team {} already exists", team.id)));
        }
        teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn update(&self, team: &Team) -> Result<(), CoreError> {
        let mut teams = self.teams.write().await;
        let stored = teams
            .get(&team.id)
            .ok_or_else(|| CoreError::not_found(format!("team {}", team.id)))?;
        if stored.version != team.version {
            return Err(CoreError::conflict(format!(
                "team {} version {} is behind stored {}",
                team.id, team.version, stored.version
            )));
        }
        let mut updated = team.clone();
        updated.version += 1;
        teams.insert(team.id, updated);
        Ok(())
    }

    async fn find_by_id(&self, id: &TeamId) -> Result<Option<Team>, CoreError> {
        Ok(self.teams.read().await.get(id).cloned())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Team>, CoreError> {
        Ok(self
            .teams
            .read()
            .await
            .values()
            .find(|t| t.subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn find_by_competition(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Vec<Team>, CoreError> {
        Ok(self
            .teams
            .read()
            .await
            .values()
            .filter(|t| t.competition_id == *competition_id)
            .cloned()
            .collect())
    }

    async fn name_taken(
        &self,
        competition_id: &CompetitionId,
        name: &str,
    ) -> Result<bool, CoreError> {
        Ok(self.teams.read().await.values().any(|t| {
            t.competition_id == *competition_id && t.name.eq_ignore_ascii_case(name)
        }))
    }
}
