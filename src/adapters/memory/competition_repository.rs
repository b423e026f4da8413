//! In-memory competition repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::competition::Competition;
use crate::domain::foundation::{CompetitionId, CoreError};
use crate::ports::CompetitionRepository;

#[derive(Default)]
pub struct InMemoryCompetitionRepository {
    competitions: RwLock<HashMap<CompetitionId, Competition>>,
}

impl InMemoryCompetitionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompetitionRepository for InMemoryCompetitionRepository {
    async fn save(&self, competition: &Competition) -> Result<(), CoreError> {
        let mut competitions = self.competitions.write().await;
        if competitions.contains_key(&competition.id) {
            return Err(CoreError::conflict(format!(
                "competition {} already exists",
                competition.id
            )));
        }
        competitions.insert(competition.id, competition.clone());
        Ok(())
    }

    async fn update(&self, competition: &Competition) -> Result<(), CoreError> {
        let mut competitions = self.competitions.write().await;
        let stored = competitions
            .get(&competition.id)
            .ok_or_else(|| CoreError::not_found(format!("competition {}", competition.id)))?;
        if stored.version != competition.version {
            return Err(CoreError::conflict(format!(
                "competition {} version {} is behind stored {}",
                competition.id, competition.version, stored.version
            )));
        }
        let mut updated = competition.clone();
        updated.version += 1;
        competitions.insert(competition.id, updated);
        Ok(())
    }

    async fn find_by_id(&self, id: &CompetitionId) -> Result<Option<Competition>, CoreError> {
        Ok(self.competitions.read().await.get(id).cloned())
    }
}
