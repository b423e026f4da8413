//! Persistence port for [`Team`] aggregates.

use async_trait::async_trait;

use crate::domain::billing::Team;
use crate::domain::foundation::{CompetitionId, CoreError, TeamId};

/// Repository for team persistence.
///
/// Same optimistic-locking contract as the account repository: `update`
/// compares versions and fails with `Conflict` on a mismatch.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn save(&self, team: &Team) -> Result<(), CoreError>;

    async fn update(&self, team: &Team) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: &TeamId) -> Result<Option<Team>, CoreError>;

    /// Look up by processor subscription id. Invoice and subscription
    /// webhooks carry only this reference.
    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Team>, CoreError>;

    async fn find_by_competition(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Vec<Team>, CoreError>;

    /// Case-insensitive name check within one competition.
    async fn name_taken(
        &self,
        competition_id: &CompetitionId,
        name: &str,
    ) -> Result<bool, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TeamRepository) {}
    }
}
