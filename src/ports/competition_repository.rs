//! Persistence port for [`Competition`] aggregates.

use async_trait::async_trait;

use crate::domain::competition::Competition;
use crate::domain::foundation::{CompetitionId, CoreError};

#[async_trait]
pub trait CompetitionRepository: Send + Sync {
    async fn save(&self, competition: &Competition) -> Result<(), CoreError>;

    /// Compare-and-swap on `version`, `Conflict` on mismatch.
    async fn update(&self, competition: &Competition) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: &CompetitionId) -> Result<Option<Competition>, CoreError>;
}
