//! Match use-case service.
//!
//! # Responsibility
//! - Serve the match inbox (pending list, dashboard preview, unviewed badge).
//! - Apply broker decisions: start negotiation or discard.
//! - Accept externally scored matches.

use crate::db::now_epoch_ms;
use crate::model::client::ClientId;
use crate::model::matching::{Match, MatchId, MatchStatus, MatchWithDetails};
use crate::model::property::PropertyId;
use crate::repo::match_repo::MatchRepository;
use crate::service::ServiceResult;
use log::info;

/// Matches shown in the dashboard preview card.
pub const DASHBOARD_RECENT_MATCHES: usize = 3;

pub struct MatchService<R: MatchRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: MatchRepository> MatchService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    /// All matches, newest first, with client/property details.
    pub fn list_matches(&self) -> ServiceResult<Vec<MatchWithDetails>> {
        Ok(self.repo.list_matches()?)
    }

    /// Matches still waiting for a broker decision.
    pub fn pending_matches(&self) -> ServiceResult<Vec<MatchWithDetails>> {
        let mut matches = self.repo.list_matches()?;
        matches.retain(|item| item.record.status == MatchStatus::Pending);
        Ok(matches)
    }

    /// The first `limit` entries of the newest-first list.
    pub fn recent_matches(&self, limit: usize) -> ServiceResult<Vec<MatchWithDetails>> {
        let mut matches = self.repo.list_matches()?;
        matches.truncate(limit);
        Ok(matches)
    }

    pub fn matches_for_client(&self, client_id: ClientId) -> ServiceResult<Vec<MatchWithDetails>> {
        Ok(self.repo.list_matches_for_client(client_id)?)
    }

    pub fn unviewed_count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_unviewed()?)
    }

    pub fn mark_viewed(&self, id: MatchId) -> ServiceResult<()> {
        self.repo.mark_viewed(id)?;
        info!("event=match_mark_viewed module=service status=ok match_id={id}");
        Ok(())
    }

    /// Moves a match into negotiation; this also marks it viewed.
    pub fn start_negotiation(&self, id: MatchId) -> ServiceResult<()> {
        self.repo.update_status(id, MatchStatus::Negotiating)?;
        info!(
            "event=match_status module=service status=ok match_id={id} match_status={}",
            MatchStatus::Negotiating.as_str()
        );
        Ok(())
    }

    /// Discards a suggestion by deleting it.
    pub fn discard(&self, id: MatchId) -> ServiceResult<()> {
        self.repo.delete_match(id)?;
        info!("event=match_discard module=service status=ok match_id={id}");
        Ok(())
    }

    /// Stores a match produced by the external scorer.
    ///
    /// Re-recording an existing client/property pair refreshes its score
    /// and keeps the original id, status and viewed flag.
    pub fn record_match(
        &self,
        client_id: ClientId,
        property_id: PropertyId,
        score: u32,
    ) -> ServiceResult<MatchId> {
        let record = Match::new(client_id, property_id, score, (self.clock)())?;
        let id = self.repo.upsert_match(&record)?;
        info!(
            "event=match_record module=service status=ok match_id={id} score={}",
            record.match_score
        );
        Ok(id)
    }
}
