//! Client use-case service.
//!
//! # Responsibility
//! - Back the client list screen (name/phone search + status/type filters).
//! - Run create/edit/delete flows from form drafts.
//!
//! # Invariants
//! - Creation requires an authenticated owner.
//! - Stored region preferences are normalized through the model.

use crate::db::now_epoch_ms;
use crate::model::client::{Client, ClientDraft, ClientId, ClientStatus, ClientType};
use crate::model::UserId;
use crate::repo::client_repo::ClientRepository;
use crate::repo::Entity;
use crate::service::{contains_ignore_case, normalize_search, ServiceError, ServiceResult};
use log::{info, warn};
use uuid::Uuid;

/// List-screen filter. Empty/`None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    /// Case-insensitive over name, plain substring over phone.
    pub search: String,
    pub status: Option<ClientStatus>,
    pub kind: Option<ClientType>,
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        if let Some(needle) = normalize_search(&self.search) {
            let raw = self.search.trim();
            if !contains_ignore_case(&client.name, &needle) && !client.phone.contains(raw) {
                return false;
            }
        }
        if self.status.is_some_and(|status| status != client.status) {
            return false;
        }
        !self.kind.is_some_and(|kind| kind != client.kind)
    }
}

pub struct ClientService<R: ClientRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    pub fn list_clients(&self, filter: &ClientFilter) -> ServiceResult<Vec<Client>> {
        let mut clients = self.repo.list_clients()?;
        clients.retain(|client| filter.matches(client));
        Ok(clients)
    }

    pub fn get_client(&self, id: ClientId) -> ServiceResult<Option<Client>> {
        Ok(self.repo.get_client(id)?)
    }

    pub fn create_client(
        &self,
        owner: Option<UserId>,
        draft: &ClientDraft,
    ) -> ServiceResult<Client> {
        let Some(owner) = owner else {
            warn!("event=client_create module=service status=error code=missing_owner");
            return Err(ServiceError::MissingOwner);
        };

        let client = Client::from_draft(Uuid::new_v4(), owner, draft, (self.clock)())?;
        let id = self.repo.create_client(&client)?;
        info!(
            "event=client_create module=service status=ok client_id={id} client_type={}",
            client.kind.as_str()
        );

        self.repo
            .get_client(id)?
            .ok_or(ServiceError::InconsistentState(
                "created client not found in read-back",
            ))
    }

    pub fn update_client(&self, id: ClientId, draft: &ClientDraft) -> ServiceResult<Client> {
        let current = self
            .repo
            .get_client(id)?
            .ok_or(ServiceError::NotFound(Entity::Client, id))?;
        let updated = current.apply_draft(draft, (self.clock)())?;
        self.repo.update_client(&updated)?;
        info!("event=client_update module=service status=ok client_id={id}");

        self.repo
            .get_client(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated client not found in read-back",
            ))
    }

    /// Deletes a client together with its preferences and matches.
    pub fn delete_client(&self, id: ClientId) -> ServiceResult<()> {
        self.repo.delete_client(id)?;
        info!("event=client_delete module=service status=ok client_id={id}");
        Ok(())
    }
}
