//! Property use-case service.
//!
//! # Responsibility
//! - Back the property list screen (search + status/region filters).
//! - Run create/edit/delete flows from form drafts.
//!
//! # Invariants
//! - Creation requires an authenticated owner.
//! - Edits keep `id`, `user_id` and `created_at` of the stored record.
//! - Log lines carry ids and status only, never owner names or phones.

use crate::db::now_epoch_ms;
use crate::model::property::{Property, PropertyDraft, PropertyId, PropertyStatus};
use crate::model::UserId;
use crate::repo::property_repo::PropertyRepository;
use crate::repo::Entity;
use crate::service::{contains_ignore_case, normalize_search, ServiceError, ServiceResult};
use log::{info, warn};
use uuid::Uuid;

/// List-screen filter. Empty/`None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilter {
    /// Case-insensitive substring over street, owner name and neighborhood.
    pub search: String,
    pub status: Option<PropertyStatus>,
    /// Exact region name.
    pub region: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(needle) = normalize_search(&self.search) {
            let hit = contains_ignore_case(&property.street, &needle)
                || property
                    .owner_name
                    .as_deref()
                    .is_some_and(|name| contains_ignore_case(name, &needle))
                || property
                    .neighborhood
                    .as_deref()
                    .is_some_and(|value| contains_ignore_case(value, &needle));
            if !hit {
                return false;
            }
        }

        if self.status.is_some_and(|status| status != property.status) {
            return false;
        }

        match self.region.as_deref() {
            Some(region) => property.region == region,
            None => true,
        }
    }
}

/// Use-case service wrapper for property flows.
pub struct PropertyService<R: PropertyRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: PropertyRepository> PropertyService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    /// Uses `clock` (epoch ms) for `created_at`/`updated_at`.
    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    /// Lists properties newest first, narrowed by `filter`.
    pub fn list_properties(&self, filter: &PropertyFilter) -> ServiceResult<Vec<Property>> {
        let mut properties = self.repo.list_properties()?;
        properties.retain(|property| filter.matches(property));
        Ok(properties)
    }

    pub fn get_property(&self, id: PropertyId) -> ServiceResult<Option<Property>> {
        Ok(self.repo.get_property(id)?)
    }

    /// Creates a property owned by `owner`.
    ///
    /// # Errors
    /// - `MissingOwner` when nobody is signed in.
    /// - `InvalidProperty` when a required field is missing; nothing is written.
    pub fn create_property(
        &self,
        owner: Option<UserId>,
        draft: &PropertyDraft,
    ) -> ServiceResult<Property> {
        let Some(owner) = owner else {
            warn!("event=property_create module=service status=error code=missing_owner");
            return Err(ServiceError::MissingOwner);
        };

        let property = Property::from_draft(Uuid::new_v4(), owner, draft, (self.clock)())?;
        let id = self.repo.create_property(&property)?;
        info!("event=property_create module=service status=ok property_id={id}");

        self.repo
            .get_property(id)?
            .ok_or(ServiceError::InconsistentState(
                "created property not found in read-back",
            ))
    }

    /// Replaces the editable fields of `id` with `draft`.
    pub fn update_property(
        &self,
        id: PropertyId,
        draft: &PropertyDraft,
    ) -> ServiceResult<Property> {
        let current = self
            .repo
            .get_property(id)?
            .ok_or(ServiceError::NotFound(Entity::Property, id))?;
        let updated = current.apply_draft(draft, (self.clock)())?;
        self.repo.update_property(&updated)?;
        info!(
            "event=property_update module=service status=ok property_id={id} property_status={}",
            updated.status.as_str()
        );

        self.repo
            .get_property(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated property not found in read-back",
            ))
    }

    /// Deletes a property together with its media rows and matches.
    pub fn delete_property(&self, id: PropertyId) -> ServiceResult<()> {
        self.repo.delete_property(id)?;
        info!("event=property_delete module=service status=ok property_id={id}");
        Ok(())
    }
}
