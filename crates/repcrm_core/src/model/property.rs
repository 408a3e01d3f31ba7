//! Property listing domain model.
//!
//! # Responsibility
//! - Define the repasse listing record and its closed enums.
//! - Validate form payloads before they reach persistence.
//!
//! # Invariants
//! - `transfer_value` is strictly positive for every stored property.
//! - `street` and `region` are never blank.
//! - `media.photos[0]` is the cover photo when present.

use crate::currency::Money;
use crate::model::media::PropertyMedia;
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type PropertyId = Uuid;

pub const DEFAULT_CITY: &str = "Curitiba";
pub const DEFAULT_STATE: &str = "PR";

/// Kind of dwelling being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartamento,
    Casa,
    Garden,
    Sobrado,
    Sitio,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        Self::Apartamento,
        Self::Casa,
        Self::Garden,
        Self::Sobrado,
        Self::Sitio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apartamento => "apartamento",
            Self::Casa => "casa",
            Self::Garden => "garden",
            Self::Sobrado => "sobrado",
            Self::Sitio => "sitio",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "apartamento" => Some(Self::Apartamento),
            "casa" => Some(Self::Casa),
            "garden" => Some(Self::Garden),
            "sobrado" => Some(Self::Sobrado),
            "sitio" => Some(Self::Sitio),
            _ => None,
        }
    }

    /// pt-BR display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Apartamento => "Apartamento",
            Self::Casa => "Casa",
            Self::Garden => "Garden",
            Self::Sobrado => "Sobrado",
            Self::Sitio => "Sítio",
        }
    }
}

/// Listing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Disponivel,
    Negociacao,
    Vendido,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 3] = [Self::Disponivel, Self::Negociacao, Self::Vendido];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disponivel => "disponivel",
            Self::Negociacao => "negociacao",
            Self::Vendido => "vendido",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "disponivel" => Some(Self::Disponivel),
            "negociacao" => Some(Self::Negociacao),
            "vendido" => Some(Self::Vendido),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disponivel => "Disponível",
            Self::Negociacao => "Em Negociação",
            Self::Vendido => "Vendido",
        }
    }
}

/// Validation failures for property form payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValidationError {
    MissingType,
    BlankStreet,
    BlankRegion,
    NonPositiveTransferValue,
}

impl Display for PropertyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingType => write!(f, "property type is required"),
            Self::BlankStreet => write!(f, "street is required"),
            Self::BlankRegion => write!(f, "region is required"),
            Self::NonPositiveTransferValue => {
                write!(f, "transfer_value must be greater than zero")
            }
        }
    }
}

impl Error for PropertyValidationError {}

/// Form payload used by create and edit flows.
///
/// `kind` is optional because an untouched form has no type selected; the
/// draft is rejected until one is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDraft {
    #[serde(rename = "type")]
    pub kind: Option<PropertyType>,
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
    pub region: String,
    pub transfer_value: Money,
    pub monthly_payment: Option<Money>,
    pub outstanding_balance: Option<Money>,
    pub bank_constructor: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub status: PropertyStatus,
    pub notes: Option<String>,
    /// Photo URLs in display order. `None` keeps the stored photos on edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    /// `None` keeps the stored videos on edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<String>>,
}

impl Default for PropertyDraft {
    fn default() -> Self {
        Self {
            kind: None,
            street: String::new(),
            neighborhood: None,
            city: DEFAULT_CITY.to_string(),
            state: DEFAULT_STATE.to_string(),
            region: String::new(),
            transfer_value: Money::ZERO,
            monthly_payment: None,
            outstanding_balance: None,
            bank_constructor: None,
            owner_name: None,
            owner_phone: None,
            status: PropertyStatus::default(),
            notes: None,
            photos: None,
            videos: None,
        }
    }
}

impl PropertyDraft {
    /// Checks required fields: type, street, region and transfer value.
    pub fn validate(&self) -> Result<PropertyType, PropertyValidationError> {
        let kind = self.kind.ok_or(PropertyValidationError::MissingType)?;
        if self.street.trim().is_empty() {
            return Err(PropertyValidationError::BlankStreet);
        }
        if self.region.trim().is_empty() {
            return Err(PropertyValidationError::BlankRegion);
        }
        if !self.transfer_value.is_positive() {
            return Err(PropertyValidationError::NonPositiveTransferValue);
        }
        Ok(kind)
    }

    /// Builds a draft pre-filled from a stored property (edit dialog).
    pub fn from_property(property: &Property) -> Self {
        Self {
            kind: Some(property.kind),
            street: property.street.clone(),
            neighborhood: property.neighborhood.clone(),
            city: property.city.clone(),
            state: property.state.clone(),
            region: property.region.clone(),
            transfer_value: property.transfer_value,
            monthly_payment: property.monthly_payment,
            outstanding_balance: property.outstanding_balance,
            bank_constructor: property.bank_constructor.clone(),
            owner_name: property.owner_name.clone(),
            owner_phone: property.owner_phone.clone(),
            status: property.status,
            notes: property.notes.clone(),
            photos: Some(property.media.photos.clone()),
            videos: Some(property.media.videos.clone()),
        }
    }

    /// Replaces both media lists with the ones in `media`.
    pub fn set_media(&mut self, media: PropertyMedia) {
        self.photos = Some(media.photos);
        self.videos = Some(media.videos);
    }

    /// Media after applying this draft over `current`; lists the draft
    /// did not carry are kept as stored.
    pub fn resolve_media(&self, current: Option<&PropertyMedia>) -> PropertyMedia {
        let stored = current.cloned().unwrap_or_default();
        PropertyMedia {
            photos: self.photos.clone().unwrap_or(stored.photos),
            videos: self.videos.clone().unwrap_or(stored.videos),
        }
    }
}

/// Stored property listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
    pub region: String,
    pub transfer_value: Money,
    pub monthly_payment: Option<Money>,
    pub outstanding_balance: Option<Money>,
    pub bank_constructor: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub status: PropertyStatus,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub media: PropertyMedia,
    pub user_id: UserId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Property {
    /// Materializes a validated draft into a new record.
    ///
    /// Blank optional text fields are stored as `None`; required text is trimmed.
    pub fn from_draft(
        id: PropertyId,
        user_id: UserId,
        draft: &PropertyDraft,
        now_ms: i64,
    ) -> Result<Self, PropertyValidationError> {
        let kind = draft.validate()?;
        Ok(Self {
            id,
            kind,
            street: draft.street.trim().to_string(),
            neighborhood: non_blank(draft.neighborhood.as_deref()),
            city: draft.city.trim().to_string(),
            state: draft.state.trim().to_string(),
            region: draft.region.trim().to_string(),
            transfer_value: draft.transfer_value,
            monthly_payment: draft.monthly_payment,
            outstanding_balance: draft.outstanding_balance,
            bank_constructor: non_blank(draft.bank_constructor.as_deref()),
            owner_name: non_blank(draft.owner_name.as_deref()),
            owner_phone: non_blank(draft.owner_phone.as_deref()),
            status: draft.status,
            notes: non_blank(draft.notes.as_deref()),
            media: draft.resolve_media(None),
            user_id,
            created_at: now_ms,
            updated_at: now_ms,
        })
    }

    /// Applies an edit payload, keeping identity, owner and creation time.
    pub fn apply_draft(
        &self,
        draft: &PropertyDraft,
        now_ms: i64,
    ) -> Result<Self, PropertyValidationError> {
        let mut updated = Self::from_draft(self.id, self.user_id, draft, now_ms)?;
        updated.media = draft.resolve_media(Some(&self.media));
        updated.created_at = self.created_at;
        Ok(updated)
    }

    /// Re-checks stored invariants; used by repositories on write and read.
    pub fn validate(&self) -> Result<(), PropertyValidationError> {
        if self.street.trim().is_empty() {
            return Err(PropertyValidationError::BlankStreet);
        }
        if self.region.trim().is_empty() {
            return Err(PropertyValidationError::BlankRegion);
        }
        if !self.transfer_value.is_positive() {
            return Err(PropertyValidationError::NonPositiveTransferValue);
        }
        Ok(())
    }

    /// Single-line address for list rows.
    pub fn address_line(&self) -> String {
        match self.neighborhood.as_deref() {
            Some(neighborhood) => format!("{}, {} - {}", self.street, neighborhood, self.city),
            None => format!("{} - {}", self.street, self.city),
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
