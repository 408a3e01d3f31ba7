//! Client (buyer/seller) domain model.
//!
//! # Responsibility
//! - Define client records with their purchase preferences.
//! - Own preference-list editing rules (type toggles, region set).
//!
//! # Invariants
//! - `name`, `phone` and `kind` are always present on stored clients.
//! - `regions_of_interest` holds unique trimmed values and never the
//!   `Outro` placeholder.
//! - `desired_property_types` holds unique values in selection order.

use crate::currency::Money;
use crate::model::property::{non_blank, PropertyType};
use crate::model::regions::OTHER_REGION;
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ClientId = Uuid;

const BRAZIL_COUNTRY_CODE: &str = "55";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Comprador,
    Vendedor,
    CompradorVendedor,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [Self::Comprador, Self::Vendedor, Self::CompradorVendedor];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comprador => "comprador",
            Self::Vendedor => "vendedor",
            Self::CompradorVendedor => "comprador_vendedor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "comprador" => Some(Self::Comprador),
            "vendedor" => Some(Self::Vendedor),
            "comprador_vendedor" => Some(Self::CompradorVendedor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Comprador => "Comprador",
            Self::Vendedor => "Vendedor",
            Self::CompradorVendedor => "Comprador + Vendedor",
        }
    }

    /// Whether purchase preferences apply to this client.
    pub fn is_buyer(self) -> bool {
        matches!(self, Self::Comprador | Self::CompradorVendedor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Ativo,
    Negociacao,
    Fechado,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 3] = [Self::Ativo, Self::Negociacao, Self::Fechado];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ativo => "ativo",
            Self::Negociacao => "negociacao",
            Self::Fechado => "fechado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ativo" => Some(Self::Ativo),
            "negociacao" => Some(Self::Negociacao),
            "fechado" => Some(Self::Fechado),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ativo => "Ativo",
            Self::Negociacao => "Em Negociação",
            Self::Fechado => "Fechado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    BlankName,
    BlankPhone,
    MissingType,
    NegativeMaxPurchaseValue,
    BlankRegion,
    DuplicateRegion(String),
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name is required"),
            Self::BlankPhone => write!(f, "phone is required"),
            Self::MissingType => write!(f, "client type is required"),
            Self::NegativeMaxPurchaseValue => {
                write!(f, "max_purchase_value cannot be negative")
            }
            Self::BlankRegion => write!(f, "region cannot be blank"),
            Self::DuplicateRegion(region) => write!(f, "region already added: {region}"),
        }
    }
}

impl Error for ClientValidationError {}

/// Form payload for client create/edit flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDraft {
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: Option<ClientType>,
    pub max_purchase_value: Option<Money>,
    pub desired_property_types: Vec<PropertyType>,
    pub regions_of_interest: Vec<String>,
    pub has_property_for_transfer: bool,
    pub status: ClientStatus,
    pub notes: Option<String>,
}

impl ClientDraft {
    /// Checks required fields: name, phone and type.
    pub fn validate(&self) -> Result<ClientType, ClientValidationError> {
        if self.name.trim().is_empty() {
            return Err(ClientValidationError::BlankName);
        }
        if self.phone.trim().is_empty() {
            return Err(ClientValidationError::BlankPhone);
        }
        let kind = self.kind.ok_or(ClientValidationError::MissingType)?;
        if self
            .max_purchase_value
            .is_some_and(|value| value.cents() < 0)
        {
            return Err(ClientValidationError::NegativeMaxPurchaseValue);
        }
        Ok(kind)
    }

    /// Selects the type when absent, deselects it when present.
    pub fn toggle_property_type(&mut self, kind: PropertyType) {
        if let Some(pos) = self.desired_property_types.iter().position(|k| *k == kind) {
            self.desired_property_types.remove(pos);
        } else {
            self.desired_property_types.push(kind);
        }
    }

    /// Toggles one of the predefined regions. `Outro` is ignored; custom
    /// regions go through [`ClientDraft::add_region`].
    pub fn toggle_region(&mut self, region: &str) {
        let region = region.trim();
        if region.is_empty() || region == OTHER_REGION {
            return;
        }
        if let Some(pos) = self.regions_of_interest.iter().position(|r| r == region) {
            self.regions_of_interest.remove(pos);
        } else {
            self.regions_of_interest.push(region.to_string());
        }
    }

    /// Adds a free-text region typed by the user.
    pub fn add_region(&mut self, region: &str) -> Result<(), ClientValidationError> {
        let region = region.trim();
        if region.is_empty() || region == OTHER_REGION {
            return Err(ClientValidationError::BlankRegion);
        }
        if self.regions_of_interest.iter().any(|r| r == region) {
            return Err(ClientValidationError::DuplicateRegion(region.to_string()));
        }
        self.regions_of_interest.push(region.to_string());
        Ok(())
    }

    pub fn remove_region(&mut self, region: &str) {
        self.regions_of_interest.retain(|r| r != region.trim());
    }

    pub fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            phone: client.phone.clone(),
            kind: Some(client.kind),
            max_purchase_value: client.max_purchase_value,
            desired_property_types: client.desired_property_types.clone(),
            regions_of_interest: client.regions_of_interest.clone(),
            has_property_for_transfer: client.has_property_for_transfer,
            status: client.status,
            notes: client.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: ClientType,
    pub max_purchase_value: Option<Money>,
    pub desired_property_types: Vec<PropertyType>,
    pub regions_of_interest: Vec<String>,
    pub has_property_for_transfer: bool,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Client {
    pub fn from_draft(
        id: ClientId,
        user_id: UserId,
        draft: &ClientDraft,
        now_ms: i64,
    ) -> Result<Self, ClientValidationError> {
        let kind = draft.validate()?;
        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            kind,
            max_purchase_value: draft.max_purchase_value,
            desired_property_types: dedup_types(&draft.desired_property_types),
            regions_of_interest: normalize_regions(&draft.regions_of_interest),
            has_property_for_transfer: draft.has_property_for_transfer,
            status: draft.status,
            notes: non_blank(draft.notes.as_deref()),
            user_id,
            created_at: now_ms,
            updated_at: now_ms,
        })
    }

    pub fn apply_draft(
        &self,
        draft: &ClientDraft,
        now_ms: i64,
    ) -> Result<Self, ClientValidationError> {
        let mut updated = Self::from_draft(self.id, self.user_id, draft, now_ms)?;
        updated.created_at = self.created_at;
        Ok(updated)
    }

    /// Re-checks stored invariants; used by repositories on write and read.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.name.trim().is_empty() {
            return Err(ClientValidationError::BlankName);
        }
        if self.phone.trim().is_empty() {
            return Err(ClientValidationError::BlankPhone);
        }
        if self
            .max_purchase_value
            .is_some_and(|value| value.cents() < 0)
        {
            return Err(ClientValidationError::NegativeMaxPurchaseValue);
        }
        Ok(())
    }

    pub fn is_buyer(&self) -> bool {
        self.kind.is_buyer()
    }

    /// `https://wa.me/<digits>` link for the client's phone.
    pub fn whatsapp_link(&self) -> Option<String> {
        whatsapp_link(&self.phone)
    }
}

/// Builds a WhatsApp deep link, prefixing the Brazilian country code when
/// the number does not already start with it.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.starts_with(BRAZIL_COUNTRY_CODE) {
        Some(format!("https://wa.me/{digits}"))
    } else {
        Some(format!("https://wa.me/{BRAZIL_COUNTRY_CODE}{digits}"))
    }
}

/// Trims, drops blanks and `Outro`, and removes duplicates keeping the first.
pub fn normalize_regions(regions: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(regions.len());
    for region in regions {
        let region = region.trim();
        if region.is_empty() || region == OTHER_REGION {
            continue;
        }
        if !unique.iter().any(|existing| existing == region) {
            unique.push(region.to_string());
        }
    }
    unique
}

fn dedup_types(types: &[PropertyType]) -> Vec<PropertyType> {
    let mut unique = Vec::with_capacity(types.len());
    for kind in types {
        if !unique.contains(kind) {
            unique.push(*kind);
        }
    }
    unique
}
