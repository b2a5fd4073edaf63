//! Entities referenced by an asset

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of referenced entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `organization` table
    Organization,
    /// `collaborator` table
    Assignee,
    /// `asset_type` table
    AssetType,
}

impl ReferenceKind {
    /// Table holding this entity
    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::Organization => "organization",
            ReferenceKind::Assignee => "collaborator",
            ReferenceKind::AssetType => "asset_type",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Organization => f.write_str("organization"),
            ReferenceKind::Assignee => f.write_str("assignee"),
            ReferenceKind::AssetType => f.write_str("asset type"),
        }
    }
}

/// An organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization id
    pub id: Uuid,
    /// Display name
    pub name: String,
}

/// A collaborator an asset can be assigned to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Personal email address
    pub personal_email: Option<String>,
    /// Work email address
    pub work_email: Option<String>,
    /// Primary email, used when the specific ones are missing
    pub email: Option<String>,
}

/// An asset type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    /// Display name
    pub name: String,
}

/// A resolved reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Organization row
    Organization(Organization),
    /// Collaborator row
    Assignee(Assignee),
    /// Asset type row
    AssetType(AssetType),
}

impl Reference {
    /// Kind of this reference
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Reference::Organization(_) => ReferenceKind::Organization,
            Reference::Assignee(_) => ReferenceKind::Assignee,
            Reference::AssetType(_) => ReferenceKind::AssetType,
        }
    }
}
