//! Package and processing entities.
//!
//! Wire shapes mirror the backend's `packages` and `package_processing` tables.
//! Rows travel as JSON; these types are the edge where the application gives
//! them structure.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Where a package was shipped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    ChinaFactory,
    DomesticManufacturer,
}

/// Shipping/customs status of a package.
///
/// Statuses advance roughly in declaration order, but regressions happen
/// (e.g. a package bounced back to customs), so no ordering is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Shipped,
    InTransitInternational,
    CustomsProcessing,
    InTransitDomestic,
    Arrived,
    Received,
}

/// Handling priority of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for SenderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChinaFactory => write!(f, "china_factory"),
            Self::DomesticManufacturer => write!(f, "domestic_manufacturer"),
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shipped => write!(f, "shipped"),
            Self::InTransitInternational => write!(f, "in_transit_international"),
            Self::CustomsProcessing => write!(f, "customs_processing"),
            Self::InTransitDomestic => write!(f, "in_transit_domestic"),
            Self::Arrived => write!(f, "arrived"),
            Self::Received => write!(f, "received"),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipped" => Ok(Self::Shipped),
            "in_transit_international" => Ok(Self::InTransitInternational),
            "customs_processing" => Ok(Self::CustomsProcessing),
            "in_transit_domestic" => Ok(Self::InTransitDomestic),
            "arrived" => Ok(Self::Arrived),
            "received" => Ok(Self::Received),
            other => Err(crate::CoreError::validation(format!(
                "unknown package status: {other}"
            ))),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(crate::CoreError::validation(format!(
                "unknown priority: {other}"
            ))),
        }
    }
}

/// An inbound package tracked by the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,

    /// Carrier tracking number, unique per package.
    pub tracking_number: String,

    pub sender_type: SenderType,

    /// Date the sender dispatched the package.
    pub shipping_date: Date,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_arrival_date: Option<Date>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub priority_level: Priority,

    pub status: PackageStatus,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Profile id of the staff member who recorded the package.
    pub created_by: String,

    pub updated_by: String,
}

/// Confirmation state for a processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl Default for ConfirmationStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Back-office processing state attached to a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageProcessing {
    pub id: Uuid,

    pub package_id: Uuid,

    #[serde(default)]
    pub tracking_number_confirmation: ConfirmationStatus,

    #[serde(default)]
    pub reservation_confirmation: ConfirmationStatus,

    /// Profile id of the staff member handling this package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A package joined with its processing record, as rendered by list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageWithProcessing {
    #[serde(flatten)]
    pub package: Package,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_processing: Option<PackageProcessing>,
}
