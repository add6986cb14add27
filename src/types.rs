use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CrmError, Result};

/// store-assigned identifier for a customer
pub type CustomerId = u64;

/// store-assigned identifier for a service entry
pub type ServiceId = u64;

/// store-assigned identifier for a reminder
pub type ReminderId = u64;

/// store-assigned identifier for an embedded AMC record or AMC service entry
pub type AmcId = u64;

/// textual principal of the record owner, as handed out by the identity provider
pub type OwnerId = String;

/// kind of work performed on an appliance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceType {
    Repair,
    Cleaning,
    Maintenance,
    /// free-text classification carried through unchanged
    Other(String),
}

impl ServiceType {
    /// parse a spreadsheet or form label; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "repair" => ServiceType::Repair,
            "cleaning" => ServiceType::Cleaning,
            "maintenance" => ServiceType::Maintenance,
            "" => ServiceType::Other("Other".to_string()),
            _ => ServiceType::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ServiceType::Repair => "Repair",
            ServiceType::Cleaning => "Cleaning",
            ServiceType::Maintenance => "Maintenance",
            ServiceType::Other(text) => text,
        }
    }
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::Maintenance
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// periodic service interval; only 1, 3 and 6 months are offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum ServiceInterval {
    OneMonth,
    ThreeMonths,
    SixMonths,
}

impl ServiceInterval {
    pub const ALL: [ServiceInterval; 3] = [
        ServiceInterval::OneMonth,
        ServiceInterval::ThreeMonths,
        ServiceInterval::SixMonths,
    ];

    pub fn months(&self) -> u32 {
        match self {
            ServiceInterval::OneMonth => 1,
            ServiceInterval::ThreeMonths => 3,
            ServiceInterval::SixMonths => 6,
        }
    }

    pub fn from_months(months: u64) -> Result<Self> {
        match months {
            1 => Ok(ServiceInterval::OneMonth),
            3 => Ok(ServiceInterval::ThreeMonths),
            6 => Ok(ServiceInterval::SixMonths),
            other => Err(CrmError::validation(
                "service_interval",
                format!("must be 1, 3 or 6 months, got {}", other),
            )),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceInterval::OneMonth => "1 month",
            ServiceInterval::ThreeMonths => "3 months",
            ServiceInterval::SixMonths => "6 months",
        }
    }
}

impl Default for ServiceInterval {
    fn default() -> Self {
        ServiceInterval::ThreeMonths
    }
}

impl TryFrom<u64> for ServiceInterval {
    type Error = CrmError;

    fn try_from(months: u64) -> Result<Self> {
        ServiceInterval::from_months(months)
    }
}

impl From<ServiceInterval> for u64 {
    fn from(interval: ServiceInterval) -> u64 {
        interval.months() as u64
    }
}

impl fmt::Display for ServiceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// payment state of a service entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    Free,
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Free => "Free",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }
}

/// payment methods accepted for one-off service entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    Cash,
    Upi,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
        }
    }
}

/// payment methods accepted for AMC contracts; a superset of `PaymentMethod`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmcPaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Online,
    Cheque,
    Other,
}

impl AmcPaymentMethod {
    pub const ALL: [AmcPaymentMethod; 6] = [
        AmcPaymentMethod::Cash,
        AmcPaymentMethod::Upi,
        AmcPaymentMethod::BankTransfer,
        AmcPaymentMethod::Online,
        AmcPaymentMethod::Cheque,
        AmcPaymentMethod::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AmcPaymentMethod::Cash => "Cash",
            AmcPaymentMethod::Upi => "UPI",
            AmcPaymentMethod::BankTransfer => "Bank Transfer",
            AmcPaymentMethod::Online => "Online",
            AmcPaymentMethod::Cheque => "Cheque",
            AmcPaymentMethod::Other => "Other",
        }
    }
}

impl From<PaymentMethod> for AmcPaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => AmcPaymentMethod::Cash,
            PaymentMethod::Upi => AmcPaymentMethod::Upi,
        }
    }
}

/// derived warranty classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarrantyStatus {
    InWarranty,
    OutWarranty,
}

impl WarrantyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WarrantyStatus::InWarranty => "In Warranty",
            WarrantyStatus::OutWarranty => "Out of Warranty",
        }
    }
}

/// AMC coverage tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmcType {
    /// labour only
    OnlyService,
    /// labour and parts
    ServiceWithParts,
    /// labour, parts at half price
    ServiceWithParts50,
}

impl AmcType {
    pub fn label(&self) -> &'static str {
        match self {
            AmcType::OnlyService => "Only Service",
            AmcType::ServiceWithParts => "Service with Parts",
            AmcType::ServiceWithParts50 => "Service with Parts @50%",
        }
    }
}

/// derived AMC contract state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractStatus {
    Active,
    PendingRenewal,
    Expired,
}

impl ContractStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Active => "Active",
            ContractStatus::PendingRenewal => "Pending Renewal",
            ContractStatus::Expired => "Expired",
        }
    }

    /// active or pending renewal
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, ContractStatus::Expired)
    }
}

/// caller role as reported by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}
