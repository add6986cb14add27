use serde::{Deserialize, Serialize};

use crate::config::UNKNOWN_LABEL;
use crate::decimal::Money;
use crate::derivation::amc::{compute_amc_contract_end_date, compute_amc_remaining_balance};
use crate::errors::{CrmError, Result};
use crate::phone::normalize_indian_mobile_to_e164;
use crate::time::Timestamp;
use crate::types::{
    AmcId, AmcPaymentMethod, AmcType, ContractStatus, CustomerId, OwnerId, PaymentMethod,
    PaymentStatus, ReminderId, ServiceId, ServiceInterval, ServiceType, WarrantyStatus,
};

/// customer record as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    // identification
    pub id: CustomerId,
    pub owner: OwnerId,
    pub name: String,
    pub contact: String,

    // appliance
    pub brand: String,
    pub model: String,
    pub service_type: ServiceType,
    pub installation_date: Timestamp,
    pub service_interval: ServiceInterval,

    // derived on write
    pub warranty_status: WarrantyStatus,
    pub next_service_date: Timestamp,
    /// latest visit closed with "mark service done"; no service entry is written for it
    #[serde(default)]
    pub last_service_done_date: Option<Timestamp>,

    // maintenance contracts
    pub amc_details: Option<AmcDetails>,
    pub amc_services: Vec<AmcServiceEntry>,
    pub amc_contracts: Vec<AmcContract>,
}

/// customer fields supplied by a form or import row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub contact: String,
    pub brand: String,
    pub model: String,
    pub service_type: ServiceType,
    pub installation_date: Timestamp,
    pub service_interval: ServiceInterval,
    pub amc_details: Option<AmcDetails>,
}

impl NewCustomer {
    /// trim and normalise user input, rejecting blank required fields
    pub fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::validation("name", "name is required"));
        }
        let contact = normalize_indian_mobile_to_e164(&self.contact);
        if contact.is_empty() {
            return Err(CrmError::validation("contact", "contact is required"));
        }
        if !self.installation_date.is_positive() {
            return Err(CrmError::validation(
                "installation_date",
                "installation date must be after 1970-01-01",
            ));
        }
        if let Some(amc) = &self.amc_details {
            amc.validate()?;
        }

        Ok(Self {
            name,
            contact,
            brand: or_unknown(&self.brand),
            model: or_unknown(&self.model),
            ..self
        })
    }
}

fn or_unknown(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// a one-off service visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub id: ServiceId,
    pub customer_id: CustomerId,
    pub owner: OwnerId,
    pub service_date: Timestamp,
    pub service_type: ServiceType,
    pub amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub is_free: bool,
    pub notes: String,
}

/// service entry fields before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceEntry {
    pub customer_id: CustomerId,
    pub service_date: Timestamp,
    pub service_type: ServiceType,
    pub amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub is_free: bool,
    pub notes: String,
}

impl NewServiceEntry {
    /// complimentary visit: zero amount, status free
    pub fn free(customer_id: CustomerId, service_date: Timestamp, service_type: ServiceType) -> Self {
        Self {
            customer_id,
            service_date,
            service_type,
            amount: Money::ZERO,
            payment_status: PaymentStatus::Free,
            payment_method: None,
            is_free: true,
            notes: String::new(),
        }
    }

    pub fn paid(
        customer_id: CustomerId,
        service_date: Timestamp,
        service_type: ServiceType,
        amount: Money,
        method: PaymentMethod,
    ) -> Self {
        Self {
            customer_id,
            service_date,
            service_type,
            amount,
            payment_status: PaymentStatus::Paid,
            payment_method: Some(method),
            is_free: false,
            notes: String::new(),
        }
    }

    pub fn unpaid(
        customer_id: CustomerId,
        service_date: Timestamp,
        service_type: ServiceType,
        amount: Money,
    ) -> Self {
        Self {
            customer_id,
            service_date,
            service_type,
            amount,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            is_free: false,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_service_fields(
            self.service_date,
            self.amount,
            self.payment_status,
            self.payment_method,
            self.is_free,
        )
    }
}

impl ServiceEntry {
    pub fn from_new(id: ServiceId, owner: OwnerId, entry: NewServiceEntry) -> Self {
        Self {
            id,
            customer_id: entry.customer_id,
            owner,
            service_date: entry.service_date,
            service_type: entry.service_type,
            amount: entry.amount,
            payment_status: entry.payment_status,
            payment_method: entry.payment_method,
            is_free: entry.is_free,
            notes: entry.notes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_service_fields(
            self.service_date,
            self.amount,
            self.payment_status,
            self.payment_method,
            self.is_free,
        )
    }

    /// change payment state, keeping the method/status invariant
    pub fn set_payment_status(&mut self, status: PaymentStatus, method: Option<PaymentMethod>) -> Result<()> {
        validate_service_fields(self.service_date, self.amount, status, method, self.is_free)?;
        self.payment_status = status;
        self.payment_method = method;
        Ok(())
    }
}

fn validate_service_fields(
    service_date: Timestamp,
    amount: Money,
    status: PaymentStatus,
    method: Option<PaymentMethod>,
    is_free: bool,
) -> Result<()> {
    if !service_date.is_positive() {
        return Err(CrmError::validation("service_date", "service date must be after 1970-01-01"));
    }
    amount.ensure_non_negative("amount")?;

    if is_free && status != PaymentStatus::Free {
        return Err(CrmError::validation(
            "payment_status",
            format!("free services must have status free, got {}", status.label()),
        ));
    }
    if status == PaymentStatus::Free && !amount.is_zero() {
        return Err(CrmError::validation(
            "amount",
            format!("free services must have a zero amount, got {}", amount),
        ));
    }
    match (status, method) {
        (PaymentStatus::Paid, None) => Err(CrmError::validation(
            "payment_method",
            "payment method is required when status is paid",
        )),
        (PaymentStatus::Free | PaymentStatus::Unpaid, Some(m)) => Err(CrmError::validation(
            "payment_method",
            format!("{} is only allowed when status is paid", m.label()),
        )),
        _ => Ok(()),
    }
}

/// scheduled follow-up for a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub customer_id: CustomerId,
    pub owner: OwnerId,
    pub reminder_date: Timestamp,
    pub description: String,
    /// user-controlled; not inferred from delivery
    pub sent_status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub customer_id: CustomerId,
    pub reminder_date: Timestamp,
    pub description: String,
}

impl Reminder {
    pub fn from_new(id: ReminderId, owner: OwnerId, reminder: NewReminder) -> Self {
        Self {
            id,
            customer_id: reminder.customer_id,
            owner,
            reminder_date: reminder.reminder_date,
            description: reminder.description,
            sent_status: false,
        }
    }
}

/// short-form AMC embedded in a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcDetails {
    pub id: AmcId,
    pub contract_type: AmcType,
    pub duration_years: u32,
    pub contract_start_date: Timestamp,
    pub contract_end_date: Timestamp,
    pub payment_method: AmcPaymentMethod,
    pub total_amount: Money,
    pub remaining_balance: Money,
    pub notes: String,
}

impl AmcDetails {
    /// new contract with nothing paid yet; the end date is derived from the duration
    pub fn new(
        id: AmcId,
        contract_type: AmcType,
        duration_years: u32,
        contract_start_date: Timestamp,
        payment_method: AmcPaymentMethod,
        total_amount: Money,
    ) -> Result<Self> {
        total_amount.ensure_non_negative("total_amount")?;
        let contract_end_date = compute_amc_contract_end_date(contract_start_date, duration_years)?;
        Ok(Self {
            id,
            contract_type,
            duration_years,
            contract_start_date,
            contract_end_date,
            payment_method,
            total_amount,
            remaining_balance: total_amount,
            notes: String::new(),
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn amount_paid(&self) -> Money {
        self.total_amount - self.remaining_balance
    }

    /// apply a payment against the balance; overpayment floors the balance at zero
    pub fn record_payment(&mut self, amount: Money) -> Result<()> {
        amount.ensure_non_negative("payment_amount")?;
        self.remaining_balance = compute_amc_remaining_balance(self.total_amount, self.amount_paid() + amount)?;
        Ok(())
    }

    /// change the contract value while keeping what has already been paid
    pub fn revise_total(&mut self, new_total: Money) -> Result<()> {
        new_total.ensure_non_negative("total_amount")?;
        let paid = self.amount_paid();
        self.total_amount = new_total;
        self.remaining_balance = compute_amc_remaining_balance(new_total, paid)?;
        Ok(())
    }

    /// change start date or duration, recomputing the end date
    pub fn reschedule(&mut self, start: Timestamp, duration_years: u32) -> Result<()> {
        self.contract_end_date = compute_amc_contract_end_date(start, duration_years)?;
        self.contract_start_date = start;
        self.duration_years = duration_years;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.total_amount.ensure_non_negative("total_amount")?;
        self.remaining_balance.ensure_non_negative("remaining_balance")?;
        if self.remaining_balance > self.total_amount {
            return Err(CrmError::validation(
                "remaining_balance",
                format!(
                    "remaining balance {} exceeds total amount {}",
                    self.remaining_balance, self.total_amount
                ),
            ));
        }
        let expected_end = compute_amc_contract_end_date(self.contract_start_date, self.duration_years)?;
        if self.contract_end_date != expected_end {
            return Err(CrmError::validation(
                "contract_end_date",
                format!(
                    "expected {} for a {} year contract starting {}",
                    expected_end.to_iso_date(),
                    self.duration_years,
                    self.contract_start_date.to_iso_date()
                ),
            ));
        }
        Ok(())
    }
}

/// long-form contract applied in bulk to several customers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcContract {
    pub owner: OwnerId,
    pub contract_type: AmcType,
    pub amount: Money,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

impl AmcContract {
    pub fn validate(&self) -> Result<()> {
        self.amount.ensure_non_negative("amount")?;
        if self.end_date <= self.start_date {
            return Err(CrmError::validation(
                "end_date",
                format!(
                    "end date {} must be after start date {}",
                    self.end_date.to_iso_date(),
                    self.start_date.to_iso_date()
                ),
            ));
        }
        Ok(())
    }
}

/// discounted part recorded against an AMC visit; values are display strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceReduction {
    pub parts_name: String,
    pub regular_price: String,
    pub discount_price: String,
}

/// visit performed under an AMC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcServiceEntry {
    pub amc_service_id: AmcId,
    pub customer_service_id: CustomerId,
    pub service_date: Timestamp,
    pub contract_type: AmcType,
    /// status of the contract on the service date
    pub contract_status: ContractStatus,
    pub parts_replaced: String,
    pub follow_up_needed: bool,
    pub price_reduction: Option<PriceReduction>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAmcServiceEntry {
    pub service_date: Timestamp,
    pub parts_replaced: String,
    pub notes: String,
    pub follow_up_needed: bool,
    pub price_reduction: Option<PriceReduction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_free_entry_invariants() {
        let entry = NewServiceEntry::free(1, date(2024, 3, 1), ServiceType::Cleaning);
        assert!(entry.validate().is_ok());

        let mut with_amount = entry.clone();
        with_amount.amount = Money::from_major(100);
        assert_eq!(with_amount.validate().unwrap_err().field(), Some("amount"));

        let mut wrong_status = entry;
        wrong_status.payment_status = PaymentStatus::Unpaid;
        assert_eq!(wrong_status.validate().unwrap_err().field(), Some("payment_status"));
    }

    #[test]
    fn test_payment_method_only_when_paid() {
        let paid = NewServiceEntry::paid(
            1,
            date(2024, 3, 1),
            ServiceType::Repair,
            Money::from_major(500),
            PaymentMethod::Upi,
        );
        assert!(paid.validate().is_ok());

        let mut missing = paid.clone();
        missing.payment_method = None;
        assert_eq!(missing.validate().unwrap_err().field(), Some("payment_method"));

        let mut unpaid_with_method =
            NewServiceEntry::unpaid(1, date(2024, 3, 1), ServiceType::Repair, Money::from_major(500));
        unpaid_with_method.payment_method = Some(PaymentMethod::Cash);
        assert_eq!(unpaid_with_method.validate().unwrap_err().field(), Some("payment_method"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let entry =
            NewServiceEntry::unpaid(1, date(2024, 3, 1), ServiceType::Repair, Money::from_minor(-1));
        assert_eq!(entry.validate().unwrap_err().field(), Some("amount"));
    }

    #[test]
    fn test_set_payment_status() {
        let new = NewServiceEntry::unpaid(7, date(2024, 3, 1), ServiceType::Repair, Money::from_major(800));
        let mut entry = ServiceEntry::from_new(3, "owner".to_string(), new);

        assert!(entry.set_payment_status(PaymentStatus::Paid, None).is_err());
        assert_eq!(entry.payment_status, PaymentStatus::Unpaid);

        entry.set_payment_status(PaymentStatus::Paid, Some(PaymentMethod::Cash)).unwrap();
        assert_eq!(entry.payment_method, Some(PaymentMethod::Cash));

        // a charged visit cannot become free without zeroing the amount
        assert!(entry.set_payment_status(PaymentStatus::Free, None).is_err());
    }

    #[test]
    fn test_new_customer_normalisation() {
        let customer = NewCustomer {
            name: "  Asha  ".to_string(),
            contact: "98765 43210".to_string(),
            brand: " ".to_string(),
            model: "RO-500".to_string(),
            service_type: ServiceType::Maintenance,
            installation_date: date(2024, 1, 15),
            service_interval: ServiceInterval::ThreeMonths,
            amc_details: None,
        }
        .normalized()
        .unwrap();

        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.contact, "+919876543210");
        assert_eq!(customer.brand, "Unknown");
        assert_eq!(customer.model, "RO-500");
    }

    #[test]
    fn test_new_customer_requires_name() {
        let err = NewCustomer {
            name: "".to_string(),
            contact: "9876543210".to_string(),
            brand: String::new(),
            model: String::new(),
            service_type: ServiceType::Maintenance,
            installation_date: date(2024, 1, 15),
            service_interval: ServiceInterval::ThreeMonths,
            amc_details: None,
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_amc_details_balance_tracking() {
        let mut amc = AmcDetails::new(
            1,
            AmcType::ServiceWithParts,
            1,
            date(2024, 1, 1),
            AmcPaymentMethod::BankTransfer,
            Money::from_major(6_000),
        )
        .unwrap();
        assert_eq!(amc.contract_end_date, date(2025, 1, 1));
        assert_eq!(amc.remaining_balance, Money::from_major(6_000));

        amc.record_payment(Money::from_major(2_500)).unwrap();
        assert_eq!(amc.remaining_balance, Money::from_major(3_500));
        assert_eq!(amc.amount_paid(), Money::from_major(2_500));

        // paid portion survives a price revision
        amc.revise_total(Money::from_major(5_000)).unwrap();
        assert_eq!(amc.remaining_balance, Money::from_major(2_500));

        amc.revise_total(Money::from_major(2_000)).unwrap();
        assert_eq!(amc.remaining_balance, Money::ZERO);
        assert!(amc.validate().is_ok());
    }

    #[test]
    fn test_amc_details_validation() {
        let mut amc = AmcDetails::new(
            1,
            AmcType::OnlyService,
            2,
            date(2024, 4, 1),
            AmcPaymentMethod::Cash,
            Money::from_major(3_000),
        )
        .unwrap();
        assert_eq!(amc.contract_end_date, date(2026, 4, 1));

        amc.remaining_balance = Money::from_major(4_000);
        assert_eq!(amc.validate().unwrap_err().field(), Some("remaining_balance"));

        amc.remaining_balance = Money::ZERO;
        amc.contract_end_date = date(2026, 3, 31);
        assert_eq!(amc.validate().unwrap_err().field(), Some("contract_end_date"));
    }

    #[test]
    fn test_amc_contract_dates() {
        let contract = AmcContract {
            owner: "owner".to_string(),
            contract_type: AmcType::OnlyService,
            amount: Money::from_major(1_000),
            start_date: date(2024, 5, 1),
            end_date: date(2024, 4, 1),
        };
        assert_eq!(contract.validate().unwrap_err().field(), Some("end_date"));
    }
}
