//! display views for records and reports
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::derivation::DerivationEngine;
use crate::errors::Result;
use crate::models::{AmcDetails, Customer, Reminder, ServiceEntry};
use crate::phone::to_whatsapp_number;
use crate::revenue::{AmcRevenue, CustomerRevenueBreakdown, RevenueByPeriod, RevenueWindow};
use crate::time::Timestamp;
use crate::types::{CustomerId, ReminderId, ServiceId};

/// serializable view of a customer, formatted for display
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: CustomerId,
    pub name: String,
    pub contact: String,
    pub whatsapp_number: Option<String>,
    pub brand: String,
    pub model: String,
    pub service_type: String,
    pub installation_date: String,
    pub service_interval: String,
    pub warranty_status: String,
    pub next_service_date: String,
    pub amc: Option<AmcView>,
    pub amc_service_count: usize,
    pub bulk_contract_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcView {
    pub contract_type: String,
    pub contract_status: String,
    pub duration_years: u32,
    pub start_date: String,
    pub end_date: String,
    pub payment_method: String,
    pub total_amount: String,
    pub amount_paid: String,
    pub remaining_balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntryView {
    pub id: ServiceId,
    pub customer_id: CustomerId,
    pub service_date: String,
    pub service_type: String,
    pub amount: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderView {
    pub id: ReminderId,
    pub customer_id: CustomerId,
    pub reminder_date: String,
    pub description: String,
    pub sent: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueView {
    pub period: String,
    pub total_revenue: String,
    pub paid_services: u64,
    pub free_services: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRevenueView {
    pub customer_name: String,
    pub contract_type: String,
    pub paid_services: u64,
    pub free_services: u64,
    pub total_revenue: String,
    pub amc_renewals: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcRevenueView {
    pub total_amount: String,
    pub in_progress_amount: String,
    pub completed_amount: String,
    pub remaining_balance: String,
}

impl CustomerView {
    /// warranty and contract status are taken at `now`
    pub fn from_customer(customer: &Customer, engine: &DerivationEngine, now: Timestamp) -> Result<Self> {
        let warranty = engine.warranty_status(customer.installation_date, now)?;
        let amc = match &customer.amc_details {
            Some(details) => Some(AmcView::from_details(details, engine, now)?),
            None => None,
        };

        Ok(CustomerView {
            id: customer.id,
            name: customer.name.clone(),
            contact: customer.contact.clone(),
            whatsapp_number: to_whatsapp_number(&customer.contact),
            brand: customer.brand.clone(),
            model: customer.model.clone(),
            service_type: customer.service_type.label().to_string(),
            installation_date: customer.installation_date.format_date(),
            service_interval: customer.service_interval.label().to_string(),
            warranty_status: warranty.label().to_string(),
            next_service_date: customer.next_service_date.format_date(),
            amc,
            amc_service_count: customer.amc_services.len(),
            bulk_contract_count: customer.amc_contracts.len(),
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl AmcView {
    pub fn from_details(details: &AmcDetails, engine: &DerivationEngine, now: Timestamp) -> Result<Self> {
        let status = engine.contract_status(details, now)?;
        Ok(AmcView {
            contract_type: details.contract_type.label().to_string(),
            contract_status: status.label().to_string(),
            duration_years: details.duration_years,
            start_date: details.contract_start_date.format_date(),
            end_date: details.contract_end_date.format_date(),
            payment_method: details.payment_method.label().to_string(),
            total_amount: details.total_amount.format_inr(),
            amount_paid: details.amount_paid().format_inr(),
            remaining_balance: details.remaining_balance.format_inr(),
        })
    }
}

impl From<&ServiceEntry> for ServiceEntryView {
    fn from(entry: &ServiceEntry) -> Self {
        ServiceEntryView {
            id: entry.id,
            customer_id: entry.customer_id,
            service_date: entry.service_date.format_date(),
            service_type: entry.service_type.label().to_string(),
            amount: entry.amount.format_inr(),
            payment_status: entry.payment_status.label().to_string(),
            payment_method: entry.payment_method.map(|m| m.label().to_string()),
            notes: entry.notes.clone(),
        }
    }
}

impl From<&Reminder> for ReminderView {
    fn from(reminder: &Reminder) -> Self {
        ReminderView {
            id: reminder.id,
            customer_id: reminder.customer_id,
            reminder_date: reminder.reminder_date.format_date(),
            description: reminder.description.clone(),
            sent: reminder.sent_status,
        }
    }
}

impl RevenueView {
    pub fn new(window: &RevenueWindow, revenue: &RevenueByPeriod) -> Self {
        RevenueView {
            period: window.label(),
            total_revenue: revenue.total_revenue.format_inr(),
            paid_services: revenue.paid_services_count,
            free_services: revenue.free_services_count,
        }
    }
}

impl From<&CustomerRevenueBreakdown> for CustomerRevenueView {
    fn from(row: &CustomerRevenueBreakdown) -> Self {
        CustomerRevenueView {
            customer_name: row.customer_name.clone(),
            contract_type: row
                .contract_type
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| "-".to_string()),
            paid_services: row.paid_services_count,
            free_services: row.free_services_count,
            total_revenue: row.total_revenue.format_inr(),
            amc_renewals: row.amc_renewal_count,
        }
    }
}

impl From<&AmcRevenue> for AmcRevenueView {
    fn from(revenue: &AmcRevenue) -> Self {
        let fmt = |m: Money| m.format_inr();
        AmcRevenueView {
            total_amount: fmt(revenue.total_amount),
            in_progress_amount: fmt(revenue.in_progress_amount),
            completed_amount: fmt(revenue.completed_amount),
            remaining_balance: fmt(revenue.remaining_balance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCustomer, NewServiceEntry};
    use crate::types::{AmcPaymentMethod, AmcType, PaymentMethod, ServiceInterval, ServiceType};

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_customer_view_formats_fields() {
        let engine = DerivationEngine::default();
        let amc = AmcDetails::new(1, AmcType::ServiceWithParts, 1, date(2024, 1, 1), AmcPaymentMethod::BankTransfer, Money::from_major(12_500))
            .unwrap();
        let customer = engine
            .build_customer(
                7,
                "owner".to_string(),
                NewCustomer {
                    name: "Kavya".to_string(),
                    contact: "9876543210".to_string(),
                    brand: "Kent".to_string(),
                    model: "Grand".to_string(),
                    service_type: ServiceType::Other("Softener".to_string()),
                    installation_date: date(2024, 1, 15),
                    service_interval: ServiceInterval::SixMonths,
                    amc_details: Some(amc),
                },
                date(2024, 2, 1),
            )
            .unwrap();

        let view = CustomerView::from_customer(&customer, &engine, date(2024, 12, 20)).unwrap();
        assert_eq!(view.whatsapp_number.as_deref(), Some("919876543210"));
        assert_eq!(view.service_type, "Softener");
        assert_eq!(view.installation_date, "15 Jan 2024");
        assert_eq!(view.next_service_date, "15 Jul 2024");

        let amc = view.amc.as_ref().unwrap();
        assert_eq!(amc.total_amount, "₹12,500.00");
        assert_eq!(amc.contract_status, "Pending Renewal");

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"whatsappNumber\""));
    }

    #[test]
    fn test_service_entry_view() {
        let entry = ServiceEntry::from_new(
            3,
            "owner".to_string(),
            NewServiceEntry::paid(1, date(2024, 3, 9), ServiceType::Repair, Money::from_minor(150_050), PaymentMethod::Upi),
        );
        let view = ServiceEntryView::from(&entry);
        assert_eq!(view.amount, "₹1,500.50");
        assert_eq!(view.payment_method.as_deref(), Some("UPI"));
        assert_eq!(view.service_date, "09 Mar 2024");
    }
}
