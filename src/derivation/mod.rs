pub mod amc;
pub mod schedule;
pub mod warranty;

use chrono::Datelike;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DerivationConfig;
use crate::errors::Result;
use crate::models::{AmcContract, AmcDetails, Customer, NewCustomer, ServiceEntry};
use crate::time::Timestamp;
use crate::types::{ContractStatus, CustomerId, OwnerId, PaymentStatus, WarrantyStatus};

pub use amc::{compute_amc_contract_end_date, compute_amc_remaining_balance, derive_amc_contract_status};
pub use schedule::{
    derive_next_service_date, derive_next_service_date_from_months, last_completed_service_date,
    last_service_for, reschedule_customer,
};
pub use warranty::{derive_warranty_status, warranty_end_date};

/// in/out of warranty head-count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyCounts {
    pub in_warranty: u64,
    pub out_warranty: u64,
}

/// derives denormalised customer fields from configured policy
#[derive(Debug, Clone, Default)]
pub struct DerivationEngine {
    pub config: DerivationConfig,
}

impl DerivationEngine {
    pub fn new(config: DerivationConfig) -> Self {
        Self { config }
    }

    pub fn warranty_status(&self, installation_date: Timestamp, now: Timestamp) -> Result<WarrantyStatus> {
        derive_warranty_status(installation_date, now, self.config.warranty_period_months)
    }

    pub fn contract_status(&self, amc: &AmcDetails, now: Timestamp) -> Result<ContractStatus> {
        derive_amc_contract_status(
            amc.contract_start_date,
            amc.contract_end_date,
            now,
            self.config.pending_renewal_window_days,
        )
    }

    pub fn long_form_contract_status(&self, contract: &AmcContract, now: Timestamp) -> Result<ContractStatus> {
        derive_amc_contract_status(
            contract.start_date,
            contract.end_date,
            now,
            self.config.pending_renewal_window_days,
        )
    }

    /// build a stored customer from validated input; no services exist yet
    pub fn build_customer(
        &self,
        id: CustomerId,
        owner: OwnerId,
        input: NewCustomer,
        now: Timestamp,
    ) -> Result<Customer> {
        let input = input.normalized()?;
        let warranty_status = self.warranty_status(input.installation_date, now)?;
        let next_service_date = derive_next_service_date(input.installation_date, input.service_interval, None)?;

        Ok(Customer {
            id,
            owner,
            name: input.name,
            contact: input.contact,
            brand: input.brand,
            model: input.model,
            service_type: input.service_type,
            installation_date: input.installation_date,
            service_interval: input.service_interval,
            warranty_status,
            next_service_date,
            last_service_done_date: None,
            amc_details: input.amc_details,
            amc_services: Vec::new(),
            amc_contracts: Vec::new(),
        })
    }

    /// recompute warranty and next service date from the service history snapshot
    pub fn refresh_customer(&self, customer: &mut Customer, services: &[ServiceEntry], now: Timestamp) -> Result<()> {
        customer.warranty_status = self.warranty_status(customer.installation_date, now)?;
        reschedule_customer(customer, services)?;

        debug!(
            "customer {} refreshed: warranty {:?}, next service {}",
            customer.id,
            customer.warranty_status,
            customer.next_service_date.to_iso_date()
        );
        Ok(())
    }

    pub fn warranty_status_counts(&self, customers: &[Customer], now: Timestamp) -> Result<WarrantyCounts> {
        let mut counts = WarrantyCounts::default();
        for customer in customers {
            match self.warranty_status(customer.installation_date, now)? {
                WarrantyStatus::InWarranty => counts.in_warranty += 1,
                WarrantyStatus::OutWarranty => counts.out_warranty += 1,
            }
        }
        Ok(counts)
    }

    pub fn customers_by_warranty_status<'a>(
        &self,
        customers: &'a [Customer],
        status: WarrantyStatus,
        now: Timestamp,
    ) -> Result<Vec<&'a Customer>> {
        let mut matching = Vec::new();
        for customer in customers {
            if self.warranty_status(customer.installation_date, now)? == status {
                matching.push(customer);
            }
        }
        Ok(matching)
    }
}

/// customers whose next service falls in the calendar month containing `now`
pub fn customers_due_in_month(customers: &[Customer], now: Timestamp) -> Vec<&Customer> {
    let today = now.date();
    customers
        .iter()
        .filter(|c| {
            let due = c.next_service_date.date();
            due.year() == today.year() && due.month() == today.month()
        })
        .collect()
}

/// customers due between the start of today and `window_days` ahead, soonest first
pub fn upcoming_services(customers: &[Customer], now: Timestamp, window_days: u32) -> Vec<&Customer> {
    let from = now.start_of_day();
    let until = now.add_days(window_days as i64);
    let mut due: Vec<&Customer> = customers
        .iter()
        .filter(|c| c.next_service_date >= from && c.next_service_date <= until)
        .collect();
    due.sort_by_key(|c| (c.next_service_date, c.id));
    due
}

pub fn unpaid_services(services: &[ServiceEntry]) -> Vec<&ServiceEntry> {
    services
        .iter()
        .filter(|s| s.payment_status == PaymentStatus::Unpaid)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::models::NewServiceEntry;
    use crate::types::{ServiceInterval, ServiceType};

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    fn new_customer(name: &str, installed: Timestamp, interval: ServiceInterval) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            contact: "9876543210".to_string(),
            brand: "Kent".to_string(),
            model: "Grand".to_string(),
            service_type: ServiceType::Maintenance,
            installation_date: installed,
            service_interval: interval,
            amc_details: None,
        }
    }

    #[test]
    fn test_build_customer_derives_fields() {
        let engine = DerivationEngine::default();
        let customer = engine
            .build_customer(
                1,
                "owner".to_string(),
                new_customer("Ravi", date(2024, 1, 15), ServiceInterval::ThreeMonths),
                date(2024, 2, 1),
            )
            .unwrap();

        assert_eq!(customer.warranty_status, WarrantyStatus::InWarranty);
        assert_eq!(customer.next_service_date, date(2024, 4, 15));
        assert_eq!(customer.contact, "+919876543210");
    }

    #[test]
    fn test_refresh_uses_latest_service() {
        let engine = DerivationEngine::default();
        let mut customer = engine
            .build_customer(
                5,
                "owner".to_string(),
                new_customer("Meena", date(2023, 1, 10), ServiceInterval::SixMonths),
                date(2023, 1, 10),
            )
            .unwrap();

        let services = vec![ServiceEntry::from_new(
            1,
            "owner".to_string(),
            NewServiceEntry::free(5, date(2024, 2, 20), ServiceType::Cleaning),
        )];
        engine.refresh_customer(&mut customer, &services, date(2024, 3, 1)).unwrap();

        assert_eq!(customer.warranty_status, WarrantyStatus::OutWarranty);
        assert_eq!(customer.next_service_date, date(2024, 8, 20));
    }

    #[test]
    fn test_warranty_counts_and_filter() {
        let engine = DerivationEngine::default();
        let now = date(2024, 6, 1);
        let customers: Vec<Customer> = [
            (1, date(2024, 1, 1)),
            (2, date(2022, 1, 1)),
            (3, date(2023, 7, 1)),
        ]
        .into_iter()
        .map(|(id, installed)| {
            engine
                .build_customer(id, "o".to_string(), new_customer("c", installed, ServiceInterval::OneMonth), now)
                .unwrap()
        })
        .collect();

        let counts = engine.warranty_status_counts(&customers, now).unwrap();
        assert_eq!(counts, WarrantyCounts { in_warranty: 2, out_warranty: 1 });

        let out = engine
            .customers_by_warranty_status(&customers, WarrantyStatus::OutWarranty, now)
            .unwrap();
        assert_eq!(out.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_due_and_upcoming_queries() {
        let engine = DerivationEngine::default();
        let now = date(2024, 4, 10);
        let customers: Vec<Customer> = [
            (1, date(2024, 1, 15), ServiceInterval::ThreeMonths), // due 2024-04-15
            (2, date(2024, 3, 28), ServiceInterval::OneMonth),    // due 2024-04-28
            (3, date(2024, 2, 5), ServiceInterval::ThreeMonths),  // due 2024-05-05
            (4, date(2024, 1, 2), ServiceInterval::SixMonths),    // due 2024-07-02
        ]
        .into_iter()
        .map(|(id, installed, interval)| {
            engine
                .build_customer(id, "o".to_string(), new_customer("c", installed, interval), now)
                .unwrap()
        })
        .collect();

        let due: Vec<_> = customers_due_in_month(&customers, now).iter().map(|c| c.id).collect();
        assert_eq!(due, vec![1, 2]);

        let upcoming: Vec<_> = upcoming_services(&customers, now, 30).iter().map(|c| c.id).collect();
        assert_eq!(upcoming, vec![1, 2, 3]);
    }

    #[test]
    fn test_unpaid_services_filter() {
        let services = vec![
            ServiceEntry::from_new(
                1,
                "o".to_string(),
                NewServiceEntry::unpaid(1, date(2024, 1, 1), ServiceType::Repair, Money::from_major(300)),
            ),
            ServiceEntry::from_new(
                2,
                "o".to_string(),
                NewServiceEntry::free(1, date(2024, 1, 2), ServiceType::Cleaning),
            ),
        ];
        let unpaid = unpaid_services(&services);
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].id, 1);
    }
}
