use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::derivation::amc::derive_amc_contract_status;
use crate::errors::Result;
use crate::models::{AmcContract, AmcDetails, Customer, ServiceEntry};
use crate::revenue::window::{RevenueWindow, WindowBounds};
use crate::types::{AmcPaymentMethod, AmcType, ContractStatus, CustomerId, PaymentMethod, PaymentStatus};

/// service revenue over one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevenueByPeriod {
    pub total_revenue: Money,
    pub paid_services_count: u64,
    pub free_services_count: u64,
}

impl RevenueByPeriod {
    fn add(&mut self, service: &ServiceEntry) {
        // free entries carry a zero amount, so summing every status is safe
        self.total_revenue += service.amount;
        match service.payment_status {
            PaymentStatus::Paid => self.paid_services_count += 1,
            PaymentStatus::Free => self.free_services_count += 1,
            PaymentStatus::Unpaid => {}
        }
    }
}

/// per-customer row of the revenue breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRevenueBreakdown {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub contract_type: Option<AmcType>,
    pub paid_services_count: u64,
    pub free_services_count: u64,
    pub total_revenue: Money,
    pub amc_renewal_count: u64,
}

/// collected service payments by method; only paid entries count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodBreakdown {
    pub cash_payments: Money,
    pub upi_payments: Money,
}

impl PaymentMethodBreakdown {
    pub fn amount_for(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash_payments,
            PaymentMethod::Upi => self.upi_payments,
        }
    }

    pub fn total(&self) -> Money {
        self.cash_payments + self.upi_payments
    }
}

/// collected AMC payments by the wider AMC method set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AmcPaymentMethodBreakdown {
    pub totals: BTreeMap<AmcPaymentMethod, Money>,
}

impl AmcPaymentMethodBreakdown {
    pub fn amount_for(&self, method: AmcPaymentMethod) -> Money {
        self.totals.get(&method).copied().unwrap_or(Money::ZERO)
    }

    pub fn total(&self) -> Money {
        self.totals.values().sum()
    }
}

/// contract value split by derived status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AmcRevenue {
    pub total_amount: Money,
    /// active or pending renewal
    pub in_progress_amount: Money,
    /// expired
    pub completed_amount: Money,
    pub remaining_balance: Money,
}

impl AmcRevenue {
    /// sum two reports bucket by bucket
    pub fn combined(self, other: AmcRevenue) -> AmcRevenue {
        AmcRevenue {
            total_amount: self.total_amount + other.total_amount,
            in_progress_amount: self.in_progress_amount + other.in_progress_amount,
            completed_amount: self.completed_amount + other.completed_amount,
            remaining_balance: self.remaining_balance + other.remaining_balance,
        }
    }

    fn add(&mut self, amount: Money, status: ContractStatus) {
        self.total_amount += amount;
        match status {
            ContractStatus::Active | ContractStatus::PendingRenewal => self.in_progress_amount += amount,
            ContractStatus::Expired => self.completed_amount += amount,
        }
    }
}

pub fn aggregate_revenue(services: &[ServiceEntry], window: &RevenueWindow) -> Result<RevenueByPeriod> {
    let bounds = WindowBounds::resolve(window)?;
    let mut revenue = RevenueByPeriod::default();
    for service in services.iter().filter(|s| bounds.contains(s.service_date)) {
        revenue.add(service);
    }
    debug!(
        "revenue for {}: {} over {} paid / {} free",
        window.label(),
        revenue.total_revenue,
        revenue.paid_services_count,
        revenue.free_services_count
    );
    Ok(revenue)
}

/// One row per customer with a service in the window or any AMC, ordered by customer id.
///
/// Renewals count each embedded or long-form contract starting inside the window.
pub fn aggregate_by_customer(
    services: &[ServiceEntry],
    customers: &[Customer],
    window: &RevenueWindow,
) -> Result<Vec<CustomerRevenueBreakdown>> {
    let bounds = WindowBounds::resolve(window)?;

    let mut per_customer: BTreeMap<CustomerId, RevenueByPeriod> = BTreeMap::new();
    for service in services.iter().filter(|s| bounds.contains(s.service_date)) {
        per_customer.entry(service.customer_id).or_default().add(service);
    }

    let mut by_id: BTreeMap<CustomerId, &Customer> = BTreeMap::new();
    for customer in customers {
        by_id.insert(customer.id, customer);
    }

    let mut rows = Vec::new();
    for (id, customer) in by_id {
        let has_amc = customer.amc_details.is_some() || !customer.amc_contracts.is_empty();
        let revenue = per_customer.get(&id).copied();
        if revenue.is_none() && !has_amc {
            continue;
        }
        let revenue = revenue.unwrap_or_default();

        let embedded_renewals = customer
            .amc_details
            .iter()
            .filter(|amc| bounds.contains(amc.contract_start_date))
            .count();
        let bulk_renewals = customer
            .amc_contracts
            .iter()
            .filter(|c| bounds.contains(c.start_date))
            .count();

        let contract_type = customer.amc_details.as_ref().map(|amc| amc.contract_type).or_else(|| {
            customer
                .amc_contracts
                .iter()
                .max_by_key(|c| (c.start_date, c.contract_type))
                .map(|c| c.contract_type)
        });

        rows.push(CustomerRevenueBreakdown {
            customer_id: id,
            customer_name: customer.name.clone(),
            contract_type,
            paid_services_count: revenue.paid_services_count,
            free_services_count: revenue.free_services_count,
            total_revenue: revenue.total_revenue,
            amc_renewal_count: (embedded_renewals + bulk_renewals) as u64,
        });
    }
    Ok(rows)
}

pub fn aggregate_by_payment_method(
    services: &[ServiceEntry],
    window: Option<&RevenueWindow>,
) -> Result<PaymentMethodBreakdown> {
    let bounds = window.map(WindowBounds::resolve).transpose()?;
    let mut breakdown = PaymentMethodBreakdown::default();
    for service in services {
        if bounds.map_or(false, |b| !b.contains(service.service_date)) {
            continue;
        }
        if service.payment_status != PaymentStatus::Paid {
            continue;
        }
        match service.payment_method {
            Some(PaymentMethod::Cash) => breakdown.cash_payments += service.amount,
            Some(PaymentMethod::Upi) => breakdown.upi_payments += service.amount,
            None => {}
        }
    }
    Ok(breakdown)
}

/// collected AMC amounts (total less remaining) per AMC method, windowed on contract start
pub fn aggregate_amc_by_payment_method(
    amcs: &[AmcDetails],
    window: Option<&RevenueWindow>,
) -> Result<AmcPaymentMethodBreakdown> {
    let bounds = window.map(WindowBounds::resolve).transpose()?;
    let mut breakdown = AmcPaymentMethodBreakdown::default();
    for amc in amcs {
        if bounds.map_or(false, |b| !b.contains(amc.contract_start_date)) {
            continue;
        }
        *breakdown.totals.entry(amc.payment_method).or_insert(Money::ZERO) += amc.amount_paid();
    }
    Ok(breakdown)
}

pub fn aggregate_amc_revenue(
    amcs: &[AmcDetails],
    now: crate::time::Timestamp,
    pending_renewal_window_days: u32,
) -> Result<AmcRevenue> {
    let mut revenue = AmcRevenue::default();
    for amc in amcs {
        let status = derive_amc_contract_status(
            amc.contract_start_date,
            amc.contract_end_date,
            now,
            pending_renewal_window_days,
        )?;
        revenue.add(amc.total_amount, status);
        revenue.remaining_balance += amc.remaining_balance;
    }
    Ok(revenue)
}

/// Bulk-applied contracts split by status.
///
/// These carry no payment record, so the full amount counts as settled and
/// nothing is added to `remaining_balance`.
pub fn aggregate_amc_contract_revenue(
    contracts: &[AmcContract],
    now: crate::time::Timestamp,
    pending_renewal_window_days: u32,
) -> Result<AmcRevenue> {
    let mut revenue = AmcRevenue::default();
    for contract in contracts {
        let status = derive_amc_contract_status(contract.start_date, contract.end_date, now, pending_renewal_window_days)?;
        revenue.add(contract.amount, status);
    }
    Ok(revenue)
}
