pub mod aggregate;
pub mod window;

use log::debug;

use crate::config::{DerivationConfig, RevenueConfig};
use crate::errors::Result;
use crate::models::{AmcContract, AmcDetails, Customer, ServiceEntry};
use crate::time::Timestamp;

pub use aggregate::{
    aggregate_amc_by_payment_method, aggregate_amc_contract_revenue, aggregate_amc_revenue, aggregate_by_customer,
    aggregate_by_payment_method, aggregate_revenue, AmcPaymentMethodBreakdown, AmcRevenue,
    CustomerRevenueBreakdown, PaymentMethodBreakdown, RevenueByPeriod,
};
pub use window::{fiscal_quarter_of, fy_quarter, fy_quarter_label, FyQuarter, RevenueWindow, WindowBounds, FY_QUARTERS};

/// monthly revenue for one calendar year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub revenue: RevenueByPeriod,
}

/// revenue reports over snapshots, parameterised by reporting policy
#[derive(Debug, Clone, Default)]
pub struct RevenueAggregator {
    pub config: RevenueConfig,
    pub derivation: DerivationConfig,
}

impl RevenueAggregator {
    pub fn new(config: RevenueConfig, derivation: DerivationConfig) -> Self {
        Self { config, derivation }
    }

    pub fn revenue(&self, services: &[ServiceEntry], window: &RevenueWindow) -> Result<RevenueByPeriod> {
        aggregate_revenue(services, window)
    }

    /// twelve monthly buckets, January first
    pub fn monthly_revenue(&self, services: &[ServiceEntry], year: i32) -> Result<Vec<MonthlyRevenue>> {
        (1..=12)
            .map(|month| {
                let revenue = aggregate_revenue(services, &RevenueWindow::month(year, month)?)?;
                Ok(MonthlyRevenue { month, revenue })
            })
            .collect()
    }

    /// the four fiscal quarters of `fiscal_year`, Q1 first
    pub fn fiscal_year_revenue(&self, services: &[ServiceEntry], fiscal_year: i32) -> Result<Vec<(FyQuarter, RevenueByPeriod)>> {
        FY_QUARTERS
            .iter()
            .map(|q| {
                let revenue = aggregate_revenue(services, &RevenueWindow::fiscal_quarter(fiscal_year, q.quarter)?)?;
                Ok((*q, revenue))
            })
            .collect()
    }

    /// per-customer rows over the configured trailing months
    pub fn customer_breakdown(
        &self,
        services: &[ServiceEntry],
        customers: &[Customer],
        now: Timestamp,
    ) -> Result<Vec<CustomerRevenueBreakdown>> {
        let window = RevenueWindow::trailing_months(now, self.config.customer_breakdown_months)?;
        let rows = aggregate_by_customer(services, customers, &window)?;
        debug!("customer breakdown for {}: {} rows", window.label(), rows.len());
        Ok(rows)
    }

    pub fn payment_methods(
        &self,
        services: &[ServiceEntry],
        window: Option<&RevenueWindow>,
    ) -> Result<PaymentMethodBreakdown> {
        aggregate_by_payment_method(services, window)
    }

    pub fn amc_payment_methods(
        &self,
        customers: &[Customer],
        window: Option<&RevenueWindow>,
    ) -> Result<AmcPaymentMethodBreakdown> {
        aggregate_amc_by_payment_method(&embedded_amcs(customers), window)
    }

    /// embedded AMCs and bulk-applied contracts together
    pub fn amc_revenue(&self, customers: &[Customer], now: Timestamp) -> Result<AmcRevenue> {
        let window_days = self.derivation.pending_renewal_window_days;
        let contracts: Vec<AmcContract> = customers.iter().flat_map(|c| c.amc_contracts.iter().cloned()).collect();
        let revenue = aggregate_amc_revenue(&embedded_amcs(customers), now, window_days)?
            .combined(aggregate_amc_contract_revenue(&contracts, now, window_days)?);
        debug!(
            "amc revenue: total {}, in progress {}, completed {}",
            revenue.total_amount, revenue.in_progress_amount, revenue.completed_amount
        );
        Ok(revenue)
    }
}

fn embedded_amcs(customers: &[Customer]) -> Vec<AmcDetails> {
    customers.iter().filter_map(|c| c.amc_details.clone()).collect()
}
