pub mod config;
pub mod decimal;
pub mod derivation;
pub mod errors;
pub mod events;
pub mod import;
pub mod models;
pub mod phone;
pub mod reminders;
pub mod revenue;
pub mod service;
pub mod store;
pub mod time;
pub mod types;
pub mod views;

// re-export key types
pub use config::{CrmConfig, DerivationConfig, ImportConfig, ReminderConfig, RevenueConfig};
pub use decimal::Money;
pub use derivation::{
    compute_amc_contract_end_date, compute_amc_remaining_balance, derive_amc_contract_status,
    derive_next_service_date, derive_warranty_status, DerivationEngine, WarrantyCounts,
};
pub use errors::{CrmError, Result};
pub use events::{CrmEvent, EventStore};
pub use import::{BatchResult, Cell, ColumnMap, ImportCustomerData, ImportPreview, ImportValidator, ParsedRow};
pub use models::{
    AmcContract, AmcDetails, AmcServiceEntry, Customer, NewAmcServiceEntry, NewCustomer,
    NewReminder, NewServiceEntry, PriceReduction, Reminder, ServiceEntry,
};
pub use phone::{normalize_indian_mobile_to_e164, to_whatsapp_number};
pub use reminders::{ReminderLifecycle, ServiceDone, ServiceRecorded};
pub use revenue::{
    aggregate_amc_contract_revenue, aggregate_amc_revenue, aggregate_by_customer,
    aggregate_by_payment_method, aggregate_revenue,
    AmcPaymentMethodBreakdown, AmcRevenue, CustomerRevenueBreakdown, PaymentMethodBreakdown,
    RevenueAggregator, RevenueByPeriod, RevenueWindow,
};
pub use service::{BulkAmcTerms, CrmService};
pub use store::{CrmStore, InMemoryStore};
pub use time::{parse_date_input, Timestamp};
pub use types::{
    AmcPaymentMethod, AmcType, ContractStatus, CustomerId, PaymentMethod, PaymentStatus,
    ServiceInterval, ServiceType, UserRole, WarrantyStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
