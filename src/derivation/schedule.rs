use crate::errors::{CrmError, Result};
use crate::models::{Customer, ServiceEntry};
use crate::time::Timestamp;
use crate::types::{CustomerId, ServiceInterval};

/// Next service date.
///
/// Without a completed service the schedule runs from installation; after a
/// service completed on `D` it runs from `D`. Months are calendar months.
pub fn derive_next_service_date(
    installation_date: Timestamp,
    service_interval: ServiceInterval,
    last_completed_date: Option<Timestamp>,
) -> Result<Timestamp> {
    if !installation_date.is_positive() {
        return Err(CrmError::validation(
            "installation_date",
            "installation date must be after 1970-01-01",
        ));
    }
    let base = match last_completed_date {
        Some(done) if !done.is_positive() => {
            return Err(CrmError::validation(
                "service_date",
                "completed service date must be after 1970-01-01",
            ))
        }
        Some(done) => done,
        None => installation_date,
    };
    base.add_months(service_interval.months())
}

/// same as `derive_next_service_date` for an unchecked month count
pub fn derive_next_service_date_from_months(
    installation_date: Timestamp,
    interval_months: u64,
    last_completed_date: Option<Timestamp>,
) -> Result<Timestamp> {
    let interval = ServiceInterval::from_months(interval_months)?;
    derive_next_service_date(installation_date, interval, last_completed_date)
}

/// latest service date recorded for the customer
pub fn last_completed_service_date(services: &[ServiceEntry], customer_id: CustomerId) -> Option<Timestamp> {
    services
        .iter()
        .filter(|s| s.customer_id == customer_id)
        .map(|s| s.service_date)
        .max()
}

/// latest completion known for the customer, recorded entry or visit marked done
pub fn last_service_for(customer: &Customer, services: &[ServiceEntry]) -> Option<Timestamp> {
    last_completed_service_date(services, customer.id).max(customer.last_service_done_date)
}

/// recompute `next_service_date` from the history snapshot and the last visit marked done
pub fn reschedule_customer(customer: &mut Customer, services: &[ServiceEntry]) -> Result<()> {
    let last_done = last_service_for(customer, services);
    customer.next_service_date =
        derive_next_service_date(customer.installation_date, customer.service_interval, last_done)?;
    Ok(())
}
