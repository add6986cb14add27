use crate::errors::{CrmError, Result};
use crate::time::Timestamp;
use crate::types::WarrantyStatus;

/// first instant at which the appliance is out of warranty
pub fn warranty_end_date(installation_date: Timestamp, warranty_period_months: u32) -> Result<Timestamp> {
    if !installation_date.is_positive() {
        return Err(CrmError::validation(
            "installation_date",
            "installation date must be after 1970-01-01",
        ));
    }
    if warranty_period_months == 0 {
        return Err(CrmError::validation("warranty_period", "warranty period must be at least one month"));
    }
    installation_date.add_months(warranty_period_months)
}

/// In warranty while `now < installation + period`; the boundary instant is out of warranty.
pub fn derive_warranty_status(
    installation_date: Timestamp,
    now: Timestamp,
    warranty_period_months: u32,
) -> Result<WarrantyStatus> {
    let ends = warranty_end_date(installation_date, warranty_period_months)?;
    Ok(if now < ends {
        WarrantyStatus::InWarranty
    } else {
        WarrantyStatus::OutWarranty
    })
}
