use crate::decimal::Money;
use crate::errors::{CrmError, Result};
use crate::time::Timestamp;
use crate::types::ContractStatus;

/// calendar-year end date for a contract of `duration_years`
pub fn compute_amc_contract_end_date(start: Timestamp, duration_years: u32) -> Result<Timestamp> {
    if duration_years == 0 {
        return Err(CrmError::validation("duration_years", "contract must run for at least one year"));
    }
    if !start.is_positive() {
        return Err(CrmError::validation(
            "contract_start_date",
            "contract start date must be after 1970-01-01",
        ));
    }
    start.add_years(duration_years)
}

/// Contract status at `now`.
///
/// Expired strictly after the end date, pending renewal within
/// `pending_renewal_window_days` before it (end date inclusive), otherwise active.
pub fn derive_amc_contract_status(
    contract_start_date: Timestamp,
    contract_end_date: Timestamp,
    now: Timestamp,
    pending_renewal_window_days: u32,
) -> Result<ContractStatus> {
    if contract_end_date < contract_start_date {
        return Err(CrmError::validation(
            "contract_end_date",
            format!(
                "end date {} is before start date {}",
                contract_end_date.to_iso_date(),
                contract_start_date.to_iso_date()
            ),
        ));
    }

    let renewal_opens = contract_end_date.sub_days(pending_renewal_window_days as i64);
    Ok(if now > contract_end_date {
        ContractStatus::Expired
    } else if now >= renewal_opens {
        ContractStatus::PendingRenewal
    } else {
        ContractStatus::Active
    })
}

/// `max(0, total - paid)`; negative inputs are rejected rather than clamped
pub fn compute_amc_remaining_balance(total_amount: Money, payments_applied: Money) -> Result<Money> {
    total_amount.ensure_non_negative("total_amount")?;
    payments_applied.ensure_non_negative("payments_applied")?;
    Ok((total_amount - payments_applied).max(Money::ZERO))
}
