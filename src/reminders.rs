use log::debug;

use crate::config::ReminderConfig;
use crate::derivation::reschedule_customer;
use crate::errors::{CrmError, Result};
use crate::models::{Customer, NewReminder, Reminder, ServiceEntry};
use crate::time::{parse_date_input, Timestamp};
use crate::types::CustomerId;

/// records to persist after a service entry is added or edited
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecorded {
    pub entry: ServiceEntry,
    /// the owning customer with `next_service_date` recomputed
    pub customer: Customer,
}

/// records to persist after a service is marked done
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDone {
    pub reminder: NewReminder,
    pub customer: Customer,
}

/// Transitions that tie service history to reminders.
///
/// Every transition takes the current snapshot and returns the records to
/// write back. Existing reminders are never edited or removed here; the sent
/// flag is only changed on request.
#[derive(Debug, Clone, Default)]
pub struct ReminderLifecycle {
    pub config: ReminderConfig,
}

impl ReminderLifecycle {
    pub fn new(config: ReminderConfig) -> Self {
        Self { config }
    }

    /// validate a new entry and advance the customer's schedule past it
    pub fn record_service_entry(
        &self,
        customer: &Customer,
        services: &[ServiceEntry],
        entry: ServiceEntry,
    ) -> Result<ServiceRecorded> {
        entry.validate()?;
        ensure_owned_by(customer, &entry)?;

        let mut history: Vec<ServiceEntry> = services.iter().filter(|s| s.id != entry.id).cloned().collect();
        history.push(entry.clone());
        let customer = reschedule(customer, &history)?;

        debug!(
            "service {} recorded for customer {}, next service {}",
            entry.id,
            customer.id,
            customer.next_service_date.to_iso_date()
        );
        Ok(ServiceRecorded { entry, customer })
    }

    /// replace an existing entry; reminders already created keep their dates
    pub fn update_service_entry(
        &self,
        customer: &Customer,
        services: &[ServiceEntry],
        updated: ServiceEntry,
    ) -> Result<ServiceRecorded> {
        if !services.iter().any(|s| s.id == updated.id) {
            return Err(CrmError::not_found("service entry", updated.id));
        }
        updated.validate()?;
        ensure_owned_by(customer, &updated)?;

        let history: Vec<ServiceEntry> = services
            .iter()
            .map(|s| if s.id == updated.id { updated.clone() } else { s.clone() })
            .collect();
        let customer = reschedule(customer, &history)?;

        debug!(
            "service {} updated for customer {}, next service {}",
            updated.id,
            customer.id,
            customer.next_service_date.to_iso_date()
        );
        Ok(ServiceRecorded { entry: updated, customer })
    }

    /// Close out a service visit.
    ///
    /// Produces one new unsent reminder at `done + interval` and moves the
    /// customer's next service date there. Two concurrent calls for the same
    /// customer would each produce a reminder; callers serialise per customer.
    pub fn mark_service_as_done(
        &self,
        customers: &[Customer],
        customer_id: CustomerId,
        service_done_date: Timestamp,
    ) -> Result<ServiceDone> {
        let customer = customers
            .iter()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| CrmError::validation("customer_id", format!("customer {} does not exist", customer_id)))?;
        if !service_done_date.is_positive() {
            return Err(CrmError::validation(
                "service_done_date",
                "service done date must be after 1970-01-01",
            ));
        }

        let reminder_date = service_done_date.add_months(customer.service_interval.months())?;
        let mut customer = customer.clone();
        customer.next_service_date = reminder_date;
        customer.last_service_done_date = Some(service_done_date);

        let reminder = NewReminder {
            customer_id,
            reminder_date,
            description: format!(
                "Service due for {} (every {}, last serviced {})",
                customer.name,
                customer.service_interval.label(),
                service_done_date.format_date()
            ),
        };

        debug!(
            "customer {} serviced on {}, next reminder {}",
            customer_id,
            service_done_date.to_iso_date(),
            reminder_date.to_iso_date()
        );
        Ok(ServiceDone { reminder, customer })
    }

    /// same as `mark_service_as_done` with a user-entered date
    pub fn mark_service_as_done_on(
        &self,
        customers: &[Customer],
        customer_id: CustomerId,
        service_done_date: &str,
    ) -> Result<ServiceDone> {
        let done = parse_date_input(service_done_date).map_err(|e| match e {
            CrmError::Validation { message, .. } => CrmError::validation("service_done_date", message),
            other => other,
        })?;
        self.mark_service_as_done(customers, customer_id, done)
    }

    /// trim and check a manually entered reminder
    pub fn validate_reminder(&self, customers: &[Customer], reminder: NewReminder) -> Result<NewReminder> {
        if !customers.iter().any(|c| c.id == reminder.customer_id) {
            return Err(CrmError::validation(
                "customer_id",
                format!("customer {} does not exist", reminder.customer_id),
            ));
        }
        if !reminder.reminder_date.is_positive() {
            return Err(CrmError::validation("reminder_date", "reminder date must be after 1970-01-01"));
        }
        let description = reminder.description.trim().to_string();
        if description.is_empty() {
            return Err(CrmError::validation("description", "description is required"));
        }
        Ok(NewReminder { description, ..reminder })
    }

    /// reminders dated on the UTC day containing `now`
    pub fn todays_reminders<'a>(&self, reminders: &'a [Reminder], now: Timestamp) -> Vec<&'a Reminder> {
        let from = now.start_of_day();
        let until = from.add_days(1);
        sorted_between(reminders, from, until)
    }

    /// reminders from tomorrow through the configured window, today excluded
    pub fn upcoming_reminders<'a>(&self, reminders: &'a [Reminder], now: Timestamp) -> Vec<&'a Reminder> {
        let from = now.start_of_day().add_days(1);
        let until = from.add_days(self.config.upcoming_window_days as i64);
        sorted_between(reminders, from, until)
    }

    pub fn unsent_reminders<'a>(&self, reminders: &'a [Reminder]) -> Vec<&'a Reminder> {
        reminders.iter().filter(|r| !r.sent_status).collect()
    }
}

/// set or clear the sent flag; toggling back to unsent is allowed
pub fn set_reminder_sent(reminder: &mut Reminder, sent: bool) {
    reminder.sent_status = sent;
}

fn ensure_owned_by(customer: &Customer, entry: &ServiceEntry) -> Result<()> {
    if entry.customer_id != customer.id {
        return Err(CrmError::validation(
            "customer_id",
            format!("service {} belongs to customer {}, not {}", entry.id, entry.customer_id, customer.id),
        ));
    }
    Ok(())
}

fn reschedule(customer: &Customer, history: &[ServiceEntry]) -> Result<Customer> {
    let mut customer = customer.clone();
    reschedule_customer(&mut customer, history)?;
    Ok(customer)
}

fn sorted_between(reminders: &[Reminder], from: Timestamp, until: Timestamp) -> Vec<&Reminder> {
    let mut matching: Vec<&Reminder> = reminders
        .iter()
        .filter(|r| r.reminder_date >= from && r.reminder_date < until)
        .collect();
    matching.sort_by_key(|r| (r.reminder_date, r.id));
    matching
}
