use hourglass_rs::SafeTimeProvider;
use log::{info, warn};

use crate::config::CrmConfig;
use crate::decimal::Money;
use crate::derivation::{
    customers_due_in_month, reschedule_customer, unpaid_services, upcoming_services,
    DerivationEngine, WarrantyCounts,
};
use crate::errors::{CrmError, Result};
use crate::events::{CrmEvent, EventStore};
use crate::import::{BatchResult, Cell, ImportPreview, ImportValidator};
use crate::models::{
    AmcContract, AmcServiceEntry, Customer, NewAmcServiceEntry, NewCustomer, NewReminder,
    NewServiceEntry, Reminder, ServiceEntry,
};
use crate::reminders::{set_reminder_sent, ReminderLifecycle};
use crate::revenue::{
    AmcPaymentMethodBreakdown, AmcRevenue, CustomerRevenueBreakdown, MonthlyRevenue,
    PaymentMethodBreakdown, RevenueAggregator, RevenueByPeriod, RevenueWindow,
};
use crate::store::CrmStore;
use crate::time::Timestamp;
use crate::types::{AmcType, CustomerId, PaymentMethod, PaymentStatus, ReminderId, ServiceId, WarrantyStatus};

/// long-form contract terms applied to several customers at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAmcTerms {
    pub contract_type: AmcType,
    pub amount: Money,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

/// Facade over a store.
///
/// Writes read a fresh snapshot, run the pure engines, then persist and emit
/// events. Edits, deletes, imports and bulk AMC changes require an admin
/// caller. Existence checks happen before anything is written.
pub struct CrmService<S: CrmStore> {
    pub store: S,
    pub config: CrmConfig,
    pub derivation: DerivationEngine,
    pub revenue: RevenueAggregator,
    pub reminders: ReminderLifecycle,
    pub import: ImportValidator,
    pub events: EventStore,
}

impl<S: CrmStore> CrmService<S> {
    pub fn new(store: S, config: CrmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            derivation: DerivationEngine::new(config.derivation.clone()),
            revenue: RevenueAggregator::new(config.revenue.clone(), config.derivation.clone()),
            reminders: ReminderLifecycle::new(config.reminders.clone()),
            import: ImportValidator::new(config.import.clone()),
            config,
            events: EventStore::new(),
        })
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<CrmEvent> {
        self.events.take_events()
    }

    // ---- customers ----

    pub fn add_customer(&mut self, input: NewCustomer, time: &SafeTimeProvider) -> Result<Customer> {
        let now = now(time)?;
        let input = input.normalized()?;
        let id = self.store.next_customer_id()?;
        let customer = self.derivation.build_customer(id, self.store.caller(), input, now)?;
        self.store.put_customer(customer.clone())?;

        info!("customer {} added, next service {}", id, customer.next_service_date.to_iso_date());
        self.events.emit(CrmEvent::CustomerAdded {
            customer_id: id,
            next_service_date: customer.next_service_date,
            timestamp: now,
        });
        Ok(customer)
    }

    /// replace editable fields; AMC history and bulk contracts are kept
    pub fn update_customer(
        &mut self,
        id: CustomerId,
        input: NewCustomer,
        time: &SafeTimeProvider,
    ) -> Result<Customer> {
        self.require_admin("update customers")?;
        let now = now(time)?;
        let existing = self.customer(id)?;

        let mut customer = self.derivation.build_customer(id, existing.owner.clone(), input, now)?;
        customer.amc_services = existing.amc_services.clone();
        customer.amc_contracts = existing.amc_contracts.clone();
        customer.last_service_done_date = existing.last_service_done_date;
        let services = self.store.fetch_services_for(id)?;
        self.derivation.refresh_customer(&mut customer, &services, now)?;
        self.store.put_customer(customer.clone())?;

        info!("customer {} updated", id);
        self.events.emit(CrmEvent::CustomerUpdated { customer_id: id, timestamp: now });
        self.emit_schedule_change(&existing, &customer, now);
        Ok(customer)
    }

    pub fn delete_customer(&mut self, id: CustomerId, time: &SafeTimeProvider) -> Result<()> {
        self.require_admin("delete customers")?;
        let now = now(time)?;
        self.customer(id)?;
        self.store.delete_customer(id)?;

        info!("customer {} deleted", id);
        self.events.emit(CrmEvent::CustomerDeleted { customer_id: id, timestamp: now });
        Ok(())
    }

    /// delete each id independently; missing ids are reported, not fatal
    pub fn multi_delete_customers(&mut self, ids: &[CustomerId], time: &SafeTimeProvider) -> Result<BatchResult> {
        self.require_admin("delete customers")?;
        let now = now(time)?;

        let mut result = BatchResult::default();
        for &id in ids {
            match self.store.delete_customer(id) {
                Ok(true) => {
                    result.record_success();
                    self.events.emit(CrmEvent::CustomerDeleted { customer_id: id, timestamp: now });
                }
                Ok(false) => {
                    warn!("multi-delete: customer {} not found", id);
                    result.record_failure(CrmError::not_found("customer", id).to_string());
                }
                Err(e) => {
                    warn!("multi-delete: customer {} failed: {}", id, e);
                    result.record_failure(format!("customer {}: {}", id, e));
                }
            }
        }

        info!("multi-delete: {} deleted, {} failed", result.success_count, result.failure_count);
        Ok(result)
    }

    /// attach one long-form contract to every listed customer
    pub fn apply_amc_to_customers(
        &mut self,
        ids: &[CustomerId],
        terms: BulkAmcTerms,
        time: &SafeTimeProvider,
    ) -> Result<BatchResult> {
        self.require_admin("apply AMC contracts")?;
        let now = now(time)?;
        let contract = AmcContract {
            owner: self.store.caller(),
            contract_type: terms.contract_type,
            amount: terms.amount,
            start_date: terms.start_date,
            end_date: terms.end_date,
        };
        contract.validate()?;

        let mut result = BatchResult::default();
        for &id in ids {
            let outcome = self.store.fetch_customer(id).and_then(|found| {
                let mut customer = found.ok_or_else(|| CrmError::not_found("customer", id))?;
                customer.amc_contracts.push(contract.clone());
                self.store.put_customer(customer)
            });
            match outcome {
                Ok(()) => {
                    result.record_success();
                    self.events.emit(CrmEvent::AmcApplied {
                        customer_id: id,
                        contract_type: contract.contract_type,
                        amount: contract.amount,
                        timestamp: now,
                    });
                }
                Err(e) => {
                    warn!("bulk AMC: customer {} skipped: {}", id, e);
                    result.record_failure(e.to_string());
                }
            }
        }

        info!("bulk AMC applied to {} customers, {} failed", result.success_count, result.failure_count);
        Ok(result)
    }

    /// apply a change to the embedded AMC and persist it
    fn update_amc<F>(&mut self, id: CustomerId, time: &SafeTimeProvider, change: F) -> Result<Customer>
    where
        F: FnOnce(&mut crate::models::AmcDetails) -> Result<()>,
    {
        self.require_admin("edit AMC details")?;
        let now = now(time)?;
        let mut customer = self.customer(id)?;
        let amc = customer
            .amc_details
            .as_mut()
            .ok_or_else(|| CrmError::validation("amc_details", format!("customer {} has no AMC", id)))?;
        change(amc)?;
        amc.validate()?;
        self.store.put_customer(customer.clone())?;

        info!("AMC for customer {} updated", id);
        self.events.emit(CrmEvent::CustomerUpdated { customer_id: id, timestamp: now });
        Ok(customer)
    }

    pub fn record_amc_payment(&mut self, id: CustomerId, amount: Money, time: &SafeTimeProvider) -> Result<Customer> {
        self.update_amc(id, time, |amc| amc.record_payment(amount))
    }

    /// change the contract value, keeping what has been paid
    pub fn revise_amc_total(&mut self, id: CustomerId, new_total: Money, time: &SafeTimeProvider) -> Result<Customer> {
        self.update_amc(id, time, |amc| amc.revise_total(new_total))
    }

    // ---- import ----

    pub fn preview_import(&self, rows: &[Vec<Cell>], time: &SafeTimeProvider) -> Result<ImportPreview> {
        self.import.validate_rows(rows, now(time)?)
    }

    /// Create a customer for each valid row.
    ///
    /// Invalid rows and rows the store rejects are counted as failures; rows
    /// already written stay written.
    pub fn import_customers(&mut self, preview: &ImportPreview, time: &SafeTimeProvider) -> Result<BatchResult> {
        self.require_admin("import customers")?;
        let now = now(time)?;

        let mut result = BatchResult::default();
        for row in &preview.rows {
            if !row.is_valid {
                warn!("import row {} skipped: {}", row.row_number, row.errors.join("; "));
                result.record_failure(format!("row {}: {}", row.row_number, row.errors.join("; ")));
                continue;
            }
            let outcome = self.store.next_customer_id().and_then(|id| {
                let customer =
                    self.derivation
                        .build_customer(id, self.store.caller(), NewCustomer::from(row.data.clone()), now)?;
                self.store.put_customer(customer)
            });
            match outcome {
                Ok(()) => result.record_success(),
                Err(e) => {
                    warn!("import row {} failed: {}", row.row_number, e);
                    result.record_failure(format!("row {}: {}", row.row_number, e));
                }
            }
        }

        info!("import: {} customers created, {} failed", result.success_count, result.failure_count);
        self.events.emit(CrmEvent::CustomersImported {
            success_count: result.success_count,
            failure_count: result.failure_count,
            timestamp: now,
        });
        Ok(result)
    }

    // ---- services ----

    pub fn add_service_entry(&mut self, input: NewServiceEntry, time: &SafeTimeProvider) -> Result<ServiceEntry> {
        let now = now(time)?;
        let customer = self.customer(input.customer_id)?;
        input.validate()?;

        let services = self.store.fetch_services_for(customer.id)?;
        let id = self.store.next_service_id()?;
        let entry = ServiceEntry::from_new(id, self.store.caller(), input);
        let recorded = self.reminders.record_service_entry(&customer, &services, entry)?;

        self.store.put_service(recorded.entry.clone())?;
        self.store.put_customer(recorded.customer.clone())?;

        info!("service {} recorded for customer {}", id, customer.id);
        self.events.emit(CrmEvent::ServiceRecorded {
            service_id: id,
            customer_id: customer.id,
            amount: recorded.entry.amount,
            payment_status: recorded.entry.payment_status,
            timestamp: now,
        });
        self.emit_schedule_change(&customer, &recorded.customer, now);
        Ok(recorded.entry)
    }

    pub fn update_service_entry(
        &mut self,
        service_id: ServiceId,
        input: NewServiceEntry,
        time: &SafeTimeProvider,
    ) -> Result<ServiceEntry> {
        self.require_admin("edit service entries")?;
        let now = now(time)?;
        let existing = self.service(service_id)?;
        if input.customer_id != existing.customer_id {
            return Err(CrmError::validation(
                "customer_id",
                format!("service {} cannot move to another customer", service_id),
            ));
        }
        let customer = self.customer(existing.customer_id)?;

        let services = self.store.fetch_services_for(customer.id)?;
        let updated = ServiceEntry::from_new(service_id, existing.owner, input);
        let recorded = self.reminders.update_service_entry(&customer, &services, updated)?;

        self.store.put_service(recorded.entry.clone())?;
        self.store.put_customer(recorded.customer.clone())?;

        info!("service {} updated", service_id);
        self.events.emit(CrmEvent::ServiceUpdated {
            service_id,
            customer_id: customer.id,
            timestamp: now,
        });
        self.emit_schedule_change(&customer, &recorded.customer, now);
        Ok(recorded.entry)
    }

    pub fn update_payment_status(
        &mut self,
        service_id: ServiceId,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        time: &SafeTimeProvider,
    ) -> Result<ServiceEntry> {
        self.require_admin("update payment status")?;
        let now = now(time)?;
        let mut entry = self.service(service_id)?;
        let old_status = entry.payment_status;
        entry.set_payment_status(status, method)?;
        self.store.put_service(entry.clone())?;

        info!("service {} payment {} -> {}", service_id, old_status.label(), status.label());
        self.events.emit(CrmEvent::PaymentStatusChanged {
            service_id,
            old_status,
            new_status: status,
            method,
            timestamp: now,
        });
        Ok(entry)
    }

    /// remove an entry and rebuild the owner's schedule from what remains
    pub fn delete_service_entry(&mut self, service_id: ServiceId, time: &SafeTimeProvider) -> Result<()> {
        self.require_admin("delete service entries")?;
        let now = now(time)?;
        let entry = self.service(service_id)?;
        self.store.delete_service(service_id)?;

        if let Some(customer) = self.store.fetch_customer(entry.customer_id)? {
            let remaining = self.store.fetch_services_for(customer.id)?;
            let mut rescheduled = customer.clone();
            reschedule_customer(&mut rescheduled, &remaining)?;
            self.store.put_customer(rescheduled.clone())?;
            self.emit_schedule_change(&customer, &rescheduled, now);
        }

        info!("service {} deleted", service_id);
        self.events.emit(CrmEvent::ServiceDeleted {
            service_id,
            customer_id: entry.customer_id,
            timestamp: now,
        });
        Ok(())
    }

    /// log a visit under the customer's embedded AMC; status is taken on the service date
    pub fn add_amc_service_entry(
        &mut self,
        customer_id: CustomerId,
        input: NewAmcServiceEntry,
        time: &SafeTimeProvider,
    ) -> Result<AmcServiceEntry> {
        let now = now(time)?;
        let mut customer = self.customer(customer_id)?;
        let amc = customer.amc_details.as_ref().ok_or_else(|| {
            CrmError::validation("amc_details", format!("customer {} has no AMC", customer_id))
        })?;
        if !input.service_date.is_positive() {
            return Err(CrmError::validation("service_date", "service date must be after 1970-01-01"));
        }
        let contract_status = self.derivation.contract_status(amc, input.service_date)?;
        let contract_type = amc.contract_type;

        let entry = AmcServiceEntry {
            amc_service_id: self.store.next_amc_id()?,
            customer_service_id: customer_id,
            service_date: input.service_date,
            contract_type,
            contract_status,
            parts_replaced: input.parts_replaced.trim().to_string(),
            follow_up_needed: input.follow_up_needed,
            price_reduction: input.price_reduction,
            notes: input.notes,
        };
        customer.amc_services.push(entry.clone());
        self.store.put_customer(customer)?;

        info!("AMC service {} recorded for customer {}", entry.amc_service_id, customer_id);
        self.events.emit(CrmEvent::AmcServiceRecorded {
            customer_id,
            amc_service_id: entry.amc_service_id,
            timestamp: now,
        });
        Ok(entry)
    }

    // ---- reminders ----

    pub fn add_reminder(&mut self, input: NewReminder, time: &SafeTimeProvider) -> Result<Reminder> {
        let now = now(time)?;
        let customers = self.store.fetch_customers()?;
        let input = self.reminders.validate_reminder(&customers, input)?;
        let id = self.store.next_reminder_id()?;
        let reminder = Reminder::from_new(id, self.store.caller(), input);
        self.store.put_reminder(reminder.clone())?;

        info!("reminder {} created for customer {}", id, reminder.customer_id);
        self.events.emit(CrmEvent::ReminderCreated {
            reminder_id: id,
            customer_id: reminder.customer_id,
            reminder_date: reminder.reminder_date,
            timestamp: now,
        });
        Ok(reminder)
    }

    pub fn set_reminder_sent(&mut self, id: ReminderId, sent: bool, time: &SafeTimeProvider) -> Result<Reminder> {
        let now = now(time)?;
        let mut reminder = self
            .store
            .fetch_reminder(id)?
            .ok_or_else(|| CrmError::not_found("reminder", id))?;
        set_reminder_sent(&mut reminder, sent);
        self.store.put_reminder(reminder.clone())?;

        info!("reminder {} marked {}", id, if sent { "sent" } else { "unsent" });
        self.events.emit(CrmEvent::ReminderSentToggled { reminder_id: id, sent, timestamp: now });
        Ok(reminder)
    }

    /// create the follow-up reminder and advance the schedule; earlier reminders are untouched
    pub fn mark_service_as_done(
        &mut self,
        customer_id: CustomerId,
        service_done_date: Timestamp,
        time: &SafeTimeProvider,
    ) -> Result<Reminder> {
        let now = now(time)?;
        let customers = self.store.fetch_customers()?;
        let done = self.reminders.mark_service_as_done(&customers, customer_id, service_done_date)?;
        let previous = customers.iter().find(|c| c.id == customer_id).cloned();

        let id = self.store.next_reminder_id()?;
        let reminder = Reminder::from_new(id, self.store.caller(), done.reminder);
        self.store.put_reminder(reminder.clone())?;
        self.store.put_customer(done.customer.clone())?;

        info!(
            "customer {} serviced on {}, reminder {} set for {}",
            customer_id,
            service_done_date.to_iso_date(),
            id,
            reminder.reminder_date.to_iso_date()
        );
        self.events.emit(CrmEvent::ServiceMarkedDone {
            customer_id,
            service_done_date,
            reminder_id: id,
            timestamp: now,
        });
        self.events.emit(CrmEvent::ReminderCreated {
            reminder_id: id,
            customer_id,
            reminder_date: reminder.reminder_date,
            timestamp: now,
        });
        if let Some(previous) = previous {
            self.emit_schedule_change(&previous, &done.customer, now);
        }
        Ok(reminder)
    }

    // ---- queries ----

    pub fn customers(&self) -> Result<Vec<Customer>> {
        self.store.fetch_customers()
    }

    pub fn services(&self) -> Result<Vec<ServiceEntry>> {
        self.store.fetch_services()
    }

    pub fn reminders(&self) -> Result<Vec<Reminder>> {
        self.store.fetch_reminders()
    }

    pub fn revenue(&self, window: &RevenueWindow) -> Result<RevenueByPeriod> {
        self.revenue.revenue(&self.store.fetch_services()?, window)
    }

    pub fn monthly_revenue(&self, year: i32) -> Result<Vec<MonthlyRevenue>> {
        self.revenue.monthly_revenue(&self.store.fetch_services()?, year)
    }

    pub fn customer_revenue_breakdown(&self, time: &SafeTimeProvider) -> Result<Vec<CustomerRevenueBreakdown>> {
        let services = self.store.fetch_services()?;
        let customers = self.store.fetch_customers()?;
        self.revenue.customer_breakdown(&services, &customers, now(time)?)
    }

    pub fn payment_method_breakdown(&self, window: Option<&RevenueWindow>) -> Result<PaymentMethodBreakdown> {
        self.revenue.payment_methods(&self.store.fetch_services()?, window)
    }

    pub fn amc_payment_method_breakdown(&self, window: Option<&RevenueWindow>) -> Result<AmcPaymentMethodBreakdown> {
        self.revenue.amc_payment_methods(&self.store.fetch_customers()?, window)
    }

    pub fn amc_revenue(&self, time: &SafeTimeProvider) -> Result<AmcRevenue> {
        self.revenue.amc_revenue(&self.store.fetch_customers()?, now(time)?)
    }

    pub fn warranty_counts(&self, time: &SafeTimeProvider) -> Result<WarrantyCounts> {
        self.derivation.warranty_status_counts(&self.store.fetch_customers()?, now(time)?)
    }

    pub fn customers_by_warranty_status(
        &self,
        status: WarrantyStatus,
        time: &SafeTimeProvider,
    ) -> Result<Vec<Customer>> {
        let customers = self.store.fetch_customers()?;
        let matching = self.derivation.customers_by_warranty_status(&customers, status, now(time)?)?;
        Ok(matching.into_iter().cloned().collect())
    }

    pub fn customers_due_this_month(&self, time: &SafeTimeProvider) -> Result<Vec<Customer>> {
        let customers = self.store.fetch_customers()?;
        Ok(customers_due_in_month(&customers, now(time)?).into_iter().cloned().collect())
    }

    pub fn upcoming_services(&self, time: &SafeTimeProvider) -> Result<Vec<Customer>> {
        let customers = self.store.fetch_customers()?;
        let window = self.config.reminders.upcoming_service_window_days;
        Ok(upcoming_services(&customers, now(time)?, window).into_iter().cloned().collect())
    }

    pub fn unpaid_services(&self) -> Result<Vec<ServiceEntry>> {
        let services = self.store.fetch_services()?;
        Ok(unpaid_services(&services).into_iter().cloned().collect())
    }

    pub fn todays_reminders(&self, time: &SafeTimeProvider) -> Result<Vec<Reminder>> {
        let reminders = self.store.fetch_reminders()?;
        Ok(self.reminders.todays_reminders(&reminders, now(time)?).into_iter().cloned().collect())
    }

    pub fn upcoming_reminders(&self, time: &SafeTimeProvider) -> Result<Vec<Reminder>> {
        let reminders = self.store.fetch_reminders()?;
        Ok(self.reminders.upcoming_reminders(&reminders, now(time)?).into_iter().cloned().collect())
    }

    // ---- helpers ----

    fn require_admin(&self, operation: &str) -> Result<()> {
        if self.store.is_caller_admin()? {
            return Ok(());
        }
        warn!("refused to {} for non-admin caller {}", operation, self.store.caller());
        Err(CrmError::unauthorized(operation))
    }

    fn customer(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .fetch_customer(id)?
            .ok_or_else(|| CrmError::not_found("customer", id))
    }

    fn service(&self, id: ServiceId) -> Result<ServiceEntry> {
        self.store
            .fetch_service(id)?
            .ok_or_else(|| CrmError::not_found("service entry", id))
    }

    fn emit_schedule_change(&mut self, before: &Customer, after: &Customer, now: Timestamp) {
        if before.next_service_date != after.next_service_date {
            self.events.emit(CrmEvent::NextServiceDateChanged {
                customer_id: after.id,
                old_date: before.next_service_date,
                new_date: after.next_service_date,
                timestamp: now,
            });
        }
    }
}

fn now(time: &SafeTimeProvider) -> Result<Timestamp> {
    Timestamp::from_datetime(time.now())
}
