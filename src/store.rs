use std::collections::BTreeMap;

use crate::errors::Result;
use crate::models::{Customer, Reminder, ServiceEntry};
use crate::types::{AmcId, CustomerId, OwnerId, ReminderId, ServiceId, UserRole};

/// System of record for customers, services and reminders.
///
/// The library never owns persistence; the service facade reads snapshots
/// through this trait and writes back whole records. Implementations are
/// expected to serialise writes touching the same customer.
pub trait CrmStore {
    /// principal recorded as owner on new records
    fn caller(&self) -> OwnerId;

    fn is_caller_admin(&self) -> Result<bool>;

    fn fetch_customers(&self) -> Result<Vec<Customer>>;

    fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    fn next_customer_id(&mut self) -> Result<CustomerId>;

    /// insert or replace by id
    fn put_customer(&mut self, customer: Customer) -> Result<()>;

    /// returns false when nothing was stored under `id`
    fn delete_customer(&mut self, id: CustomerId) -> Result<bool>;

    fn fetch_services(&self) -> Result<Vec<ServiceEntry>>;

    fn fetch_service(&self, id: ServiceId) -> Result<Option<ServiceEntry>>;

    fn next_service_id(&mut self) -> Result<ServiceId>;

    fn put_service(&mut self, service: ServiceEntry) -> Result<()>;

    fn delete_service(&mut self, id: ServiceId) -> Result<bool>;

    fn fetch_reminders(&self) -> Result<Vec<Reminder>>;

    fn fetch_reminder(&self, id: ReminderId) -> Result<Option<Reminder>>;

    fn next_reminder_id(&mut self) -> Result<ReminderId>;

    fn put_reminder(&mut self, reminder: Reminder) -> Result<()>;

    /// ids for embedded AMC records and AMC service entries
    fn next_amc_id(&mut self) -> Result<AmcId>;

    fn fetch_services_for(&self, customer_id: CustomerId) -> Result<Vec<ServiceEntry>> {
        Ok(self
            .fetch_services()?
            .into_iter()
            .filter(|s| s.customer_id == customer_id)
            .collect())
    }
}

/// Map-backed store for tests and demos.
///
/// Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    caller: OwnerId,
    role: UserRole,
    customers: BTreeMap<CustomerId, Customer>,
    services: BTreeMap<ServiceId, ServiceEntry>,
    reminders: BTreeMap<ReminderId, Reminder>,
    last_customer_id: CustomerId,
    last_service_id: ServiceId,
    last_reminder_id: ReminderId,
    last_amc_id: AmcId,
}

impl InMemoryStore {
    /// empty store where `caller` is an admin
    pub fn new(caller: impl Into<OwnerId>) -> Self {
        Self {
            caller: caller.into(),
            role: UserRole::Admin,
            customers: BTreeMap::new(),
            services: BTreeMap::new(),
            reminders: BTreeMap::new(),
            last_customer_id: 0,
            last_service_id: 0,
            last_reminder_id: 0,
            last_amc_id: 0,
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn reminder_count(&self) -> usize {
        self.reminders.len()
    }
}

impl CrmStore for InMemoryStore {
    fn caller(&self) -> OwnerId {
        self.caller.clone()
    }

    fn is_caller_admin(&self) -> Result<bool> {
        Ok(self.role.is_admin())
    }

    fn fetch_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.values().cloned().collect())
    }

    fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.get(&id).cloned())
    }

    fn next_customer_id(&mut self) -> Result<CustomerId> {
        self.last_customer_id += 1;
        Ok(self.last_customer_id)
    }

    fn put_customer(&mut self, customer: Customer) -> Result<()> {
        self.customers.insert(customer.id, customer);
        Ok(())
    }

    fn delete_customer(&mut self, id: CustomerId) -> Result<bool> {
        Ok(self.customers.remove(&id).is_some())
    }

    fn fetch_services(&self) -> Result<Vec<ServiceEntry>> {
        Ok(self.services.values().cloned().collect())
    }

    fn fetch_service(&self, id: ServiceId) -> Result<Option<ServiceEntry>> {
        Ok(self.services.get(&id).cloned())
    }

    fn next_service_id(&mut self) -> Result<ServiceId> {
        self.last_service_id += 1;
        Ok(self.last_service_id)
    }

    fn put_service(&mut self, service: ServiceEntry) -> Result<()> {
        self.services.insert(service.id, service);
        Ok(())
    }

    fn delete_service(&mut self, id: ServiceId) -> Result<bool> {
        Ok(self.services.remove(&id).is_some())
    }

    fn fetch_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.reminders.values().cloned().collect())
    }

    fn fetch_reminder(&self, id: ReminderId) -> Result<Option<Reminder>> {
        Ok(self.reminders.get(&id).cloned())
    }

    fn next_reminder_id(&mut self) -> Result<ReminderId> {
        self.last_reminder_id += 1;
        Ok(self.last_reminder_id)
    }

    fn put_reminder(&mut self, reminder: Reminder) -> Result<()> {
        self.reminders.insert(reminder.id, reminder);
        Ok(())
    }

    fn next_amc_id(&mut self) -> Result<AmcId> {
        self.last_amc_id += 1;
        Ok(self.last_amc_id)
    }
}
