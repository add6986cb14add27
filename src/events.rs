use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::time::Timestamp;
use crate::types::{AmcType, CustomerId, PaymentMethod, PaymentStatus, ReminderId, ServiceId};

/// all events emitted by the service facade after a successful write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrmEvent {
    // customer events
    CustomerAdded {
        customer_id: CustomerId,
        next_service_date: Timestamp,
        timestamp: Timestamp,
    },
    CustomerUpdated {
        customer_id: CustomerId,
        timestamp: Timestamp,
    },
    CustomerDeleted {
        customer_id: CustomerId,
        timestamp: Timestamp,
    },
    CustomersImported {
        success_count: u64,
        failure_count: u64,
        timestamp: Timestamp,
    },
    NextServiceDateChanged {
        customer_id: CustomerId,
        old_date: Timestamp,
        new_date: Timestamp,
        timestamp: Timestamp,
    },

    // service events
    ServiceRecorded {
        service_id: ServiceId,
        customer_id: CustomerId,
        amount: Money,
        payment_status: PaymentStatus,
        timestamp: Timestamp,
    },
    ServiceUpdated {
        service_id: ServiceId,
        customer_id: CustomerId,
        timestamp: Timestamp,
    },
    ServiceDeleted {
        service_id: ServiceId,
        customer_id: CustomerId,
        timestamp: Timestamp,
    },
    PaymentStatusChanged {
        service_id: ServiceId,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
        method: Option<PaymentMethod>,
        timestamp: Timestamp,
    },

    // reminder events
    ReminderCreated {
        reminder_id: ReminderId,
        customer_id: CustomerId,
        reminder_date: Timestamp,
        timestamp: Timestamp,
    },
    ReminderSentToggled {
        reminder_id: ReminderId,
        sent: bool,
        timestamp: Timestamp,
    },
    ServiceMarkedDone {
        customer_id: CustomerId,
        service_done_date: Timestamp,
        reminder_id: ReminderId,
        timestamp: Timestamp,
    },

    // amc events
    AmcApplied {
        customer_id: CustomerId,
        contract_type: AmcType,
        amount: Money,
        timestamp: Timestamp,
    },
    AmcServiceRecorded {
        customer_id: CustomerId,
        amc_service_id: u64,
        timestamp: Timestamp,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<CrmEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: CrmEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<CrmEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CrmEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        store.emit(CrmEvent::CustomerDeleted {
            customer_id: 3,
            timestamp: Timestamp::from_nanos(1),
        });
        assert_eq!(store.events().len(), 1);

        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut store = EventStore::new();
        store.emit(CrmEvent::ReminderSentToggled {
            reminder_id: 1,
            sent: true,
            timestamp: Timestamp::from_nanos(1),
        });
        store.clear();
        assert!(store.events().is_empty());
        assert!(store.take_events().is_empty());
    }
}
