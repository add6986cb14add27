//! End-to-end checks of the documented behaviour through the public api.

use appliance_crm_rs::chrono::{TimeZone, Utc};
use appliance_crm_rs::{
    aggregate_amc_revenue, aggregate_revenue, compute_amc_contract_end_date,
    compute_amc_remaining_balance, derive_amc_contract_status, derive_next_service_date,
    derive_warranty_status, normalize_indian_mobile_to_e164, AmcDetails, AmcPaymentMethod, AmcType,
    Cell, ColumnMap, ContractStatus, CrmConfig, CrmError, CrmEvent, CrmService, ImportValidator,
    InMemoryStore, Money, NewCustomer, NewServiceEntry, PaymentMethod, ReminderLifecycle,
    RevenueWindow, SafeTimeProvider, ServiceEntry, ServiceInterval, ServiceType, TimeSource,
    Timestamp, UserRole, WarrantyStatus,
};

fn date(y: i32, m: u32, d: u32) -> Timestamp {
    Timestamp::from_ymd(y, m, d).unwrap()
}

fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()))
}

fn new_customer(name: &str, installed: Timestamp, interval: ServiceInterval) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        contact: "9876543210".to_string(),
        brand: "Kent".to_string(),
        model: "Grand".to_string(),
        service_type: ServiceType::Maintenance,
        installation_date: installed,
        service_interval: interval,
        amc_details: None,
    }
}

#[test]
fn warranty_boundary_is_exclusive() {
    let installed = date(2024, 1, 15);
    let end = date(2025, 1, 15);
    let just_before = Timestamp::from_nanos(end.nanos() - 1);

    assert_eq!(derive_warranty_status(installed, just_before, 12).unwrap(), WarrantyStatus::InWarranty);
    assert_eq!(derive_warranty_status(installed, end, 12).unwrap(), WarrantyStatus::OutWarranty);
}

#[test]
fn first_service_is_one_interval_after_installation() {
    let installed = date(2024, 1, 15);
    for (interval, expected) in [
        (ServiceInterval::OneMonth, date(2024, 2, 15)),
        (ServiceInterval::ThreeMonths, date(2024, 4, 15)),
        (ServiceInterval::SixMonths, date(2024, 7, 15)),
    ] {
        assert_eq!(derive_next_service_date(installed, interval, None).unwrap(), expected);
    }
}

#[test]
fn remaining_balance_floor() {
    assert_eq!(
        compute_amc_remaining_balance(Money::from_major(5_000), Money::from_major(1_500)).unwrap(),
        Money::from_major(3_500)
    );
    assert_eq!(
        compute_amc_remaining_balance(Money::from_major(5_000), Money::from_major(9_000)).unwrap(),
        Money::ZERO
    );
}

#[test]
fn free_entries_are_never_counted_as_paid() {
    let services = vec![
        ServiceEntry::from_new(1, "o".into(), NewServiceEntry::free(1, date(2024, 5, 1), ServiceType::Cleaning)),
        ServiceEntry::from_new(
            2,
            "o".into(),
            NewServiceEntry::paid(1, date(2024, 5, 2), ServiceType::Repair, Money::from_major(800), PaymentMethod::Cash),
        ),
    ];
    let revenue = aggregate_revenue(&services, &RevenueWindow::month(2024, 5).unwrap()).unwrap();
    assert_eq!(revenue.paid_services_count, 1);
    assert_eq!(revenue.free_services_count, 1);
    assert_eq!(revenue.total_revenue, Money::from_major(800));

    let mut bad = NewServiceEntry::free(1, date(2024, 5, 1), ServiceType::Cleaning);
    bad.amount = Money::from_major(1);
    assert!(bad.validate().is_err());
}

#[test]
fn phone_normalisation_round_trip() {
    assert_eq!(normalize_indian_mobile_to_e164("9876543210"), "+919876543210");
    assert_eq!(normalize_indian_mobile_to_e164("+919876543210"), "+919876543210");
}

#[test]
fn new_customer_scenario() {
    let mut crm = CrmService::new(InMemoryStore::new("owner"), CrmConfig::default()).unwrap();
    let customer = crm
        .add_customer(new_customer("Ravi", date(2024, 1, 15), ServiceInterval::ThreeMonths), &clock(2024, 2, 1))
        .unwrap();

    assert_eq!(customer.warranty_status, WarrantyStatus::InWarranty);
    assert_eq!(customer.next_service_date, date(2024, 4, 15));
}

#[test]
fn mark_service_done_scenario() {
    let engine = appliance_crm_rs::DerivationEngine::default();
    let customer = engine
        .build_customer(42, "owner".into(), new_customer("Meena", date(2024, 3, 10), ServiceInterval::ThreeMonths), date(2024, 3, 10))
        .unwrap();

    let done = ReminderLifecycle::default()
        .mark_service_as_done(&[customer], 42, date(2024, 6, 10))
        .unwrap();
    assert_eq!(done.reminder.reminder_date, date(2024, 9, 10));

    let mut crm = CrmService::new(InMemoryStore::new("owner"), CrmConfig::default()).unwrap();
    let time = clock(2024, 6, 10);
    let stored = crm
        .add_customer(new_customer("Meena", date(2024, 3, 10), ServiceInterval::ThreeMonths), &time)
        .unwrap();
    let reminder = crm.mark_service_as_done(stored.id, date(2024, 6, 10), &time).unwrap();
    assert_eq!(reminder.reminder_date, date(2024, 9, 10));
    assert!(!reminder.sent_status);

    let events = crm.take_events();
    assert!(events.iter().any(|e| matches!(e, CrmEvent::ReminderCreated { .. })));
}

#[test]
fn import_row_scenarios() {
    let validator = ImportValidator::default();
    let columns = ColumnMap::from_header(&[Cell::from("Name"), Cell::from("Contact")]).unwrap();
    let now = date(2024, 6, 1);

    let blank_name = validator.parse_and_validate_row(&[Cell::from(""), Cell::from("9876543210")], &columns, 2, now);
    assert!(!blank_name.is_valid);
    assert!(blank_name.errors.iter().any(|e| e.contains("Name is required")));

    let short_contact = validator.parse_and_validate_row(&[Cell::from("A"), Cell::from("98765")], &columns, 3, now);
    assert_eq!(short_contact.data.contact, "98765");
    assert!(short_contact.is_valid);
    assert!(!short_contact.warnings.is_empty());
}

#[test]
fn amc_contract_lifecycle_scenario() {
    let start = date(2024, 1, 1);
    let end = compute_amc_contract_end_date(start, 1).unwrap();
    assert_eq!(end, date(2025, 1, 1));

    assert_eq!(derive_amc_contract_status(start, end, date(2024, 12, 15), 30).unwrap(), ContractStatus::PendingRenewal);
    assert_eq!(derive_amc_contract_status(start, end, date(2025, 1, 2), 30).unwrap(), ContractStatus::Expired);
    assert_eq!(derive_amc_contract_status(start, end, date(2024, 6, 1), 30).unwrap(), ContractStatus::Active);
}

#[test]
fn amc_revenue_is_idempotent() {
    let contracts = vec![
        AmcDetails::new(1, AmcType::OnlyService, 1, date(2024, 1, 1), AmcPaymentMethod::Cash, Money::from_major(3_000)).unwrap(),
        AmcDetails::new(2, AmcType::ServiceWithParts50, 2, date(2021, 1, 1), AmcPaymentMethod::Online, Money::from_major(7_000)).unwrap(),
    ];
    let snapshot = contracts.clone();

    let first = aggregate_amc_revenue(&contracts, date(2024, 6, 1), 30).unwrap();
    let second = aggregate_amc_revenue(&contracts, date(2024, 6, 1), 30).unwrap();
    assert_eq!(first, second);
    assert_eq!(contracts, snapshot);
    assert_eq!(first.in_progress_amount, Money::from_major(3_000));
    assert_eq!(first.completed_amount, Money::from_major(7_000));
}

#[test]
fn invalid_interval_is_a_validation_error() {
    let err = appliance_crm_rs::derivation::derive_next_service_date_from_months(date(2024, 1, 1), 4, None).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.field(), Some("service_interval"));
}

#[test]
fn non_admin_cannot_import() {
    let store = InMemoryStore::new("viewer").with_role(UserRole::User);
    let mut crm = CrmService::new(store, CrmConfig::default()).unwrap();
    let time = clock(2024, 6, 1);

    let sheet = vec![
        vec![Cell::from("name"), Cell::from("contact")],
        vec![Cell::from("Ravi"), Cell::from("9876543210")],
    ];
    let preview = crm.preview_import(&sheet, &time).unwrap();
    assert_eq!(preview.valid_count, 1);

    let err = crm.import_customers(&preview, &time).unwrap_err();
    assert!(matches!(err, CrmError::Unauthorized { .. }));
    assert_eq!(crm.store.customer_count(), 0);
}

#[test]
fn import_applies_valid_rows_only() {
    let mut crm = CrmService::new(InMemoryStore::new("admin"), CrmConfig::default()).unwrap();
    let time = clock(2024, 6, 1);
    let sheet = vec![
        vec![Cell::from("Name"), Cell::from("Contact"), Cell::from("ServiceInterval")],
        vec![Cell::from("Ravi"), Cell::from("9876543210"), Cell::Number(6.0)],
        vec![Cell::from(""), Cell::from("9876543211"), Cell::Empty],
        vec![Cell::from("Lata"), Cell::from("9876543212"), Cell::from("weekly")],
    ];

    let preview = crm.preview_import(&sheet, &time).unwrap();
    let result = crm.import_customers(&preview, &time).unwrap();
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);
    assert!(result.errors[0].starts_with("row 3"));

    let customers = crm.customers().unwrap();
    assert_eq!(customers[0].service_interval, ServiceInterval::SixMonths);
    assert_eq!(customers[1].service_interval, ServiceInterval::ThreeMonths);
}
