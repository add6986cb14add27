/// quick start - add a customer, record a service, mark it done
use appliance_crm_rs::views::{CustomerView, ReminderView};
use appliance_crm_rs::{
    chrono::{TimeZone, Utc},
    CrmConfig, CrmService, InMemoryStore, Money, NewCustomer, NewServiceEntry, PaymentMethod,
    SafeTimeProvider, ServiceInterval, ServiceType, TimeSource, Timestamp,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 6, 10, 10, 0, 0).unwrap()));
    let mut crm = CrmService::new(InMemoryStore::new("shop-owner"), CrmConfig::default())?;

    // a purifier installed in March, serviced every three months
    let customer = crm.add_customer(
        NewCustomer {
            name: "Meena Iyer".to_string(),
            contact: "98765 43210".to_string(),
            brand: "Kent".to_string(),
            model: "Grand Plus".to_string(),
            service_type: ServiceType::Other("Installation".to_string()),
            installation_date: Timestamp::from_ymd(2024, 3, 10)?,
            service_interval: ServiceInterval::ThreeMonths,
            amc_details: None,
        },
        &time,
    )?;

    // paid filter change today
    crm.add_service_entry(
        NewServiceEntry::paid(
            customer.id,
            Timestamp::from_ymd(2024, 6, 10)?,
            ServiceType::Maintenance,
            Money::from_major(650),
            PaymentMethod::Upi,
        ),
        &time,
    )?;

    let reminder = crm.mark_service_as_done(customer.id, Timestamp::from_ymd(2024, 6, 10)?, &time)?;

    let engine = appliance_crm_rs::DerivationEngine::new(CrmConfig::default().derivation);
    for customer in crm.customers()? {
        println!("{}", CustomerView::from_customer(&customer, &engine, Timestamp::from_ymd(2024, 6, 10)?)?.to_json_pretty()?);
    }
    println!("{}", serde_json::to_string_pretty(&ReminderView::from(&reminder))?);

    Ok(())
}
