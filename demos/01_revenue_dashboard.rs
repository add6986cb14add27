/// revenue dashboard - monthly, fiscal quarter and AMC figures for a small shop
use appliance_crm_rs::views::{AmcRevenueView, CustomerRevenueView, RevenueView};
use appliance_crm_rs::{
    AmcDetails, AmcPaymentMethod, AmcType, CrmConfig, CrmService, InMemoryStore, Money,
    NewCustomer, NewServiceEntry, PaymentMethod, RevenueWindow, SafeTimeProvider, ServiceInterval,
    ServiceType, TimeSource, Timestamp,
};

fn customer(name: &str, contact: &str, installed: Timestamp, amc: Option<AmcDetails>) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        contact: contact.to_string(),
        brand: "Aquaguard".to_string(),
        model: "Enhance".to_string(),
        service_type: ServiceType::Other("Installation".to_string()),
        installation_date: installed,
        service_interval: ServiceInterval::SixMonths,
        amc_details: amc,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let time = SafeTimeProvider::new(TimeSource::System);
    let mut crm = CrmService::new(InMemoryStore::new("shop-owner"), CrmConfig::default())?;

    let amc = AmcDetails::new(
        0,
        AmcType::ServiceWithParts,
        1,
        Timestamp::from_ymd(2024, 4, 1)?,
        AmcPaymentMethod::Upi,
        Money::from_major(4_500),
    )?;
    let ravi = crm.add_customer(customer("Ravi", "9876543210", Timestamp::from_ymd(2023, 11, 2)?, Some(amc)), &time)?;
    let lata = crm.add_customer(customer("Lata", "9123456780", Timestamp::from_ymd(2024, 2, 20)?, None), &time)?;

    let visits = [
        NewServiceEntry::paid(ravi.id, Timestamp::from_ymd(2024, 4, 12)?, ServiceType::Repair, Money::from_major(1_200), PaymentMethod::Cash),
        NewServiceEntry::free(ravi.id, Timestamp::from_ymd(2024, 5, 3)?, ServiceType::Maintenance),
        NewServiceEntry::paid(lata.id, Timestamp::from_ymd(2024, 5, 18)?, ServiceType::Maintenance, Money::from_major(450), PaymentMethod::Upi),
        NewServiceEntry::unpaid(lata.id, Timestamp::from_ymd(2025, 1, 9)?, ServiceType::Repair, Money::from_major(900)),
    ];
    for visit in visits {
        crm.add_service_entry(visit, &time)?;
    }
    crm.record_amc_payment(ravi.id, Money::from_major(3_000), &time)?;

    let windows = [
        RevenueWindow::month(2024, 5)?,
        RevenueWindow::fiscal_quarter(2024, 1)?,
        RevenueWindow::fiscal_quarter(2024, 4)?,
        RevenueWindow::year(2024),
    ];
    for window in &windows {
        let revenue = crm.revenue(window)?;
        println!("{}", serde_json::to_string_pretty(&RevenueView::new(window, &revenue))?);
    }

    let breakdown: Vec<CustomerRevenueView> = crm
        .customer_revenue_breakdown(&time)?
        .iter()
        .map(CustomerRevenueView::from)
        .collect();
    println!("{}", serde_json::to_string_pretty(&breakdown)?);

    let methods = crm.payment_method_breakdown(None)?;
    println!("cash {} / upi {}", methods.cash_payments.format_inr(), methods.upi_payments.format_inr());

    println!("{}", serde_json::to_string_pretty(&AmcRevenueView::from(&crm.amc_revenue(&time)?))?);

    Ok(())
}
