/// import preview - validate a sheet, show row errors, then import the valid rows
use appliance_crm_rs::{
    chrono::{TimeZone, Utc},
    Cell, CrmConfig, CrmService, InMemoryStore, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()));
    let mut crm = CrmService::new(InMemoryStore::new("shop-owner"), CrmConfig::default())?;

    let text = |s: &str| Cell::from(s);
    let sheet = vec![
        vec![text("Name"), text("Contact"), text("Brand"), text("Model"), text("InstallationDate"), text("ServiceInterval")],
        vec![text("Suresh"), text("+91 98450 12345"), text("Kent"), text("Supreme"), Cell::Number(45_306.0), Cell::Number(3.0)],
        vec![text("Anita"), text("98450"), text("Pureit"), text("Classic"), text("2024-02-14"), text("6 months")],
        vec![text(""), text("9845012399"), text("Kent"), text("Pearl"), text("2024-03-01"), text("1")],
        vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty],
        vec![text("Farhan"), text("9845012400"), Cell::Empty, Cell::Empty, text("31/02/2024"), text("weekly")],
    ];

    let preview = crm.preview_import(&sheet, &time)?;
    println!("valid rows: {}, invalid rows: {}", preview.valid_count, preview.invalid_count);
    for row in &preview.rows {
        for warning in &row.warnings {
            println!("row {} warning: {}", row.row_number, warning);
        }
        for error in &row.errors {
            println!("row {} error: {}", row.row_number, error);
        }
    }

    let result = crm.import_customers(&preview, &time)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
