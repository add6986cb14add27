use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::errors::{CrmError, Result};
use crate::models::NewCustomer;
use crate::phone::{is_normalized_indian_mobile, normalize_indian_mobile_to_e164};
use crate::time::{from_excel_serial, parse_date_input, Timestamp};
use crate::types::{ServiceInterval, ServiceType};

pub const COLUMN_NAME: &str = "name";
pub const COLUMN_CONTACT: &str = "contact";
pub const COLUMN_BRAND: &str = "brand";
pub const COLUMN_MODEL: &str = "model";
pub const COLUMN_SERVICE_TYPE: &str = "servicetype";
pub const COLUMN_INSTALLATION_DATE: &str = "installationdate";
pub const COLUMN_SERVICE_INTERVAL: &str = "serviceinterval";

const REQUIRED_COLUMNS: [&str; 2] = [COLUMN_NAME, COLUMN_CONTACT];

static EMPTY_CELL: Cell = Cell::Empty;

/// one spreadsheet cell as handed over by the file reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
        }
    }

    /// trimmed text; whole numbers print without a fraction
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// lower-cased header name to column index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    columns: HashMap<String, usize>,
}

impl ColumnMap {
    /// map a header row; `name` and `contact` must be present
    pub fn from_header(header: &[Cell]) -> Result<Self> {
        let mut columns = HashMap::new();
        for (index, cell) in header.iter().enumerate() {
            columns.insert(cell.text().to_lowercase(), index);
        }

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(CrmError::validation(
                "header",
                format!("missing required columns: {}", missing.join(", ")),
            ));
        }
        Ok(Self { columns })
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    fn cell<'a>(&self, row: &'a [Cell], column: &str) -> Option<&'a Cell> {
        self.index_of(column).map(|i| row.get(i).unwrap_or(&EMPTY_CELL))
    }
}

/// customer fields read from one import row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCustomerData {
    pub name: String,
    pub contact: String,
    pub brand: String,
    pub model: String,
    pub service_type: ServiceType,
    pub installation_date: Timestamp,
    pub service_interval: ServiceInterval,
}

impl From<ImportCustomerData> for NewCustomer {
    fn from(data: ImportCustomerData) -> Self {
        NewCustomer {
            name: data.name,
            contact: data.contact,
            brand: data.brand,
            model: data.model,
            service_type: data.service_type,
            installation_date: data.installation_date,
            service_interval: data.service_interval,
            amc_details: None,
        }
    }
}

/// verdict for one row; `warnings` never make a row invalid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRow {
    pub data: ImportCustomerData,
    /// spreadsheet row number, header is row 1
    pub row_number: usize,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub rows: Vec<ParsedRow>,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl ImportPreview {
    pub fn valid_rows(&self) -> impl Iterator<Item = &ParsedRow> {
        self.rows.iter().filter(|r| r.is_valid)
    }

    pub fn invalid_rows(&self) -> impl Iterator<Item = &ParsedRow> {
        self.rows.iter().filter(|r| !r.is_valid)
    }
}

/// outcome of a partial-failure batch write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: u64,
    pub failure_count: u64,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.failure_count += 1;
        self.errors.push(error.into());
    }

    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// per-row parsing and validation for tabular customer imports
#[derive(Debug, Clone, Default)]
pub struct ImportValidator {
    pub config: ImportConfig,
}

impl ImportValidator {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Validate a whole sheet; the first row is the header.
    ///
    /// Blank rows are skipped but still advance the row number.
    pub fn validate_rows(&self, rows: &[Vec<Cell>], now: Timestamp) -> Result<ImportPreview> {
        let Some((header, data_rows)) = rows.split_first() else {
            return Ok(ImportPreview::default());
        };
        let columns = ColumnMap::from_header(header)?;

        let mut preview = ImportPreview::default();
        for (index, row) in data_rows.iter().enumerate() {
            if row.iter().all(Cell::is_blank) {
                continue;
            }
            let parsed = self.parse_and_validate_row(row, &columns, index + 2, now);
            if parsed.is_valid {
                preview.valid_count += 1;
            } else {
                warn!("import row {} rejected: {}", parsed.row_number, parsed.errors.join("; "));
                preview.invalid_count += 1;
            }
            preview.rows.push(parsed);
        }

        debug!(
            "import preview: {} valid, {} invalid",
            preview.valid_count, preview.invalid_count
        );
        Ok(preview)
    }

    /// Parse one data row independently of every other row.
    ///
    /// Blank name, blank contact and bad installation dates are fatal. An
    /// unusable interval falls back to the configured default and only warns.
    pub fn parse_and_validate_row(
        &self,
        row: &[Cell],
        columns: &ColumnMap,
        row_number: usize,
        now: Timestamp,
    ) -> ParsedRow {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let name = columns.cell(row, COLUMN_NAME).map(Cell::text).unwrap_or_default();
        if name.is_empty() {
            errors.push("Name is required".to_string());
        }

        let contact_raw = columns.cell(row, COLUMN_CONTACT).map(Cell::text).unwrap_or_default();
        if contact_raw.is_empty() {
            errors.push("Contact is required".to_string());
        }
        let contact = normalize_indian_mobile_to_e164(&contact_raw);
        if !contact.is_empty() && !is_normalized_indian_mobile(&contact) {
            warnings.push(format!("Contact '{}' is not a 10-digit mobile number; kept as entered", contact));
        }

        let brand = self.text_or_default(row, columns, COLUMN_BRAND, &self.config.default_brand);
        let model = self.text_or_default(row, columns, COLUMN_MODEL, &self.config.default_model);

        let service_type = match columns.cell(row, COLUMN_SERVICE_TYPE) {
            Some(cell) if !cell.is_blank() => ServiceType::from_label(&cell.text()),
            _ => ServiceType::default(),
        };

        let installation_date = match columns.cell(row, COLUMN_INSTALLATION_DATE) {
            Some(cell) if !cell.is_blank() => match parse_installation_date(cell) {
                Ok(date) => date,
                Err(message) => {
                    errors.push(message);
                    now
                }
            },
            _ => now,
        };

        let service_interval = match columns.cell(row, COLUMN_SERVICE_INTERVAL) {
            Some(cell) if !cell.is_blank() => match parse_interval(cell) {
                Some(interval) => interval,
                None => {
                    warnings.push(format!(
                        "Invalid service interval '{}' (using default: {})",
                        cell.text(),
                        self.config.default_service_interval.label()
                    ));
                    self.config.default_service_interval
                }
            },
            _ => self.config.default_service_interval,
        };

        ParsedRow {
            data: ImportCustomerData {
                name,
                contact,
                brand,
                model,
                service_type,
                installation_date,
                service_interval,
            },
            row_number,
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn text_or_default(&self, row: &[Cell], columns: &ColumnMap, column: &str, default: &str) -> String {
        columns
            .cell(row, column)
            .map(Cell::text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

fn parse_installation_date(cell: &Cell) -> std::result::Result<Timestamp, String> {
    let parsed = match cell {
        Cell::Number(serial) => {
            from_excel_serial(*serial).map_err(|_| "Invalid installation date".to_string())?
        }
        other => parse_date_input(&other.text()).map_err(|_| "Invalid installation date format".to_string())?,
    };
    if !parsed.is_positive() {
        return Err("Installation date must be valid".to_string());
    }
    Ok(parsed)
}

/// leading integer of the cell, e.g. "6 months" -> 6
fn parse_interval(cell: &Cell) -> Option<ServiceInterval> {
    let months = match cell {
        Cell::Number(n) if n.fract() == 0.0 && *n > 0.0 => *n as u64,
        Cell::Number(_) => return None,
        other => {
            let text = other.text();
            let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()?
        }
    };
    ServiceInterval::from_months(months).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    fn header() -> Vec<Cell> {
        ["Name", "Contact", "Brand", "Model", "ServiceType", "InstallationDate", "ServiceInterval"]
            .into_iter()
            .map(Cell::from)
            .collect()
    }

    fn row(cells: [&str; 7]) -> Vec<Cell> {
        cells.into_iter().map(Cell::from).collect()
    }

    #[test]
    fn test_header_requires_name_and_contact() {
        let err = ColumnMap::from_header(&[Cell::from("Name"), Cell::from("Brand")]).unwrap_err();
        assert_eq!(err.field(), Some("header"));
        assert!(err.to_string().contains("contact"));

        let columns = ColumnMap::from_header(&header()).unwrap();
        assert_eq!(columns.index_of(COLUMN_INSTALLATION_DATE), Some(5));
    }

    #[test]
    fn test_blank_name_is_fatal() {
        let validator = ImportValidator::default();
        let columns = ColumnMap::from_header(&[Cell::from("name"), Cell::from("contact")]).unwrap();
        let parsed = validator.parse_and_validate_row(
            &[Cell::from(""), Cell::from("9876543210")],
            &columns,
            2,
            date(2024, 6, 1),
        );
        assert!(!parsed.is_valid);
        assert!(parsed.errors.iter().any(|e| e.contains("Name is required")));
        assert_eq!(parsed.data.contact, "+919876543210");
    }

    #[test]
    fn test_short_contact_warns_but_stays_valid() {
        let validator = ImportValidator::default();
        let columns = ColumnMap::from_header(&[Cell::from("name"), Cell::from("contact")]).unwrap();
        let parsed = validator.parse_and_validate_row(&[Cell::from("A"), Cell::from("98765")], &columns, 3, date(2024, 6, 1));

        assert!(parsed.is_valid);
        assert_eq!(parsed.data.contact, "98765");
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_defaults_for_missing_optional_columns() {
        let validator = ImportValidator::default();
        let now = date(2024, 6, 1);
        let columns = ColumnMap::from_header(&[Cell::from("name"), Cell::from("contact")]).unwrap();
        let parsed = validator.parse_and_validate_row(&[Cell::from("Ravi"), Cell::Number(9876543210.0)], &columns, 2, now);

        assert!(parsed.is_valid);
        assert_eq!(parsed.data.contact, "+919876543210");
        assert_eq!(parsed.data.brand, "Unknown");
        assert_eq!(parsed.data.model, "Unknown");
        assert_eq!(parsed.data.service_type, ServiceType::Maintenance);
        assert_eq!(parsed.data.installation_date, now);
        assert_eq!(parsed.data.service_interval, ServiceInterval::ThreeMonths);
    }

    #[test]
    fn test_full_row_parsing() {
        let validator = ImportValidator::default();
        let columns = ColumnMap::from_header(&header()).unwrap();
        let parsed = validator.parse_and_validate_row(
            &row(["Meena", "98765 43210", "Kent", "Grand+", "Water softener", "15/01/2024", "6 months"]),
            &columns,
            2,
            date(2024, 6, 1),
        );

        assert!(parsed.is_valid, "{:?}", parsed.errors);
        assert_eq!(parsed.data.service_type, ServiceType::Other("Water softener".to_string()));
        assert_eq!(parsed.data.installation_date, date(2024, 1, 15));
        assert_eq!(parsed.data.service_interval, ServiceInterval::SixMonths);
    }

    #[test]
    fn test_excel_serial_installation_date() {
        let validator = ImportValidator::default();
        let columns = ColumnMap::from_header(&header()).unwrap();
        let mut cells = row(["Anil", "9876543210", "", "", "repair", "", "1"]);
        cells[5] = Cell::Number(45306.0);

        let parsed = validator.parse_and_validate_row(&cells, &columns, 2, date(2024, 6, 1));
        assert!(parsed.is_valid);
        assert_eq!(parsed.data.installation_date, date(2024, 1, 15));
        assert_eq!(parsed.data.service_type, ServiceType::Repair);
        assert_eq!(parsed.data.service_interval, ServiceInterval::OneMonth);
    }

    #[test]
    fn test_bad_date_fatal_bad_interval_warns() {
        let validator = ImportValidator::default();
        let columns = ColumnMap::from_header(&header()).unwrap();

        let bad_date = validator.parse_and_validate_row(
            &row(["Anil", "9876543210", "", "", "", "sometime", "3"]),
            &columns,
            2,
            date(2024, 6, 1),
        );
        assert!(!bad_date.is_valid);
        assert_eq!(bad_date.errors, vec!["Invalid installation date format".to_string()]);

        let mut negative = row(["Anil", "9876543210", "", "", "", "", "3"]);
        negative[5] = Cell::Number(-4.0);
        assert!(!validator.parse_and_validate_row(&negative, &columns, 2, date(2024, 6, 1)).is_valid);

        let bad_interval = validator.parse_and_validate_row(
            &row(["Anil", "9876543210", "", "", "", "2024-01-01", "4"]),
            &columns,
            2,
            date(2024, 6, 1),
        );
        assert!(bad_interval.is_valid);
        assert_eq!(bad_interval.data.service_interval, ServiceInterval::ThreeMonths);
        assert!(bad_interval.warnings[0].contains("Invalid service interval"));
    }

    #[test]
    fn test_sheet_preview_skips_blank_rows() {
        let validator = ImportValidator::default();
        let sheet = vec![
            header(),
            row(["Ravi", "9876543210", "", "", "", "2024-01-01", "3"]),
            vec![Cell::Empty, Cell::from("  ")],
            row(["", "9876500000", "", "", "", "", ""]),
            row(["Lata", "9123456789", "", "", "", "", ""]),
        ];
        let preview = validator.validate_rows(&sheet, date(2024, 6, 1)).unwrap();

        assert_eq!(preview.rows.len(), 3);
        assert_eq!(preview.valid_count, 2);
        assert_eq!(preview.invalid_count, 1);
        let numbers: Vec<_> = preview.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![2, 4, 5]);
        assert_eq!(preview.invalid_rows().next().map(|r| r.row_number), Some(4));
    }

    #[test]
    fn test_empty_sheet() {
        let preview = ImportValidator::default().validate_rows(&[], date(2024, 6, 1)).unwrap();
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn test_batch_result_counts() {
        let mut result = BatchResult::default();
        result.record_success();
        result.record_failure("row 3: contact is required");
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 1);
        assert!(!result.is_complete_success());
    }
}
