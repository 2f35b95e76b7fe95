use rust_xlsxwriter::Workbook;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use property_harvest::errors::HarvestError;
use property_harvest::events::NoOpProgress;
use property_harvest::leads::{Lead, read_leads};
use property_harvest::{Credentials, HarvestConfig};

fn addresses(leads: &[Lead]) -> Vec<&str> {
    leads.iter().map(Lead::address).collect()
}

#[test]
fn spreadsheet_leads_read_first_column_top_to_bottom() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("leads.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "123 Main St").expect("cell");
    sheet.write_string(0, 1, "owner notes").expect("cell");
    // Row 2 left blank
    sheet.write_string(2, 0, "  456 Oak Ave \n\n").expect("cell");
    sheet.write_string(3, 0, "78 Elm/Birch Rd").expect("cell");
    workbook.save(&path).expect("save");

    let leads = read_leads(&path).expect("read leads");
    assert_eq!(addresses(&leads), ["123 Main St", "456 Oak Ave", "78 Elm_Birch Rd"]);
    let indices: Vec<usize> = leads.iter().map(Lead::index).collect();
    assert_eq!(indices, [0, 1, 2]);
}

#[test]
fn missing_lead_file_is_a_lead_source_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = read_leads(&dir.path().join("absent.xlsx"));
    assert!(matches!(result, Err(HarvestError::LeadSource { .. })));
}

#[tokio::test]
async fn harvest_fails_fast_on_a_missing_lead_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = HarvestConfig::builder()
        .lead_source(dir.path().join("absent.csv"))
        .output_dir(dir.path())
        .credentials(Credentials::new("agent@example.com", "pw"))
        .build()
        .expect("config");

    let result =
        property_harvest::harvest(config, Arc::new(NoOpProgress), CancellationToken::new()).await;
    assert!(matches!(result, Err(HarvestError::LeadSource { .. })));
    // Nothing was written
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}
