use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct BulkTravellerPayload {
    pub unit_ids: Vec<String>,
}

/// A report ready to be offered as a file download.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn unit_evidence_name(unit_id: &str) -> String {
    format!("{}_evidence.zip", sanitize(unit_id))
}

pub fn step_evidence_name(unit_id: &str, step_id: i64) -> String {
    format!("{}_step{}_evidence.zip", sanitize(unit_id), step_id)
}

pub fn traveller_name(unit_id: &str) -> String {
    format!("{}_traveller.xlsx", sanitize(unit_id))
}

pub const BULK_TRAVELLER_NAME: &str = "traveller_logs.xlsx";

// Unit ids are user-chosen; keep the download name header-safe.
fn sanitize(unit_id: &str) -> String {
    unit_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
