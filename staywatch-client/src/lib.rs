//! Patient-data service client: response-contract parsing and the HTTP source.

mod service;

use reqwest::StatusCode;
use serde_json::Value;
use staywatch_core::{LookupErrorKind, PatientRecord, PatientSummary};
use tracing::warn;

pub use service::{ClientError, HttpPatientService};

/// Keys the service uses to explain an empty result.
const MESSAGE_KEYS: [&str; 3] = ["detail", "error", "message"];

/// Parse a patient lookup body from a JSON string.
pub fn parse_patient_str(body: &str) -> Result<PatientRecord, LookupErrorKind> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        warn!(error = %err, "patient body is not JSON");
        LookupErrorKind::ParseError
    })?;
    parse_patient_value(&value)
}

/// Parse a patient lookup body.
///
/// `null`, or an object without `stay_id` whose message says "not found",
/// means the service has no match. Any other body lacking a well-formed
/// `stay_id` record is a parse failure. Extra fields are ignored.
pub fn parse_patient_value(body: &Value) -> Result<PatientRecord, LookupErrorKind> {
    match body {
        Value::Null => return Err(LookupErrorKind::NotFound),
        Value::Object(map) if !map.contains_key("stay_id") => {
            return Err(if reports_no_match(body) {
                LookupErrorKind::NotFound
            } else {
                warn!("patient body has no stay_id");
                LookupErrorKind::ParseError
            });
        }
        Value::Object(_) => {}
        _ => {
            warn!("patient body is not an object");
            return Err(LookupErrorKind::ParseError);
        }
    }

    serde_json::from_value(body.clone()).map_err(|err| {
        warn!(error = %err, "patient body does not match the record shape");
        LookupErrorKind::ParseError
    })
}

/// Parse the current-patients census body (a JSON array of rows).
pub fn parse_census_value(body: &Value) -> Result<Vec<PatientSummary>, LookupErrorKind> {
    let Some(rows) = body.as_array() else {
        warn!("census body is not an array");
        return Err(LookupErrorKind::ParseError);
    };

    rows.iter()
        .map(|row| {
            serde_json::from_value(row.clone()).map_err(|err| {
                warn!(error = %err, "census row rejected");
                LookupErrorKind::ParseError
            })
        })
        .collect()
}

/// Map a non-2xx status onto the lookup failure taxonomy.
pub fn classify_status(status: StatusCode) -> LookupErrorKind {
    if status == StatusCode::NOT_FOUND {
        LookupErrorKind::NotFound
    } else {
        // 5xx, and any other rejection, is the service failing the request.
        LookupErrorKind::ServerError
    }
}

fn reports_no_match(body: &Value) -> bool {
    MESSAGE_KEYS.iter().any(|key| {
        body.get(key)
            .and_then(Value::as_str)
            .map(|text| text.to_lowercase().contains("not found"))
            .unwrap_or(false)
    })
}
