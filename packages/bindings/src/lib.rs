use napi::Result as NapiResult;
use napi_derive::napi;

use lease_calc_core::lease_accounting::{self, LeaseContract};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_contract(input_json: &str) -> NapiResult<LeaseContract> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lease accounting
// ---------------------------------------------------------------------------

#[napi]
pub fn present_value(input_json: String) -> NapiResult<String> {
    let contract = parse_contract(&input_json)?;
    let pv = lease_accounting::present_value(&contract).map_err(to_napi_error)?;
    serde_json::to_string(&pv).map_err(to_napi_error)
}

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let contract = parse_contract(&input_json)?;
    let rows = lease_accounting::generate_schedule(&contract).map_err(to_napi_error)?;
    serde_json::to_string(&rows).map_err(to_napi_error)
}

#[napi]
pub fn calculate_lease(input_json: String) -> NapiResult<String> {
    let contract = parse_contract(&input_json)?;
    let output = lease_accounting::calculate_lease(&contract).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
