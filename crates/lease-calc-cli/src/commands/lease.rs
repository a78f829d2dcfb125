use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use lease_calc_core::lease_accounting::{
    calculate_lease, parse_date, present_value, LeaseContract, PaymentFrequency,
};
use lease_calc_core::LeaseError;

use crate::input;

/// Lease contract, from a file, piped JSON, or individual flags
#[derive(Args)]
pub struct LeaseArgs {
    /// Path to a JSON or YAML contract file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Lease term in whole years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Payment amount per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Payment frequency: monthly, quarterly or yearly
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Annual discount rate in percent (e.g. 6 for 6%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Lease start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_start_date)]
    pub start_date: Option<NaiveDate>,

    /// Annual rent increase in percent, applied on each anniversary
    #[arg(long)]
    pub rent_increase_rate: Option<Decimal>,
}

fn parse_start_date(s: &str) -> Result<NaiveDate, LeaseError> {
    parse_date(s)
}

pub fn run_present_value(args: LeaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contract = load_contract(args)?;
    let pv = present_value(&contract)?;
    log::info!("Present value {} over {} periods", pv, contract.total_periods()?);
    Ok(json!({
        "present_value": pv,
        "total_periods": contract.total_periods()?,
        "payment_frequency": contract.payment_frequency,
    }))
}

pub fn run_schedule(args: LeaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contract = load_contract(args)?;
    let started = Instant::now();
    let output = calculate_lease(&contract)?;
    log::info!(
        "Generated {} schedule rows ({} modifications applied) in {}us",
        output.result.schedule.len(),
        output.result.modifications_applied,
        started.elapsed().as_micros()
    );
    for warning in &output.warnings {
        log::warn!("{}", warning);
    }
    Ok(serde_json::to_value(output)?)
}

fn load_contract(args: LeaseArgs) -> Result<LeaseContract, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        log::debug!("Reading lease contract from {}", path);
        return input::file::read_contract(path);
    }
    if let Some(contract) = input::stdin::read_stdin_contract()? {
        log::debug!("Read lease contract from stdin");
        return Ok(contract);
    }

    log::debug!("Building lease contract from flags");
    Ok(LeaseContract {
        lease_term_years: args
            .term_years
            .ok_or("--term-years is required (or provide --input)")?,
        payment_amount: args
            .payment
            .ok_or("--payment is required (or provide --input)")?,
        payment_frequency: args.frequency,
        interest_rate: args
            .interest_rate
            .ok_or("--interest-rate is required (or provide --input)")?,
        start_date: args.start_date,
        rent_increase_rate: args.rent_increase_rate.unwrap_or(Decimal::ZERO),
        modifications: vec![],
    })
}
