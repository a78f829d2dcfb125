//! IFRS 16 lessee measurement and amortisation.
//!
//! The lease liability is the present value of the payment stream as an
//! ordinary annuity. Each period the liability accrues interest at the
//! periodic rate and is reduced by the payment; the right-of-use asset is
//! depreciated straight-line from the last reset point (commencement or the
//! latest modification) to lease end.

use std::time::Instant;

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::contract::{LeaseContract, PaymentFrequency};
use super::modification::{
    apply_if_due, periods_to_end, sort_pending, PendingModification, PeriodPosition,
    RunningState,
};
use crate::error::LeaseError;
use crate::time_value::annuity_present_value;
use crate::types::{percent_to_period_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::LeaseResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A single period in the lease amortisation schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRow {
    /// Period number (1-indexed)
    pub period: u32,
    /// Last day of the period, when the lease has a start date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    pub opening_liability: Money,
    pub interest_expense: Money,
    pub payment: Money,
    pub principal: Money,
    /// Liability after the payment, floored at zero
    pub closing_liability: Money,
    pub depreciation: Money,
    /// Right-of-use asset after depreciation, floored at zero
    pub closing_asset: Money,
    /// Whether a modification took effect at the start of this period
    pub modification_applied: bool,
    /// Index of that modification in the contract's list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_index: Option<usize>,
}

/// Headline figures plus the full schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseScheduleOutput {
    /// PV of the original, unmodified payment stream
    pub present_value: Money,
    /// ROU asset at commencement (equal to the initial liability)
    pub initial_rou_asset: Money,
    pub total_periods: u32,
    pub payments_per_year: u32,
    /// Periodic discount rate at commencement
    pub rate_per_period: Rate,
    /// Undiscounted sum of payments in the schedule
    pub total_payments: Money,
    pub total_interest_expense: Money,
    pub total_depreciation: Money,
    /// Number of modifications that took effect
    pub modifications_applied: usize,
    pub schedule: Vec<ScheduleRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Present value of the lease liability at commencement.
///
/// Uses the original contract terms only; modifications affect the schedule
/// rows, not this figure.
pub fn present_value(contract: &LeaseContract) -> LeaseResult<Money> {
    contract.validate()?;
    initial_present_value(contract)
}

/// Period-by-period amortisation schedule.
pub fn generate_schedule(contract: &LeaseContract) -> LeaseResult<Vec<ScheduleRow>> {
    contract.validate()?;
    Ok(build_schedule(contract)?.rows)
}

/// Present value and schedule wrapped in the standard computation envelope.
pub fn calculate_lease(
    contract: &LeaseContract,
) -> LeaseResult<ComputationOutput<LeaseScheduleOutput>> {
    let start = Instant::now();
    contract.validate()?;

    let present_value = initial_present_value(contract)?;
    let ScheduleBuild {
        rows,
        mut warnings,
        modifications_applied,
    } = build_schedule(contract)?;

    if contract.interest_rate.is_zero() {
        warnings.push("Zero discount rate: liability equals undiscounted payments".into());
    }

    let payments_per_year = contract.payment_frequency.payments_per_year();
    let output = LeaseScheduleOutput {
        present_value,
        initial_rou_asset: present_value,
        total_periods: rows.len() as u32,
        payments_per_year,
        rate_per_period: percent_to_period_rate(contract.interest_rate, payments_per_year),
        total_payments: column_total(&rows, "total_payments", |r| r.payment)?,
        total_interest_expense: column_total(&rows, "total_interest_expense", |r| {
            r.interest_expense
        })?,
        total_depreciation: column_total(&rows, "total_depreciation", |r| r.depreciation)?,
        modifications_applied,
        schedule: rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IFRS 16 lease liability (ordinary annuity PV, effective interest, straight-line ROU)",
        &serde_json::json!({
            "lease_term_years": contract.lease_term_years,
            "payment_amount": contract.payment_amount.to_string(),
            "payment_frequency": contract.payment_frequency,
            "interest_rate_pct": contract.interest_rate.to_string(),
            "rent_increase_rate_pct": contract.rent_increase_rate.to_string(),
            "start_date": contract.start_date,
            "modifications": contract.modifications.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Schedule loop
// ---------------------------------------------------------------------------

struct ScheduleBuild {
    rows: Vec<ScheduleRow>,
    warnings: Vec<String>,
    modifications_applied: usize,
}

fn initial_present_value(contract: &LeaseContract) -> LeaseResult<Money> {
    let rate = percent_to_period_rate(
        contract.interest_rate,
        contract.payment_frequency.payments_per_year(),
    );
    annuity_present_value(contract.payment_amount, rate, contract.total_periods()?)
}

fn column_total(
    rows: &[ScheduleRow],
    field: &str,
    value: impl Fn(&ScheduleRow) -> Money,
) -> LeaseResult<Money> {
    rows.iter().try_fold(Decimal::ZERO, |acc, row| {
        acc.checked_add(value(row))
            .ok_or_else(|| LeaseError::overflow(field))
    })
}

/// Expects a validated contract.
fn build_schedule(contract: &LeaseContract) -> LeaseResult<ScheduleBuild> {
    let frequency = contract.payment_frequency;
    let payments_per_year = frequency.payments_per_year();
    let total_periods = contract.total_periods()?;

    let initial_liability = initial_present_value(contract)?;
    let mut state = RunningState {
        payment: contract.payment_amount,
        interest_rate: contract.interest_rate,
        rent_increase_rate: contract.rent_increase_rate,
        remaining_periods: total_periods,
        liability: initial_liability,
        asset: initial_liability,
        depreciation_per_period: initial_liability / Decimal::from(total_periods),
        escalation_anchor: 1,
    };

    let pending = sort_pending(&contract.modifications);
    let mut cursor = 0usize;
    let mut warnings: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(total_periods as usize);
    let mut period_start = contract.start_date;
    let mut previous_start: Option<NaiveDate> = None;
    let mut liability_exhausted_at: Option<u32> = None;

    for period in 1..=total_periods {
        let position = PeriodPosition {
            period,
            start_date: period_start,
            total_periods,
            frequency,
        };

        let (next_state, advanced) = apply_if_due(&pending, cursor, position, &state)?;
        state = next_state;
        let applied = if advanced {
            let entry = pending[cursor];
            cursor += 1;
            note_modification(&mut warnings, entry, position, previous_start, contract);
            Some(entry.original_index)
        } else {
            None
        };

        if state.rent_increase_rate > Decimal::ZERO
            && period > state.escalation_anchor
            && (period - state.escalation_anchor) % payments_per_year == 0
        {
            let factor = Decimal::ONE + state.rent_increase_rate / Decimal::ONE_HUNDRED;
            state.payment = state
                .payment
                .checked_mul(factor)
                .ok_or_else(|| LeaseError::overflow("rent_increase_rate"))?;
        }

        let period_end = match period_start {
            Some(start) => {
                let end = period_end_date(start, frequency)?;
                previous_start = Some(start);
                period_start = Some(next_day(end)?);
                Some(end)
            }
            None => None,
        };

        // Interest on a fully amortised balance is zero.
        let opening_liability = state.liability.max(Decimal::ZERO);
        let rate = percent_to_period_rate(state.interest_rate, payments_per_year);
        let interest_expense = opening_liability
            .checked_mul(rate)
            .ok_or_else(|| LeaseError::overflow("interest_rate"))?;
        let principal = state
            .payment
            .checked_sub(interest_expense)
            .ok_or_else(|| LeaseError::overflow("payment_amount"))?;
        let carried_liability = state
            .liability
            .checked_sub(principal)
            .ok_or_else(|| LeaseError::overflow("payment_amount"))?;

        let depreciation = state.depreciation_per_period.min(state.asset);
        state.asset -= depreciation;

        if carried_liability <= Decimal::ZERO
            && period < total_periods
            && liability_exhausted_at.is_none()
            && !state.payment.is_zero()
        {
            liability_exhausted_at = Some(period);
        }

        rows.push(ScheduleRow {
            period,
            period_end,
            opening_liability,
            interest_expense,
            payment: state.payment,
            principal,
            closing_liability: carried_liability.max(Decimal::ZERO),
            depreciation,
            closing_asset: state.asset,
            modification_applied: applied.is_some(),
            modification_index: applied,
        });

        state.liability = carried_liability;
        state.remaining_periods = state.remaining_periods.saturating_sub(1);
    }

    for entry in &pending[cursor..] {
        warnings.push(format!(
            "Modification {} effective {} was not applied within the {total_periods}-period schedule",
            entry.original_index, entry.modification.effective_date
        ));
    }
    if let Some(period) = liability_exhausted_at {
        warnings.push(format!(
            "Lease liability fully amortised in period {period} of {total_periods}; later rows carry a zero balance"
        ));
    }

    Ok(ScheduleBuild {
        rows,
        warnings,
        modifications_applied: cursor,
    })
}

fn note_modification(
    warnings: &mut Vec<String>,
    entry: PendingModification<'_>,
    position: PeriodPosition,
    previous_start: Option<NaiveDate>,
    contract: &LeaseContract,
) {
    let modification = entry.modification;
    let index = entry.original_index;

    if modification.is_empty() {
        warnings.push(format!(
            "Modification {index} overrides no terms; liability remeasured at unchanged terms"
        ));
    }
    if contract
        .start_date
        .is_some_and(|start| modification.effective_date < start)
    {
        warnings.push(format!(
            "Modification {index} is effective {} before lease commencement; applied in period 1",
            modification.effective_date
        ));
    }
    if previous_start.is_some_and(|prev| modification.effective_date <= prev) {
        warnings.push(format!(
            "Modification {index} effective {} deferred to period {}: one modification is applied per period",
            modification.effective_date, position.period
        ));
    }
    if let Some(years) = modification.lease_term_years {
        let remaining = periods_to_end(position);
        let requested = years.saturating_mul(position.frequency.payments_per_year());
        if requested != remaining {
            warnings.push(format!(
                "Modification {index} sets a {years}-year remaining term ({requested} periods) \
                 but {remaining} periods remain in the schedule; row count is unchanged"
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

/// Last day of the period starting on `start`.
///
/// Month arithmetic clamps to the end of shorter months
/// (31 Jan + 1 month = 28/29 Feb).
pub fn period_end_date(start: NaiveDate, frequency: PaymentFrequency) -> LeaseResult<NaiveDate> {
    start
        .checked_add_months(Months::new(frequency.period_months()))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| {
            LeaseError::DateOverflow(format!("period starting {start} runs past the calendar range"))
        })
}

fn next_day(date: NaiveDate) -> LeaseResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| LeaseError::DateOverflow(format!("no day after {date}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
