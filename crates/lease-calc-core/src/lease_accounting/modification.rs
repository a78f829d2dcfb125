//! Remeasurement of the lease liability when contract terms change.
//!
//! Modifications are read from an effective-date ordered copy of the
//! contract's list. A single forward cursor walks that copy, and at most one
//! modification is applied per period: if two modifications are both due by
//! the same period start, the second is applied in the following period.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::contract::{term_to_periods, LeaseModification, PaymentFrequency};
use crate::time_value::annuity_present_value;
use crate::types::{percent_to_period_rate, Money, Percent};
use crate::LeaseResult;

/// A modification paired with its position in the caller's list.
#[derive(Debug, Clone, Copy)]
pub struct PendingModification<'a> {
    pub original_index: usize,
    pub modification: &'a LeaseModification,
}

/// Copy the caller's modifications into effective-date order.
///
/// The sort is stable, so modifications sharing a date keep the order the
/// caller supplied them in. The caller's slice is never reordered.
pub fn sort_pending(modifications: &[LeaseModification]) -> Vec<PendingModification<'_>> {
    let mut pending: Vec<PendingModification<'_>> = modifications
        .iter()
        .enumerate()
        .map(|(original_index, modification)| PendingModification {
            original_index,
            modification,
        })
        .collect();
    pending.sort_by_key(|p| p.modification.effective_date);
    pending
}

/// Values in force while walking the schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningState {
    pub payment: Money,
    /// Annual discount rate in percent
    pub interest_rate: Percent,
    /// Annual rent increase in percent
    pub rent_increase_rate: Percent,
    /// Periods left in the schedule, counting the current one
    pub remaining_periods: u32,
    /// Carried liability, not clamped at zero
    pub liability: Money,
    pub asset: Money,
    pub depreciation_per_period: Money,
    /// Period from which anniversary escalation is counted
    pub escalation_anchor: u32,
}

/// Where the schedule loop currently stands.
#[derive(Debug, Clone, Copy)]
pub struct PeriodPosition {
    /// 1-based period index
    pub period: u32,
    pub start_date: Option<NaiveDate>,
    pub total_periods: u32,
    pub frequency: PaymentFrequency,
}

/// Apply the modification at `cursor` if it is due by the period start.
///
/// Returns the state to continue with and whether the cursor advanced.
/// Without a period start date nothing is ever due.
pub fn apply_if_due(
    pending: &[PendingModification<'_>],
    cursor: usize,
    position: PeriodPosition,
    state: &RunningState,
) -> LeaseResult<(RunningState, bool)> {
    let (Some(next), Some(start_date)) = (pending.get(cursor), position.start_date) else {
        return Ok((state.clone(), false));
    };
    if next.modification.effective_date > start_date {
        return Ok((state.clone(), false));
    }

    let remeasured = remeasure(next.modification, position, state)?;
    Ok((remeasured, true))
}

/// Rebuild the liability and asset baseline from the modified terms.
pub fn remeasure(
    modification: &LeaseModification,
    position: PeriodPosition,
    state: &RunningState,
) -> LeaseResult<RunningState> {
    let payment = modification.payment_amount.unwrap_or(state.payment);
    let interest_rate = modification.interest_rate.unwrap_or(state.interest_rate);
    let rent_increase_rate = modification
        .rent_increase_rate
        .unwrap_or(state.rent_increase_rate);

    let remaining_periods = match modification.lease_term_years {
        Some(years) => term_to_periods(years, position.frequency, "lease_term_years")?,
        None => periods_to_end(position),
    };

    let rate_per_period =
        percent_to_period_rate(interest_rate, position.frequency.payments_per_year());
    let liability = annuity_present_value(payment, rate_per_period, remaining_periods)?;
    let asset = liability;
    let depreciation_per_period = if remaining_periods == 0 {
        Decimal::ZERO
    } else {
        asset / Decimal::from(remaining_periods)
    };

    Ok(RunningState {
        payment,
        interest_rate,
        rent_increase_rate,
        remaining_periods,
        liability,
        asset,
        depreciation_per_period,
        escalation_anchor: position.period,
    })
}

/// Periods from the current one through the end of the schedule, inclusive.
pub fn periods_to_end(position: PeriodPosition) -> u32 {
    position
        .total_periods
        .saturating_sub(position.period)
        .saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn modification(effective: NaiveDate) -> LeaseModification {
        LeaseModification {
            effective_date: effective,
            payment_amount: None,
            lease_term_years: None,
            interest_rate: None,
            rent_increase_rate: None,
        }
    }

    fn state() -> RunningState {
        RunningState {
            payment: dec!(1000),
            interest_rate: dec!(12),
            rent_increase_rate: dec!(3),
            remaining_periods: 12,
            liability: dec!(5000),
            asset: dec!(4800),
            depreciation_per_period: dec!(900),
            escalation_anchor: 1,
        }
    }

    fn position(period: u32, start: NaiveDate) -> PeriodPosition {
        PeriodPosition {
            period,
            start_date: Some(start),
            total_periods: 24,
            frequency: PaymentFrequency::Monthly,
        }
    }

    #[test]
    fn test_sort_pending_keeps_caller_order() {
        let list = vec![
            modification(date(2025, 6, 1)),
            modification(date(2025, 1, 1)),
            modification(date(2025, 6, 1)),
        ];
        let pending = sort_pending(&list);
        let order: Vec<usize> = pending.iter().map(|p| p.original_index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        // caller's list untouched
        assert_eq!(list[0].effective_date, date(2025, 6, 1));
        assert_eq!(list[1].effective_date, date(2025, 1, 1));
    }

    #[test]
    fn test_not_due_before_effective_date() {
        let list = vec![modification(date(2024, 3, 2))];
        let pending = sort_pending(&list);
        let (next, advanced) =
            apply_if_due(&pending, 0, position(3, date(2024, 3, 1)), &state()).unwrap();
        assert!(!advanced);
        assert_eq!(next, state());
    }

    #[test]
    fn test_due_on_effective_date() {
        let list = vec![modification(date(2024, 3, 1))];
        let pending = sort_pending(&list);
        let (_, advanced) =
            apply_if_due(&pending, 0, position(3, date(2024, 3, 1)), &state()).unwrap();
        assert!(advanced);
    }

    #[test]
    fn test_no_start_date_never_due() {
        let list = vec![modification(date(1900, 1, 1))];
        let pending = sort_pending(&list);
        let mut pos = position(1, date(2024, 1, 1));
        pos.start_date = None;
        let (_, advanced) = apply_if_due(&pending, 0, pos, &state()).unwrap();
        assert!(!advanced);
    }

    #[test]
    fn test_cursor_past_end_is_noop() {
        let list = vec![modification(date(2024, 1, 1))];
        let pending = sort_pending(&list);
        let (_, advanced) =
            apply_if_due(&pending, 1, position(5, date(2024, 5, 1)), &state()).unwrap();
        assert!(!advanced);
    }

    #[test]
    fn test_payment_only_override_inherits_rates() {
        let mut m = modification(date(2024, 1, 1));
        m.payment_amount = Some(dec!(1500));
        let pos = position(13, date(2025, 1, 1));
        let next = remeasure(&m, pos, &state()).unwrap();

        assert_eq!(next.payment, dec!(1500));
        assert_eq!(next.interest_rate, dec!(12));
        assert_eq!(next.rent_increase_rate, dec!(3));
        assert_eq!(next.remaining_periods, 12);

        let rate = percent_to_period_rate(dec!(12), 12);
        let expected = annuity_present_value(dec!(1500), rate, 12).unwrap();
        assert_eq!(next.liability, expected);
        assert_eq!(next.asset, expected);
        assert_eq!(next.depreciation_per_period, expected / dec!(12));
        assert_eq!(next.escalation_anchor, 13);
    }

    #[test]
    fn test_explicit_term_drives_remeasurement() {
        let mut m = modification(date(2024, 1, 1));
        m.lease_term_years = Some(3);
        m.interest_rate = Some(Decimal::ZERO);
        let next = remeasure(&m, position(13, date(2025, 1, 1)), &state()).unwrap();

        assert_eq!(next.remaining_periods, 36);
        assert_eq!(next.liability, dec!(36000));
        assert_eq!(next.depreciation_per_period, dec!(1000));
    }

    #[test]
    fn test_periods_to_end_counts_current_period() {
        assert_eq!(periods_to_end(position(1, date(2024, 1, 1))), 24);
        assert_eq!(periods_to_end(position(24, date(2025, 12, 1))), 1);
    }
}
