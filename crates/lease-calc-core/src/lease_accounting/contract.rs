//! Lease contract and modification inputs.
//!
//! A contract is supplied wholesale per calculation. Annual rates are in
//! percent (6 = 6% p.a.); the payment amount is per payment period.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LeaseError;
use crate::types::{Money, Percent};
use crate::LeaseResult;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest lease term accepted, in years.
pub const MAX_LEASE_TERM_YEARS: u32 = 999;

// ---------------------------------------------------------------------------
// Payment frequency
// ---------------------------------------------------------------------------

/// How often lease payments fall due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl PaymentFrequency {
    /// Number of payment periods in one year.
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Yearly => 1,
        }
    }

    /// Calendar length of one period.
    pub fn period_months(self) -> u32 {
        12 / self.payments_per_year()
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentFrequency {
    type Err = LeaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "quarterly" => Ok(PaymentFrequency::Quarterly),
            "yearly" | "annual" | "annually" => Ok(PaymentFrequency::Yearly),
            other => Err(LeaseError::InvalidInput {
                field: "payment_frequency".into(),
                reason: format!("expected monthly, quarterly or yearly, got '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A lease contract as entered by the lessee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseContract {
    /// Lease term in whole years
    pub lease_term_years: u32,
    /// Payment per period
    pub payment_amount: Money,
    /// Payment frequency
    pub payment_frequency: PaymentFrequency,
    /// Annual discount rate in percent
    pub interest_rate: Percent,
    /// Commencement date; without it rows carry no period end dates
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    /// Annual rent increase in percent, applied on each anniversary
    #[serde(default)]
    pub rent_increase_rate: Percent,
    /// Mid-term remeasurement events, in any order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<LeaseModification>,
}

/// A change to lease terms taking effect partway through the lease.
///
/// `None` fields inherit the value in force immediately before the
/// modification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaseModification {
    #[serde(deserialize_with = "deserialize_date")]
    pub effective_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Money>,
    /// Remaining lease term from the effective date, in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_term_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_increase_rate: Option<Percent>,
}

impl LeaseContract {
    /// Payment periods in the schedule: term x payments per year.
    pub fn total_periods(&self) -> LeaseResult<u32> {
        term_to_periods(
            self.lease_term_years,
            self.payment_frequency,
            "lease_term_years",
        )
    }

    /// Reject contracts that would produce a meaningless schedule.
    pub fn validate(&self) -> LeaseResult<()> {
        check_term("lease_term_years", self.lease_term_years)?;
        self.total_periods()?;
        check_payment("payment_amount", self.payment_amount)?;
        check_rate("interest_rate", self.interest_rate)?;
        check_rate("rent_increase_rate", self.rent_increase_rate)?;

        if !self.modifications.is_empty() && self.start_date.is_none() {
            return Err(LeaseError::InvalidInput {
                field: "start_date".into(),
                reason: "A start date is required to place modifications in the schedule".into(),
            });
        }

        for (i, modification) in self.modifications.iter().enumerate() {
            modification.validate(i, self.payment_frequency)?;
        }
        Ok(())
    }
}

impl LeaseModification {
    fn validate(&self, index: usize, frequency: PaymentFrequency) -> LeaseResult<()> {
        if let Some(payment) = self.payment_amount {
            check_payment(&format!("modifications[{index}].payment_amount"), payment)?;
        }
        if let Some(rate) = self.interest_rate {
            check_rate(&format!("modifications[{index}].interest_rate"), rate)?;
        }
        if let Some(rate) = self.rent_increase_rate {
            check_rate(&format!("modifications[{index}].rent_increase_rate"), rate)?;
        }
        if let Some(years) = self.lease_term_years {
            let field = format!("modifications[{index}].lease_term_years");
            check_term(&field, years)?;
            term_to_periods(years, frequency, &field)?;
        }
        Ok(())
    }

    /// True when the modification changes nothing.
    pub fn is_empty(&self) -> bool {
        self.payment_amount.is_none()
            && self.lease_term_years.is_none()
            && self.interest_rate.is_none()
            && self.rent_increase_rate.is_none()
    }
}

pub(crate) fn term_to_periods(
    years: u32,
    frequency: PaymentFrequency,
    field: &str,
) -> LeaseResult<u32> {
    years
        .checked_mul(frequency.payments_per_year())
        .ok_or_else(|| LeaseError::InvalidTerm {
            field: field.into(),
            reason: format!("{years} years of {frequency} payments overflows the period count"),
        })
}

fn check_term(field: &str, years: u32) -> LeaseResult<()> {
    if years == 0 {
        return Err(LeaseError::InvalidTerm {
            field: field.into(),
            reason: "Lease term must be at least one year".into(),
        });
    }
    if years > MAX_LEASE_TERM_YEARS {
        return Err(LeaseError::InvalidTerm {
            field: field.into(),
            reason: format!("{years} years exceeds the {MAX_LEASE_TERM_YEARS}-year maximum"),
        });
    }
    Ok(())
}

fn check_payment(field: &str, value: Money) -> LeaseResult<()> {
    if value < Decimal::ZERO {
        return Err(LeaseError::InvalidPaymentAmount {
            field: field.into(),
            value,
        });
    }
    Ok(())
}

fn check_rate(field: &str, value: Percent) -> LeaseResult<()> {
    if value < Decimal::ZERO {
        return Err(LeaseError::InvalidRate {
            field: field.into(),
            value,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> LeaseResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        LeaseError::UnparseableDate {
            input: input.to_string(),
        }
    })
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

// An empty string is how a blank date field arrives from a form.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
