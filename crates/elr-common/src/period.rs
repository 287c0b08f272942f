//! ISO-8601 date-based periods (`PnYnMnWnD`), optionally signed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, Months};
use thiserror::Error;

/// Error returned when a period literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ISO-8601 period: {0}")]
pub struct InvalidPeriod(pub String);

/// A signed calendar period such as `P1Y2M`, `-P7D` or `P2W`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoPeriod {
    negative: bool,
    months: u32,
    days: u64,
}

impl IsoPeriod {
    pub fn is_negative(&self) -> bool {
        self.negative && !self.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0
    }

    /// Adds the period to an instant, honouring its sign.
    ///
    /// Month arithmetic clamps to the end of shorter months. Returns `None`
    /// on overflow.
    pub fn add_to(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        if self.negative {
            instant
                .checked_sub_months(Months::new(self.months))?
                .checked_sub_days(Days::new(self.days))
        } else {
            instant
                .checked_add_months(Months::new(self.months))?
                .checked_add_days(Days::new(self.days))
        }
    }

    /// Half-open interval `[start, end)` spanned by the period from `anchor`.
    ///
    /// Negative periods end at the anchor; positive ones start there.
    pub fn interval_from(
        &self,
        anchor: DateTime<FixedOffset>,
    ) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let shifted = self.add_to(anchor)?;
        if self.is_negative() {
            Some((shifted, anchor))
        } else {
            Some((anchor, shifted))
        }
    }
}

impl FromStr for IsoPeriod {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPeriod(s.to_string());
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let body = rest
            .strip_prefix('P')
            .or_else(|| rest.strip_prefix('p'))
            .ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let mut period = IsoPeriod {
            negative,
            ..IsoPeriod::default()
        };
        let mut digits = String::new();
        let mut last_rank = 0;
        for ch in body.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let amount: u32 = digits.parse().map_err(|_| invalid())?;
            digits.clear();
            let rank = match ch.to_ascii_uppercase() {
                'Y' => 1,
                'M' => 2,
                'W' => 3,
                'D' => 4,
                _ => return Err(invalid()),
            };
            if rank <= last_rank {
                return Err(invalid());
            }
            last_rank = rank;
            match rank {
                1 | 2 => {
                    let months = if rank == 1 {
                        amount.checked_mul(12).ok_or_else(invalid)?
                    } else {
                        amount
                    };
                    period.months = period.months.checked_add(months).ok_or_else(invalid)?;
                }
                3 => period.days += u64::from(amount) * 7,
                _ => period.days += u64::from(amount),
            }
        }
        if !digits.is_empty() {
            return Err(invalid());
        }
        Ok(period)
    }
}

impl fmt::Display for IsoPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 || self.months == 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}
