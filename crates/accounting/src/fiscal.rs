//! Fiscal years and reporting periods.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use easyerp_core::{DomainError, DomainResult, Entity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
    pub is_closed: bool,
}

impl FiscalYear {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("fiscal year name must not be empty"));
        }
        if end_date < start_date {
            return Err(DomainError::validation(format!(
                "fiscal year {name} ends ({end_date}) before it starts ({start_date})"
            )));
        }
        Ok(Self {
            name,
            start_date,
            end_date,
            is_current: false,
            is_closed: false,
        })
    }

    /// `FY <year>`, January 1 through December 31.
    pub fn calendar(year: i32) -> DomainResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| DomainError::validation(format!("invalid year {year}")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| DomainError::validation(format!("invalid year {year}")))?;
        Self::new(format!("FY {year}"), start, end)
    }

    /// Calendar fiscal year containing `date`.
    pub fn calendar_for(date: NaiveDate) -> DomainResult<Self> {
        Self::calendar(date.year())
    }

    pub fn as_current(mut self) -> Self {
        self.is_current = true;
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn close(&mut self) -> DomainResult<()> {
        if self.is_closed {
            return Err(DomainError::conflict(format!(
                "fiscal year {} is already closed",
                self.name
            )));
        }
        self.is_closed = true;
        self.is_current = false;
        Ok(())
    }

    /// Split the year into consecutive periods of `period_type`.
    ///
    /// The last period is truncated at `end_date` when the year is not a whole
    /// number of periods long.
    pub fn periods(&self, period_type: PeriodType) -> Vec<FinancialPeriod> {
        let mut out = Vec::new();
        let mut start = self.start_date;
        let mut number = 1;

        while start <= self.end_date {
            let end = match period_type.months() {
                Some(m) => start
                    .checked_add_months(Months::new(m))
                    .and_then(|d| d.pred_opt())
                    .map_or(self.end_date, |d| d.min(self.end_date)),
                None => self.end_date,
            };

            out.push(FinancialPeriod {
                fiscal_year: self.name.clone(),
                period_type,
                period_number: number,
                start_date: start,
                end_date: end,
                is_closed: false,
                closed_date: None,
            });

            match end.succ_opt() {
                Some(next) => start = next,
                None => break,
            }
            number += 1;
        }

        out
    }
}

impl Entity for FiscalYear {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodType {
    Monthly,
    Quarterly,
    Yearly,
}

impl PeriodType {
    fn months(self) -> Option<u32> {
        match self {
            PeriodType::Monthly => Some(1),
            PeriodType::Quarterly => Some(3),
            PeriodType::Yearly => None,
        }
    }
}

/// Reporting period within a fiscal year.
///
/// Unique per (fiscal year, period type, period number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub fiscal_year: String,
    pub period_type: PeriodType,
    pub period_number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub closed_date: Option<DateTime<Utc>>,
}

impl FinancialPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn close(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.is_closed {
            return Err(DomainError::conflict(format!(
                "{} {:?} {} is already closed",
                self.fiscal_year, self.period_type, self.period_number
            )));
        }
        self.is_closed = true;
        self.closed_date = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn calendar_year_spans_jan_to_dec() {
        let fy = FiscalYear::calendar(2025).unwrap();
        assert_eq!(fy.name, "FY 2025");
        assert_eq!(fy.start_date, d(2025, 1, 1));
        assert_eq!(fy.end_date, d(2025, 12, 31));
        assert!(fy.contains(d(2025, 6, 30)));
        assert!(!fy.contains(d(2026, 1, 1)));
    }

    #[test]
    fn rejects_inverted_dates() {
        assert!(FiscalYear::new("FY X", d(2025, 12, 31), d(2025, 1, 1)).is_err());
    }

    #[test]
    fn monthly_periods_cover_the_year() {
        let fy = FiscalYear::calendar(2024).unwrap();
        let months = fy.periods(PeriodType::Monthly);
        assert_eq!(months.len(), 12);
        assert_eq!(months[1].start_date, d(2024, 2, 1));
        assert_eq!(months[1].end_date, d(2024, 2, 29));
        assert_eq!(months[11].period_number, 12);
        assert_eq!(months[11].end_date, d(2024, 12, 31));
    }

    #[test]
    fn quarterly_and_yearly_periods() {
        let fy = FiscalYear::new("FY 2025/26", d(2025, 7, 1), d(2026, 6, 30)).unwrap();
        let quarters = fy.periods(PeriodType::Quarterly);
        assert_eq!(quarters.len(), 4);
        assert_eq!(quarters[0].end_date, d(2025, 9, 30));
        assert_eq!(quarters[3].start_date, d(2026, 4, 1));

        let years = fy.periods(PeriodType::Yearly);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].end_date, d(2026, 6, 30));
    }

    #[test]
    fn short_year_truncates_last_period() {
        let fy = FiscalYear::new("Stub", d(2025, 1, 1), d(2025, 2, 10)).unwrap();
        let months = fy.periods(PeriodType::Monthly);
        assert_eq!(months.len(), 2);
        assert_eq!(months[1].end_date, d(2025, 2, 10));
    }

    #[test]
    fn closing_twice_is_a_conflict() {
        let mut fy = FiscalYear::calendar(2025).unwrap().as_current();
        fy.close().unwrap();
        assert!(!fy.is_current);
        assert!(matches!(fy.close(), Err(DomainError::Conflict(_))));

        let mut period = fy.periods(PeriodType::Monthly).remove(0);
        period.close(Utc::now()).unwrap();
        assert!(period.close(Utc::now()).is_err());
    }
}
