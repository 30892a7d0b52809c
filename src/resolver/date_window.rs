use chrono::{Days, NaiveDate};

/// Range of date-stamped directories to examine
///
/// Produces `days_to_check` consecutive dates going backwards from
/// `today - start_offset`, in ascending offset order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub days_to_check: u32,
    pub start_offset: u32,
}

impl DateWindow {
    pub fn new(days_to_check: u32, start_offset: u32) -> Self {
        Self {
            days_to_check,
            start_offset,
        }
    }

    /// Calendar dates covered by the window, relative to `today`
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.days_to_check)
            .filter_map(|i| {
                let offset = u64::from(self.start_offset) + u64::from(i);
                today.checked_sub_days(Days::new(offset))
            })
            .collect()
    }

    /// Dates formatted as `YYYY-MM-DD` directory names
    pub fn labels(&self, today: NaiveDate) -> Vec<String> {
        self.dates(today)
            .into_iter()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .collect()
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        // Default: today only
        Self::new(1, 0)
    }
}
