use chrono::{Datelike, Months, NaiveDate};

/// add calendar months, clamping the day to the end of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// number of whole months from `from` to `to`, zero when `to` is not after `from`
pub fn full_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }

    let raw = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    let mut months = raw.max(0) as u32;

    while months > 0 {
        match add_months(from, months) {
            Some(anniversary) if anniversary <= to => break,
            _ => months -= 1,
        }
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
        assert_eq!(add_months(date(2024, 1, 15), 12), Some(date(2025, 1, 15)));
    }

    #[test]
    fn test_full_months_between() {
        assert_eq!(full_months_between(date(2024, 1, 15), date(2024, 1, 15)), 0);
        assert_eq!(full_months_between(date(2024, 1, 15), date(2024, 2, 14)), 0);
        assert_eq!(full_months_between(date(2024, 1, 15), date(2024, 2, 15)), 1);
        assert_eq!(full_months_between(date(2024, 1, 15), date(2024, 4, 16)), 3);
        assert_eq!(full_months_between(date(2024, 1, 31), date(2024, 2, 29)), 1);
        assert_eq!(full_months_between(date(2024, 3, 1), date(2024, 1, 1)), 0);
    }
}
