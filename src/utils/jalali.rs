//! Jalali (Solar Hijri) calendar conversion.
//!
//! Uses the break-table algorithm from jalaali-js, valid for Jalali years
//! -61 to 3177. Julian day numbers come from chrono's proleptic Gregorian
//! calendar.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::errors::{MajazamoozError, Result};

pub const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// Offset between chrono's days-from-CE and the Julian day number.
const JDN_OFFSET: i32 = 1_721_425;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct JalaliDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl JalaliDate {
    pub fn new(year: i32, month: i32, day: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(MajazamoozError::date_parse(format!(
                "Invalid Jalali month: {}",
                month
            )));
        }
        let length = month_length(year, month)?;
        if !(1..=length).contains(&day) {
            return Err(MajazamoozError::date_parse(format!(
                "Invalid Jalali day {} for {}/{}",
                day, year, month
            )));
        }
        Ok(Self { year, month, day })
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

struct YearInfo {
    /// 0 for a leap year.
    leap: i32,
    gregorian_year: i32,
    /// Day in March of the Gregorian year on which the Jalali year starts.
    march: u32,
}

fn jal_cal(jy: i32) -> Result<YearInfo> {
    let last = BREAKS[BREAKS.len() - 1];
    if jy < BREAKS[0] || jy >= last {
        return Err(MajazamoozError::date_parse(format!(
            "Jalali year {} is out of range",
            jy
        )));
    }

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Ok(YearInfo {
        leap,
        gregorian_year: gy,
        march: march as u32,
    })
}

fn to_jdn(date: NaiveDate) -> i32 {
    date.num_days_from_ce() + JDN_OFFSET
}

fn from_jdn(jdn: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(jdn - JDN_OFFSET)
        .ok_or_else(|| MajazamoozError::date_parse(format!("Day {} is out of range", jdn)))
}

fn nowruz_jdn(info: &YearInfo) -> Result<i32> {
    NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march)
        .map(to_jdn)
        .ok_or_else(|| MajazamoozError::date_parse("Invalid Nowruz date"))
}

pub fn is_leap_jalali_year(year: i32) -> Result<bool> {
    Ok(jal_cal(year)?.leap == 0)
}

pub fn month_length(year: i32, month: i32) -> Result<i32> {
    Ok(match month {
        1..=6 => 31,
        7..=11 => 30,
        12 if is_leap_jalali_year(year)? => 30,
        12 => 29,
        _ => {
            return Err(MajazamoozError::date_parse(format!(
                "Invalid Jalali month: {}",
                month
            )));
        }
    })
}

/// 1-based month, wrapped into `1..=12`.
pub fn normalize_month(month: i32) -> i32 {
    (month - 1).rem_euclid(12) + 1
}

pub fn month_name(month: i32) -> &'static str {
    MONTH_NAMES[(normalize_month(month) - 1) as usize]
}

pub fn to_jalali(date: NaiveDate) -> Result<JalaliDate> {
    let jdn = to_jdn(date);
    let mut jy = date.year() - 621;
    let info = jal_cal(jy)?;
    let mut k = jdn - nowruz_jdn(&info)?;

    if k >= 0 {
        if k <= 185 {
            return Ok(JalaliDate {
                year: jy,
                month: 1 + k / 31,
                day: k % 31 + 1,
            });
        }
        k -= 186;
    } else {
        jy -= 1;
        k += 179;
        if info.leap == 1 {
            k += 1;
        }
    }

    Ok(JalaliDate {
        year: jy,
        month: 7 + k / 30,
        day: k % 30 + 1,
    })
}

pub fn to_gregorian(date: JalaliDate) -> Result<NaiveDate> {
    let info = jal_cal(date.year)?;
    let jdn = nowruz_jdn(&info)? + (date.month - 1) * 31 - date.month / 7 * (date.month - 7)
        + date.day
        - 1;
    from_jdn(jdn)
}

/// One Jalali month with its Gregorian `[start, end)` bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JalaliMonth {
    pub year: i32,
    pub month: i32,
    pub name: &'static str,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl JalaliMonth {
    pub fn new(year: i32, month: i32) -> Result<Self> {
        let start = to_gregorian(JalaliDate::new(year, month, 1)?)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = to_gregorian(JalaliDate::new(next_year, next_month, 1)?)?;
        let name = month_name(month);
        Ok(Self {
            year,
            month,
            name,
            label: format!("{} {}", name, year),
            start,
            end,
        })
    }

    /// Month bounds as instants, with midnight taken in `offset`.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let at_midnight = |d: NaiveDate| {
            offset
                .from_local_datetime(&d.and_time(chrono::NaiveTime::MIN))
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| d.and_time(chrono::NaiveTime::MIN).and_utc())
        };
        (at_midnight(self.start), at_midnight(self.end))
    }
}

/// The month containing `today` followed by the `count - 1` months before it.
pub fn last_months(count: usize, today: NaiveDate) -> Result<Vec<JalaliMonth>> {
    let current = to_jalali(today)?;
    let mut months = Vec::with_capacity(count);
    let (mut year, mut month) = (current.year, current.month);
    for _ in 0..count {
        months.push(JalaliMonth::new(year, month)?);
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    Ok(months)
}

/// Today's date in `offset`.
pub fn today_in(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn converts_to_jalali() {
        assert_eq!(
            to_jalali(date(2021, 7, 14)).unwrap(),
            JalaliDate { year: 1400, month: 4, day: 23 }
        );
        assert_eq!(
            to_jalali(date(2021, 3, 21)).unwrap(),
            JalaliDate { year: 1400, month: 1, day: 1 }
        );
        assert_eq!(
            to_jalali(date(2021, 3, 20)).unwrap(),
            JalaliDate { year: 1399, month: 12, day: 30 }
        );
    }

    #[test]
    fn converts_to_gregorian() {
        let j = JalaliDate::new(1400, 4, 1).unwrap();
        assert_eq!(to_gregorian(j).unwrap(), date(2021, 6, 22));
        let j = JalaliDate::new(1403, 1, 1).unwrap();
        assert_eq!(to_gregorian(j).unwrap(), date(2024, 3, 20));
    }

    #[test]
    fn round_trips_a_year() {
        let mut d = date(2023, 1, 1);
        for _ in 0..366 {
            let j = to_jalali(d).unwrap();
            assert_eq!(to_gregorian(j).unwrap(), d);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_jalali_year(1399).unwrap());
        assert!(!is_leap_jalali_year(1400).unwrap());
        assert!(is_leap_jalali_year(1403).unwrap());
        assert_eq!(month_length(1399, 12).unwrap(), 30);
        assert_eq!(month_length(1400, 12).unwrap(), 29);
        assert!(JalaliDate::new(1400, 12, 30).is_err());
    }

    #[test]
    fn normalizes_months() {
        assert_eq!(normalize_month(12), 12);
        assert_eq!(normalize_month(15), 3);
        assert_eq!(normalize_month(24), 12);
        assert_eq!(normalize_month(0), 12);
        assert_eq!(normalize_month(-5), 7);
        assert_eq!(normalize_month(-24), 12);
    }

    #[test]
    fn last_months_walk_backwards() {
        let months = last_months(4, date(2021, 6, 14)).unwrap();
        let labels: Vec<_> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            ["خرداد 1400", "اردیبهشت 1400", "فروردین 1400", "اسفند 1399"]
        );
        assert_eq!(months[0].start, date(2021, 5, 22));
        assert_eq!(months[0].end, date(2021, 6, 22));
        assert_eq!(months[3].end, months[2].start);
    }

    #[test]
    fn utc_bounds_use_offset() {
        let month = JalaliMonth::new(1400, 4).unwrap();
        let tehran = FixedOffset::east_opt(210 * 60).unwrap();
        let (start, _) = month.utc_bounds(tehran);
        assert_eq!(start.to_rfc3339(), "2021-06-21T20:30:00+00:00");
    }

    #[test]
    fn rejects_out_of_range_years() {
        assert!(to_jalali(date(4000, 1, 1)).is_err());
        assert!(is_leap_jalali_year(3178).is_err());
    }
}
