use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static YEAR_30XX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b30(\d{2})\b").expect("valid year typo pattern"));

const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%Y/%m/%d"];

/// Drop any time-of-day part and fix the `30xx` year typo
pub fn repair_date_text(raw: &str) -> Option<String> {
    let day = raw.split_whitespace().next()?;
    let day = day.split('T').next().unwrap_or(day);
    Some(YEAR_30XX.replace_all(day, "20$1").into_owned())
}

pub fn parse_job_date(raw: &str) -> Option<NaiveDate> {
    let text = repair_date_text(raw)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}

/// Parse each distinct date string once. Record volumes dwarf the number
/// of distinct job dates, so callers broadcast the result back per record.
pub fn parse_distinct<'a>(values: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, Option<NaiveDate>> {
    let mut parsed = HashMap::new();
    for value in values {
        parsed.entry(value).or_insert_with(|| parse_job_date(value));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_bulk_download_timestamps() {
        assert_eq!(parse_job_date("6/1/2011 12:00:00 AM"), Some(ymd(2011, 6, 1)));
        assert_eq!(parse_job_date("2020-01-01"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_job_date("2019-03-04T00:00:00"), Some(ymd(2019, 3, 4)));
    }

    #[test]
    fn repairs_thirty_hundred_years() {
        assert_eq!(parse_job_date("5/14/3012 12:00:00 AM"), Some(ymd(2012, 5, 14)));
        assert_eq!(repair_date_text("1/30/2012").as_deref(), Some("1/30/2012"));
        assert_eq!(repair_date_text("3/1/2030").as_deref(), Some("3/1/2030"));
    }

    #[test]
    fn unparseable_dates_become_none() {
        assert_eq!(parse_job_date(""), None);
        assert_eq!(parse_job_date("unknown"), None);
        assert_eq!(parse_job_date("13/45/2012"), None);
    }

    #[test]
    fn distinct_values_parsed_once() {
        let values = vec!["1/2/2015", "1/2/2015", "bad"];
        let parsed = parse_distinct(values.iter().copied());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["1/2/2015"], Some(ymd(2015, 1, 2)));
        assert_eq!(parsed["bad"], None);
    }
}
