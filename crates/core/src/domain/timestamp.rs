use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the timestamp spellings the backend is known to emit. Zone-less values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats in the backend's zone-less style (`2023-07-04T00:00:00`).
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{format_timestamp, parse_timestamp};

    #[test]
    fn accepts_rfc3339_naive_and_date_only() {
        let expected = Utc.with_ymd_and_hms(2023, 7, 4, 0, 0, 0).single().expect("valid date");

        assert_eq!(parse_timestamp("2023-07-04T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-07-04T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-07-04T00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2023-07-04"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn formats_without_zone_suffix() {
        let value = Utc.with_ymd_and_hms(2023, 7, 16, 8, 30, 0).single().expect("valid date");
        assert_eq!(format_timestamp(&value), "2023-07-16T08:30:00");
    }
}
