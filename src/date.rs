//! Date handling for article and page metadata. Dates show up in two places:
//! human-readable strings on pages (e.g., `26 August 2018`, localized with the
//! page's locale) and ISO calendar dates in the sitemap (e.g., `2018-08-26`).

use chrono::{DateTime, Local, NaiveDate, ParseResult, TimeZone, Utc};
use serde::{de::Error as _, Deserialize, Deserializer};
use std::convert::TryFrom;

/// The format for dates displayed on pages.
const HUMAN_FORMAT: &str = "%d %B %Y";

/// The format for sitemap `lastmod` values.
const SITEMAP_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date, either `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
}

/// Deserializes an optional date field via [`parse_date`].
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid date `{}`: {}", s, e))),
    }
}

/// Maps a locale identifier such as `it_IT` or `it_IT.UTF-8` onto chrono's
/// locale table. Unknown identifiers fall back to POSIX (English names).
fn chrono_locale(id: &str) -> chrono::Locale {
    let id = id.split('.').next().unwrap_or(id);
    chrono::Locale::try_from(id).unwrap_or(chrono::Locale::POSIX)
}

/// Formats a modification time for display, using the month names of the
/// locale `locale_id`.
pub fn human_date<Tz: TimeZone>(date: &DateTime<Tz>, locale_id: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format_localized(HUMAN_FORMAT, chrono_locale(locale_id))
        .to_string()
}

/// Formats a calendar date for display. See [`human_date`].
pub fn human_calendar_date(date: &NaiveDate, locale_id: &str) -> String {
    match date.and_hms_opt(0, 0, 0) {
        Some(midnight) => human_date(&Utc.from_utc_datetime(&midnight), locale_id),
        None => date.format(HUMAN_FORMAT).to_string(),
    }
}

/// Formats a modification time as a sitemap `lastmod` value.
pub fn sitemap_date(date: &DateTime<Local>) -> String {
    date.format(SITEMAP_FORMAT).to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_date_dashes() -> ParseResult<()> {
        assert_eq!(NaiveDate::from_ymd_opt(2018, 8, 26), Some(parse_date("2018-08-26")?));
        Ok(())
    }

    #[test]
    fn test_parse_date_slashes() -> ParseResult<()> {
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 2), Some(parse_date("2020/01/02")?));
        Ok(())
    }

    #[test]
    fn test_parse_date_garbage() {
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_human_calendar_date_english() -> ParseResult<()> {
        assert_eq!(
            "26 August 2018",
            human_calendar_date(&parse_date("2018-08-26")?, "en_US"),
        );
        Ok(())
    }

    #[test]
    fn test_human_calendar_date_localized() -> ParseResult<()> {
        assert_eq!(
            "26 agosto 2018",
            human_calendar_date(&parse_date("2018-08-26")?, "it_IT.UTF-8"),
        );
        Ok(())
    }

    #[test]
    fn test_human_calendar_date_unknown_locale() -> ParseResult<()> {
        assert_eq!(
            "01 January 2020",
            human_calendar_date(&parse_date("2020-01-01")?, "xx_XX"),
        );
        Ok(())
    }

    #[test]
    fn test_sitemap_date() {
        let date = Local.with_ymd_and_hms(2021, 4, 16, 12, 30, 0).unwrap();
        assert_eq!("2021-04-16", sitemap_date(&date));
    }
}
