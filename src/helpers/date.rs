//! Date helper functions

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Locale, TimeZone};
use chrono_tz::Tz;

use crate::config::DateConfig;

/// Formats CMS publication dates for the listing and detail pages
#[derive(Debug, Clone)]
pub struct DateFormatter {
    listing: String,
    detail: String,
    locale: Locale,
    timezone: Tz,
}

impl DateFormatter {
    /// Build from the `dates` section of the site config
    pub fn new(config: &DateConfig) -> Result<Self> {
        let locale = Locale::try_from(config.locale.as_str())
            .map_err(|_| anyhow!("Unknown locale: {}", config.locale))?;
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| anyhow!("Unknown timezone: {}", config.timezone))?;

        Ok(Self {
            listing: date_fns_to_chrono_format(&config.listing_format),
            detail: date_fns_to_chrono_format(&config.detail_format),
            locale,
            timezone,
        })
    }

    /// Date as shown on the home page listing
    pub fn listing(&self, date: Option<&str>) -> String {
        self.format(date, &self.listing)
    }

    /// Date as shown on a post page
    pub fn detail(&self, date: Option<&str>) -> String {
        self.format(date, &self.detail)
    }

    fn format(&self, date: Option<&str>, format: &str) -> String {
        let Some(raw) = date else {
            return String::new();
        };
        match parse_date(raw) {
            Some(date) => format_localized(&date.with_timezone(&self.timezone), format, self.locale),
            None => {
                tracing::warn!("Unparseable publication date: {}", raw);
                String::new()
            }
        }
    }
}

/// Parse a CMS timestamp: RFC 3339 or `2021-03-25T19:25:28+0000`
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Format with localized month and weekday names
pub fn format_localized<Z: TimeZone>(date: &DateTime<Z>, format: &str, locale: Locale) -> String
where
    Z::Offset: std::fmt::Display,
{
    date.format_localized(format, locale).to_string()
}

/// Convert a date-fns pattern (`dd MMM yyyy`) to a chrono format string.
///
/// Runs of the same letter form one token; text in single quotes is literal.
pub fn date_fns_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut result = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(chars[i], &mut result);
                i += 1;
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('E', 4) => Some("%A"),
            ('E', _) => Some("%a"),
            ('a', _) => Some("%p"),
            _ => None,
        };

        match token {
            Some(t) => result.push_str(t),
            None => {
                for _ in 0..run {
                    push_literal(c, &mut result);
                }
            }
        }
        i += run;
    }

    result
}

fn push_literal(c: char, out: &mut String) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> DateFormatter {
        DateFormatter::new(&DateConfig::default()).unwrap()
    }

    #[test]
    fn test_date_fns_to_chrono() {
        assert_eq!(date_fns_to_chrono_format("dd MMM yyyy"), "%d %b %Y");
        assert_eq!(date_fns_to_chrono_format("dd  MMM yyyy"), "%d  %b %Y");
        assert_eq!(date_fns_to_chrono_format("d/M/yy HH:mm"), "%-d/%-m/%y %H:%M");
        assert_eq!(date_fns_to_chrono_format("EEEE, MMMM"), "%A, %B");
        assert_eq!(date_fns_to_chrono_format("dd 'de' MMMM"), "%d de %B");
        assert_eq!(date_fns_to_chrono_format("100%"), "100%%");
    }

    #[test]
    fn test_listing_and_detail_formats() {
        let f = formatter();
        assert_eq!(f.listing(Some("2021-03-25T10:00:00Z")), "25  mar 2021");
        assert_eq!(f.detail(Some("2021-03-25T10:00:00Z")), "25 mar 2021");
    }

    #[test]
    fn test_prismic_timestamp() {
        let f = formatter();
        assert_eq!(f.detail(Some("2021-04-19T15:28:03+0000")), "19 abr 2021");
    }

    #[test]
    fn test_timezone_shifts_day() {
        // 01:00 UTC is still the previous evening in São Paulo
        let f = formatter();
        assert_eq!(f.detail(Some("2021-02-01T01:00:00Z")), "31 jan 2021");
    }

    #[test]
    fn test_missing_or_invalid_date() {
        let f = formatter();
        assert_eq!(f.listing(None), "");
        assert_eq!(f.detail(Some("yesterday")), "");
    }

    #[test]
    fn test_unknown_locale() {
        let config = DateConfig {
            locale: "xx_YY".to_string(),
            ..DateConfig::default()
        };
        assert!(DateFormatter::new(&config).is_err());
    }
}
