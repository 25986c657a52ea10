//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Format a UTC timestamp in the site timezone using a date-fns pattern
///
/// # Examples
/// ```ignore
/// format_date(&date, "d MMM y", "pt-BR", chrono_tz::UTC) // -> "15 mar 2021"
/// ```
pub fn format_date(date: &DateTime<Utc>, pattern: &str, language: &str, tz: Tz) -> String {
    let local = date.with_timezone(&tz);
    let chrono_format = date_fns_to_chrono_format(pattern);

    match chrono_locale(language) {
        Some(locale) => local.format_localized(&chrono_format, locale).to_string(),
        None => local.format(&chrono_format).to_string(),
    }
}

/// Format a date for a `datetime` attribute
pub fn date_iso(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Map a language tag such as `pt-BR` onto a chrono locale
pub fn chrono_locale(language: &str) -> Option<Locale> {
    Locale::try_from(language.replace('-', "_").as_str()).ok()
}

/// Convert a date-fns format string to a chrono format string
///
/// Letters are pattern tokens, `'...'` is literal text and `''` is a
/// single quote. Unknown letters pass through unchanged.
fn date_fns_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut result = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                result.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        result.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut result, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut result, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }

        match token(c, run) {
            Some(chrono_fmt) => result.push_str(chrono_fmt),
            None => (0..run).for_each(|_| push_literal(&mut result, c)),
        }
        i += run;
    }

    result
}

fn push_literal(result: &mut String, c: char) {
    if c == '%' {
        result.push_str("%%");
    } else {
        result.push(c);
    }
}

fn token(c: char, run: usize) -> Option<&'static str> {
    let chrono_fmt = match (c, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        _ => return None,
    };
    Some(chrono_fmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()
    }

    #[test]
    fn test_format_date_pt_br() {
        assert_eq!(
            format_date(&published(), "d MMM y", "pt-BR", chrono_tz::UTC),
            "15 mar 2021"
        );
    }

    #[test]
    fn test_format_edited_with_literal() {
        assert_eq!(
            format_date(&published(), "d MMM y', às' HH:mm", "pt-BR", chrono_tz::UTC),
            "15 mar 2021, às 19:25"
        );
    }

    #[test]
    fn test_format_in_site_timezone() {
        assert_eq!(
            format_date(
                &published(),
                "dd/MM/yyyy HH:mm",
                "pt-BR",
                chrono_tz::America::Sao_Paulo
            ),
            "15/03/2021 16:25"
        );
    }

    #[test]
    fn test_unknown_language_falls_back() {
        assert_eq!(
            format_date(&published(), "d MMMM y", "klingon", chrono_tz::UTC),
            "15 March 2021"
        );
    }

    #[test]
    fn test_date_fns_to_chrono() {
        assert_eq!(date_fns_to_chrono_format("d MMM y"), "%-d %b %Y");
        assert_eq!(date_fns_to_chrono_format("yyyy-MM-dd"), "%Y-%m-%d");
        assert_eq!(date_fns_to_chrono_format("HH:mm' 100%'"), "%H:%M 100%%");
        assert_eq!(date_fns_to_chrono_format("d 'o''clock'"), "%-d o'clock");
    }

    #[test]
    fn test_date_iso() {
        assert_eq!(date_iso(&published()), "2021-03-15T19:25:28+00:00");
    }
}
