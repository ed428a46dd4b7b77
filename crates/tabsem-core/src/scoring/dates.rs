//! Tolerant date parsing for literal-context matching
//!
//! Cells say "12 May 1994", "05/12/1994" or just "1994"; the KB says
//! "+1994-05-12T00:00:00Z". Both sides go through one forgiving parser and
//! are compared component-wise. Parser failures never propagate; a cell
//! that does not parse simply contributes nothing.

use chrono::NaiveDate;

/// A date with optional precision: month/day may be absent ("1994",
/// "May 1994").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// Replace unicode dash variants with ASCII '-'.
pub fn normalize_dashes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

const FULL_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

const MONTH_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%d", "-01"),
    ("%B %d %Y", " 01 "),
    ("%b %d %Y", " 01 "),
];

/// Parse a date leniently. Handles ISO dates, slash forms (month-first
/// preferred), textual months, month precision, bare years and Wikidata
/// `+Y…T…Z` timestamps.
pub fn parse_date(text: &str) -> Option<ParsedDate> {
    let mut s = normalize_dashes(text.trim()).trim_start_matches('+').to_string();
    // Wikidata timestamps: keep the calendar date, drop the time part.
    if let Some(t) = s.find('T') {
        s.truncate(t);
    }
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            use chrono::Datelike;
            return Some(ParsedDate {
                year: date.year(),
                month: Some(date.month()),
                day: Some(date.day()),
            });
        }
    }

    // Month precision: complete a day and re-parse.
    for (format, day_completion) in MONTH_FORMATS {
        let completed = match *day_completion {
            "-01" => format!("{s}-01"),
            _ => {
                // "May 1994" → "May 01 1994"
                match s.split_once(' ') {
                    Some((month, year)) => format!("{month} 01 {year}"),
                    None => continue,
                }
            }
        };
        if let Ok(date) = NaiveDate::parse_from_str(&completed, format) {
            use chrono::Datelike;
            return Some(ParsedDate {
                year: date.year(),
                month: Some(date.month()),
                day: None,
            });
        }
    }

    // Bare year.
    if s.len() <= 4 && !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return Some(ParsedDate {
            year: s.parse().ok()?,
            month: None,
            day: None,
        });
    }

    None
}

/// Exact component-wise equality of two date strings (precision included).
pub fn dates_equal(a: &str, b: &str) -> bool {
    match (parse_date(a), parse_date(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}

/// Equality on the year alone, ignoring finer components.
pub fn years_equal(a: &str, b: &str) -> bool {
    match (parse_date(a), parse_date(b)) {
        (Some(da), Some(db)) => da.year == db.year,
        _ => false,
    }
}

/// Match a KB "start:end" period literal against a hyphenated cell
/// ("1994-2001", "[1994 – 2001]"): both endpoints must agree.
pub fn period_matches(literal: &str, cell: &str) -> bool {
    let Some((start, end)) = literal.split_once(':') else {
        return false;
    };
    let cleaned: String = normalize_dashes(cell)
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')'))
        .collect();
    let parts: Vec<&str> = cleaned.split('-').collect();
    if parts.len() != 2 {
        return false;
    }
    dates_equal(start, parts[0]) && dates_equal(end, parts[1])
}

// ============================================================================
// TESTS
// ============================================================================
