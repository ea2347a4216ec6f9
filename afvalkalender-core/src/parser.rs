//! Parser for the Dutch rule sentences of the schema, e.g.
//!
//! ```text
//! Iedere 2 weken op dinsdag van 2024-01-02 tot 2024-12-31 behalve 2024-04-30, dat wordt 2024-05-01
//! ```
//!
//! The vocabulary is a closed table: connector words, the three frequency
//! phrases and seven weekday names. Anything outside it is rejected.

use std::{collections::BTreeSet, fmt, sync::LazyLock};

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use tracing::{debug, warn};

use crate::{Frequency, ParseError, RecurrenceDescriptor};

const VAN: &str = " van ";
const TOT: &str = " tot ";
const BEHALVE: &str = " behalve ";
const DAT_WORDT: &str = ", dat wordt ";
const OP: &str = " op ";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Dutch weekday names as they appear in rule text.
pub const WEEKDAYS: [(&str, Weekday); 7] = [
    ("maandag", Weekday::Mon),
    ("dinsdag", Weekday::Tue),
    ("woensdag", Weekday::Wed),
    ("donderdag", Weekday::Thu),
    ("vrijdag", Weekday::Fri),
    ("zaterdag", Weekday::Sat),
    ("zondag", Weekday::Sun),
];

static INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\biedere (\d+) weken\b").unwrap());

/// Look up a Dutch weekday name.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    WEEKDAYS
        .iter()
        .find(|(dutch, _)| dutch.eq_ignore_ascii_case(name))
        .map(|&(_, day)| day)
}

/// Dutch name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize].0
}

/// Rule sentence parser
pub struct RuleParser;

impl RuleParser {
    /// Parse one schema entry into a recurrence descriptor.
    pub fn parse(label: &str, text: &str) -> Result<RecurrenceDescriptor, ParseError> {
        // Connector words and weekday names are matched case-insensitively,
        // runs of whitespace count as one space.
        let text = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        count_separator(label, &text, VAN, 1)?;
        count_separator(label, &text, TOT, 1)?;
        let exceptions = count_separator(label, &text, BEHALVE, 1)?;
        if count_separator(label, &text, DAT_WORDT, 1)? != exceptions {
            return Err(template_error(label, &text));
        }

        let (rule, rest) = text
            .split_once(VAN)
            .ok_or_else(|| template_error(label, &text))?;
        let (start, rest) = rest
            .split_once(TOT)
            .ok_or_else(|| template_error(label, &text))?;
        let (until, exception) = match rest.split_once(BEHALVE) {
            Some((until, exception)) => {
                let pair = exception
                    .split_once(DAT_WORDT)
                    .ok_or_else(|| template_error(label, &text))?;
                (until, Some(pair))
            }
            None => (rest, None),
        };

        let start_date = parse_date(label, start)?;
        let until = parse_date(label, until)?;

        let (frequency_phrase, weekday) = parse_rule_clause(label, rule)?;
        let interval = parse_interval(label, frequency_phrase)?;

        let mut exception_dates = BTreeSet::new();
        let mut additional_dates = BTreeSet::new();
        if let Some((exception, replacement)) = exception {
            let exception = parse_date(label, exception)?;
            let replacement = parse_date(label, replacement)?;
            if exception.weekday() != weekday {
                return Err(ParseError::ExceptionWeekday {
                    label: label.to_string(),
                    date: exception,
                    expected: weekday,
                    actual: exception.weekday(),
                });
            }
            if !on_schedule(start_date, until, interval, exception) {
                warn!(
                    "Exception date {} of {} is not a scheduled collection",
                    exception, label
                );
            }
            exception_dates.insert(exception);
            additional_dates.insert(replacement);
        }

        if start_date.weekday() != weekday {
            return Err(ParseError::StartWeekday {
                label: label.to_string(),
                date: start_date,
                expected: weekday,
                actual: start_date.weekday(),
            });
        }

        if until < start_date {
            return Err(ParseError::UntilBeforeStart {
                label: label.to_string(),
                start: start_date,
                until,
            });
        }

        debug!(
            "Parsed {}: every {} week(s) on {:?} from {} to {}",
            label, interval, weekday, start_date, until
        );

        Ok(RecurrenceDescriptor {
            label: label.to_string(),
            start_date,
            frequency: Frequency::Weekly,
            interval,
            weekday,
            until,
            additional_dates,
            exception_dates,
        })
    }
}

fn template_error(label: &str, text: &str) -> ParseError {
    ParseError::Template {
        label: label.to_string(),
        text: text.to_string(),
    }
}

fn count_separator(
    label: &str,
    text: &str,
    separator: &'static str,
    max: usize,
) -> Result<usize, ParseError> {
    let count = text.matches(separator).count();
    if count > max {
        return Err(ParseError::Ambiguous {
            label: label.to_string(),
            separator,
            count,
            max,
        });
    }
    Ok(count)
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate, ParseError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ParseError::Date {
        label: label.to_string(),
        value: value.to_string(),
    })
}

/// Split `<frequency> op <weekday>` into the frequency phrase and the weekday.
fn parse_rule_clause<'a>(label: &str, rule: &'a str) -> Result<(&'a str, Weekday), ParseError> {
    count_separator(label, rule, OP, 1)?;
    let (frequency, name) = rule
        .split_once(OP)
        .ok_or_else(|| ParseError::MissingWeekday {
            label: label.to_string(),
            clause: rule.to_string(),
        })?;

    let name = name.trim();
    let weekday = weekday_from_name(name).ok_or_else(|| ParseError::UnknownWeekday {
        label: label.to_string(),
        name: name.to_string(),
    })?;

    Ok((frequency, weekday))
}

fn parse_interval(label: &str, phrase: &str) -> Result<u32, ParseError> {
    if phrase.contains("om de week") {
        return Ok(2);
    }

    // Once "iedere" is used, only the full `iedere <N> weken` phrase counts
    if let Some(start) = phrase.find("iedere") {
        let invalid = || ParseError::InvalidInterval {
            label: label.to_string(),
            value: phrase[start..].to_string(),
        };
        let captures = INTERVAL.captures(phrase).ok_or_else(invalid)?;
        return match captures[1].parse::<u32>() {
            Ok(interval) if interval >= 1 => Ok(interval),
            _ => Err(invalid()),
        };
    }

    if phrase.contains("week") || phrase.contains("weken") {
        return Ok(1);
    }

    Err(ParseError::MissingFrequency {
        label: label.to_string(),
        clause: phrase.to_string(),
    })
}

/// Whether `date` is one of the occurrences generated by the rule.
fn on_schedule(start: NaiveDate, until: NaiveDate, interval: u32, date: NaiveDate) -> bool {
    let days = (date - start).num_days();
    (start..=until).contains(&date) && days % (7 * i64::from(interval)) == 0
}

/// Canonical rule text. Parsing it yields the same descriptor as long as
/// there is at most one exception pair.
impl fmt::Display for RecurrenceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval {
            1 => f.write_str("elke week")?,
            2 => f.write_str("om de week")?,
            n => write!(f, "iedere {n} weken")?,
        }

        write!(
            f,
            "{OP}{}{VAN}{}{TOT}{}",
            weekday_name(self.weekday),
            self.start_date.format(DATE_FORMAT),
            self.until.format(DATE_FORMAT)
        )?;

        for (exception, replacement) in self.exception_dates.iter().zip(&self.additional_dates) {
            write!(
                f,
                "{BEHALVE}{}{DAT_WORDT}{}",
                exception.format(DATE_FORMAT),
                replacement.format(DATE_FORMAT)
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_rule() {
        let rule =
            RuleParser::parse("gft", "Elke week op maandag van 2024-01-01 tot 2024-12-31").unwrap();

        assert_eq!(rule.label, "gft");
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.weekday, Weekday::Mon);
        assert_eq!(rule.start_date, date(2024, 1, 1));
        assert_eq!(rule.until, date(2024, 12, 31));
        assert!(rule.exception_dates.is_empty());
        assert!(rule.additional_dates.is_empty());
    }

    #[test]
    fn test_explicit_interval() {
        let rule = RuleParser::parse(
            "papier",
            "Iedere 2 weken op dinsdag van 2024-01-02 tot 2024-12-31",
        )
        .unwrap();
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.weekday, Weekday::Tue);

        let rule = RuleParser::parse(
            "textiel",
            "iedere 6 weken op zaterdag van 2024-01-06 tot 2024-12-28",
        )
        .unwrap();
        assert_eq!(rule.interval, 6);
        assert_eq!(rule.weekday, Weekday::Sat);
    }

    #[test]
    fn test_om_de_week() {
        let rule = RuleParser::parse(
            "restafval",
            "om de week op donderdag van 2024-01-04 tot 2024-06-27",
        )
        .unwrap();
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.weekday, Weekday::Thu);
    }

    #[test]
    fn test_exception_clause() {
        let rule = RuleParser::parse(
            "gft",
            "Elke week op maandag van 2024-01-01 tot 2024-12-31 behalve 2024-04-01, dat wordt 2024-04-02",
        )
        .unwrap();

        assert_eq!(rule.exception_dates, BTreeSet::from([date(2024, 4, 1)]));
        assert_eq!(rule.additional_dates, BTreeSet::from([date(2024, 4, 2)]));
    }

    #[test]
    fn test_whitespace_and_case() {
        let rule = RuleParser::parse(
            "pmd",
            "  ELKE   week op Vrijdag van 2024-01-05  tot 2024-12-27 ",
        )
        .unwrap();
        assert_eq!(rule.weekday, Weekday::Fri);
        assert_eq!(rule.interval, 1);
    }

    #[test]
    fn test_exception_weekday_mismatch() {
        let err = RuleParser::parse(
            "gft",
            "Elke week op maandag van 2024-01-01 tot 2024-12-31 behalve 2024-03-05, dat wordt 2024-03-06",
        )
        .unwrap_err();

        assert_eq!(
            err,
            ParseError::ExceptionWeekday {
                label: "gft".to_string(),
                date: date(2024, 3, 5),
                expected: Weekday::Mon,
                actual: Weekday::Tue,
            }
        );
    }

    #[test]
    fn test_start_weekday_mismatch() {
        let err = RuleParser::parse("gft", "Elke week op dinsdag van 2024-01-01 tot 2024-12-31")
            .unwrap_err();
        assert!(matches!(err, ParseError::StartWeekday { .. }));
        assert_eq!(err.label(), "gft");
    }

    #[test]
    fn test_missing_frequency_and_weekday() {
        let err = RuleParser::parse("glas", "Soms van 2024-01-01 tot 2024-12-31").unwrap_err();
        assert_eq!(err.label(), "glas");
        assert!(err.to_string().contains("glas"));

        let err =
            RuleParser::parse("glas", "Af en toe op maandag van 2024-01-01 tot 2024-12-31")
                .unwrap_err();
        assert!(matches!(err, ParseError::MissingFrequency { .. }));
        assert!(err.to_string().contains("glas"));
    }

    #[test]
    fn test_unknown_weekday() {
        let err = RuleParser::parse("gft", "Elke week op maandagavond van 2024-01-01 tot 2024-12-31")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownWeekday {
                label: "gft".to_string(),
                name: "maandagavond".to_string(),
            }
        );
    }

    #[test]
    fn test_template_errors() {
        let err = RuleParser::parse("gft", "Elke week op maandag vanaf 2024-01-01").unwrap_err();
        assert!(matches!(err, ParseError::Template { .. }));

        let err = RuleParser::parse(
            "gft",
            "Elke week op maandag van 2024-01-01 tot 2024-06-30 tot 2024-12-31",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Ambiguous { count: 2, .. }));

        let err = RuleParser::parse(
            "gft",
            "Elke week op maandag van 2024-01-01 tot 2024-12-31 behalve 2024-04-01",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Template { .. }));
    }

    #[test]
    fn test_malformed_dates() {
        let err = RuleParser::parse("gft", "Elke week op maandag van 2024-13-01 tot 2024-12-31")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::Date {
                label: "gft".to_string(),
                value: "2024-13-01".to_string(),
            }
        );

        let err = RuleParser::parse("gft", "Elke week op maandag van 1 januari tot 2024-12-31")
            .unwrap_err();
        assert!(matches!(err, ParseError::Date { .. }));
    }

    #[test]
    fn test_invalid_interval() {
        let err = RuleParser::parse(
            "papier",
            "Iedere twee weken op dinsdag van 2024-01-02 tot 2024-12-31",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidInterval { .. }));

        let err = RuleParser::parse(
            "papier",
            "Iedere 0 weken op dinsdag van 2024-01-02 tot 2024-12-31",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidInterval { .. }));
    }

    #[test]
    fn test_weken_defaults_to_weekly() {
        let rule =
            RuleParser::parse("gft", "Alle weken op maandag van 2024-01-01 tot 2024-12-31").unwrap();
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.weekday, Weekday::Mon);
    }

    #[test]
    fn test_incomplete_iedere_phrase() {
        for text in [
            "Iedere +3 weken op dinsdag van 2024-01-02 tot 2024-12-31",
            "Iedere 2 week op dinsdag van 2024-01-02 tot 2024-12-31",
            "Iedere week op dinsdag van 2024-01-02 tot 2024-12-31",
            "Iedere 99999999999 weken op dinsdag van 2024-01-02 tot 2024-12-31",
        ] {
            let err = RuleParser::parse("papier", text).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidInterval { .. }),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_repeated_exception_clause() {
        let err = RuleParser::parse(
            "gft",
            "Elke week op maandag van 2024-01-01 tot 2024-12-31 behalve 2024-03-04, dat wordt 2024-03-05 behalve 2024-04-01, dat wordt 2024-04-02",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Ambiguous {
                separator: " behalve ",
                count: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_weekday_clause() {
        let err = RuleParser::parse(
            "gft",
            "Elke week op maandag op dinsdag van 2024-01-01 tot 2024-12-31",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Ambiguous {
                separator: " op ",
                count: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_until_before_start() {
        let err = RuleParser::parse("gft", "Elke week op maandag van 2024-12-30 tot 2024-01-01")
            .unwrap_err();
        assert!(matches!(err, ParseError::UntilBeforeStart { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        let descriptors = [
            RecurrenceDescriptor {
                label: "gft".to_string(),
                start_date: date(2024, 1, 1),
                frequency: Frequency::Weekly,
                interval: 1,
                weekday: Weekday::Mon,
                until: date(2024, 12, 30),
                additional_dates: BTreeSet::from([date(2024, 3, 5)]),
                exception_dates: BTreeSet::from([date(2024, 3, 4)]),
            },
            RecurrenceDescriptor {
                label: "papier".to_string(),
                start_date: date(2024, 1, 3),
                frequency: Frequency::Weekly,
                interval: 2,
                weekday: Weekday::Wed,
                until: date(2024, 12, 31),
                additional_dates: BTreeSet::new(),
                exception_dates: BTreeSet::new(),
            },
            RecurrenceDescriptor {
                label: "kerstbomen".to_string(),
                start_date: date(2024, 1, 7),
                frequency: Frequency::Weekly,
                interval: 52,
                weekday: Weekday::Sun,
                until: date(2025, 1, 31),
                additional_dates: BTreeSet::new(),
                exception_dates: BTreeSet::new(),
            },
        ];

        for descriptor in descriptors {
            let text = descriptor.to_string();
            let parsed = RuleParser::parse(&descriptor.label, &text).unwrap();
            assert_eq!(parsed, descriptor, "round trip of {text:?}");
        }
    }

    #[test]
    fn test_weekday_table() {
        for (name, day) in WEEKDAYS {
            assert_eq!(weekday_from_name(name), Some(day));
            assert_eq!(weekday_name(day), name);
        }
        assert_eq!(weekday_from_name("Woensdag"), Some(Weekday::Wed));
        assert_eq!(weekday_from_name("wednesday"), None);
    }

    #[test]
    fn test_on_schedule() {
        let start = date(2024, 1, 2);
        let until = date(2024, 12, 31);
        assert!(on_schedule(start, until, 2, date(2024, 1, 16)));
        assert!(!on_schedule(start, until, 2, date(2024, 1, 9)));
        assert!(!on_schedule(start, until, 1, date(2025, 1, 7)));
    }
}
