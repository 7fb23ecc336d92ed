//! Column filter values and the predicates compiled from them
//!
//! A `FilterValue` is what a caller stores in the table state. Before the
//! view is materialized each value is compiled once into a
//! `FilterPredicate` so regexes and lowercased needles are not rebuilt per
//! row.

use chrono::NaiveDate;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::record::DataValue;
use crate::data::type_inference::{parse_day, TypeInference};
use crate::data::value_compare::compare_values;

/// Sentinel used by category dropdowns to mean "no constraint"
pub const ALL_SENTINEL: &str = "all";

/// How a column may be filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Case-insensitive substring
    Text,
    /// Exact match against one category value
    Category,
    /// Inclusive day range
    DateRange,
    /// Inclusive numeric range
    NumberRange,
    /// Case-insensitive regular expression
    Pattern,
    /// Skim-style fuzzy match
    Fuzzy,
    /// Scalar equality
    Equals,
}

/// Inclusive day range. `to` missing means a single-day filter on `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            from: Some(day),
            to: None,
        }
    }

    /// Effective inclusive bounds, or None when the range constrains nothing
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let from = self.from?;
        let to = self.to.map_or(from, |to| to.max(from));
        Some((from, to))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        match self.bounds() {
            Some((from, to)) => from <= day && day <= to,
            None => true,
        }
    }
}

/// A value stored against one column in the filter state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Text(String),
    Category(String),
    DateRange(DateRange),
    NumberRange { min: Option<f64>, max: Option<f64> },
    Pattern(String),
    Fuzzy(String),
    Equals(DataValue),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::Category(_) => FilterKind::Category,
            FilterValue::DateRange(_) => FilterKind::DateRange,
            FilterValue::NumberRange { .. } => FilterKind::NumberRange,
            FilterValue::Pattern(_) => FilterKind::Pattern,
            FilterValue::Fuzzy(_) => FilterKind::Fuzzy,
            FilterValue::Equals(_) => FilterKind::Equals,
        }
    }

    /// Reduce a value to its canonical form, or None when it means
    /// "clear this column's filter".
    ///
    /// Empty strings, the `"all"` sentinel on category and equality filters,
    /// a date range without `from`, an unbounded number range, a null
    /// equality value and a regex that does not compile all clear. Reversed
    /// ranges are normalized so the upper bound is never below the lower one.
    pub fn normalize(self) -> Option<FilterValue> {
        match self {
            FilterValue::Text(s) | FilterValue::Fuzzy(s) | FilterValue::Pattern(s)
                if s.is_empty() =>
            {
                None
            }
            FilterValue::Pattern(s) => build_regex(&s).map(|_| FilterValue::Pattern(s)),
            FilterValue::Category(s) if s.is_empty() || s.eq_ignore_ascii_case(ALL_SENTINEL) => {
                None
            }
            FilterValue::DateRange(range) => {
                let (from, to) = range.bounds()?;
                Some(FilterValue::DateRange(DateRange::new(
                    Some(from),
                    (to != from).then_some(to),
                )))
            }
            FilterValue::NumberRange { min: None, max: None } => None,
            FilterValue::NumberRange {
                min: Some(min),
                max: Some(max),
            } if max < min => Some(FilterValue::NumberRange {
                min: Some(min),
                max: Some(min),
            }),
            FilterValue::Equals(DataValue::Null) => None,
            FilterValue::Equals(DataValue::String(s))
                if s.is_empty() || s.eq_ignore_ascii_case(ALL_SENTINEL) =>
            {
                None
            }
            other => Some(other),
        }
    }

    /// Parse user-typed text into a filter of the given kind.
    ///
    /// Returns None when the text is malformed for that kind, which callers
    /// treat as "no constraint" so half-typed input never errors.
    ///
    /// Ranges use `from..to`, `from..` and `..to`; a single value without
    /// `..` is a one-day (or exact number) range.
    pub fn parse(kind: FilterKind, text: &str) -> Option<FilterValue> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let value = match kind {
            FilterKind::Text => FilterValue::Text(text.to_string()),
            FilterKind::Category => FilterValue::Category(text.to_string()),
            FilterKind::Pattern => FilterValue::Pattern(text.to_string()),
            FilterKind::Fuzzy => FilterValue::Fuzzy(text.to_string()),
            FilterKind::Equals => FilterValue::Equals(TypeInference::parse_value(text)),
            FilterKind::DateRange => {
                let (from, to) = split_range(text);
                let from = parse_bound(from, parse_day)?;
                let to = match to {
                    Some(to) => parse_bound(to, parse_day)?,
                    None => from,
                };
                FilterValue::DateRange(DateRange::new(from, to))
            }
            FilterKind::NumberRange => {
                let parse_num = |s: &str| s.parse::<f64>().ok();
                let (min, max) = split_range(text);
                let min = parse_bound(min, parse_num)?;
                let max = match max {
                    Some(max) => parse_bound(max, parse_num)?,
                    None => min,
                };
                FilterValue::NumberRange { min, max }
            }
        };

        value.normalize()
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "contains '{}'", s),
            FilterValue::Category(s) => write!(f, "= '{}'", s),
            FilterValue::DateRange(range) => match range.bounds() {
                Some((from, to)) if from == to => write!(f, "on {}", from),
                Some((from, to)) => write!(f, "{} .. {}", from, to),
                None => write!(f, "any date"),
            },
            FilterValue::NumberRange { min, max } => {
                let show = |v: &Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
                write!(f, "{} .. {}", show(min), show(max))
            }
            FilterValue::Pattern(p) => write!(f, "~ /{}/", p),
            FilterValue::Fuzzy(p) => write!(f, "~ '{}'", p),
            FilterValue::Equals(v) => write!(f, "== {}", v),
        }
    }
}

/// Split `a..b` into its halves; text without `..` is a single bound
fn split_range(text: &str) -> (&str, Option<&str>) {
    match text.split_once("..") {
        Some((lo, hi)) => (lo.trim(), Some(hi.trim())),
        None => (text, None),
    }
}

/// An empty bound is open (`Some(None)`), a malformed one rejects the
/// whole filter (`None`)
fn parse_bound<T>(text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Option<T>> {
    if text.is_empty() {
        Some(None)
    } else {
        parse(text).map(Some)
    }
}

fn build_regex(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// A filter value compiled for repeated evaluation
pub enum FilterPredicate {
    Text(String),
    Category(String),
    DateRange(NaiveDate, NaiveDate),
    NumberRange(Option<f64>, Option<f64>),
    Pattern(Regex),
    Fuzzy {
        matcher: SkimMatcherV2,
        pattern: String,
        exact: bool,
    },
    Equals(DataValue),
    /// Compiles to nothing, every row passes
    Unconstrained,
}

impl FilterPredicate {
    pub fn compile(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => FilterPredicate::Text(s.to_lowercase()),
            FilterValue::Category(s) => FilterPredicate::Category(s.clone()),
            FilterValue::DateRange(range) => match range.bounds() {
                Some((from, to)) => FilterPredicate::DateRange(from, to),
                None => FilterPredicate::Unconstrained,
            },
            FilterValue::NumberRange { min, max } => FilterPredicate::NumberRange(*min, *max),
            FilterValue::Pattern(p) => match build_regex(p) {
                Some(regex) => FilterPredicate::Pattern(regex),
                None => FilterPredicate::Unconstrained,
            },
            FilterValue::Fuzzy(p) => {
                // A leading ' asks for an exact substring instead of fuzzy
                let (pattern, exact) = match p.strip_prefix('\'') {
                    Some(rest) => (rest.to_lowercase(), true),
                    None => (p.clone(), false),
                };
                FilterPredicate::Fuzzy {
                    matcher: SkimMatcherV2::default().ignore_case(),
                    pattern,
                    exact,
                }
            }
            FilterValue::Equals(v) => FilterPredicate::Equals(v.clone()),
        }
    }

    pub fn matches(&self, value: &DataValue) -> bool {
        match self {
            FilterPredicate::Text(needle) => value.to_string().to_lowercase().contains(needle),
            FilterPredicate::Category(category) => match value {
                DataValue::String(s) => s == category,
                DataValue::Null => false,
                other => other.to_string() == *category,
            },
            FilterPredicate::DateRange(from, to) => value
                .as_day()
                .is_some_and(|day| *from <= day && day <= *to),
            FilterPredicate::NumberRange(min, max) => value.as_f64().is_some_and(|n| {
                min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
            }),
            FilterPredicate::Pattern(regex) => regex.is_match(&value.to_string()),
            FilterPredicate::Fuzzy {
                matcher,
                pattern,
                exact,
            } => {
                let text = value.to_string();
                if *exact {
                    text.to_lowercase().contains(pattern.as_str())
                } else {
                    matcher.fuzzy_match(&text, pattern).is_some()
                }
            }
            FilterPredicate::Equals(expected) => {
                !value.is_null() && compare_values(value, expected).is_eq()
            }
            FilterPredicate::Unconstrained => true,
        }
    }
}
