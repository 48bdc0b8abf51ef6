//! Grade engine.
//!
//! Turns a student's raw unit marks into an average, a highest mark and a
//! qualitative grade band. Entries that do not parse as numbers are ignored.

use serde::Serialize;

use crate::models::UnitMarks;

/// Qualitative grade band derived from the average mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Outstanding,
    Excellent,
    Good,
    Satisfactory,
}

impl Grade {
    /// Band for an average. Lower bounds are inclusive.
    pub fn from_average(average: f64) -> Self {
        if average >= 90.0 {
            Grade::Outstanding
        } else if average >= 80.0 {
            Grade::Excellent
        } else if average >= 70.0 {
            Grade::Good
        } else {
            Grade::Satisfactory
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Outstanding => "OUTSTANDING",
            Grade::Excellent => "EXCELLENT",
            Grade::Good => "GOOD",
            Grade::Satisfactory => "SATISFACTORY",
        }
    }
}

/// Result of grading a set of unit marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub average: f64,
    pub unit_count: usize,
    pub highest: f64,
    pub grade: Grade,
    /// One `"<Unit Name>: <value>%"` line per counted unit, in input order.
    pub details: Vec<String>,
}

/// Grade the given unit marks.
pub fn compute_grade(unit_marks: &UnitMarks) -> GradeReport {
    let mut total = 0.0;
    let mut unit_count = 0usize;
    let mut highest = 0.0_f64;
    let mut details = Vec::new();

    for (unit, raw) in unit_marks {
        let Some(value) = parse_mark(raw) else {
            continue;
        };

        total += value;
        unit_count += 1;
        highest = highest.max(value);
        details.push(format!("{}: {}%", humanize_unit(unit), format_mark(value)));
    }

    let average = if unit_count > 0 {
        total / unit_count as f64
    } else {
        0.0
    };

    GradeReport {
        average,
        unit_count,
        highest,
        grade: Grade::from_average(average),
        details,
    }
}

/// Renders a mark the way the detail lines expect: always with a fractional
/// part, and with a signed two-digit exponent outside `1e-4..1e16`.
fn format_mark(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
        return formatted;
    }
    format!("{:?}", value)
}

fn parse_mark(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `unit_1` -> `Unit 1`, `extra_credit_lab` -> `Extra Credit Lab`.
///
/// A letter is upper-cased when it does not directly follow another letter,
/// otherwise lower-cased.
pub fn humanize_unit(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;

    for ch in key.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(pairs: &[(&str, &str)]) -> UnitMarks {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mixed_marks_scenario() {
        let report = compute_grade(&marks(&[
            ("unit_1", "95"),
            ("unit_2", "85"),
            ("unit_3", "not a number"),
        ]));

        assert_eq!(report.unit_count, 2);
        assert!((report.average - 90.0).abs() < 1e-9);
        assert_eq!(report.highest, 95.0);
        assert_eq!(report.grade, Grade::Outstanding);
        assert_eq!(report.details, vec!["Unit 1: 95.0%", "Unit 2: 85.0%"]);
    }

    #[test]
    fn test_no_parseable_marks() {
        let report = compute_grade(&marks(&[("unit_1", "abc"), ("unit_2", ""), ("unit_3", "   ")]));

        assert_eq!(report.unit_count, 0);
        assert_eq!(report.average, 0.0);
        assert_eq!(report.highest, 0.0);
        assert_eq!(report.grade, Grade::Satisfactory);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_empty_marks() {
        let report = compute_grade(&UnitMarks::new());
        assert_eq!(report.unit_count, 0);
        assert_eq!(report.grade, Grade::Satisfactory);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let report = compute_grade(&marks(&[("unit_1", "  72.5 ")]));
        assert_eq!(report.unit_count, 1);
        assert_eq!(report.details, vec!["Unit 1: 72.5%"]);
    }

    #[test]
    fn test_non_finite_values_are_skipped() {
        let report = compute_grade(&marks(&[("unit_1", "nan"), ("unit_2", "inf"), ("unit_3", "60")]));
        assert_eq!(report.unit_count, 1);
        assert_eq!(report.average, 60.0);
    }

    #[test]
    fn test_average_of_parseable_only() {
        let report = compute_grade(&marks(&[
            ("unit_1", "50"),
            ("unit_2", "x"),
            ("unit_3", "75"),
            ("unit_4", "100"),
        ]));
        assert_eq!(report.unit_count, 3);
        assert!((report.average - 75.0).abs() < 1e-9);
        assert_eq!(report.highest, 100.0);
    }

    #[test]
    fn test_highest_with_negative_marks() {
        let report = compute_grade(&marks(&[("unit_1", "-5"), ("unit_2", "-2")]));
        assert_eq!(report.highest, 0.0);
        assert_eq!(report.unit_count, 2);
    }

    #[test]
    fn test_detail_exponent_form() {
        assert_eq!(format_mark(85.5), "85.5");
        assert_eq!(format_mark(100.0), "100.0");
        assert_eq!(format_mark(0.0), "0.0");
        assert_eq!(format_mark(1e16), "1e+16");
        assert_eq!(format_mark(1.5e20), "1.5e+20");
        assert_eq!(format_mark(1e-5), "1e-05");
        assert_eq!(format_mark(-2.5e-7), "-2.5e-07");

        let report = compute_grade(&marks(&[("unit_1", "1e16")]));
        assert_eq!(report.details, vec!["Unit 1: 1e+16%"]);
    }

    #[test]
    fn test_grade_band_boundaries() {
        assert_eq!(Grade::from_average(90.0), Grade::Outstanding);
        assert_eq!(Grade::from_average(89.999), Grade::Excellent);
        assert_eq!(Grade::from_average(80.0), Grade::Excellent);
        assert_eq!(Grade::from_average(79.999), Grade::Good);
        assert_eq!(Grade::from_average(70.0), Grade::Good);
        assert_eq!(Grade::from_average(69.999), Grade::Satisfactory);
        assert_eq!(Grade::from_average(0.0), Grade::Satisfactory);
    }

    #[test]
    fn test_details_follow_input_order() {
        let report = compute_grade(&marks(&[
            ("unit_10", "70"),
            ("unit_2", "80"),
            ("unit_1", "90"),
        ]));
        assert_eq!(
            report.details,
            vec!["Unit 10: 70.0%", "Unit 2: 80.0%", "Unit 1: 90.0%"]
        );
    }

    #[test]
    fn test_humanize_unit() {
        assert_eq!(humanize_unit("unit_1"), "Unit 1");
        assert_eq!(humanize_unit("unit_final_EXAM"), "Unit Final Exam");
        assert_eq!(humanize_unit("unit_1a"), "Unit 1A");
    }
}
