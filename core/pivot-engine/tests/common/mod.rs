//! FILENAME: core/pivot-engine/tests/common/mod.rs
//! Fixtures shared by the subtotal integration tests.

#![allow(dead_code)]

use engine::{CellValue, Table};

pub fn text(s: &str) -> CellValue {
    CellValue::text(s)
}

pub fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

/// The three-row enrollment example.
pub struct EnrollmentFixture;

impl EnrollmentFixture {
    pub fn table() -> Table {
        Table::from_records(
            ["Enrolled", "School", "Score"],
            vec![
                vec![("Enrolled", text("Yes")), ("School", text("A")), ("Score", num(10.0))],
                vec![("Enrolled", text("Yes")), ("School", text("B")), ("Score", num(20.0))],
                vec![("Enrolled", text("No")), ("School", text("A")), ("Score", num(5.0))],
            ],
        )
        .expect("fixture table")
    }
}

/// Student scores grouped by enrollment, term, school and grade.
pub struct StudentFixture;

impl StudentFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Enrolled", "Time", "School", "Grade", "Score"]
    }

    /// (enrolled, time, school, grade, score)
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("Yes", "Fall", "North", 9.0, 80.0),
            ("Yes", "Fall", "North", 10.0, 90.0),
            ("Yes", "Fall", "South", 9.0, 70.0),
            ("Yes", "Spring", "North", 9.0, 85.0),
            ("No", "Fall", "North", 9.0, 60.0),
            ("No", "Spring", "South", 10.0, 75.0),
            ("No", "Spring", "South", 10.0, 65.0),
            ("Yes", "Fall", "North", 9.0, 100.0),
        ]
    }

    pub fn index() -> Vec<&'static str> {
        vec!["Enrolled", "Time", "School", "Grade"]
    }

    pub fn table() -> Table {
        Table::with_rows(
            Self::headers(),
            Self::data()
                .into_iter()
                .map(|(enrolled, time, school, grade, score)| {
                    vec![text(enrolled), text(time), text(school), num(grade), num(score)]
                }),
        )
        .expect("fixture table")
    }

    /// Number of distinct tuples over the first `width` grouping columns.
    pub fn distinct_prefixes(width: usize) -> usize {
        let mut seen: Vec<Vec<String>> = Vec::new();
        for (enrolled, time, school, grade, _) in Self::data() {
            let full = vec![
                enrolled.to_string(),
                time.to_string(),
                school.to_string(),
                grade.to_string(),
            ];
            let prefix = full[..width].to_vec();
            if !seen.contains(&prefix) {
                seen.push(prefix);
            }
        }
        seen.len()
    }

    pub fn total_score() -> f64 {
        Self::data().iter().map(|row| row.4).sum()
    }
}

/// Extracts one row's cells as display strings.
pub fn display_row(cells: &[CellValue]) -> Vec<String> {
    cells.iter().map(CellValue::display_value).collect()
}
