use crate::assignment::model::Assignment;
use crate::result::model::TestResult;
use crate::status::model::{CellStatus, StatusKind};
use crate::time::{format_date, format_timestamp, parse_date, parse_timestamp};
use chrono::{FixedOffset, NaiveDate};
use std::cmp::Ordering;

/// Derives the display status of a (unit, step) cell. Shared by the matrix
/// and the tester queue so both screens always agree.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    offset: FixedOffset,
}

impl Classifier {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn classify(
        &self,
        assignment: Option<&Assignment>,
        result: Option<&TestResult>,
        today: NaiveDate,
    ) -> CellStatus {
        let Some(assignment) = assignment else {
            return CellStatus::bare(StatusKind::Pending);
        };
        if assignment.skipped {
            return CellStatus::bare(StatusKind::Skipped);
        }

        let kind = match assignment.status.trim().to_uppercase().as_str() {
            "PASS" => StatusKind::Pass,
            "FAIL" => StatusKind::Fail,
            "RUNNING" => StatusKind::Running,
            _ => {
                let scheduled = scheduled_kind(parse_date(assignment.start_at.as_deref()), today);
                match result {
                    // results recorded before the assignment status was kept up to date
                    Some(result) if scheduled != StatusKind::Running => {
                        StatusKind::from_passed(result.passed)
                    }
                    _ => scheduled,
                }
            }
        };

        CellStatus::new(kind, self.display_date(assignment, result))
    }

    fn display_date(&self, assignment: &Assignment, result: Option<&TestResult>) -> Option<String> {
        result
            .and_then(|result| parse_timestamp(result.finished_at.as_deref()))
            .map(|finished| format_timestamp(&finished, &self.offset))
            .or_else(|| parse_date(assignment.end_at.as_deref()).map(|date| format_date(&date)))
            .or_else(|| parse_date(assignment.start_at.as_deref()).map(|date| format_date(&date)))
    }
}

fn scheduled_kind(start: Option<NaiveDate>, today: NaiveDate) -> StatusKind {
    match start.map(|start| start.cmp(&today)) {
        None => StatusKind::Pending,
        Some(Ordering::Less) => StatusKind::Overdue,
        Some(Ordering::Equal) => StatusKind::Running,
        Some(Ordering::Greater) => StatusKind::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::display_offset;
    use proptest::prelude::*;

    fn classifier() -> Classifier {
        Classifier::new(display_offset(8))
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn assignment(status: &str, start_at: Option<&str>) -> Assignment {
        Assignment::builder()
            .id(1)
            .unit_id("U1".to_string())
            .step_id(10)
            .status(status.to_string())
            .maybe_start_at(start_at.map(str::to_string))
            .build()
    }

    fn result(passed: bool, finished_at: Option<&str>) -> TestResult {
        TestResult::builder()
            .id(1)
            .unit_id("U1".to_string())
            .step_id(10)
            .passed(passed)
            .maybe_finished_at(finished_at.map(str::to_string))
            .build()
    }

    #[test]
    fn missing_assignment_is_pending() {
        let cell = classifier().classify(None, Some(&result(true, None)), day("2024-06-01"));
        assert_eq!(cell, CellStatus::bare(StatusKind::Pending));
        assert_eq!(cell.date_text(), "-");
    }

    #[test]
    fn skipped_wins_over_everything() {
        let mut skipped = assignment("PASS", Some("2024-01-01"));
        skipped.skipped = true;
        let cell = classifier().classify(Some(&skipped), Some(&result(true, Some("2024-01-02T00:00:00"))), day("2024-06-01"));
        assert_eq!(cell.kind, StatusKind::Skipped);
        assert_eq!(cell.label, "N/A");
        assert_eq!(cell.display_date, None);
        assert_eq!(cell.passed, None);
    }

    #[test]
    fn terminal_status_is_case_insensitive() {
        let cell = classifier().classify(Some(&assignment(" fail ", Some("2030-01-01"))), None, day("2024-06-01"));
        assert_eq!(cell.kind, StatusKind::Fail);
        assert_eq!(cell.label, "FAIL");
        assert_eq!(cell.passed, Some(false));

        let cell = classifier().classify(Some(&assignment("Pass", None)), Some(&result(false, None)), day("2024-06-01"));
        assert_eq!(cell.kind, StatusKind::Pass);
        assert_eq!(cell.passed, Some(true));
    }

    #[test]
    fn running_status_is_kept() {
        let cell = classifier().classify(Some(&assignment("running", Some("2020-01-01"))), None, day("2024-06-01"));
        assert_eq!(cell.kind, StatusKind::Running);
    }

    #[test]
    fn schedule_drives_pending_assignments() {
        let today = day("2024-06-01");
        let c = classifier();
        assert_eq!(c.classify(Some(&assignment("PENDING", Some("2024-01-01"))), None, today).kind, StatusKind::Overdue);
        assert_eq!(c.classify(Some(&assignment("PENDING", Some("2024-06-01"))), None, today).kind, StatusKind::Running);
        assert_eq!(c.classify(Some(&assignment("PENDING", Some("2024-07-01"))), None, today).kind, StatusKind::Pending);
        assert_eq!(c.classify(Some(&assignment("PENDING", None)), None, today).kind, StatusKind::Pending);
        assert_eq!(c.classify(Some(&assignment("WAITING", Some("2024-01-01"))), None, today).kind, StatusKind::Overdue);
    }

    #[test]
    fn sentinel_start_means_unscheduled() {
        let cell = classifier().classify(Some(&assignment("PENDING", Some("1970-01-01"))), None, day("2024-06-01"));
        assert_eq!(cell.kind, StatusKind::Pending);
        assert_eq!(cell.display_date, None);
    }

    #[test]
    fn sentinel_finish_with_offset_has_no_date() {
        let cell = classifier().classify(
            Some(&assignment("PASS", None)),
            Some(&result(true, Some("1970-01-01T00:00:00+08:00"))),
            day("2024-06-01"),
        );
        assert_eq!(cell.kind, StatusKind::Pass);
        assert_eq!(cell.display_date, None);
    }

    #[test]
    fn legacy_result_overrides_pending_and_overdue() {
        let today = day("2024-06-01");
        let c = classifier();
        let overdue = c.classify(Some(&assignment("PENDING", Some("2024-01-01"))), Some(&result(true, None)), today);
        assert_eq!(overdue.kind, StatusKind::Pass);
        assert_eq!(overdue.passed, Some(true));

        let unscheduled = c.classify(Some(&assignment("PENDING", None)), Some(&result(false, None)), today);
        assert_eq!(unscheduled.kind, StatusKind::Fail);

        let running = c.classify(Some(&assignment("PENDING", Some("2024-06-01"))), Some(&result(false, None)), today);
        assert_eq!(running.kind, StatusKind::Running);
        assert_eq!(running.passed, None);
    }

    #[test]
    fn display_date_precedence() {
        let today = day("2024-06-01");
        let c = classifier();
        let mut scheduled = assignment("PASS", Some("2024-05-01"));
        scheduled.end_at = Some("2024-05-03T00:00:00".to_string());

        let with_result = c.classify(Some(&scheduled), Some(&result(true, Some("2024-05-02T20:30:00"))), today);
        assert_eq!(with_result.date_text(), "2024-05-03 04:30");

        let sentinel_result = c.classify(Some(&scheduled), Some(&result(true, Some("1970-01-01T00:00:00"))), today);
        assert_eq!(sentinel_result.date_text(), "2024-05-03");

        scheduled.end_at = None;
        let start_only = c.classify(Some(&scheduled), None, today);
        assert_eq!(start_only.date_text(), "2024-05-01");
    }

    #[test]
    fn overdue_scenario() {
        let cell = classifier().classify(
            Some(&assignment("PENDING", Some("2024-01-01"))),
            None,
            day("2024-06-01"),
        );
        assert_eq!(cell.kind, StatusKind::Overdue);
        assert_eq!(cell.label, "OVERDUE");
        assert_eq!(cell.date_text(), "2024-01-01");
    }

    fn any_date_string() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("1970-01-01".to_string())),
            (2000i32..2040, 1u32..13, 1u32..29)
                .prop_map(|(y, m, d)| Some(format!("{:04}-{:02}-{:02}", y, m, d))),
            ".{0,24}".prop_map(Some),
        ]
    }

    fn any_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("PASS".to_string()),
            Just("fail".to_string()),
            Just("Running".to_string()),
            Just("PENDING".to_string()),
            ".{0,12}",
        ]
    }

    prop_compose! {
        fn any_assignment()(
            status in any_status(),
            start_at in any_date_string(),
            end_at in any_date_string(),
            skipped in any::<bool>(),
        ) -> Assignment {
            Assignment::builder()
                .id(1)
                .unit_id("U1".to_string())
                .step_id(10)
                .status(status)
                .maybe_start_at(start_at)
                .maybe_end_at(end_at)
                .skipped(skipped)
                .build()
        }
    }

    prop_compose! {
        fn any_result()(passed in any::<bool>(), finished_at in any_date_string()) -> Option<TestResult> {
            Some(TestResult::builder()
                .id(1)
                .unit_id("U1".to_string())
                .step_id(10)
                .passed(passed)
                .maybe_finished_at(finished_at)
                .build())
        }
    }

    proptest! {
        #[test]
        fn skipped_is_always_na(mut a in any_assignment(), r in any_result(), offset in 0i64..20000) {
            a.skipped = true;
            let today = day("2000-01-01") + chrono::Days::new(offset as u64);
            let cell = classifier().classify(Some(&a), r.as_ref(), today);
            prop_assert_eq!(cell.kind, StatusKind::Skipped);
            prop_assert_eq!(cell.label, "N/A");
            prop_assert_eq!(cell.display_date, None);
        }

        #[test]
        fn terminal_status_ignores_dates(
            mut a in any_assignment(),
            r in any_result(),
            pass in any::<bool>(),
            lower in any::<bool>(),
        ) {
            a.skipped = false;
            let status = if pass { "pass" } else { "FAIL" };
            a.status = if lower { status.to_lowercase() } else { status.to_uppercase() };
            let cell = classifier().classify(Some(&a), r.as_ref(), day("2024-06-01"));
            prop_assert_eq!(cell.kind, StatusKind::from_passed(pass));
            prop_assert_eq!(cell.passed, Some(pass));
        }

        #[test]
        fn classifier_is_total(a in any_assignment(), r in any_result()) {
            let c = classifier();
            let today = day("2024-06-01");
            let first = c.classify(Some(&a), r.as_ref(), today);
            let second = c.classify(Some(&a), r.as_ref(), today);
            prop_assert_eq!(&first, &second);
            if let Some(date) = &first.display_date {
                prop_assert!(!date.starts_with("1970-01-01"));
            }
        }

        #[test]
        fn unscheduled_pending_has_no_date(status in prop_oneof![Just("PENDING"), Just("pending"), Just("")]) {
            let a = assignment(status, None);
            let cell = classifier().classify(Some(&a), None, day("2024-06-01"));
            prop_assert_eq!(cell.kind, StatusKind::Pending);
            prop_assert_eq!(cell.display_date, None);
        }
    }
}
