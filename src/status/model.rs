use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusKind {
    Pending,
    Running,
    Pass,
    Fail,
    Overdue,
    Skipped,
}

impl StatusKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Pending => "PENDING",
            StatusKind::Running => "RUNNING",
            StatusKind::Pass => "PASS",
            StatusKind::Fail => "FAIL",
            StatusKind::Overdue => "OVERDUE",
            StatusKind::Skipped => "N/A",
        }
    }

    pub fn from_passed(passed: bool) -> Self {
        if passed {
            StatusKind::Pass
        } else {
            StatusKind::Fail
        }
    }
}

/// What one (unit, step) cell shows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CellStatus {
    pub kind: StatusKind,
    pub label: String,
    pub display_date: Option<String>,
    pub passed: Option<bool>,
}

impl CellStatus {
    pub fn new(kind: StatusKind, display_date: Option<String>) -> Self {
        CellStatus {
            kind,
            label: kind.label().to_string(),
            display_date,
            passed: match kind {
                StatusKind::Pass => Some(true),
                StatusKind::Fail => Some(false),
                _ => None,
            },
        }
    }

    pub fn bare(kind: StatusKind) -> Self {
        CellStatus::new(kind, None)
    }

    pub fn date_text(&self) -> &str {
        self.display_date.as_deref().unwrap_or("-")
    }
}
