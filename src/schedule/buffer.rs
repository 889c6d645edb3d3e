use crate::api::AppError;
use crate::assignment::model::{Assignment, AssignmentPatch};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{info, warn};

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PendingChange {
    pub patch: AssignmentPatch,
    pub dirty: bool,
}

/// Scheduler edits held back until an explicit save, kept apart from the
/// fetched assignments.
#[derive(Debug, Default)]
pub struct ScheduleBuffer {
    entries: BTreeMap<i64, PendingChange>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SaveReport {
    pub saved: Vec<Assignment>,
    pub remaining: usize,
}

impl ScheduleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(&mut self, assignment_id: i64, change: AssignmentPatch) {
        let entry = self.entries.entry(assignment_id).or_default();
        entry.patch.merge(change);
        entry.dirty = true;
    }

    pub fn discard(&mut self, assignment_id: i64) -> bool {
        self.entries.remove(&assignment_id).is_some()
    }

    pub fn discard_all(&mut self) {
        self.entries.clear();
    }

    pub fn pending(&self, assignment_id: i64) -> Option<&PendingChange> {
        self.entries.get(&assignment_id)
    }

    pub fn dirty_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.dirty).count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_count() > 0
    }

    /// The fetched assignments with pending edits laid over them.
    pub fn merged(&self, assignments: &[Assignment]) -> Vec<Assignment> {
        assignments
            .iter()
            .map(|assignment| {
                let mut merged = assignment.clone();
                if let Some(entry) = self.entries.get(&assignment.id) {
                    entry.patch.apply_to(&mut merged);
                }
                merged
            })
            .collect()
    }

    /// Sends one PATCH per dirty entry in ascending id order and stops at
    /// the first failure. Entries already saved are cleared; the failing
    /// entry and the ones after it stay dirty.
    pub async fn save<F, Fut>(&mut self, mut patch: F) -> Result<SaveReport, AppError>
    where
        F: FnMut(i64, AssignmentPatch) -> Fut,
        Fut: Future<Output = Result<Assignment, AppError>>,
    {
        let dirty: Vec<(i64, AssignmentPatch)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(id, entry)| (*id, entry.patch.clone()))
            .collect();
        info!("saving {} scheduled assignments", dirty.len());

        let mut saved = Vec::with_capacity(dirty.len());
        for (assignment_id, change) in dirty {
            if change.is_empty() {
                self.entries.remove(&assignment_id);
                continue;
            }
            match patch(assignment_id, change).await {
                Ok(assignment) => {
                    self.entries.remove(&assignment_id);
                    saved.push(assignment);
                }
                Err(err) => {
                    warn!(
                        "schedule save stopped at assignment {} after {} saved: {}",
                        assignment_id,
                        saved.len(),
                        err
                    );
                    return Err(err);
                }
            }
        }
        Ok(SaveReport {
            saved,
            remaining: self.dirty_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn assignment(id: i64) -> Assignment {
        Assignment::builder()
            .id(id)
            .unit_id("U1".to_string())
            .step_id(id)
            .build()
    }

    fn start(date: &str) -> AssignmentPatch {
        AssignmentPatch {
            start_at: Some(Some(date.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn edits_merge_and_overlay() {
        let mut buffer = ScheduleBuffer::new();
        buffer.edit(2, start("2024-03-01"));
        buffer.edit(2, AssignmentPatch {
            tester_id: Some(Some("ana".to_string())),
            ..Default::default()
        });
        assert_eq!(buffer.dirty_count(), 1);

        let merged = buffer.merged(&[assignment(1), assignment(2)]);
        assert_eq!(merged[0], assignment(1));
        assert_eq!(merged[1].start_at.as_deref(), Some("2024-03-01"));
        assert_eq!(merged[1].tester_id.as_deref(), Some("ana"));
    }

    #[test]
    fn discard_drops_edits() {
        let mut buffer = ScheduleBuffer::new();
        buffer.edit(1, start("2024-03-01"));
        buffer.edit(2, start("2024-03-02"));
        assert!(buffer.discard(1));
        assert!(!buffer.discard(1));
        assert_eq!(buffer.dirty_count(), 1);
        buffer.discard_all();
        assert!(!buffer.is_dirty());
    }

    #[tokio::test]
    async fn save_patches_sequentially_in_id_order() {
        let mut buffer = ScheduleBuffer::new();
        buffer.edit(9, start("2024-03-09"));
        buffer.edit(3, start("2024-03-03"));
        let calls = Arc::new(Mutex::new(vec![]));
        let seen = calls.clone();
        let report = buffer
            .save(|id, change| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(id);
                    let mut updated = assignment(id);
                    change.apply_to(&mut updated);
                    Ok(updated)
                }
            })
            .await
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![3, 9]);
        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.remaining, 0);
        assert!(!buffer.is_dirty());
    }

    #[tokio::test]
    async fn save_stops_at_first_failure() {
        let mut buffer = ScheduleBuffer::new();
        buffer.edit(1, start("2024-03-01"));
        buffer.edit(2, start("2024-03-02"));
        buffer.edit(3, start("2024-03-03"));
        let result = buffer
            .save(|id, _| async move {
                if id == 2 {
                    Err(AppError::Remote {
                        status: 409,
                        message: "assignment 2 is locked".to_string(),
                    })
                } else {
                    Ok(assignment(id))
                }
            })
            .await;
        match result {
            Err(AppError::Remote { message, .. }) => assert_eq!(message, "assignment 2 is locked"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(buffer.pending(1).is_none());
        assert!(buffer.pending(2).unwrap().dirty);
        assert!(buffer.pending(3).unwrap().dirty);
        assert_eq!(buffer.dirty_count(), 2);
    }
}
