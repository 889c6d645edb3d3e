pub mod poller;
pub mod query;

use crate::assignment::model::{Assignment, AssignmentFilter};
use crate::notification::model::Notification;
use crate::step::model::Step;
use crate::unit::model::{UnitDetails, UnitSummary};
use query::QueryCache;

/// Every cached query the dashboard reads, one cache per resource.
pub struct Caches {
    pub units: QueryCache<(), Vec<UnitSummary>>,
    pub details: QueryCache<String, UnitDetails>,
    pub steps: QueryCache<(), Vec<Step>>,
    pub assignments: QueryCache<AssignmentFilter, Vec<Assignment>>,
    pub notifications: QueryCache<(), Vec<Notification>>,
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}

impl Caches {
    pub fn new() -> Self {
        Self {
            units: QueryCache::new("units"),
            details: QueryCache::new("unit_details"),
            steps: QueryCache::new("steps"),
            assignments: QueryCache::new("assignments"),
            notifications: QueryCache::new("notifications"),
        }
    }

    /// Anything that shows the unit or its assignments.
    pub async fn invalidate_unit(&self, unit_id: &str) {
        self.units.invalidate(&()).await;
        self.details.invalidate(&unit_id.to_string()).await;
        self.assignments.invalidate_all().await;
    }

    pub async fn invalidate_assignments(&self, unit_id: &str) {
        self.details.invalidate(&unit_id.to_string()).await;
        self.assignments.invalidate_all().await;
        self.units.invalidate(&()).await;
    }

    pub async fn invalidate_everything(&self) {
        self.units.invalidate_all().await;
        self.details.invalidate_all().await;
        self.steps.invalidate_all().await;
        self.assignments.invalidate_all().await;
        self.notifications.invalidate_all().await;
    }
}
