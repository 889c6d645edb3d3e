use crate::assignment::model::AssignmentFilter;
use crate::cache::Caches;
use crate::session::model::Role;
use crate::session::service::SessionStore;
use crate::store::RemoteStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    pub units: Duration,
    pub schedule: Duration,
    pub tester: Duration,
}

/// Runs `tick` every `period` until `shutdown` flips to true.
pub fn spawn_poller<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("{} poller every {:?}", name, period);
        loop {
            tokio::select! {
                _ = interval.tick() => tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }
        info!("{} poller stopped", name);
    })
}

/// Unit list, full schedule and the tester's own queue, each on its own clock.
pub fn spawn_pollers(
    store: RemoteStore,
    session: Arc<SessionStore>,
    caches: Arc<Caches>,
    intervals: PollIntervals,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let units = {
        let (store, session, caches) = (store.clone(), session.clone(), caches.clone());
        spawn_poller("units", intervals.units, shutdown.clone(), move || {
            let (store, session, caches) = (store.clone(), session.clone(), caches.clone());
            async move {
                let Some(current) = session.current().await else {
                    return;
                };
                let units = store.authorized(&current.token).units();
                let state = caches.units.refresh(&(), || units.list()).await;
                debug!("units poll: {:?}", state.data().map(Vec::len));
            }
        })
    };

    let schedule = {
        let (store, session, caches) = (store.clone(), session.clone(), caches.clone());
        spawn_poller("schedule", intervals.schedule, shutdown.clone(), move || {
            let (store, session, caches) = (store.clone(), session.clone(), caches.clone());
            async move {
                let Some(current) = session.current().await else {
                    return;
                };
                if current.role != Role::Supervisor {
                    return;
                }
                let assignments = store.authorized(&current.token).assignments();
                let filter = AssignmentFilter::all();
                caches
                    .assignments
                    .refresh(&filter, || assignments.list(&filter))
                    .await;
            }
        })
    };

    let tester = spawn_poller("tester", intervals.tester, shutdown, move || {
        let (store, session, caches) = (store.clone(), session.clone(), caches.clone());
        async move {
            let Some(current) = session.current().await else {
                return;
            };
            if current.role != Role::Tester {
                return;
            }
            let assignments = store.authorized(&current.token).assignments();
            let filter = AssignmentFilter::for_tester(&current.user.id);
            caches
                .assignments
                .refresh(&filter, || assignments.list(&filter))
                .await;
            let notifications = store.authorized(&current.token).notifications();
            caches
                .notifications
                .refresh(&(), || notifications.list())
                .await;
        }
    });

    vec![units, schedule, tester]
}
