use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, error, warn};

use crate::models::AppointmentError;

type Undo = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), AppointmentError>> + Send>;

/// Compensating actions for a multi-step booking.
///
/// Each successful step registers how to undo itself. On failure the undo
/// actions run in reverse order and are awaited before the error is returned;
/// on success they are dropped.
pub struct Saga {
    name: &'static str,
    steps: Vec<(String, Undo)>,
}

impl Saga {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn on_abort<F, Fut>(&mut self, label: impl Into<String>, undo: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), AppointmentError>> + Send + 'static,
    {
        self.steps
            .push((label.into(), Box::new(move || Box::pin(undo()))));
    }

    pub fn commit(self) {
        debug!("{} committed ({} compensations discarded)", self.name, self.steps.len());
    }

    /// Runs every compensation and returns the error to report. A failed
    /// compensation replaces `cause` with `InconsistentState`.
    pub async fn abort(self, cause: AppointmentError) -> AppointmentError {
        warn!("{} aborted: {}", self.name, cause);

        let mut failures = Vec::new();
        for (label, undo) in self.steps.into_iter().rev() {
            match undo().await {
                Ok(()) => debug!("{}: compensated '{}'", self.name, label),
                Err(err) => {
                    error!("{}: compensation '{}' failed: {}", self.name, label, err);
                    failures.push(format!("{}: {}", label, err));
                }
            }
        }

        if failures.is_empty() {
            cause
        } else {
            AppointmentError::InconsistentState(format!(
                "{} (after: {})",
                failures.join("; "),
                cause
            ))
        }
    }

    /// Commits on `Ok`, compensates on `Err`.
    pub async fn finish<T>(self, result: Result<T, AppointmentError>) -> Result<T, AppointmentError> {
        match result {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(cause) => Err(self.abort(cause).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) -> impl FnOnce() -> BoxFuture<'static, Result<(), AppointmentError>> {
        let log = Arc::clone(log);
        move || {
            Box::pin(async move {
                log.lock().unwrap().push(entry);
                Ok::<(), AppointmentError>(())
            })
        }
    }

    #[tokio::test]
    async fn compensations_run_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");
        saga.on_abort("first", recorder(&log, "first"));
        saga.on_abort("second", recorder(&log, "second"));

        let err = saga.abort(AppointmentError::PatientNotFound).await;

        assert_matches!(err, AppointmentError::PatientNotFound);
        assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    }

    #[tokio::test]
    async fn commit_discards_compensations() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");
        saga.on_abort("first", recorder(&log, "first"));

        let value = saga.finish(Ok::<_, AppointmentError>(7)).await.unwrap();

        assert_eq!(value, 7);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_compensation_is_reported_as_inconsistent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");
        saga.on_abort("restore", recorder(&log, "restore"));
        saga.on_abort("broken", || async {
            Err::<(), _>(AppointmentError::InconsistentState("slot taken".to_string()))
        });

        let err = saga.abort(AppointmentError::RoomConflict).await;

        assert_matches!(err, AppointmentError::InconsistentState(msg) if msg.contains("broken"));
        assert_eq!(*log.lock().unwrap(), vec!["restore"]);
    }
}
