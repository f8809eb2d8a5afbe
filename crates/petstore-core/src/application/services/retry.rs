//! Conflict retry boundary
//!
//! A mutation that loses a race to another transaction fails with
//! [`ApplicationError::Conflict`]. The boundary reruns the whole
//! transactional attempt, reading fresh state, up to a fixed number of
//! times. Every other error is returned as is.

use crate::application::errors::{AppResult, ApplicationError};
use crate::security::Operation;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Upper bound accepted for the configured retry count
pub const MAX_CONFLICT_RETRIES: u32 = 5;

const BACKOFF_STEP: Duration = Duration::from_millis(15);

/// Run `attempt`, retrying it up to `retries` more times on conflict
pub async fn with_conflict_retry<T, F, Fut>(
    operation: Operation,
    retries: u32,
    mut attempt: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let retries = retries.min(MAX_CONFLICT_RETRIES);
    let mut retried = 0;

    loop {
        match attempt().await {
            Err(ApplicationError::Conflict { entity, id }) if retried < retries => {
                retried += 1;
                warn!(
                    operation = %operation,
                    entity = %entity,
                    id = %id,
                    attempt = retried,
                    "Conflicting update, retrying"
                );
                tokio::time::sleep(BACKOFF_STEP * retried).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_conflict_once() {
        let calls = AtomicU32::new(0);

        let result = with_conflict_retry(Operation::InitiateAdoption, 1, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApplicationError::conflict("Pet", 1))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_retries() {
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = with_conflict_retry(Operation::InitiateAdoption, 1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApplicationError::conflict("Pet", 1))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = with_conflict_retry(Operation::RemovePet, 3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApplicationError::unauthorized(Operation::RemovePet, "no"))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Authorization);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_count_is_capped() {
        let calls = AtomicU32::new(0);

        let _ = with_conflict_retry(Operation::UpdatePet, 100, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ApplicationError::conflict("Pet", 1))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), MAX_CONFLICT_RETRIES + 1);
    }
}
