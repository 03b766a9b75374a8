//! Shared "ensure resource exists" idiom.
//!
//! Both pipelines follow the same check-then-act shape: look the resource up,
//! create it only when absent, and hand the identified resource to the next
//! step. The helper takes both halves as closures so each resource kind
//! supplies its own lookup and creation calls. The check is advisory only;
//! when creation races another writer, the provider remains the source of
//! truth for uniqueness.

use std::future::Future;

/// Outcome of an ensure step, recording whether a create call was issued.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Ensured<R> {
    /// The resource already existed; no create call was made.
    Found(R),
    /// The resource was absent and has been created.
    Created(R),
}

impl<R> Ensured<R> {
    /// Unwraps the ensured resource.
    #[must_use]
    pub fn into_inner(self) -> R {
        match self {
            Self::Found(resource) | Self::Created(resource) => resource,
        }
    }

    /// Returns `true` when the ensure step issued a create call.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Looks a resource up and creates it only when the lookup reports absence.
///
/// The `create` closure is not invoked at all when `lookup` yields a
/// resource, which keeps repeated ensures idempotent from the caller's
/// perspective.
///
/// # Errors
///
/// Propagates whichever error the lookup or creation closure returns; a
/// lookup failure prevents the create call entirely.
pub async fn ensure_exists<R, E, LookupFut, CreateFut>(
    lookup: impl FnOnce() -> LookupFut,
    create: impl FnOnce() -> CreateFut,
) -> Result<Ensured<R>, E>
where
    LookupFut: Future<Output = Result<Option<R>, E>>,
    CreateFut: Future<Output = Result<R, E>>,
{
    if let Some(resource) = lookup().await? {
        return Ok(Ensured::Found(resource));
    }
    let resource = create().await?;
    Ok(Ensured::Created(resource))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
    #[error("step failed: {0}")]
    struct StepError(&'static str);

    #[tokio::test]
    async fn found_resource_skips_creation() {
        let creates = AtomicU32::new(0);

        let ensured = ensure_exists(
            || async { Ok::<_, StepError>(Some("existing")) },
            || async {
                creates.fetch_add(1, Ordering::SeqCst);
                Ok("fresh")
            },
        )
        .await
        .unwrap_or_else(|err| panic!("ensure should succeed: {err}"));

        assert_eq!(ensured, Ensured::Found("existing"));
        assert!(!ensured.was_created());
        assert_eq!(creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_resource_triggers_one_create() {
        let creates = AtomicU32::new(0);

        let ensured = ensure_exists(
            || async { Ok::<_, StepError>(None) },
            || async {
                creates.fetch_add(1, Ordering::SeqCst);
                Ok("fresh")
            },
        )
        .await
        .unwrap_or_else(|err| panic!("ensure should succeed: {err}"));

        assert_eq!(ensured.into_inner(), "fresh");
        assert_eq!(creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_prevents_creation() {
        let creates = AtomicU32::new(0);

        let result: Result<Ensured<&str>, StepError> = ensure_exists(
            || async { Err(StepError("lookup")) },
            || async {
                creates.fetch_add(1, Ordering::SeqCst);
                Ok("fresh")
            },
        )
        .await;

        assert_eq!(result, Err(StepError("lookup")));
        assert_eq!(creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_failure_propagates() {
        let result: Result<Ensured<&str>, StepError> = ensure_exists(
            || async { Ok(None) },
            || async { Err(StepError("create")) },
        )
        .await;

        assert_eq!(result, Err(StepError("create")));
    }
}
