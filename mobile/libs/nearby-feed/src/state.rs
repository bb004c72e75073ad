//! Location acquisition state machine
//!
//! Transition table:
//! - Uninitialized --BeginInitialize--> CheckingCache
//! - CheckingCache --CacheHit--> CacheHit
//! - CheckingCache --CacheMiss--> RequestingPermission
//! - CacheHit --CoordinatesReady--> LocationResolved
//! - RequestingPermission --PermissionGranted--> PermissionGranted
//! - RequestingPermission --PermissionDenied--> PermissionDenied
//! - RequestingPermission --PermissionFailed--> LocationError
//! - PermissionGranted --BeginLocate--> Locating
//! - Locating --PositionAcquired--> LocationResolved
//! - Locating --PositionFailed--> LocationError
//! - PermissionDenied --Fail--> LocationError
//! - LocationResolved | LocationError --UserRetry--> RequestingPermission
//!
//! Anything else is rejected and leaves the state untouched.

use crate::error::LocationError;

/// Why the machine ended in [`LocationState::LocationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFailure {
    PermissionDenied,
    Unavailable,
}

impl LocationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::Unavailable => "unavailable",
        }
    }
}

impl From<&LocationError> for LocationFailure {
    fn from(error: &LocationError) -> Self {
        match error {
            LocationError::PermissionDenied => Self::PermissionDenied,
            LocationError::Unavailable(_) => Self::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationState {
    #[default]
    Uninitialized,
    CheckingCache,
    CacheHit,
    RequestingPermission,
    PermissionGranted,
    PermissionDenied,
    Locating,
    /// Coordinates available; feed fetches may proceed
    LocationResolved,
    /// Needs an explicit user retry
    LocationError(LocationFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationEvent {
    BeginInitialize,
    CacheHit,
    CacheMiss,
    CoordinatesReady,
    PermissionGranted,
    PermissionDenied,
    PermissionFailed(LocationFailure),
    BeginLocate,
    PositionAcquired,
    PositionFailed(LocationFailure),
    Fail,
    UserRetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid location transition: {event:?} in state {from:?}")]
pub struct InvalidTransition {
    pub from: LocationState,
    pub event: LocationEvent,
}

impl LocationState {
    pub fn on(self, event: LocationEvent) -> Result<LocationState, InvalidTransition> {
        use LocationEvent as E;
        use LocationState as S;

        let next = match (self, event) {
            (S::Uninitialized, E::BeginInitialize) => S::CheckingCache,
            (S::CheckingCache, E::CacheHit) => S::CacheHit,
            (S::CheckingCache, E::CacheMiss) => S::RequestingPermission,
            (S::CacheHit, E::CoordinatesReady) => S::LocationResolved,
            (S::RequestingPermission, E::PermissionGranted) => S::PermissionGranted,
            (S::RequestingPermission, E::PermissionDenied) => S::PermissionDenied,
            (S::RequestingPermission, E::PermissionFailed(reason)) => S::LocationError(reason),
            (S::PermissionGranted, E::BeginLocate) => S::Locating,
            (S::Locating, E::PositionAcquired) => S::LocationResolved,
            (S::Locating, E::PositionFailed(reason)) => S::LocationError(reason),
            (S::PermissionDenied, E::Fail) => S::LocationError(LocationFailure::PermissionDenied),
            (S::LocationResolved, E::UserRetry) | (S::LocationError(_), E::UserRetry) => {
                S::RequestingPermission
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::LocationResolved)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::LocationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[LocationEvent]) -> Result<LocationState, InvalidTransition> {
        events
            .iter()
            .try_fold(LocationState::default(), |state, event| state.on(*event))
    }

    #[test]
    fn test_cache_hit_path() {
        let state = run(&[
            LocationEvent::BeginInitialize,
            LocationEvent::CacheHit,
            LocationEvent::CoordinatesReady,
        ])
        .unwrap();
        assert_eq!(state, LocationState::LocationResolved);
    }

    #[test]
    fn test_permission_granted_path() {
        let state = run(&[
            LocationEvent::BeginInitialize,
            LocationEvent::CacheMiss,
            LocationEvent::PermissionGranted,
            LocationEvent::BeginLocate,
            LocationEvent::PositionAcquired,
        ])
        .unwrap();
        assert!(state.is_resolved());
    }

    #[test]
    fn test_permission_denied_path() {
        let state = run(&[
            LocationEvent::BeginInitialize,
            LocationEvent::CacheMiss,
            LocationEvent::PermissionDenied,
            LocationEvent::Fail,
        ])
        .unwrap();
        assert_eq!(
            state,
            LocationState::LocationError(LocationFailure::PermissionDenied)
        );
    }

    #[test]
    fn test_position_failure_path() {
        let state = run(&[
            LocationEvent::BeginInitialize,
            LocationEvent::CacheMiss,
            LocationEvent::PermissionGranted,
            LocationEvent::BeginLocate,
            LocationEvent::PositionFailed(LocationFailure::Unavailable),
        ])
        .unwrap();
        assert_eq!(state, LocationState::LocationError(LocationFailure::Unavailable));
    }

    #[test]
    fn test_user_retry_from_terminal_states() {
        let resolved = LocationState::LocationResolved;
        assert_eq!(
            resolved.on(LocationEvent::UserRetry).unwrap(),
            LocationState::RequestingPermission
        );

        let failed = LocationState::LocationError(LocationFailure::PermissionDenied);
        assert_eq!(
            failed.on(LocationEvent::UserRetry).unwrap(),
            LocationState::RequestingPermission
        );
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let err = LocationState::Uninitialized
            .on(LocationEvent::PositionAcquired)
            .unwrap_err();
        assert_eq!(err.from, LocationState::Uninitialized);

        assert!(LocationState::Locating.on(LocationEvent::UserRetry).is_err());
        assert!(LocationState::LocationResolved
            .on(LocationEvent::BeginInitialize)
            .is_err());
    }

    #[test]
    fn test_failure_from_location_error() {
        assert_eq!(
            LocationFailure::from(&LocationError::PermissionDenied),
            LocationFailure::PermissionDenied
        );
        assert_eq!(
            LocationFailure::from(&LocationError::Unavailable("gps off".into())),
            LocationFailure::Unavailable
        );
    }
}
