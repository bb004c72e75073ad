//! Device location service seam

use tracing::debug;

use crate::error::LocationError;
use crate::models::Coordinates;

/// Outcome of a foreground permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Accuracy hint passed to the position query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Lowest,
    Low,
    #[default]
    Balanced,
    High,
    Highest,
}

#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for foreground location permission
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    /// Current position of the device
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinates, LocationError>;
}

/// Provider that reports a configured position
///
/// Stands in for a device location service on hosts that have none. With no
/// position configured it behaves like a user who refuses the prompt.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    position: Option<Coordinates>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Coordinates::new(latitude, longitude)))
    }

    pub fn denied() -> Self {
        Self::new(None)
    }
}

#[async_trait::async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(match self.position {
            Some(_) => PermissionStatus::Granted,
            None => PermissionStatus::Denied,
        })
    }

    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinates, LocationError> {
        debug!(?accuracy, "Fixed location queried");
        match self.position {
            Some(position) if position.is_valid() => Ok(position),
            Some(position) => Err(LocationError::Unavailable(format!(
                "configured position {},{} is out of range",
                position.latitude, position.longitude
            ))),
            None => Err(LocationError::PermissionDenied),
        }
    }
}
