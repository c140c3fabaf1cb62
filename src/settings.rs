//! Location settings negotiation.
//!
//! Checks that the device's location configuration can serve the requested
//! accuracy and interval. When it cannot but the OS offers a fix, a one-shot
//! resolution dialog is launched under [`REQUEST_CHECK_SETTINGS`]. The
//! negotiator never retries on its own: the session decides what to do once
//! the dialog closes.

use log::{error, info, warn};

use crate::config::{LocationRequirements, REQUEST_CHECK_SETTINGS};
use crate::error::TrackerError;

/// Opaque platform token for a resolvable settings failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionHandle(pub u64);

/// Result of a settings check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSettingsOutcome {
    /// Updates can start right away.
    Satisfied,
    /// The OS can fix the settings through a user dialog.
    ResolutionRequired(ResolutionHandle),
    /// The settings cannot be fixed from inside the app.
    ChangeUnavailable,
}

/// How the user closed the resolution dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionResult {
    Accepted,
    Cancelled,
}

/// Location settings API, implemented by the host.
pub trait SettingsClient {
    /// Start an asynchronous check. The outcome is delivered back as
    /// [`crate::SessionEvent::SettingsChecked`].
    fn check_settings(&mut self, requirements: &LocationRequirements);

    /// Launch the resolution dialog. An `Err` means the platform refused to
    /// deliver it.
    fn start_resolution(
        &mut self,
        handle: &ResolutionHandle,
        request_code: i32,
    ) -> std::result::Result<(), String>;
}

/// Where a negotiation stands after an outcome or dialog result.
#[derive(Debug)]
pub enum NegotiationStep {
    /// Settings are good: open the subscription.
    Satisfied,
    /// A resolution dialog is up; wait for its result.
    AwaitingResolution,
    /// This attempt is over.
    Failed(TrackerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Checking,
    AwaitingResolution,
}

/// Drives one settings check and its optional resolution dialog.
#[derive(Debug)]
pub struct SettingsNegotiator {
    requirements: LocationRequirements,
    phase: Phase,
}

impl SettingsNegotiator {
    pub fn new(requirements: LocationRequirements) -> Self {
        Self {
            requirements,
            phase: Phase::Idle,
        }
    }

    pub fn requirements(&self) -> &LocationRequirements {
        &self.requirements
    }

    /// Ask the client to validate the current device configuration.
    pub fn check_settings(&mut self, client: &mut impl SettingsClient) {
        self.phase = Phase::Checking;
        client.check_settings(&self.requirements);
    }

    /// Consume the outcome of [`Self::check_settings`].
    pub fn on_outcome(
        &mut self,
        outcome: LocationSettingsOutcome,
        client: &mut impl SettingsClient,
    ) -> NegotiationStep {
        match outcome {
            LocationSettingsOutcome::Satisfied => {
                info!("[SettingsNegotiator] All location settings are satisfied");
                self.phase = Phase::Idle;
                NegotiationStep::Satisfied
            }
            LocationSettingsOutcome::ResolutionRequired(handle) => {
                info!("[SettingsNegotiator] Location settings are not satisfied, attempting to upgrade");
                match client.start_resolution(&handle, REQUEST_CHECK_SETTINGS) {
                    Ok(()) => {
                        self.phase = Phase::AwaitingResolution;
                        NegotiationStep::AwaitingResolution
                    }
                    Err(reason) => {
                        warn!("[SettingsNegotiator] Unable to launch resolution: {}", reason);
                        self.phase = Phase::Idle;
                        NegotiationStep::Failed(TrackerError::ResolutionUnavailable { reason })
                    }
                }
            }
            LocationSettingsOutcome::ChangeUnavailable => {
                error!(
                    "[SettingsNegotiator] {}",
                    crate::error::SETTINGS_UNSATISFIABLE_MESSAGE
                );
                self.phase = Phase::Idle;
                NegotiationStep::Failed(TrackerError::SettingsUnsatisfiable)
            }
        }
    }

    /// Consume the result of the resolution dialog.
    ///
    /// Returns `None` when the result belongs to a different request or no
    /// dialog is outstanding. `Accepted` leaves the re-check to the caller.
    pub fn on_resolution_result(
        &mut self,
        request_code: i32,
        result: ResolutionResult,
    ) -> Option<NegotiationStep> {
        if request_code != REQUEST_CHECK_SETTINGS || self.phase != Phase::AwaitingResolution {
            return None;
        }
        self.phase = Phase::Idle;
        match result {
            ResolutionResult::Accepted => {
                info!("[SettingsNegotiator] User agreed to make required location settings changes");
                Some(NegotiationStep::Satisfied)
            }
            ResolutionResult::Cancelled => {
                info!("[SettingsNegotiator] User chose not to make required location settings changes");
                Some(NegotiationStep::Failed(TrackerError::ResolutionCancelled))
            }
        }
    }

    pub fn is_checking(&self) -> bool {
        self.phase == Phase::Checking
    }

    pub fn is_awaiting_resolution(&self) -> bool {
        self.phase == Phase::AwaitingResolution
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeClient {
        checks: u32,
        resolutions: Vec<(ResolutionHandle, i32)>,
        refuse_resolution: bool,
    }

    impl SettingsClient for FakeClient {
        fn check_settings(&mut self, _requirements: &LocationRequirements) {
            self.checks += 1;
        }
        fn start_resolution(
            &mut self,
            handle: &ResolutionHandle,
            request_code: i32,
        ) -> std::result::Result<(), String> {
            if self.refuse_resolution {
                return Err("PendingIntent unable to execute request".to_string());
            }
            self.resolutions.push((handle.clone(), request_code));
            Ok(())
        }
    }

    fn negotiator() -> SettingsNegotiator {
        SettingsNegotiator::new(LocationRequirements::default())
    }

    #[test]
    fn test_satisfied() {
        let mut client = FakeClient::default();
        let mut n = negotiator();
        n.check_settings(&mut client);
        assert!(n.is_checking());
        assert_eq!(client.checks, 1);

        let step = n.on_outcome(LocationSettingsOutcome::Satisfied, &mut client);
        assert!(matches!(step, NegotiationStep::Satisfied));
        assert!(!n.is_checking());
    }

    #[test]
    fn test_resolution_launched_with_fixed_code() {
        let mut client = FakeClient::default();
        let mut n = negotiator();
        n.check_settings(&mut client);

        let step = n.on_outcome(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(7)),
            &mut client,
        );
        assert!(matches!(step, NegotiationStep::AwaitingResolution));
        assert_eq!(client.resolutions, vec![(ResolutionHandle(7), REQUEST_CHECK_SETTINGS)]);
        // No automatic retry
        assert_eq!(client.checks, 1);
    }

    #[test]
    fn test_resolution_refused_is_not_satisfied() {
        let mut client = FakeClient {
            refuse_resolution: true,
            ..Default::default()
        };
        let mut n = negotiator();
        n.check_settings(&mut client);

        let step = n.on_outcome(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(1)),
            &mut client,
        );
        assert!(matches!(
            step,
            NegotiationStep::Failed(TrackerError::ResolutionUnavailable { .. })
        ));
        assert!(!n.is_awaiting_resolution());
    }

    #[test]
    fn test_change_unavailable() {
        let mut client = FakeClient::default();
        let mut n = negotiator();
        n.check_settings(&mut client);
        let step = n.on_outcome(LocationSettingsOutcome::ChangeUnavailable, &mut client);
        assert!(matches!(
            step,
            NegotiationStep::Failed(TrackerError::SettingsUnsatisfiable)
        ));
    }

    #[test]
    fn test_resolution_results() {
        let mut client = FakeClient::default();
        let mut n = negotiator();
        n.check_settings(&mut client);
        n.on_outcome(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(2)),
            &mut client,
        );

        assert!(n.on_resolution_result(42, ResolutionResult::Accepted).is_none());
        let step = n
            .on_resolution_result(REQUEST_CHECK_SETTINGS, ResolutionResult::Cancelled)
            .unwrap();
        assert!(matches!(
            step,
            NegotiationStep::Failed(TrackerError::ResolutionCancelled)
        ));

        // Dialog already consumed
        assert!(n
            .on_resolution_result(REQUEST_CHECK_SETTINGS, ResolutionResult::Accepted)
            .is_none());
    }
}
