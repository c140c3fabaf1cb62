//! # Location Acquisition Session
//!
//! Per-screen state machine that takes a screen from "no location" to a live
//! fix subscription and back.
//!
//! ```text
//! Idle ──activate──▶ Gating ──authorized──▶ Negotiating ──satisfied──▶ Subscribed
//!  ▲                   │ denied/interrupted      │ unavailable/cancelled     │ deactivate
//!  └───────────────────┴─────────────────────────┘                          ▼
//!                                        Gating ◀──activate── Suspended ◀───┘
//! ```
//!
//! Every provider result comes back as a [`SessionEvent`]; the whole
//! transition table lives in [`LocationAcquisitionSession::handle`].
//! What to do with fixes is supplied by a [`LocationConsumer`].

use log::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::permission::{AuthorizationResult, PermissionGate, PermissionPlatform};
use crate::settings::{
    LocationSettingsOutcome, NegotiationStep, ResolutionResult, SettingsClient,
    SettingsNegotiator,
};
use crate::{GeoFix, LocationRequirements};

// ============================================================================
// Collaborators
// ============================================================================

/// Token identifying an open fix subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(pub u64);

/// Fused location provider, implemented by the host.
pub trait LocationProvider {
    /// Open a subscription. Fixes are delivered as [`SessionEvent::Fix`].
    fn subscribe(&mut self, requirements: &LocationRequirements) -> SubscriptionHandle;

    /// Close a subscription. Must take effect before returning.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Short user-visible messages (toasts, snackbars).
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Everything the session needs from the platform.
pub trait LocationPlatform: PermissionPlatform + SettingsClient + LocationProvider + Notifier {}

impl<T> LocationPlatform for T where
    T: PermissionPlatform + SettingsClient + LocationProvider + Notifier
{
}

/// What the consumer wants after handling a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixDisposition {
    Continue,
    /// Close the subscription; the next activation starts over.
    Unsubscribe,
}

/// The per-screen behavior plugged into a session.
pub trait LocationConsumer {
    /// Called once authorization is confirmed, before settings are checked.
    fn enable_location(&mut self) {}

    /// Called for every fix while subscribed, in delivery order.
    fn on_fix(&mut self, fix: &GeoFix) -> FixDisposition;
}

// ============================================================================
// States and Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum SessionState {
    Idle,
    Gating,
    Negotiating,
    Subscribed,
    Suspended,
}

/// Inputs to the session: lifecycle changes and provider continuations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The screen became visible.
    Activated,
    /// The screen is no longer visible.
    Deactivated,
    /// The user acknowledged the permission rationale prompt.
    RationaleAcknowledged,
    /// OS permission dialog result.
    PermissionResult {
        request_code: i32,
        grant_results: Vec<bool>,
    },
    /// Outcome of a settings check.
    SettingsChecked(LocationSettingsOutcome),
    /// Settings resolution dialog result.
    ResolutionFinished {
        request_code: i32,
        result: ResolutionResult,
    },
    /// A location fix from the open subscription.
    Fix(GeoFix),
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::Activated => "Activated",
            SessionEvent::Deactivated => "Deactivated",
            SessionEvent::RationaleAcknowledged => "RationaleAcknowledged",
            SessionEvent::PermissionResult { .. } => "PermissionResult",
            SessionEvent::SettingsChecked(_) => "SettingsChecked",
            SessionEvent::ResolutionFinished { .. } => "ResolutionFinished",
            SessionEvent::Fix(_) => "Fix",
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Location acquisition state machine for one screen.
pub struct LocationAcquisitionSession<P, C> {
    platform: P,
    consumer: C,
    gate: PermissionGate,
    negotiator: SettingsNegotiator,
    state: SessionState,
    subscription: Option<SubscriptionHandle>,
    visible: bool,
    /// The construction path already ran one check.
    primed: bool,
    /// No `Activated` has been seen yet.
    first_activation: bool,
    last_error: Option<TrackerError>,
}

impl<P: LocationPlatform, C: LocationConsumer> LocationAcquisitionSession<P, C> {
    pub fn new(platform: P, consumer: C, config: &TrackerConfig) -> Self {
        Self {
            platform,
            consumer,
            gate: PermissionGate::new(),
            negotiator: SettingsNegotiator::new(config.requirements),
            state: SessionState::Idle,
            subscription: None,
            visible: true,
            primed: false,
            first_activation: true,
            last_error: None,
        }
    }

    /// Run the first gate/negotiate cycle from the construction path (the
    /// map finished loading). The first [`SessionEvent::Activated`] after a
    /// prime does not run it again.
    pub fn prime(&mut self) -> SessionState {
        self.primed = true;
        if matches!(self.state, SessionState::Idle | SessionState::Suspended) {
            self.begin_cycle();
        }
        self.state
    }

    /// Apply one event and return the resulting state.
    pub fn handle(&mut self, event: SessionEvent) -> SessionState {
        let before = self.state;
        let name = event.name();

        match event {
            SessionEvent::Activated => self.on_activated(),
            SessionEvent::Deactivated => self.on_deactivated(),
            SessionEvent::RationaleAcknowledged => {
                self.gate.on_rationale_acknowledged(&mut self.platform);
            }
            SessionEvent::PermissionResult {
                request_code,
                grant_results,
            } => self.on_permission_result(request_code, &grant_results),
            SessionEvent::SettingsChecked(outcome) => self.on_settings_checked(outcome),
            SessionEvent::ResolutionFinished {
                request_code,
                result,
            } => self.on_resolution_finished(request_code, result),
            SessionEvent::Fix(fix) => self.on_fix(fix),
        }

        if before != self.state {
            info!(
                "[LocationSession] {:?} -> {:?} on {}",
                before, self.state, name
            );
        }
        self.state
    }

    /// Tear the session down. Any open subscription is closed before this
    /// returns, so no fix can reach a torn-down session.
    pub fn shutdown(&mut self) {
        self.close_subscription();
        self.gate.reset();
        self.negotiator.reset();
        self.state = SessionState::Idle;
        self.visible = false;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// The failure that last sent the session to rest, if any.
    pub fn last_error(&self) -> Option<&TrackerError> {
        self.last_error.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn on_activated(&mut self) {
        self.visible = true;
        let first = std::mem::replace(&mut self.first_activation, false);
        if first && self.primed {
            debug!("[LocationSession] First activation after prime, skipping check");
            return;
        }
        match self.state {
            SessionState::Idle | SessionState::Suspended => self.begin_cycle(),
            // A dialog covered the screen; its result drives the cycle
            SessionState::Gating | SessionState::Negotiating | SessionState::Subscribed => {}
        }
    }

    fn on_deactivated(&mut self) {
        self.visible = false;
        match self.state {
            SessionState::Subscribed => {
                self.close_subscription();
                self.state = SessionState::Suspended;
            }
            SessionState::Gating if self.gate.is_pending() => {}
            SessionState::Negotiating if self.negotiator.is_awaiting_resolution() => {}
            SessionState::Gating | SessionState::Negotiating => {
                self.gate.reset();
                self.negotiator.reset();
                self.state = SessionState::Suspended;
            }
            SessionState::Idle | SessionState::Suspended => {}
        }
    }

    fn begin_cycle(&mut self) {
        self.last_error = None;
        self.state = SessionState::Gating;
        if self.gate.is_authorized(&self.platform) {
            self.on_authorized();
        } else {
            self.gate.request_authorization(&mut self.platform);
        }
    }

    fn on_authorized(&mut self) {
        self.consumer.enable_location();
        self.state = SessionState::Negotiating;
        self.negotiator.check_settings(&mut self.platform);
    }

    fn on_permission_result(&mut self, request_code: i32, grant_results: &[bool]) {
        let Some(result) = self.gate.on_authorization_result(request_code, grant_results) else {
            return;
        };
        if self.state != SessionState::Gating {
            debug!(
                "[LocationSession] Permission result {:?} ignored in {:?}",
                result, self.state
            );
            return;
        }
        match result {
            AuthorizationResult::Granted => self.on_authorized(),
            AuthorizationResult::Denied => self.rest(TrackerError::PermissionDenied),
            // Interrupted: no notification, no escalation
            AuthorizationResult::Interrupted => self.state = SessionState::Idle,
        }
    }

    fn on_settings_checked(&mut self, outcome: LocationSettingsOutcome) {
        if self.state != SessionState::Negotiating || !self.negotiator.is_checking() {
            debug!(
                "[LocationSession] Settings outcome {:?} ignored in {:?}",
                outcome, self.state
            );
            return;
        }
        let step = self.negotiator.on_outcome(outcome, &mut self.platform);
        self.apply_step(step);
    }

    fn on_resolution_finished(&mut self, request_code: i32, result: ResolutionResult) {
        let Some(step) = self.negotiator.on_resolution_result(request_code, result) else {
            return;
        };
        match step {
            // The user changed the settings; validate them again
            NegotiationStep::Satisfied => self.negotiator.check_settings(&mut self.platform),
            other => self.apply_step(other),
        }
    }

    fn apply_step(&mut self, step: NegotiationStep) {
        match step {
            NegotiationStep::Satisfied => {
                if self.visible {
                    self.open_subscription();
                } else {
                    self.state = SessionState::Suspended;
                }
            }
            NegotiationStep::AwaitingResolution => {}
            NegotiationStep::Failed(err) => self.rest(err),
        }
    }

    fn on_fix(&mut self, fix: GeoFix) {
        if self.state != SessionState::Subscribed {
            debug!("[LocationSession] Dropping fix delivered in {:?}", self.state);
            return;
        }
        if self.consumer.on_fix(&fix) == FixDisposition::Unsubscribe {
            self.close_subscription();
            self.state = SessionState::Idle;
        }
    }

    fn open_subscription(&mut self) {
        if self.subscription.is_none() {
            let requirements = *self.negotiator.requirements();
            self.subscription = Some(self.platform.subscribe(&requirements));
        }
        self.state = SessionState::Subscribed;
    }

    fn close_subscription(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.platform.unsubscribe(handle);
        }
    }

    /// Settle in `Idle` after a failure, telling the user when it matters.
    fn rest(&mut self, err: TrackerError) {
        if let Some(message) = err.user_message() {
            self.platform.notify(message);
        } else {
            warn!("[LocationSession] {}", err);
        }
        self.state = SessionState::Idle;
        self.last_error = Some(err);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PERMISSION_DENIED_MESSAGE, SETTINGS_UNSATISFIABLE_MESSAGE};
    use crate::settings::ResolutionHandle;
    use crate::{LOCATION_PERMISSION_REQUEST_CODE, REQUEST_CHECK_SETTINGS};

    #[derive(Default)]
    struct FakePlatform {
        granted: bool,
        rationale: bool,
        rationales_shown: u32,
        permission_requests: u32,
        settings_checks: u32,
        resolutions: u32,
        refuse_resolution: bool,
        next_handle: u64,
        open: Vec<SubscriptionHandle>,
        subscribes: u32,
        messages: Vec<String>,
    }

    impl PermissionPlatform for FakePlatform {
        fn is_location_permission_granted(&self) -> bool {
            self.granted
        }
        fn should_show_rationale(&self) -> bool {
            self.rationale
        }
        fn show_rationale(&mut self) {
            self.rationales_shown += 1;
        }
        fn request_permission(&mut self, _request_code: i32) {
            self.permission_requests += 1;
        }
    }

    impl SettingsClient for FakePlatform {
        fn check_settings(&mut self, _requirements: &LocationRequirements) {
            self.settings_checks += 1;
        }
        fn start_resolution(
            &mut self,
            _handle: &ResolutionHandle,
            _request_code: i32,
        ) -> std::result::Result<(), String> {
            self.resolutions += 1;
            if self.refuse_resolution {
                return Err("no activity to launch from".to_string());
            }
            Ok(())
        }
    }

    impl LocationProvider for FakePlatform {
        fn subscribe(&mut self, _requirements: &LocationRequirements) -> SubscriptionHandle {
            self.next_handle += 1;
            self.subscribes += 1;
            let handle = SubscriptionHandle(self.next_handle);
            self.open.push(handle);
            handle
        }
        fn unsubscribe(&mut self, handle: SubscriptionHandle) {
            self.open.retain(|h| *h != handle);
        }
    }

    impl Notifier for FakePlatform {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    #[derive(Default)]
    struct CountingConsumer {
        enabled: u32,
        fixes: Vec<GeoFix>,
        stop_after: Option<usize>,
    }

    impl LocationConsumer for CountingConsumer {
        fn enable_location(&mut self) {
            self.enabled += 1;
        }
        fn on_fix(&mut self, fix: &GeoFix) -> FixDisposition {
            self.fixes.push(*fix);
            match self.stop_after {
                Some(n) if self.fixes.len() >= n => FixDisposition::Unsubscribe,
                _ => FixDisposition::Continue,
            }
        }
    }

    type TestSession = LocationAcquisitionSession<FakePlatform, CountingConsumer>;

    fn session(granted: bool) -> TestSession {
        let platform = FakePlatform {
            granted,
            ..Default::default()
        };
        LocationAcquisitionSession::new(
            platform,
            CountingConsumer::default(),
            &TrackerConfig::default(),
        )
    }

    fn fix(lat: f64) -> GeoFix {
        GeoFix::new(lat, 0.0, 3.0, 0)
    }

    #[test]
    fn test_authorized_and_satisfied_subscribes() {
        let mut s = session(true);
        assert_eq!(s.prime(), SessionState::Negotiating);
        assert_eq!(s.consumer().enabled, 1);
        assert_eq!(s.platform().settings_checks, 1);

        let state = s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        assert_eq!(state, SessionState::Subscribed);
        assert_eq!(s.platform().open.len(), 1);
    }

    #[test]
    fn test_fixes_forwarded_only_while_subscribed() {
        let mut s = session(true);
        s.handle(SessionEvent::Fix(fix(1.0)));
        assert!(s.consumer().fixes.is_empty());

        s.prime();
        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        s.handle(SessionEvent::Fix(fix(1.0)));
        s.handle(SessionEvent::Fix(fix(2.0)));
        assert_eq!(s.consumer().fixes.len(), 2);
        assert_eq!(s.consumer().fixes[1].latitude, 2.0);
    }

    #[test]
    fn test_rationale_then_request_then_granted() {
        let mut s = session(false);
        s.platform_mut().rationale = true;

        assert_eq!(s.prime(), SessionState::Gating);
        assert_eq!(s.platform().rationales_shown, 1);
        assert_eq!(s.platform().permission_requests, 0);

        assert_eq!(s.handle(SessionEvent::RationaleAcknowledged), SessionState::Gating);
        assert_eq!(s.platform().permission_requests, 1);

        // A repeated acknowledgement does not ask twice
        s.handle(SessionEvent::RationaleAcknowledged);
        assert_eq!(s.platform().permission_requests, 1);

        let state = s.handle(SessionEvent::PermissionResult {
            request_code: LOCATION_PERMISSION_REQUEST_CODE,
            grant_results: vec![true],
        });
        assert_eq!(state, SessionState::Negotiating);
        assert_eq!(s.consumer().enabled, 1);
        assert_eq!(s.platform().settings_checks, 1);
        assert!(s.platform().messages.is_empty());
    }

    #[test]
    fn test_refused_resolution_launch_rests_like_cancel() {
        let mut s = session(true);
        s.platform_mut().refuse_resolution = true;
        s.prime();

        let state = s.handle(SessionEvent::SettingsChecked(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(1)),
        ));
        assert_eq!(state, SessionState::Idle);
        assert_eq!(s.platform().resolutions, 1);
        assert!(s.platform().messages.is_empty());
        assert!(s.platform().open.is_empty());
        assert!(!s.is_subscribed());
        assert!(matches!(
            s.last_error(),
            Some(TrackerError::ResolutionUnavailable { .. })
        ));
    }

    #[test]
    fn test_permission_request_then_granted() {
        let mut s = session(false);
        assert_eq!(s.prime(), SessionState::Gating);
        assert_eq!(s.platform().permission_requests, 1);

        s.platform_mut().granted = true;
        let state = s.handle(SessionEvent::PermissionResult {
            request_code: LOCATION_PERMISSION_REQUEST_CODE,
            grant_results: vec![true],
        });
        assert_eq!(state, SessionState::Negotiating);
        assert_eq!(s.consumer().enabled, 1);
    }

    #[test]
    fn test_permission_denied_notifies_and_rests() {
        let mut s = session(false);
        s.prime();
        let state = s.handle(SessionEvent::PermissionResult {
            request_code: LOCATION_PERMISSION_REQUEST_CODE,
            grant_results: vec![false],
        });
        assert_eq!(state, SessionState::Idle);
        assert_eq!(s.platform().messages, vec![PERMISSION_DENIED_MESSAGE]);
        assert!(matches!(s.last_error(), Some(TrackerError::PermissionDenied)));
    }

    #[test]
    fn test_permission_interrupted_is_silent() {
        let mut s = session(false);
        s.prime();
        let state = s.handle(SessionEvent::PermissionResult {
            request_code: LOCATION_PERMISSION_REQUEST_CODE,
            grant_results: vec![],
        });
        assert_eq!(state, SessionState::Idle);
        assert!(s.platform().messages.is_empty());
        assert!(s.last_error().is_none());
    }

    #[test]
    fn test_foreign_permission_result_ignored() {
        let mut s = session(false);
        s.prime();
        let state = s.handle(SessionEvent::PermissionResult {
            request_code: 77,
            grant_results: vec![true],
        });
        assert_eq!(state, SessionState::Gating);
    }

    #[test]
    fn test_change_unavailable_is_terminal() {
        let mut s = session(true);
        s.prime();
        let state = s.handle(SessionEvent::SettingsChecked(
            LocationSettingsOutcome::ChangeUnavailable,
        ));
        assert_eq!(state, SessionState::Idle);
        assert!(!s.is_subscribed());
        assert_eq!(s.platform().messages, vec![SETTINGS_UNSATISFIABLE_MESSAGE]);

        // No retry until the user re-triggers
        assert_eq!(s.platform().settings_checks, 1);
    }

    #[test]
    fn test_resolution_accepted_rechecks() {
        let mut s = session(true);
        s.prime();
        let state = s.handle(SessionEvent::SettingsChecked(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(1)),
        ));
        assert_eq!(state, SessionState::Negotiating);
        assert_eq!(s.platform().resolutions, 1);

        s.handle(SessionEvent::ResolutionFinished {
            request_code: REQUEST_CHECK_SETTINGS,
            result: ResolutionResult::Accepted,
        });
        assert_eq!(s.platform().settings_checks, 2);

        let state = s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        assert_eq!(state, SessionState::Subscribed);
    }

    #[test]
    fn test_resolution_cancelled_rests_silently() {
        let mut s = session(true);
        s.prime();
        s.handle(SessionEvent::SettingsChecked(
            LocationSettingsOutcome::ResolutionRequired(ResolutionHandle(1)),
        ));
        let state = s.handle(SessionEvent::ResolutionFinished {
            request_code: REQUEST_CHECK_SETTINGS,
            result: ResolutionResult::Cancelled,
        });
        assert_eq!(state, SessionState::Idle);
        assert!(s.platform().messages.is_empty());
        assert!(matches!(
            s.last_error(),
            Some(TrackerError::ResolutionCancelled)
        ));
    }

    #[test]
    fn test_first_activation_after_prime_skips_check() {
        let mut s = session(true);
        s.prime();
        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        s.handle(SessionEvent::Activated);
        assert_eq!(s.platform().settings_checks, 1);
        assert_eq!(s.platform().subscribes, 1);
    }

    #[test]
    fn test_reactivation_reruns_cycle() {
        let mut s = session(true);
        s.prime();
        s.handle(SessionEvent::Activated);
        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));

        assert_eq!(s.handle(SessionEvent::Deactivated), SessionState::Suspended);
        assert!(s.platform().open.is_empty());

        assert_eq!(s.handle(SessionEvent::Activated), SessionState::Negotiating);
        assert_eq!(s.platform().settings_checks, 2);
    }

    #[test]
    fn test_first_activation_without_prime_runs_cycle() {
        let mut s = session(true);
        assert_eq!(s.handle(SessionEvent::Activated), SessionState::Negotiating);
        // A late prime does not start a second cycle
        s.prime();
        assert_eq!(s.platform().settings_checks, 1);
    }

    #[test]
    fn test_deactivate_during_check_drops_outcome() {
        let mut s = session(true);
        s.prime();
        assert_eq!(s.handle(SessionEvent::Deactivated), SessionState::Suspended);
        let state = s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        assert_eq!(state, SessionState::Suspended);
        assert!(!s.is_subscribed());
    }

    #[test]
    fn test_permission_dialog_pause_keeps_gating() {
        let mut s = session(false);
        s.prime();
        s.handle(SessionEvent::Activated);
        // The OS dialog hides the screen
        assert_eq!(s.handle(SessionEvent::Deactivated), SessionState::Gating);

        s.platform_mut().granted = true;
        s.handle(SessionEvent::PermissionResult {
            request_code: LOCATION_PERMISSION_REQUEST_CODE,
            grant_results: vec![true],
        });
        assert_eq!(s.handle(SessionEvent::Activated), SessionState::Negotiating);
        assert_eq!(s.platform().settings_checks, 1);

        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        assert_eq!(s.platform().subscribes, 1);
    }

    #[test]
    fn test_consumer_unsubscribe() {
        let mut s = session(true);
        s.consumer_mut().stop_after = Some(1);
        s.prime();
        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));

        assert_eq!(s.handle(SessionEvent::Fix(fix(1.0))), SessionState::Idle);
        assert!(s.platform().open.is_empty());
        s.handle(SessionEvent::Fix(fix(2.0)));
        assert_eq!(s.consumer().fixes.len(), 1);
    }

    #[test]
    fn test_shutdown_unsubscribes() {
        let mut s = session(true);
        s.prime();
        s.handle(SessionEvent::SettingsChecked(LocationSettingsOutcome::Satisfied));
        s.shutdown();
        assert!(s.platform().open.is_empty());
        assert_eq!(s.state(), SessionState::Idle);
        s.handle(SessionEvent::Fix(fix(1.0)));
        assert!(s.consumer().fixes.is_empty());
    }
}
