//! Runtime location permission handling.
//!
//! The gate answers "is fine location granted?" and drives the OS consent
//! dialog. When the OS says a rationale should be shown first, the gate shows
//! a non-blocking prompt and only issues the real request once the user
//! acknowledges it, so the request is never suppressed indefinitely.

use log::{debug, info};

use crate::config::LOCATION_PERMISSION_REQUEST_CODE;

/// OS permission surface, implemented by the host.
pub trait PermissionPlatform {
    /// Whether fine-grained location access is currently granted.
    fn is_location_permission_granted(&self) -> bool;

    /// Whether the OS wants an explanation shown before asking again.
    fn should_show_rationale(&self) -> bool;

    /// Show a non-blocking explanation with a single acknowledge action.
    /// The host reports the acknowledgement through
    /// [`PermissionGate::on_rationale_acknowledged`].
    fn show_rationale(&mut self);

    /// Launch the OS consent dialog. The result comes back asynchronously.
    fn request_permission(&mut self, request_code: i32);
}

/// Outcome of one OS permission dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationResult {
    Granted,
    Denied,
    /// The interaction was interrupted and the OS returned no results.
    Interrupted,
}

impl AuthorizationResult {
    /// Interpret the per-permission grant flags returned by the OS.
    ///
    /// Only the first entry matters: a single permission is ever requested.
    pub fn from_grant_results(grant_results: &[bool]) -> Self {
        match grant_results.first() {
            None => AuthorizationResult::Interrupted,
            Some(true) => AuthorizationResult::Granted,
            Some(false) => AuthorizationResult::Denied,
        }
    }
}

/// Location permission gate.
#[derive(Debug, Default)]
pub struct PermissionGate {
    rationale_showing: bool,
    request_in_flight: bool,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authorized(&self, platform: &impl PermissionPlatform) -> bool {
        platform.is_location_permission_granted()
    }

    /// Start the consent flow, showing the rationale first if the OS asks for it.
    pub fn request_authorization(&mut self, platform: &mut impl PermissionPlatform) {
        if self.rationale_showing || self.request_in_flight {
            debug!("[PermissionGate] Request already pending");
            return;
        }
        if platform.should_show_rationale() {
            info!("[PermissionGate] Displaying permission rationale to provide additional context");
            self.rationale_showing = true;
            platform.show_rationale();
        } else {
            info!("[PermissionGate] Requesting permission");
            self.issue_request(platform);
        }
    }

    /// The user acknowledged the rationale prompt: ask for real now.
    pub fn on_rationale_acknowledged(&mut self, platform: &mut impl PermissionPlatform) {
        if !self.rationale_showing {
            return;
        }
        self.rationale_showing = false;
        self.issue_request(platform);
    }

    /// Feed the OS permission result back in.
    ///
    /// Returns `None` when the result belongs to a different request.
    pub fn on_authorization_result(
        &mut self,
        request_code: i32,
        grant_results: &[bool],
    ) -> Option<AuthorizationResult> {
        if request_code != LOCATION_PERMISSION_REQUEST_CODE {
            return None;
        }
        self.request_in_flight = false;
        let result = AuthorizationResult::from_grant_results(grant_results);
        match result {
            AuthorizationResult::Interrupted => info!("[PermissionGate] User interaction was cancelled"),
            AuthorizationResult::Granted => info!("[PermissionGate] Permission granted"),
            AuthorizationResult::Denied => info!("[PermissionGate] Permission denied"),
        }
        Some(result)
    }

    /// Whether a rationale or an OS dialog is currently outstanding.
    pub fn is_pending(&self) -> bool {
        self.rationale_showing || self.request_in_flight
    }

    /// Forget any outstanding prompt, e.g. when the screen goes away.
    pub fn reset(&mut self) {
        self.rationale_showing = false;
        self.request_in_flight = false;
    }

    fn issue_request(&mut self, platform: &mut impl PermissionPlatform) {
        self.request_in_flight = true;
        platform.request_permission(LOCATION_PERMISSION_REQUEST_CODE);
    }
}
