//! Power / gating state machine for a screen session.
//!
//! ```text
//!             deviceInUse && tabVisible
//!      Off ─────────────────────────────► On
//!       ▲                                  │
//!       └──── !deviceInUse || !tabVisible ─┘
//!             (or destroy, unconditionally)
//! ```
//!
//! While `On`, frames are only requested when the gate
//! (`canView && shouldShowScreen`) is open. The controller only decides;
//! the session carries out the side effects of each change it reports.

use std::fmt;

// ── PowerState ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    #[default]
    Off,
    On,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Off => write!(f, "Off"),
            PowerState::On => write!(f, "On"),
        }
    }
}

/// A power transition the session must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerChange {
    /// Attach input, measure the viewport, start rendering if gated open.
    On,
    /// Detach input, abort the gesture, cancel the in-flight frame.
    Off,
}

/// Edge of one gating input (`canView` or `shouldShowScreen`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChange {
    Opened,
    Closed,
}

// ── Signals ──────────────────────────────────────────────────────

/// The externally driven inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub device_in_use: bool,
    pub tab_visible: bool,
    pub can_view: bool,
    pub show_screen: bool,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            device_in_use: false,
            tab_visible: true,
            can_view: false,
            show_screen: false,
        }
    }
}

// ── Lifecycle ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    signals: Signals,
    power: PowerState,
    destroyed: bool,
}

impl Lifecycle {
    /// Start `Off` with the given signals. Call [`reconcile`](Self::reconcile)
    /// to power on if the signals already ask for it.
    pub fn new(signals: Signals) -> Self {
        Self {
            signals,
            power: PowerState::Off,
            destroyed: false,
        }
    }

    pub fn power(&self) -> PowerState {
        self.power
    }

    pub fn signals(&self) -> Signals {
        self.signals
    }

    pub fn is_on(&self) -> bool {
        self.power == PowerState::On
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// `canView && shouldShowScreen`.
    pub fn gate_open(&self) -> bool {
        self.signals.can_view && self.signals.show_screen
    }

    /// Powered on and gated open: the render loop may request frames.
    pub fn wants_frames(&self) -> bool {
        self.is_on() && self.gate_open()
    }

    // ── Inputs ───────────────────────────────────────────────────

    pub fn set_device_in_use(&mut self, in_use: bool) -> Option<PowerChange> {
        self.signals.device_in_use = in_use;
        self.reconcile()
    }

    pub fn set_tab_visible(&mut self, visible: bool) -> Option<PowerChange> {
        self.signals.tab_visible = visible;
        self.reconcile()
    }

    pub fn set_can_view(&mut self, can_view: bool) -> Option<GateChange> {
        let previous = std::mem::replace(&mut self.signals.can_view, can_view);
        edge(previous, can_view)
    }

    pub fn set_show_screen(&mut self, show: bool) -> Option<GateChange> {
        let previous = std::mem::replace(&mut self.signals.show_screen, show);
        edge(previous, show)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Move power to where the signals say it should be.
    pub fn reconcile(&mut self) -> Option<PowerChange> {
        let desired = !self.destroyed && self.signals.device_in_use && self.signals.tab_visible;
        match (self.power, desired) {
            (PowerState::Off, true) => {
                self.power = PowerState::On;
                Some(PowerChange::On)
            }
            (PowerState::On, false) => {
                self.power = PowerState::Off;
                Some(PowerChange::Off)
            }
            _ => None,
        }
    }

    /// Roll back a power-on whose side effects could not be carried out.
    ///
    /// The signals are kept, so a later [`reconcile`](Self::reconcile)
    /// retries the power-on.
    pub fn abort_power_on(&mut self) {
        self.power = PowerState::Off;
    }

    /// Permanently power off. No later input can power the session on.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.power = PowerState::Off;
    }
}

fn edge(previous: bool, current: bool) -> Option<GateChange> {
    match (previous, current) {
        (false, true) => Some(GateChange::Opened),
        (true, false) => Some(GateChange::Closed),
        _ => None,
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off_and_visible() {
        let lc = Lifecycle::default();
        assert_eq!(lc.power(), PowerState::Off);
        assert!(lc.signals().tab_visible);
        assert!(!lc.wants_frames());
    }

    #[test]
    fn in_use_powers_on_and_off() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.set_device_in_use(true), Some(PowerChange::On));
        assert_eq!(lc.set_device_in_use(true), None);
        assert!(lc.is_on());
        assert_eq!(lc.set_device_in_use(false), Some(PowerChange::Off));
        assert_eq!(lc.set_device_in_use(false), None);
    }

    #[test]
    fn hidden_tab_suspends_and_visible_tab_resumes() {
        let mut lc = Lifecycle::default();
        lc.set_device_in_use(true);
        assert_eq!(lc.set_tab_visible(false), Some(PowerChange::Off));
        assert_eq!(lc.set_tab_visible(true), Some(PowerChange::On));
    }

    #[test]
    fn visible_tab_does_not_power_on_an_unused_device() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.set_tab_visible(false), None);
        assert_eq!(lc.set_tab_visible(true), None);
        assert_eq!(lc.power(), PowerState::Off);
    }

    #[test]
    fn gate_edges() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.set_can_view(true), Some(GateChange::Opened));
        assert_eq!(lc.set_can_view(true), None);
        assert!(!lc.gate_open());
        assert_eq!(lc.set_show_screen(true), Some(GateChange::Opened));
        assert!(lc.gate_open());
        assert!(!lc.wants_frames());

        lc.set_device_in_use(true);
        assert!(lc.wants_frames());
        assert_eq!(lc.set_show_screen(false), Some(GateChange::Closed));
        assert!(lc.is_on());
        assert!(!lc.wants_frames());
    }

    #[test]
    fn aborted_power_on_is_retried_by_reconcile() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.set_device_in_use(true), Some(PowerChange::On));
        lc.abort_power_on();
        assert_eq!(lc.power(), PowerState::Off);
        assert_eq!(lc.reconcile(), Some(PowerChange::On));
    }

    #[test]
    fn destroy_is_permanent() {
        let mut lc = Lifecycle::default();
        lc.set_device_in_use(true);
        lc.destroy();
        assert!(lc.is_destroyed());
        assert_eq!(lc.power(), PowerState::Off);
        assert_eq!(lc.set_device_in_use(true), None);
        assert_eq!(lc.reconcile(), None);
    }
}
