// src/hud.rs - What the heads-up display currently shows
use std::collections::VecDeque;

use chrono::Local;

use crate::globe::{ContinentRegion, GlobeTransform};
use crate::interaction::InteractionState;
use crate::panel::PanelPosition;
use crate::presentation::Presenter;
use crate::worker::SystemState;

pub const EVENT_LOG_CAPACITY: usize = 6;

/// Text shown in the GEO_INTEL panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinentReadout {
    pub name: &'static str,
    pub code: &'static str,
    pub activity: &'static str,
    pub population: &'static str,
}

impl ContinentReadout {
    pub const SCANNING: ContinentReadout = ContinentReadout {
        name: "SCANNING...",
        code: "NULL",
        activity: "LOW",
        population: "---",
    };

    pub fn is_critical(&self) -> bool {
        self.activity == "CRITICAL"
    }
}

impl From<&ContinentRegion> for ContinentReadout {
    fn from(region: &ContinentRegion) -> Self {
        Self {
            name: region.name,
            code: region.code,
            activity: region.activity,
            population: region.population,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: String,
    pub message: String,
}

pub struct HudState {
    continent: ContinentReadout,
    globe: Option<GlobeTransform>,
    panel: Option<PanelPosition>,
    events: VecDeque<LogEntry>,
    system: Option<SystemState>,
    globe_hand: bool,
    panel_hand: bool,
}

impl Default for HudState {
    fn default() -> Self {
        Self::new()
    }
}

impl HudState {
    pub fn new() -> Self {
        Self {
            continent: ContinentReadout::SCANNING,
            globe: None,
            panel: None,
            events: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
            system: None,
            globe_hand: false,
            panel_hand: false,
        }
    }

    pub fn continent(&self) -> &ContinentReadout {
        &self.continent
    }

    pub fn globe_transform(&self) -> Option<GlobeTransform> {
        self.globe
    }

    pub fn panel_position(&self) -> Option<PanelPosition> {
        self.panel
    }

    /// Newest first.
    pub fn events(&self) -> impl Iterator<Item = &LogEntry> {
        self.events.iter()
    }

    pub fn hands_tracked(&self) -> (bool, bool) {
        (self.globe_hand, self.panel_hand)
    }

    pub fn push_event(&mut self, message: impl Into<String>) {
        self.events.push_front(LogEntry {
            time: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        });
        self.events.truncate(EVENT_LOG_CAPACITY);
    }

    pub fn observe_system(&mut self, state: &SystemState) {
        if self.system.as_ref() == Some(state) {
            return;
        }
        let message = match state {
            SystemState::Initializing => "> CALIBRATING_SENSORS...".to_string(),
            SystemState::Scanning => "> SCANNING_FREQ_RANGE".to_string(),
            SystemState::Active => "> HANDSHAKE_ESTABLISHED".to_string(),
            SystemState::Error(reason) => format!("> SYSTEM_FAULT: {}", reason),
        };
        self.push_event(message);
        self.system = Some(state.clone());
    }

    /// Log hands entering or leaving their roles.
    pub fn observe_hands(&mut self, snapshot: &InteractionState) {
        let globe = snapshot.globe_hand.detected;
        if globe != self.globe_hand {
            self.push_event(if globe {
                "> L_HAND ACQUIRED [TERRAFORM]"
            } else {
                "> L_HAND LOST [TERRAFORM]"
            });
            self.globe_hand = globe;
        }

        let panel = snapshot.panel_hand.detected;
        if panel != self.panel_hand {
            self.push_event(if panel {
                "> R_HAND ACQUIRED [INTERFACE]"
            } else {
                "> R_HAND LOST [INTERFACE]"
            });
            self.panel_hand = panel;
        }
    }
}

impl Presenter for HudState {
    fn set_globe_transform(&mut self, transform: GlobeTransform) {
        self.globe = Some(transform);
    }

    fn set_active_continent(&mut self, region: &'static ContinentRegion) {
        let readout = ContinentReadout::from(region);
        if readout != self.continent {
            self.push_event(format!("> TARGET_ZONE {} [{}]", readout.name, readout.code));
            self.continent = readout;
        }
    }

    fn set_panel_position(&mut self, position: PanelPosition) {
        let was_engaged = self.panel.is_some_and(|p| p.engaged);
        if position.engaged != was_engaged {
            self.push_event(if position.engaged {
                "> PANEL_LOCK ENGAGED"
            } else {
                "> PANEL_LOCK RELEASED"
            });
        }
        self.panel = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::continent_for;
    use crate::interaction::HandInteraction;

    fn messages(hud: &HudState) -> Vec<String> {
        hud.events().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn starts_scanning_with_empty_log() {
        let hud = HudState::new();
        assert_eq!(*hud.continent(), ContinentReadout::SCANNING);
        assert!(hud.globe_transform().is_none());
        assert_eq!(hud.events().count(), 0);
    }

    #[test]
    fn log_keeps_newest_six() {
        let mut hud = HudState::new();
        for i in 0..10 {
            hud.push_event(format!("event {i}"));
        }
        let log = messages(&hud);
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log[0], "event 9");
        assert_eq!(log[5], "event 4");
    }

    #[test]
    fn continent_change_is_logged_once() {
        let mut hud = HudState::new();
        let asia = continent_for(75.0).unwrap();
        hud.set_active_continent(asia);
        hud.set_active_continent(asia);
        assert_eq!(hud.continent().name, "ASIA");
        assert!(hud.continent().is_critical());
        assert_eq!(messages(&hud), vec!["> TARGET_ZONE ASIA [AS-01]"]);
    }

    #[test]
    fn panel_grab_and_release_are_logged() {
        let mut hud = HudState::new();
        let at = |engaged| PanelPosition { x: 10.0, y: 20.0, engaged };
        hud.set_panel_position(at(false));
        hud.set_panel_position(at(true));
        hud.set_panel_position(at(true));
        hud.set_panel_position(at(false));
        assert_eq!(
            messages(&hud),
            vec!["> PANEL_LOCK RELEASED", "> PANEL_LOCK ENGAGED"]
        );
    }

    #[test]
    fn hand_and_system_transitions_are_logged() {
        let mut hud = HudState::new();
        hud.observe_system(&SystemState::Initializing);
        hud.observe_system(&SystemState::Initializing);

        let mut snapshot = InteractionState::default();
        snapshot.globe_hand = HandInteraction {
            detected: true,
            ..HandInteraction::default()
        };
        hud.observe_hands(&snapshot);
        hud.observe_hands(&snapshot);
        assert_eq!(hud.hands_tracked(), (true, false));

        hud.observe_hands(&InteractionState::default());
        hud.observe_system(&SystemState::Error("no camera".into()));

        assert_eq!(
            messages(&hud),
            vec![
                "> SYSTEM_FAULT: no camera",
                "> L_HAND LOST [TERRAFORM]",
                "> L_HAND ACQUIRED [TERRAFORM]",
                "> CALIBRATING_SENSORS...",
            ]
        );
    }
}
