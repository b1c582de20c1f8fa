//! Pinch-to-drag mapping for the floating HUD panel.

use crate::config::PanelConfig;
use crate::interaction::HandInteraction;
use crate::smoothing::SmoothedParameter;

/// Top-left corner of the panel in screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPosition {
    pub x: f64,
    pub y: f64,
    /// True while the hand is pinching and dragging the panel.
    pub engaged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub struct PanelMapper {
    config: PanelConfig,
    x: SmoothedParameter,
    y: SmoothedParameter,
    engaged: bool,
    mirrored: bool,
}

impl PanelMapper {
    /// Start docked near the right edge, vertically centred.
    pub fn new(config: PanelConfig, viewport: Viewport) -> Self {
        let x = viewport.width - config.start_right_inset;
        let y = viewport.height / 2.0 - config.start_center_offset;
        Self {
            x: SmoothedParameter::new(x, config.follow_factor),
            y: SmoothedParameter::new(y, config.follow_factor),
            engaged: false,
            mirrored: true,
            config,
        }
    }

    /// Whether hand x is flipped onto the screen. On by default, matching a
    /// selfie-mirrored camera view.
    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn position(&self) -> PanelPosition {
        PanelPosition {
            x: self.x.current,
            y: self.y.current,
            engaged: self.engaged,
        }
    }

    /// Screen target for a hand, flipped horizontally when the view is mirrored.
    pub fn target_for(&self, hand: &HandInteraction, viewport: Viewport) -> (f64, f64) {
        let screen_x = if self.mirrored {
            1.0 - hand.position.x
        } else {
            hand.position.x
        };
        let x = screen_x * viewport.width - self.config.anchor_inset_x;
        let y = hand.position.y * viewport.height - self.config.anchor_inset_y;
        (x, y)
    }

    /// Follow the hand while it pinches; otherwise stay where released.
    pub fn update(&mut self, hand: &HandInteraction, viewport: Viewport) -> PanelPosition {
        self.engaged = hand.detected && hand.is_pinching;
        if self.engaged {
            let (x, y) = self.target_for(hand, viewport);
            self.x.set_target(x);
            self.y.set_target(y);
            self.x.advance();
            self.y.advance();
        }
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn viewport() -> Viewport {
        Viewport::new(1600.0, 900.0)
    }

    fn hand(x: f64, y: f64, pinching: bool) -> HandInteraction {
        HandInteraction {
            detected: true,
            position: Point2::new(x, y),
            pinch_distance: if pinching { 0.02 } else { 0.2 },
            is_pinching: pinching,
        }
    }

    #[test]
    fn starts_docked_right() {
        let mapper = PanelMapper::new(PanelConfig::default(), viewport());
        assert_eq!(
            mapper.position(),
            PanelPosition { x: 1280.0, y: 300.0, engaged: false }
        );
    }

    #[test]
    fn pinch_drags_toward_mirrored_target() {
        let mut mapper = PanelMapper::new(PanelConfig::default(), viewport());
        let grab = hand(0.25, 0.5, true);
        let (tx, ty) = mapper.target_for(&grab, viewport());
        assert_eq!((tx, ty), (1050.0, 400.0));

        let p = mapper.update(&grab, viewport());
        assert!(p.engaged);
        // 1280 + (1050 - 1280) * 0.25, 300 + (400 - 300) * 0.25
        assert_eq!((p.x, p.y), (1222.5, 325.0));
    }

    #[test]
    fn unmirrored_view_follows_raw_x() {
        let mut mapper =
            PanelMapper::new(PanelConfig::default(), viewport()).with_mirrored(false);
        let grab = hand(0.25, 0.5, true);
        assert_eq!(mapper.target_for(&grab, viewport()), (250.0, 400.0));

        let p = mapper.update(&grab, viewport());
        // 1280 + (250 - 1280) * 0.25
        assert_eq!((p.x, p.y), (1022.5, 325.0));
    }

    #[test]
    fn open_hand_holds_position() {
        let mut mapper = PanelMapper::new(PanelConfig::default(), viewport());
        for _ in 0..10 {
            mapper.update(&hand(0.1, 0.2, true), viewport());
        }
        let released = mapper.position();

        for x in [0.1, 0.3, 0.5] {
            let p = mapper.update(&hand(x, 0.8, false), viewport());
            assert!(!p.engaged);
            assert_eq!((p.x, p.y), (released.x, released.y));
        }
        let p = mapper.update(&HandInteraction::default(), viewport());
        assert_eq!((p.x, p.y), (released.x, released.y));
    }

    #[test]
    fn moving_pinch_moves_panel() {
        let mut mapper = PanelMapper::new(PanelConfig::default(), viewport());
        let mut last = mapper.update(&hand(0.2, 0.5, true), viewport());
        for step in 1..20 {
            let p = mapper.update(&hand(0.2 + 0.01 * step as f64, 0.5, true), viewport());
            assert!(p.x != last.x);
            last = p;
        }
    }

    #[test]
    fn pinch_flag_without_detection_is_ignored() {
        let mut mapper = PanelMapper::new(PanelConfig::default(), viewport());
        let ghost = HandInteraction {
            detected: false,
            ..hand(0.0, 0.0, true)
        };
        let p = mapper.update(&ghost, viewport());
        assert!(!p.engaged);
        assert_eq!((p.x, p.y), (1280.0, 300.0));
    }
}
