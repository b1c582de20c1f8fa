// src/tracking.rs - Role classification of detected hands
use std::collections::VecDeque;
use std::time::Duration;

use nalgebra::Point2;
use tracing::debug;

use crate::config::RolePolicy;
use crate::interaction::{HandInteraction, InteractionState};
use crate::landmarks::{index, Detection, Handedness};

/// The user's real hand, after undoing the selfie-mirror label swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandRole {
    None,
    /// Physical right hand in the screen-right zone; drags the HUD panel.
    PanelControl,
    /// Physical left hand in the screen-left zone; turns the globe.
    GlobeControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEligibility {
    pub panel: bool,
    pub globe: bool,
}

#[derive(Debug, Clone)]
pub struct ClassifiedHand {
    pub detection: Detection,
    pub role: HandRole,
    pub pinch_distance: Option<f64>,
    pub is_pinching: bool,
}

/// Result of one classification pass.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedFrame {
    pub state: InteractionState,
    pub hands: Vec<ClassifiedHand>,
}

#[derive(Clone, Debug)]
pub struct PerformanceMetrics {
    pub avg_fps: f32,
    pub avg_processing_time: f32,
    pub tracking_confidence: f32,
    frame_times: VecDeque<f32>,
}

impl PerformanceMetrics {
    const WINDOW: usize = 30;

    pub fn new() -> Self {
        Self {
            avg_fps: 0.0,
            avg_processing_time: 0.0,
            tracking_confidence: 0.0,
            frame_times: VecDeque::with_capacity(Self::WINDOW),
        }
    }

    /// Fold in one frame's wall time and the mean confidence of its
    /// role-assigned hands.
    pub fn record(&mut self, elapsed: Duration, confidence: f32) {
        self.frame_times.push_front(elapsed.as_secs_f32());
        if self.frame_times.len() > Self::WINDOW {
            self.frame_times.pop_back();
        }

        self.avg_processing_time =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.avg_fps = if self.avg_processing_time > 0.0 {
            1.0 / self.avg_processing_time
        } else {
            0.0
        };
        self.tracking_confidence = confidence;
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub fn physical_side(handedness: Handedness, mirrored_labels: bool) -> Option<PhysicalSide> {
    match (handedness, mirrored_labels) {
        (Handedness::Left, true) | (Handedness::Right, false) => Some(PhysicalSide::Right),
        (Handedness::Right, true) | (Handedness::Left, false) => Some(PhysicalSide::Left),
        (Handedness::Unknown, _) => None,
    }
}

/// Zone test on the raw wrist x. Both flags are true inside the overlap band.
pub fn zone_eligibility(wrist_x: f64, policy: &RolePolicy) -> ZoneEligibility {
    ZoneEligibility {
        panel: wrist_x < policy.panel_zone_max_x,
        globe: wrist_x > policy.globe_zone_min_x,
    }
}

pub fn assign_role(side: Option<PhysicalSide>, zones: ZoneEligibility) -> HandRole {
    match side {
        Some(PhysicalSide::Right) if zones.panel => HandRole::PanelControl,
        Some(PhysicalSide::Left) if zones.globe => HandRole::GlobeControl,
        _ => HandRole::None,
    }
}

/// Thumb-tip to index-tip distance in the image plane; depth is ignored.
pub fn pinch_distance(detection: &Detection) -> Option<f64> {
    let thumb = detection.landmarks.get(index::THUMB_TIP)?;
    let index_tip = detection.landmarks.get(index::INDEX_FINGER_TIP)?;
    Some((thumb.xy() - index_tip.xy()).norm())
}

pub fn classify_hand(detection: &Detection, policy: &RolePolicy) -> ClassifiedHand {
    let wrist = detection
        .wrist()
        .filter(|w| detection.is_complete() && w.x.is_finite() && w.y.is_finite());

    let Some(wrist) = wrist else {
        return ClassifiedHand {
            detection: detection.clone(),
            role: HandRole::None,
            pinch_distance: None,
            is_pinching: false,
        };
    };

    // A hand whose pinch cannot be measured holds no role.
    let pinch = pinch_distance(detection).filter(|d| d.is_finite());
    let side = physical_side(detection.handedness, policy.mirrored_labels);
    let role = match pinch {
        Some(_) => assign_role(side, zone_eligibility(wrist.x, policy)),
        None => HandRole::None,
    };

    ClassifiedHand {
        detection: detection.clone(),
        role,
        pinch_distance: pinch,
        is_pinching: pinch.is_some_and(|d| d < policy.pinch_threshold),
    }
}

pub struct RoleClassifier {
    policy: RolePolicy,
    frame_counter: u64,
}

impl RoleClassifier {
    pub fn new(policy: RolePolicy) -> Self {
        Self {
            policy,
            frame_counter: 0,
        }
    }

    /// Classify one frame. Both hand records start undetected; each hand
    /// that earns a role overwrites its record, so if the detector reports
    /// two hands for the same role the later one wins.
    pub fn classify_frame(&mut self, detections: &[Detection], timestamp_ms: f64) -> ClassifiedFrame {
        self.frame_counter += 1;
        let mut state = InteractionState {
            frame: self.frame_counter,
            timestamp_ms,
            ..InteractionState::default()
        };

        let hands: Vec<ClassifiedHand> = detections
            .iter()
            .map(|detection| classify_hand(detection, &self.policy))
            .collect();

        for (i, hand) in hands.iter().enumerate() {
            let slot = match hand.role {
                HandRole::PanelControl => &mut state.panel_hand,
                HandRole::GlobeControl => &mut state.globe_hand,
                HandRole::None => continue,
            };
            // Role assignment already required a finite wrist and pinch.
            let (Some(wrist), Some(pinch)) = (hand.detection.wrist(), hand.pinch_distance) else {
                continue;
            };

            if slot.detected {
                debug!(
                    "frame {}: hand {} replaces an earlier {:?} claim",
                    self.frame_counter, i, hand.role
                );
            }
            *slot = HandInteraction {
                detected: true,
                position: Point2::new(wrist.x, wrist.y),
                pinch_distance: pinch,
                is_pinching: hand.is_pinching,
            };
        }

        ClassifiedFrame { state, hands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{synthetic_hand, Landmark};

    fn hand(label: Handedness, wrist_x: f64, wrist_y: f64, gap: f64) -> Detection {
        Detection {
            landmarks: synthetic_hand(wrist_x, wrist_y, gap),
            handedness: label,
            confidence: 0.9,
        }
    }

    fn classify(detections: &[Detection]) -> ClassifiedFrame {
        RoleClassifier::new(RolePolicy::default()).classify_frame(detections, 0.0)
    }

    #[test]
    fn mirrored_labels_swap_sides() {
        assert_eq!(physical_side(Handedness::Left, true), Some(PhysicalSide::Right));
        assert_eq!(physical_side(Handedness::Right, true), Some(PhysicalSide::Left));
        assert_eq!(physical_side(Handedness::Left, false), Some(PhysicalSide::Left));
        assert_eq!(physical_side(Handedness::Unknown, true), None);
    }

    #[test]
    fn overlap_band_is_eligible_for_both_zones() {
        let policy = RolePolicy::default();
        assert_eq!(zone_eligibility(0.5, &policy), ZoneEligibility { panel: true, globe: true });
        assert_eq!(zone_eligibility(0.2, &policy), ZoneEligibility { panel: true, globe: false });
        assert_eq!(zone_eligibility(0.8, &policy), ZoneEligibility { panel: false, globe: true });
        // Bounds are strict.
        assert!(!zone_eligibility(0.6, &policy).panel);
        assert!(!zone_eligibility(0.4, &policy).globe);
    }

    #[test]
    fn left_label_outside_panel_zone_gets_no_role() {
        for x in [0.6, 0.61, 0.75, 0.99, 1.0] {
            let frame = classify(&[hand(Handedness::Left, x, 0.5, 0.2)]);
            assert_eq!(frame.hands[0].role, HandRole::None, "x = {x}");
            assert!(!frame.state.panel_hand.detected);
            assert!(!frame.state.globe_hand.detected);
        }
    }

    #[test]
    fn right_label_outside_globe_zone_gets_no_role() {
        for x in [0.0, 0.1, 0.39, 0.4] {
            let frame = classify(&[hand(Handedness::Right, x, 0.5, 0.2)]);
            assert_eq!(frame.hands[0].role, HandRole::None, "x = {x}");
            assert!(!frame.state.any_detected());
        }
    }

    #[test]
    fn two_hands_fill_both_records() {
        let frame = classify(&[
            hand(Handedness::Left, 0.3, 0.4, 0.02),
            hand(Handedness::Right, 0.8, 0.6, 0.3),
        ]);

        assert_eq!(frame.hands[0].role, HandRole::PanelControl);
        assert_eq!(frame.hands[1].role, HandRole::GlobeControl);

        let panel = frame.state.panel_hand;
        assert!(panel.detected);
        assert_eq!(panel.position, Point2::new(0.3, 0.4));
        assert!(panel.is_pinching);

        let globe = frame.state.globe_hand;
        assert!(globe.detected);
        assert_eq!(globe.position, Point2::new(0.8, 0.6));
        assert!((globe.pinch_distance - 0.3).abs() < 1e-12);
        assert!(!globe.is_pinching);
    }

    #[test]
    fn middle_band_follows_physical_side() {
        let frame = classify(&[hand(Handedness::Left, 0.5, 0.5, 0.2)]);
        assert_eq!(frame.hands[0].role, HandRole::PanelControl);
        let frame = classify(&[hand(Handedness::Right, 0.5, 0.5, 0.2)]);
        assert_eq!(frame.hands[0].role, HandRole::GlobeControl);
    }

    #[test]
    fn pinch_threshold_is_exclusive() {
        let policy = RolePolicy::default();
        let below = classify_hand(&hand(Handedness::Left, 0.3, 0.5, 0.0799), &policy);
        assert!(below.is_pinching);

        let mut exact = hand(Handedness::Left, 0.3, 0.5, 0.2);
        exact.landmarks[index::INDEX_FINGER_TIP] = Landmark::new(0.0, 0.0, 0.0);
        exact.landmarks[index::THUMB_TIP] = Landmark::new(0.08, 0.0, 0.0);
        let at = classify_hand(&exact, &policy);
        assert_eq!(at.pinch_distance, Some(0.08));
        assert!(!at.is_pinching);
    }

    #[test]
    fn pinch_distance_is_symmetric_and_ignores_depth() {
        let mut a = hand(Handedness::Left, 0.3, 0.5, 0.05);
        a.landmarks[index::THUMB_TIP].z = 5.0;
        let mut b = a.clone();
        b.landmarks.swap(index::THUMB_TIP, index::INDEX_FINGER_TIP);

        let da = pinch_distance(&a).unwrap();
        let db = pinch_distance(&b).unwrap();
        assert!(da >= 0.0);
        assert!((da - db).abs() < 1e-12);
        assert!((da - 0.05).abs() < 1e-12);
    }

    #[test]
    fn malformed_detections_are_ignored() {
        let truncated = Detection {
            landmarks: vec![Landmark::new(0.3, 0.5, 0.0); 5],
            handedness: Handedness::Left,
            confidence: 0.9,
        };
        let mut nan_wrist = hand(Handedness::Right, 0.8, 0.5, 0.1);
        nan_wrist.landmarks[index::WRIST].x = f64::NAN;
        let unknown = hand(Handedness::Unknown, 0.5, 0.5, 0.1);

        let frame = classify(&[truncated, nan_wrist, unknown]);
        assert!(frame.hands.iter().all(|h| h.role == HandRole::None));
        assert!(!frame.state.any_detected());
    }

    #[test]
    fn unmeasurable_pinch_drops_the_role() {
        let mut nan_thumb = hand(Handedness::Left, 0.3, 0.5, 0.02);
        nan_thumb.landmarks[index::THUMB_TIP].y = f64::NAN;
        let mut inf_index = hand(Handedness::Right, 0.8, 0.5, 0.2);
        inf_index.landmarks[index::INDEX_FINGER_TIP].x = f64::INFINITY;

        let frame = classify(&[nan_thumb, inf_index]);
        for classified in &frame.hands {
            assert_eq!(classified.role, HandRole::None);
            assert_eq!(classified.pinch_distance, None);
            assert!(!classified.is_pinching);
        }
        assert!(!frame.state.any_detected());
    }

    #[test]
    fn empty_frame_resets_records() {
        let mut classifier = RoleClassifier::new(RolePolicy::default());
        let first = classifier.classify_frame(&[hand(Handedness::Left, 0.3, 0.5, 0.02)], 0.0);
        assert!(first.state.panel_hand.detected);

        let second = classifier.classify_frame(&[], 16.0);
        assert!(!second.state.any_detected());
        assert_eq!(second.state.frame, 2);
        assert_eq!(second.state.timestamp_ms, 16.0);
    }

    #[test]
    fn duplicate_role_claim_keeps_last() {
        let frame = classify(&[
            hand(Handedness::Right, 0.7, 0.3, 0.2),
            hand(Handedness::Right, 0.9, 0.6, 0.2),
        ]);
        assert_eq!(frame.state.globe_hand.position, Point2::new(0.9, 0.6));
    }

    #[test]
    fn metrics_average_over_window() {
        let mut metrics = PerformanceMetrics::new();
        for _ in 0..40 {
            metrics.record(Duration::from_millis(20), 0.8);
        }
        assert!((metrics.avg_processing_time - 0.02).abs() < 1e-4);
        assert!((metrics.avg_fps - 50.0).abs() < 0.5);
        assert_eq!(metrics.tracking_confidence, 0.8);
    }
}
