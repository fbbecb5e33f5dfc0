use eframe::egui::{Pos2, Vec2};

use crate::geo::CountryCode;
use crate::render::ProjectionFamily;
use crate::state::Action;

const WHEEL_ZOOM_RATE: f32 = 0.0018;
const WHEEL_ZOOM_STEP_MIN: f32 = 0.85;
const WHEEL_ZOOM_STEP_MAX: f32 = 1.15;

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct FeatureHit {
    pub code: Option<CountryCode>,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum PointerEvent {
    DragStart,
    DragMove(Vec2),
    DragEnd,
    Wheel { anchor: Pos2, delta: f32 },
    Pinch { anchor: Pos2, factor: f32 },
    Click(Option<FeatureHit>),
    DoubleClick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum Propagation {
    Continue,
    Stop,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Gesture {
    #[default]
    Idle,
    Dragging,
}

pub(in crate::app) struct InteractionController {
    family: ProjectionFamily,
    gesture: Gesture,
    sensitivity: f64,
}

impl InteractionController {
    pub(in crate::app) fn new(family: ProjectionFamily, sensitivity: f64) -> Self {
        Self {
            family,
            gesture: Gesture::Idle,
            sensitivity,
        }
    }

    pub(in crate::app) fn bind(&mut self, family: ProjectionFamily) {
        self.family = family;
        self.gesture = Gesture::Idle;
    }

    pub(in crate::app) fn family(&self) -> ProjectionFamily {
        self.family
    }

    pub(in crate::app) fn is_dragging(&self) -> bool {
        self.gesture == Gesture::Dragging
    }

    pub(in crate::app) fn handle(&mut self, event: PointerEvent) -> Vec<Action> {
        match event {
            PointerEvent::DragStart => {
                self.gesture = Gesture::Dragging;
                Vec::new()
            }
            PointerEvent::DragEnd => {
                self.gesture = Gesture::Idle;
                Vec::new()
            }
            PointerEvent::DragMove(delta) => {
                if self.gesture != Gesture::Dragging || delta == Vec2::ZERO {
                    return Vec::new();
                }
                match self.family {
                    ProjectionFamily::Flat => vec![Action::PanBy(delta)],
                    ProjectionFamily::Globe => vec![Action::RotateBy([
                        delta.x as f64 * self.sensitivity,
                        -delta.y as f64 * self.sensitivity,
                    ])],
                }
            }
            PointerEvent::Wheel { anchor, delta } => {
                let factor = (1.0 + delta * WHEEL_ZOOM_RATE).clamp(WHEEL_ZOOM_STEP_MIN, WHEEL_ZOOM_STEP_MAX);
                self.zoom(anchor, factor)
            }
            PointerEvent::Pinch { anchor, factor } => self.zoom(anchor, factor),
            PointerEvent::Click(hit) => {
                let (propagation, mut actions) = Self::on_feature_click(hit);
                if propagation == Propagation::Continue {
                    actions.extend(Self::on_background_click());
                }
                actions
            }
            PointerEvent::DoubleClick => Self::on_background_click(),
        }
    }

    fn zoom(&self, anchor: Pos2, factor: f32) -> Vec<Action> {
        let idle_flat = self.family == ProjectionFamily::Flat && self.gesture == Gesture::Idle;
        if !idle_flat || !factor.is_finite() || (factor - 1.0).abs() <= f32::EPSILON {
            return Vec::new();
        }
        vec![Action::ZoomAt { anchor, factor }]
    }

    /// Runs before the background handler. A feature hit always stops
    /// propagation, even when it has no code to select.
    fn on_feature_click(hit: Option<FeatureHit>) -> (Propagation, Vec<Action>) {
        match hit {
            Some(FeatureHit { code: Some(code) }) => {
                (Propagation::Stop, vec![Action::SelectCountry(code)])
            }
            Some(FeatureHit { code: None }) => (Propagation::Stop, Vec::new()),
            None => (Propagation::Continue, Vec::new()),
        }
    }

    fn on_background_click() -> Vec<Action> {
        vec![Action::ClearSelection]
    }
}
