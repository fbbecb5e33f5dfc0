use eframe::egui::{self, Pos2, Rect, Ui};

use crate::state::ViewTransform;

use super::super::ViewModel;
use super::super::interaction::{FeatureHit, PointerEvent};

impl ViewModel {
    pub(in crate::app) fn pointer_events(
        &self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        transform: ViewTransform,
    ) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let local = |point: Pos2| (point - rect.min).to_pos2();

        if response.drag_started_by(egui::PointerButton::Primary) {
            events.push(PointerEvent::DragStart);
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            events.push(PointerEvent::DragMove(response.drag_delta()));
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            events.push(PointerEvent::DragEnd);
        }

        if response.hovered()
            && let Some(pointer) = pointer
        {
            let anchor = local(pointer);
            let (scroll, zoom) = ui.input(|input| (input.raw_scroll_delta.y, input.zoom_delta()));
            if scroll.abs() > f32::EPSILON {
                events.push(PointerEvent::Wheel {
                    anchor,
                    delta: scroll,
                });
            } else if (zoom - 1.0).abs() > f32::EPSILON {
                events.push(PointerEvent::Pinch {
                    anchor,
                    factor: zoom,
                });
            }
        }

        if response.double_clicked() {
            events.push(PointerEvent::DoubleClick);
        } else if response.clicked_by(egui::PointerButton::Primary) {
            let hit = response
                .interact_pointer_pos()
                .or(pointer)
                .and_then(|point| self.surface.hit_test(transform.invert(local(point))))
                .map(|element| FeatureHit {
                    code: element.code.clone(),
                });
            events.push(PointerEvent::Click(hit));
        }

        events
    }
}
