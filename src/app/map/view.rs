use eframe::egui::{self, Align2, Color32, FontId, Sense, Ui, Vec2, vec2};
use tracing::{debug, trace};

use crate::render::{ProjectionEngine, compose};
use crate::util::format_score;

use super::super::{MapLayout, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_map(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.input(|input| input.time);

        let transform = self.store.snapshot().projection.transform();
        for event in self.pointer_events(ui, rect, &response, transform) {
            for action in self.controller.handle(event) {
                self.dispatch(action);
            }
        }

        self.ensure_layout(rect.size());
        self.ensure_scene(now);
        self.surface.prune(now);

        let transform = self.store.snapshot().projection.transform();
        self.surface
            .paint(&painter, rect, transform, &self.config.palette, now);

        let hovered = response
            .hover_pos()
            .and_then(|pointer| {
                self.surface
                    .hit_test(transform.invert((pointer - rect.min).to_pos2()))
            });
        if let Some(element) = hovered {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });

            let mut label = match &element.code {
                Some(code) => format!("{}  ({code})", element.name),
                None => element.name.clone(),
            };
            if let Some(score) = element.score {
                label.push_str(&format!("  |  {}", format_score(score)));
            }
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                label,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.surface.is_animating(now) || self.controller.is_dragging() {
            ui.ctx().request_repaint();
        }
    }

    fn ensure_layout(&mut self, size: Vec2) {
        let projection = self.store.snapshot().projection;
        let (family, rotation) = (projection.family(), projection.rotation());
        if self.layout.as_ref().is_some_and(|layout| {
            layout.size == size && layout.family == family && layout.rotation == rotation
        }) {
            return;
        }

        let generator = ProjectionEngine::build(
            size,
            family,
            rotation,
            &self.dataset.features,
            self.config.map.projection_params(),
        );
        if generator.is_none() {
            debug!(width = size.x, height = size.y, "viewport not ready for projection");
        }
        self.layout = Some(MapLayout {
            size,
            family,
            rotation,
            generator,
        });
        self.layout_generation += 1;
    }

    fn ensure_scene(&mut self, now: f64) {
        let selection = &self.store.snapshot().selection;
        if self
            .synced
            .as_ref()
            .is_some_and(|(synced, generation)| {
                synced == selection && *generation == self.layout_generation
            })
        {
            return;
        }
        self.synced = Some((selection.clone(), self.layout_generation));

        let Some(generator) = self.layout.as_ref().and_then(|layout| layout.generator.as_ref())
        else {
            return;
        };
        let scene = compose(&self.dataset, selection, generator, &self.config.palette);
        let stats = self.surface.sync(&scene, now);
        trace!(
            entered = stats.entered,
            updated = stats.updated,
            exited = stats.exited,
            features = self.surface.feature_count(),
            arcs = self.surface.arc_count(),
            "surface synced"
        );
    }
}
