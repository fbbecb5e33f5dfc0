use eframe::egui::{self, Align, Color32, Context, Layout};
use tracing::{error, info};

use crate::export::ExportRenderer;
use crate::geo::{CountryLookup, LonLat};
use crate::render::ProjectionFamily;
use crate::state::{Action, ProjectionState, Selection};

use super::super::{StatusLine, ViewModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Svg,
    Png,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("relmap");
                    ui.separator();
                    ui.label(format!(
                        "countries: {}/{}",
                        self.dataset.resolved_count(),
                        self.dataset.features.len()
                    ));
                    ui.label(format!("relations: {}", self.dataset.relations.len()));
                    ui.separator();

                    let mut family = self.store.snapshot().projection.family();
                    for option in [ProjectionFamily::Flat, ProjectionFamily::Globe] {
                        ui.selectable_value(&mut family, option, option.label());
                    }
                    if family != self.store.snapshot().projection.family() {
                        self.dispatch(Action::SetFamily(family));
                    }
                    if family == ProjectionFamily::Globe {
                        let hidden = self.hidden_selection_anchor();
                        let face = ui
                            .add_enabled(hidden.is_some(), egui::Button::new("Face selection"))
                            .on_hover_text("Turn the globe to the selected country.");
                        if face.clicked()
                            && let Some([lon, lat]) = hidden
                        {
                            self.dispatch(Action::SetRotation([-lon, -lat]));
                        }
                    }
                    ui.separator();

                    self.draw_alliance_picker(ui);
                    let has_selection = !self.store.snapshot().selection.is_none();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Clear selection"))
                        .clicked()
                    {
                        self.dispatch(Action::ClearSelection);
                    }
                    ui.separator();

                    if ui.button("Export SVG").clicked() {
                        self.export(ExportFormat::Svg);
                    }
                    if ui.button("Export PNG").clicked() {
                        self.export(ExportFormat::Png);
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(status) = &self.status {
                            let color = if status.is_error {
                                Color32::from_rgb(248, 113, 113)
                            } else {
                                Color32::from_gray(200)
                            };
                            ui.colored_label(color, status.text.as_str());
                        }
                        ui.label(self.view_text());
                    });
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Reloading map data...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_map(ui);
                }
            });
    }

    fn draw_alliance_picker(&mut self, ui: &mut egui::Ui) {
        let current = self.store.snapshot().selection.alliance().map(str::to_owned);
        let mut picked = None;
        egui::ComboBox::from_id_salt("alliance_picker")
            .selected_text(current.as_deref().unwrap_or("Alliance..."))
            .show_ui(ui, |ui| {
                for name in self.dataset.alliances.names() {
                    let label = format!("{name} ({})", self.dataset.alliances.member_count(name));
                    if ui
                        .selectable_label(current.as_deref() == Some(name), label)
                        .clicked()
                    {
                        picked = Some(name.to_owned());
                    }
                }
            });
        if let Some(name) = picked {
            self.dispatch(Action::SelectAlliance(name));
        }
    }

    fn hidden_selection_anchor(&self) -> Option<LonLat> {
        let code = self.store.snapshot().selection.country()?;
        let anchor = self.dataset.feature(code)?.geometry.anchor()?;
        let generator = self.layout.as_ref()?.generator.as_ref()?;
        (generator.family() == ProjectionFamily::Globe && generator.project(anchor).is_none())
            .then_some(anchor)
    }

    fn view_text(&self) -> String {
        match self.store.snapshot().projection {
            ProjectionState::Flat(transform) => format!("zoom {:.1}x", transform.scale),
            ProjectionState::Globe { rotation } => {
                format!("rotation {:.0}°, {:.0}°", rotation[0], rotation[1])
            }
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let selection: &Selection = &self.store.snapshot().selection;
        let renderer =
            ExportRenderer::new(&self.dataset, &self.config.palette, &self.config.export);
        let path = renderer.default_path(selection, format.extension());
        let result = match format {
            ExportFormat::Svg => renderer.write_svg(selection, &path),
            ExportFormat::Png => renderer.write_png(selection, &path),
        };

        self.status = Some(match result {
            Ok(()) => {
                info!(path = %path.display(), "export finished");
                StatusLine {
                    text: format!("Saved {}", path.display()),
                    is_error: false,
                }
            }
            Err(err) => {
                error!(error = %err, "export failed");
                StatusLine {
                    text: format!("Export failed: {err}"),
                    is_error: true,
                }
            }
        });
    }
}
