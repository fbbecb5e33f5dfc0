use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::geo::{DataSources, Dataset, load_dataset};
use crate::render::{PathGenerator, ProjectionFamily, Rotation};
use crate::state::{Action, Selection, VizStore};

mod interaction;
mod map;
mod render_utils;
mod surface;
mod ui;

use self::interaction::InteractionController;
use self::surface::RenderSurface;

pub struct RelMapApp {
    sources: DataSources,
    config: Config,
    initial_selection: Selection,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Dataset,
    config: Config,
    store: VizStore,
    controller: InteractionController,
    surface: RenderSurface,
    layout: Option<MapLayout>,
    layout_generation: u64,
    synced: Option<(Selection, u64)>,
    status: Option<StatusLine>,
}

struct MapLayout {
    size: Vec2,
    family: ProjectionFamily,
    rotation: Rotation,
    generator: Option<PathGenerator>,
}

struct StatusLine {
    text: String,
    is_error: bool,
}

impl RelMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        sources: DataSources,
        config: Config,
        initial_selection: Selection,
    ) -> Self {
        let state = Self::start_load(sources.clone());
        Self {
            sources,
            config,
            initial_selection,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(sources: DataSources) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&sources).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(sources: DataSources) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(sources),
        }
    }

    fn ready(config: &Config, dataset: Dataset, selection: Selection) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(dataset, config.clone(), selection)))
    }
}

impl eframe::App for RelMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => {
                        transition = Some(Self::ready(
                            &self.config,
                            dataset,
                            self.initial_selection.clone(),
                        ));
                    }
                    Ok(Err(message)) => {
                        error!(error = message.as_str(), "failed to load map data");
                        transition = Some(AppState::Error(message));
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading map and relationship data...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load map data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.sources.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading map data");
                    self.reload_rx = Some(Self::spawn_load(self.sources.clone()));
                }

                let carried = model.store.snapshot().selection.clone();
                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dataset)) => {
                            transition = Some(Self::ready(&self.config, dataset, carried));
                        }
                        Ok(Err(message)) => {
                            error!(error = message.as_str(), "failed to reload map data");
                            transition = Some(AppState::Error(message));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
            ctx.request_repaint();
        }
    }
}

impl ViewModel {
    fn new(dataset: Dataset, config: Config, selection: Selection) -> Self {
        let family = config.map.initial_projection;
        let mut store = VizStore::new(family);
        store.on_selection_change(|selection| info!(?selection, "selection changed"));
        store.on_rotation_change(|[lon, lat]| debug!(lon, lat, "globe rotated"));
        store.dispatch(selection.validated(&dataset).into_action());

        Self {
            controller: InteractionController::new(family, config.map.rotate_sensitivity),
            surface: RenderSurface::new(config.map.transition_secs(), config.map.arc_draw_secs()),
            dataset,
            config,
            store,
            layout: None,
            layout_generation: 0,
            synced: None,
            status: None,
        }
    }

    fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
        let family = self.store.snapshot().projection.family();
        if self.controller.family() != family {
            debug!(family = family.label(), "rebinding gestures");
            self.controller.bind(family);
        }
    }
}
