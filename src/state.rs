use eframe::egui::{Pos2, Vec2};
use tracing::warn;

use crate::geo::{CountryCode, Dataset};
use crate::render::{ProjectionFamily, Rotation};

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 8.0;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Country(CountryCode),
    Alliance(String),
}

impl Selection {
    pub fn country(&self) -> Option<&str> {
        match self {
            Self::Country(code) => Some(code),
            _ => None,
        }
    }

    pub fn alliance(&self) -> Option<&str> {
        match self {
            Self::Alliance(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn validated(self, dataset: &Dataset) -> Self {
        let known = match &self {
            Self::None => true,
            Self::Country(code) => {
                dataset.index_of(code).is_some() || dataset.relations.get(code).is_some()
            }
            Self::Alliance(name) => dataset.alliances.contains(name),
        };
        if known {
            self
        } else {
            warn!(selection = ?self, "selection names nothing in the dataset, ignoring it");
            Self::None
        }
    }

    pub fn into_action(self) -> Action {
        match self {
            Self::None => Action::ClearSelection,
            Self::Country(code) => Action::SelectCountry(code),
            Self::Alliance(name) => Action::SelectAlliance(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn apply(&self, point: Pos2) -> Pos2 {
        Pos2::new(
            point.x * self.scale + self.translate.x,
            point.y * self.scale + self.translate.y,
        )
    }

    pub fn invert(&self, point: Pos2) -> Pos2 {
        Pos2::new(
            (point.x - self.translate.x) / self.scale,
            (point.y - self.translate.y) / self.scale,
        )
    }

    pub fn zoom_at(&self, anchor: Pos2, factor: f32) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return *self;
        }
        let scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let world = self.invert(anchor);
        Self {
            scale,
            translate: anchor.to_vec2() - world.to_vec2() * scale,
        }
    }

    pub fn pan(&self, delta: Vec2) -> Self {
        Self {
            translate: self.translate + delta,
            ..*self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectionState {
    Flat(ViewTransform),
    Globe { rotation: Rotation },
}

impl Default for ProjectionState {
    fn default() -> Self {
        Self::identity(ProjectionFamily::Flat)
    }
}

impl ProjectionState {
    pub fn identity(family: ProjectionFamily) -> Self {
        match family {
            ProjectionFamily::Flat => Self::Flat(ViewTransform::default()),
            ProjectionFamily::Globe => Self::Globe {
                rotation: [0.0, 0.0],
            },
        }
    }

    pub fn family(&self) -> ProjectionFamily {
        match self {
            Self::Flat(_) => ProjectionFamily::Flat,
            Self::Globe { .. } => ProjectionFamily::Globe,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        match self {
            Self::Flat(transform) => *transform,
            Self::Globe { .. } => ViewTransform::default(),
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            Self::Flat(_) => [0.0, 0.0],
            Self::Globe { rotation } => *rotation,
        }
    }
}

pub fn normalize_rotation([lon, lat]: Rotation) -> Rotation {
    let lon = if lon.is_finite() {
        let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
        if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
    } else {
        0.0
    };
    let lat = if lat.is_nan() { 0.0 } else { lat.clamp(-90.0, 90.0) };
    [lon, lat]
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SelectCountry(CountryCode),
    SelectAlliance(String),
    ClearSelection,
    SetFamily(ProjectionFamily),
    ZoomAt { anchor: Pos2, factor: f32 },
    PanBy(Vec2),
    RotateBy(Rotation),
    SetRotation(Rotation),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VizSnapshot {
    pub selection: Selection,
    pub projection: ProjectionState,
    pub revision: u64,
}

/// Pure transition. Actions that do not apply to the current projection
/// family, or that change nothing, return an equal snapshot with the same
/// revision.
pub fn reduce(snapshot: &VizSnapshot, action: &Action) -> VizSnapshot {
    let mut next = snapshot.clone();
    match action {
        Action::SelectCountry(code) => next.selection = Selection::Country(code.clone()),
        Action::SelectAlliance(name) => next.selection = Selection::Alliance(name.clone()),
        Action::ClearSelection => next.selection = Selection::None,
        Action::SetFamily(family) => {
            if snapshot.projection.family() != *family {
                next.projection = ProjectionState::identity(*family);
            }
        }
        Action::ZoomAt { anchor, factor } => {
            if let ProjectionState::Flat(transform) = &mut next.projection {
                *transform = transform.zoom_at(*anchor, *factor);
            }
        }
        Action::PanBy(delta) => {
            if let ProjectionState::Flat(transform) = &mut next.projection
                && delta.is_finite()
            {
                *transform = transform.pan(*delta);
            }
        }
        Action::RotateBy([dlon, dlat]) => {
            if let ProjectionState::Globe { rotation } = &mut next.projection {
                *rotation = normalize_rotation([rotation[0] + dlon, rotation[1] + dlat]);
            }
        }
        Action::SetRotation(target) => {
            if let ProjectionState::Globe { rotation } = &mut next.projection {
                *rotation = normalize_rotation(*target);
            }
        }
    }

    if next.selection != snapshot.selection || next.projection != snapshot.projection {
        next.revision = snapshot.revision.wrapping_add(1);
    }
    next
}

type SelectionListener = Box<dyn FnMut(&Selection)>;
type RotationListener = Box<dyn FnMut(Rotation)>;

#[derive(Default)]
pub struct VizStore {
    snapshot: VizSnapshot,
    selection_listeners: Vec<SelectionListener>,
    rotation_listeners: Vec<RotationListener>,
}

impl VizStore {
    pub fn new(family: ProjectionFamily) -> Self {
        Self {
            snapshot: VizSnapshot {
                projection: ProjectionState::identity(family),
                ..VizSnapshot::default()
            },
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &VizSnapshot {
        &self.snapshot
    }

    pub fn on_selection_change(&mut self, listener: impl FnMut(&Selection) + 'static) {
        self.selection_listeners.push(Box::new(listener));
    }

    pub fn on_rotation_change(&mut self, listener: impl FnMut(Rotation) + 'static) {
        self.rotation_listeners.push(Box::new(listener));
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = reduce(&self.snapshot, &action);
        if next.revision == self.snapshot.revision {
            return false;
        }

        let selection_changed = next.selection != self.snapshot.selection;
        let rotation = match next.projection {
            ProjectionState::Globe { rotation } if next.projection != self.snapshot.projection => {
                Some(rotation)
            }
            _ => None,
        };
        self.snapshot = next;

        if selection_changed {
            for listener in &mut self.selection_listeners {
                listener(&self.snapshot.selection);
            }
        }
        if let Some(rotation) = rotation {
            for listener in &mut self.rotation_listeners {
                listener(rotation);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use eframe::egui::{pos2, vec2};
    use proptest::prelude::*;

    use super::*;

    fn apply(actions: &[Action]) -> VizSnapshot {
        actions
            .iter()
            .fold(VizSnapshot::default(), |snapshot, action| reduce(&snapshot, action))
    }

    #[test]
    fn country_and_alliance_selection_are_mutually_exclusive() {
        let snapshot = apply(&[
            Action::SelectAlliance("NATO".to_owned()),
            Action::SelectCountry("USA".to_owned()),
        ]);
        assert_eq!(snapshot.selection, Selection::Country("USA".to_owned()));
        assert_eq!(snapshot.selection.alliance(), None);

        let snapshot = reduce(&snapshot, &Action::SelectAlliance("NATO".to_owned()));
        assert_eq!(snapshot.selection.alliance(), Some("NATO"));
        assert_eq!(snapshot.selection.country(), None);

        let snapshot = reduce(&snapshot, &Action::ClearSelection);
        assert!(snapshot.selection.is_none());
    }

    #[test]
    fn switching_family_resets_view_state() {
        let snapshot = apply(&[
            Action::ZoomAt {
                anchor: pos2(10.0, 10.0),
                factor: 4.0,
            },
            Action::SetFamily(ProjectionFamily::Globe),
            Action::RotateBy([30.0, 10.0]),
            Action::SetFamily(ProjectionFamily::Globe),
        ]);
        assert_eq!(snapshot.projection.rotation(), [30.0, 10.0]);

        let snapshot = reduce(&snapshot, &Action::SetFamily(ProjectionFamily::Flat));
        assert_eq!(snapshot.projection, ProjectionState::Flat(ViewTransform::default()));
    }

    #[test]
    fn gestures_only_apply_to_their_family() {
        let flat = apply(&[Action::RotateBy([10.0, 10.0])]);
        assert_eq!(flat, VizSnapshot::default());

        let globe = apply(&[
            Action::SetFamily(ProjectionFamily::Globe),
            Action::PanBy(vec2(5.0, 5.0)),
            Action::ZoomAt {
                anchor: pos2(0.0, 0.0),
                factor: 2.0,
            },
        ]);
        assert_eq!(globe.projection, ProjectionState::identity(ProjectionFamily::Globe));
        assert_eq!(globe.revision, 1);
    }

    #[test]
    fn set_rotation_faces_a_location_on_the_globe_only() {
        let flat = apply(&[Action::SetRotation([-2.0, -46.0])]);
        assert_eq!(flat, VizSnapshot::default());

        let globe = apply(&[
            Action::SetFamily(ProjectionFamily::Globe),
            Action::RotateBy([30.0, 10.0]),
            Action::SetRotation([-200.0, -46.0]),
        ]);
        assert_eq!(globe.projection.rotation(), [160.0, -46.0]);
        assert_eq!(globe.revision, 3);
    }

    #[test]
    fn zoom_is_bounded_and_anchored() {
        let anchor = pos2(120.0, 80.0);
        let transform = ViewTransform::default().zoom_at(anchor, 100.0);
        assert_eq!(transform.scale, MAX_ZOOM);
        assert!((transform.apply(anchor) - anchor).length() < 1e-3);

        let transform = transform.zoom_at(anchor, 0.001);
        assert_eq!(transform.scale, MIN_ZOOM);
    }

    #[test]
    fn longitude_wraps_and_latitude_clamps() {
        assert_eq!(normalize_rotation([190.0, 95.0]), [-170.0, 90.0]);
        assert_eq!(normalize_rotation([-180.0, -120.0]), [-180.0, -90.0]);
        assert_eq!(normalize_rotation([180.0, 0.0]), [-180.0, 0.0]);
    }

    #[test]
    fn store_notifies_only_on_effective_changes() {
        let selections = Rc::new(RefCell::new(Vec::new()));
        let rotations = Rc::new(RefCell::new(Vec::new()));
        let mut store = VizStore::new(ProjectionFamily::Globe);
        {
            let selections = Rc::clone(&selections);
            store.on_selection_change(move |selection| selections.borrow_mut().push(selection.clone()));
            let rotations = Rc::clone(&rotations);
            store.on_rotation_change(move |rotation| rotations.borrow_mut().push(rotation));
        }

        assert!(store.dispatch(Action::SelectCountry("USA".to_owned())));
        assert!(!store.dispatch(Action::SelectCountry("USA".to_owned())));
        assert!(store.dispatch(Action::RotateBy([15.0, 0.0])));
        assert!(!store.dispatch(Action::PanBy(vec2(3.0, 3.0))));

        assert_eq!(*selections.borrow(), vec![Selection::Country("USA".to_owned())]);
        assert_eq!(*rotations.borrow(), vec![[15.0, 0.0]]);
        assert_eq!(store.snapshot().revision, 2);
    }

    #[test]
    fn unknown_selections_are_dropped() {
        use crate::geo::{AllianceMembership, RelationshipData};

        let dataset = Dataset::new(
            Vec::new(),
            RelationshipData::default(),
            AllianceMembership::from_members([("NATO".to_owned(), vec!["USA".to_owned()])]),
        );
        assert_eq!(Selection::Country("ATL".to_owned()).validated(&dataset), Selection::None);
        assert_eq!(Selection::Alliance("SEATO".to_owned()).validated(&dataset), Selection::None);
        assert_eq!(
            Selection::Alliance("NATO".to_owned()).validated(&dataset),
            Selection::Alliance("NATO".to_owned())
        );
        assert_eq!(Selection::None.into_action(), Action::ClearSelection);
    }

    proptest! {
        #[test]
        fn latitude_stays_bounded_under_any_drag(
            drags in proptest::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 0..64),
        ) {
            let mut snapshot = reduce(&VizSnapshot::default(), &Action::SetFamily(ProjectionFamily::Globe));
            for delta in drags {
                snapshot = reduce(&snapshot, &Action::RotateBy([delta.0, delta.1]));
                let [lon, lat] = snapshot.projection.rotation();
                prop_assert!((-90.0..=90.0).contains(&lat));
                prop_assert!((-180.0..180.0).contains(&lon));
            }
        }
    }
}
