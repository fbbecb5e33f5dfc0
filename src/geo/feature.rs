use serde_json::{Map, Value};

pub type LonLat = [f64; 2];
pub type Ring = Vec<LonLat>;

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    pub fn polygons(&self) -> &[Vec<Ring>] {
        match self {
            Self::Polygon(rings) => std::slice::from_ref(rings),
            Self::MultiPolygon(polygons) => polygons,
        }
    }

    pub fn point_count(&self) -> usize {
        self.polygons()
            .iter()
            .flat_map(|rings| rings.iter())
            .map(Vec::len)
            .sum()
    }

    pub fn anchor(&self) -> Option<LonLat> {
        let ring = self
            .polygons()
            .iter()
            .filter_map(|rings| rings.first())
            .max_by_key(|ring| ring.len())
            .filter(|ring| !ring.is_empty())?;
        let (lon, lat) = ring
            .iter()
            .fold((0.0, 0.0), |(lon, lat), point| (lon + point[0], lat + point[1]));
        let count = ring.len() as f64;
        Some([lon / count, lat / count])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CountryFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

const NAME_KEYS: [&str; 5] = ["name", "NAME", "ADMIN", "admin", "NAME_LONG"];

impl CountryFeature {
    pub fn new(id: Option<String>, properties: Map<String, Value>, geometry: Geometry) -> Self {
        Self {
            id,
            properties,
            geometry,
        }
    }

    pub fn name(&self) -> Option<&str> {
        NAME_KEYS.iter().find_map(|key| {
            self.properties
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
        })
    }

    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_owned)
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "Unnamed feature".to_owned())
    }

    pub fn string_properties<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
        keys.iter().filter_map(|key| {
            self.properties
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
        })
    }

    pub fn numeric_property(&self, keys: &[&str]) -> Option<u16> {
        keys.iter()
            .filter_map(|key| self.properties.get(*key))
            .find_map(numeric_value)
    }

    pub fn numeric_id(&self) -> Option<u16> {
        self.id.as_deref().and_then(|id| id.trim().parse().ok())
    }
}

fn numeric_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
