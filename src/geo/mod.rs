mod collect;
mod dataset;
mod feature;
mod relations;
mod resolver;
mod topology;

pub use collect::{DataSources, load_dataset};
pub use dataset::{CountryLookup, Dataset};
pub use feature::{CountryFeature, Geometry, LonLat, Ring};
pub use relations::{AllianceMembership, CountryCode, RelationshipData, RelationshipEntry};
