use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::dataset::Dataset;
use super::relations::{AllianceMembership, parse_alliances, parse_relations};
use super::topology::parse_features;

#[derive(Clone, Debug)]
pub struct DataSources {
    pub topology: PathBuf,
    pub relations: PathBuf,
    pub alliances: Option<PathBuf>,
    pub object: Option<String>,
}

fn read_source(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} file {}", path.display()))
}

pub fn load_dataset(sources: &DataSources) -> Result<Dataset> {
    let topology_raw = read_source(&sources.topology, "topology")?;
    let features = parse_features(&topology_raw, sources.object.as_deref())
        .with_context(|| format!("failed to parse topology {}", sources.topology.display()))?;

    let relations_raw = read_source(&sources.relations, "relationship")?;
    let relations = parse_relations(&relations_raw)
        .with_context(|| format!("failed to parse relationships {}", sources.relations.display()))?;

    let alliances = match &sources.alliances {
        Some(path) => {
            let raw = read_source(path, "alliance")?;
            parse_alliances(&raw)
                .with_context(|| format!("failed to parse alliances {}", path.display()))?
        }
        None => AllianceMembership::default(),
    };

    info!(
        topology = %sources.topology.display(),
        relations = %sources.relations.display(),
        features = features.len(),
        points = features.iter().map(|feature| feature.geometry.point_count()).sum::<usize>(),
        "loaded data sources"
    );
    Ok(Dataset::new(features, relations, alliances))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn temp_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn loads_all_sources_and_resolves_codes() {
        let topology = temp_json(
            r#"{ "type": "FeatureCollection", "features": [
                { "type": "Feature", "properties": { "name": "France", "iso_a3": "FRA" },
                  "geometry": { "type": "Polygon", "coordinates": [[[0,40],[8,40],[8,50],[0,50],[0,40]]] } },
                { "type": "Feature", "properties": { "name": "Nowhere" },
                  "geometry": { "type": "Polygon", "coordinates": [[[20,0],[21,0],[21,1],[20,0]]] } }
            ] }"#,
        );
        let relations = temp_json(r#"{ "FRA": { "name": "France", "relations": { "DEU": 7 } } }"#);
        let alliances = temp_json(r#"{ "EU": ["FRA", "DEU"] }"#);

        let dataset = load_dataset(&DataSources {
            topology: topology.path().to_path_buf(),
            relations: relations.path().to_path_buf(),
            alliances: Some(alliances.path().to_path_buf()),
            object: None,
        })
        .expect("dataset loads");

        assert_eq!(dataset.features.len(), 2);
        assert_eq!(dataset.code_of(0), Some("FRA"));
        assert_eq!(dataset.code_of(1), None);
        assert_eq!(dataset.index_of("FRA"), Some(0));
        assert_eq!(dataset.resolved_count(), 1);
        assert!(dataset.alliances.is_member("EU", "FRA"));
        assert_eq!(dataset.name_of("FRA"), "France");
        assert_eq!(dataset.name_of("DEU"), "DEU");
    }

    #[test]
    fn missing_files_report_the_path() {
        let error = load_dataset(&DataSources {
            topology: PathBuf::from("/definitely/missing/topology.json"),
            relations: PathBuf::from("/definitely/missing/relations.json"),
            alliances: None,
            object: None,
        })
        .expect_err("missing topology");
        assert!(format!("{error:#}").contains("/definitely/missing/topology.json"));
    }
}
