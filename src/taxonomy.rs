use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// SF Planning neighborhoods, used when no taxonomy file is supplied.
const DEFAULT_NEIGHBORHOODS: &[&str] = &[
    "Bayview",
    "Bernal Heights",
    "Castro/Upper Market",
    "Chinatown",
    "Civic Center/Tenderloin",
    "Downtown/Union Square",
    "Excelsior",
    "Financial District",
    "Glen Park",
    "Haight Ashbury",
    "Hayes Valley",
    "Inner Richmond",
    "Inner Sunset",
    "Japantown",
    "Lower Haight",
    "Marina",
    "Mission",
    "Mission Bay",
    "Nob Hill",
    "Noe Valley",
    "North Beach",
    "Outer Richmond",
    "Outer Sunset",
    "Pacific Heights",
    "Potrero Hill",
    "Russian Hill",
    "SOMA",
    "Sunset/Parkside",
    "Twin Peaks",
    "Visitacion Valley",
    "Western Addition",
];

/// The neighborhood vocabulary the model is asked to draw labels from, plus a
/// lowercase alias map for spot-check tooling.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub neighborhoods: Vec<String>,
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyRecord {
    #[serde(default)]
    canonical: String,
    #[serde(default)]
    aliases: String,
}

impl Taxonomy {
    pub fn default_neighborhoods() -> Self {
        Self {
            neighborhoods: DEFAULT_NEIGHBORHOODS.iter().map(|s| s.to_string()).collect(),
            aliases: HashMap::new(),
        }
    }

    /// Load the taxonomy from a CSV with `canonical` and pipe-separated
    /// `aliases` columns. A missing file falls back to the built-in list; a
    /// present but unreadable file is a fatal pre-flight error.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            crate::warn!(
                "{} not found; using default SF neighborhoods",
                path.display()
            );
            return Ok(Self::default_neighborhoods());
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let mut neighborhoods = Vec::new();
        let mut aliases = HashMap::new();
        for record in reader.deserialize() {
            let record: TaxonomyRecord = record
                .with_context(|| format!("failed to parse row in {}", path.display()))?;
            let canonical = record.canonical.trim();
            if canonical.is_empty() {
                continue;
            }
            neighborhoods.push(canonical.to_string());
            aliases.insert(canonical.to_lowercase(), canonical.to_string());
            for alias in record.aliases.split('|') {
                let alias = alias.trim();
                if !alias.is_empty() {
                    aliases.insert(alias.to_lowercase(), canonical.to_string());
                }
            }
        }

        Ok(Self {
            neighborhoods,
            aliases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_canonical_names_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neighborhood_list.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "canonical,aliases").unwrap();
        writeln!(file, "Mission,The Mission|Mission District").unwrap();
        writeln!(file, "SOMA,South of Market").unwrap();
        writeln!(file, ",").unwrap();
        drop(file);

        let taxonomy = Taxonomy::load(&path).unwrap();
        assert_eq!(taxonomy.neighborhoods, vec!["Mission", "SOMA"]);
        assert_eq!(taxonomy.aliases.get("the mission").unwrap(), "Mission");
        assert_eq!(taxonomy.aliases.get("south of market").unwrap(), "SOMA");
        assert_eq!(taxonomy.aliases.get("soma").unwrap(), "SOMA");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let taxonomy = Taxonomy::load(Path::new("/nonexistent/neighborhoods.csv")).unwrap();
        assert!(taxonomy.neighborhoods.iter().any(|n| n == "Mission"));
        assert!(taxonomy.aliases.is_empty());
    }
}
