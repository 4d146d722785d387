// Indicator catalogue: pillars, indicators and composite structure.
//
// The source data describes the parent to children edge of a composite
// indicator in up to three overlapping ways (inline `subIndicators`, a
// `subIndicatorIds` key to id map, and the top-level sub-indicator list the
// ids point into). Everything is resolved once here so the engine only ever
// sees `IndicatorKind`.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::LoadError;
use crate::types::{Indicator, IndicatorKind, MeasurementType, RawTargets, SubIndicator, Targets};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalogue {
    #[serde(default)]
    pillars: Vec<RawPillar>,
    #[serde(default)]
    sub_indicators: Vec<RawSubIndicator>,
}

#[derive(Debug, Deserialize)]
struct RawPillar {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    indicators: Vec<RawIndicator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIndicator {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    targets: RawTargets,
    measurement_type: Option<String>,
    #[serde(default)]
    is_dual: bool,
    #[serde(default)]
    sub_indicator_ids: BTreeMap<String, String>,
    #[serde(default)]
    sub_indicators: Vec<RawSubIndicator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubIndicator {
    id: Option<String>,
    key: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    targets: RawTargets,
    measurement_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Dual indicator with no resolvable children, scored on its own targets.
    StandaloneDual,
    /// A declared child resolves neither inline nor through the catalogue.
    UnresolvedSubIndicator,
    /// The same child is defined twice with different targets.
    ConflictingSubTargets,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueIssue {
    pub indicator_id: String,
    pub kind: IssueKind,
    pub detail: String,
}

impl fmt::Display for CatalogueIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indicator {}: {}", self.indicator_id, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pillar {
    pub id: String,
    pub name: String,
    pub indicators: Vec<Indicator>,
}

/// Immutable reference data for one planning cycle. Load once at start-up
/// and share it by reference.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    pillars: Vec<Pillar>,
    issues: Vec<CatalogueIssue>,
}

impl Catalogue {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(s: &str) -> Result<Self, LoadError> {
        let raw: RawCatalogue = serde_json::from_str(s)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalogue) -> Result<Self, LoadError> {
        let mut issues = Vec::new();
        let registry = build_registry(&raw.sub_indicators, &mut issues);

        let mut seen: HashSet<String> = HashSet::new();
        let mut pillars = Vec::with_capacity(raw.pillars.len());
        for rp in raw.pillars {
            let mut indicators = Vec::with_capacity(rp.indicators.len());
            for ri in rp.indicators {
                let id = ri.id.trim().to_string();
                if !seen.insert(id.clone()) {
                    return Err(LoadError::DuplicateIndicator(id));
                }
                indicators.push(resolve_indicator(ri, &registry, &mut issues));
            }
            pillars.push(Pillar {
                id: rp.id.trim().to_string(),
                name: rp.name,
                indicators,
            });
        }

        for issue in &issues {
            tracing::warn!(kind = ?issue.kind, "catalogue: {}", issue);
        }
        tracing::info!(
            pillars = pillars.len(),
            indicators = seen.len(),
            issues = issues.len(),
            "catalogue loaded"
        );
        Ok(Catalogue { pillars, issues })
    }

    pub fn new(pillars: Vec<Pillar>) -> Self {
        Catalogue { pillars, issues: Vec::new() }
    }

    pub fn pillars(&self) -> &[Pillar] {
        &self.pillars
    }

    pub fn pillar(&self, id: &str) -> Option<&Pillar> {
        let id = id.trim();
        self.pillars.iter().find(|p| p.id == id)
    }

    pub fn indicator(&self, id: &str) -> Option<&Indicator> {
        self.pillars
            .iter()
            .flat_map(|p| p.indicators.iter())
            .find(|i| i.id == id)
    }

    /// Indicator count across every pillar; the denominator of district-wide
    /// progress.
    pub fn total_indicator_count(&self) -> usize {
        self.pillars.iter().map(|p| p.indicators.len()).sum()
    }

    pub fn issues(&self) -> &[CatalogueIssue] {
        &self.issues
    }
}

struct RegistryEntry {
    name: String,
    targets: Targets,
    measurement: Option<MeasurementType>,
}

fn build_registry(
    raw: &[RawSubIndicator],
    issues: &mut Vec<CatalogueIssue>,
) -> HashMap<String, RegistryEntry> {
    let mut registry: HashMap<String, RegistryEntry> = HashMap::new();
    for rs in raw {
        let Some(id) = rs.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let targets = Targets::from_raw(&rs.targets);
        match registry.get(id) {
            Some(existing) if existing.targets != targets => {
                issues.push(CatalogueIssue {
                    indicator_id: id.to_string(),
                    kind: IssueKind::ConflictingSubTargets,
                    detail: format!(
                        "sub-indicator {} is defined twice with different targets ({:?} vs {:?}); keeping the first",
                        id, existing.targets, targets
                    ),
                });
            }
            Some(_) => {}
            None => {
                registry.insert(
                    id.to_string(),
                    RegistryEntry {
                        name: rs.name.clone(),
                        targets,
                        measurement: rs
                            .measurement_type
                            .as_deref()
                            .map(|t| MeasurementType::from_tag(Some(t))),
                    },
                );
            }
        }
    }
    registry
}

fn resolve_indicator(
    ri: RawIndicator,
    registry: &HashMap<String, RegistryEntry>,
    issues: &mut Vec<CatalogueIssue>,
) -> Indicator {
    let id = ri.id.trim().to_string();
    let measurement = MeasurementType::from_tag(ri.measurement_type.as_deref());
    let targets = Targets::from_raw(&ri.targets);
    let name = if ri.name.is_empty() { id.clone() } else { ri.name };

    let mut children: Vec<SubIndicator> = Vec::new();
    let mut declared = 0usize;

    for rs in &ri.sub_indicators {
        let Some(key) = rs
            .key
            .as_deref()
            .or(rs.id.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
        else {
            declared += 1;
            issues.push(CatalogueIssue {
                indicator_id: id.clone(),
                kind: IssueKind::UnresolvedSubIndicator,
                detail: "inline sub-indicator has neither key nor id".to_string(),
            });
            continue;
        };
        declared += 1;
        let child = SubIndicator {
            key: key.to_string(),
            id: rs
                .id
                .clone()
                .or_else(|| ri.sub_indicator_ids.get(key).cloned()),
            name: if rs.name.is_empty() { key.to_string() } else { rs.name.clone() },
            measurement: rs
                .measurement_type
                .as_deref()
                .map(|t| MeasurementType::from_tag(Some(t)))
                .unwrap_or(measurement),
            targets: Targets::from_raw(&rs.targets),
        };
        if let Some(linked) = ri.sub_indicator_ids.get(key).and_then(|sid| registry.get(sid)) {
            if linked.targets != child.targets {
                issues.push(CatalogueIssue {
                    indicator_id: id.clone(),
                    kind: IssueKind::ConflictingSubTargets,
                    detail: format!(
                        "sub-indicator {} has inline targets {:?} but catalogue targets {:?}; using inline",
                        key, child.targets, linked.targets
                    ),
                });
            }
        }
        children.push(child);
    }

    for (key, sub_id) in &ri.sub_indicator_ids {
        if children.iter().any(|c| &c.key == key) {
            continue;
        }
        declared += 1;
        match registry.get(sub_id.trim()) {
            Some(entry) => children.push(SubIndicator {
                key: key.clone(),
                id: Some(sub_id.trim().to_string()),
                name: if entry.name.is_empty() { key.clone() } else { entry.name.clone() },
                measurement: entry.measurement.unwrap_or(measurement),
                targets: entry.targets,
            }),
            None => issues.push(CatalogueIssue {
                indicator_id: id.clone(),
                kind: IssueKind::UnresolvedSubIndicator,
                detail: format!("sub-indicator {} points at unknown id {}", key, sub_id),
            }),
        }
    }

    // Dual with nothing to score against falls back to its own targets.
    let standalone_dual = children.is_empty() && (ri.is_dual || declared > 0);
    if standalone_dual {
        let detail = if declared == 0 {
            "marked dual but declares no sub-indicators; scoring on its own targets"
        } else {
            "none of its sub-indicators resolve; scoring on its own targets"
        };
        issues.push(CatalogueIssue {
            indicator_id: id.clone(),
            kind: IssueKind::StandaloneDual,
            detail: detail.to_string(),
        });
    }
    let kind = if children.is_empty() {
        IndicatorKind::Simple
    } else {
        IndicatorKind::Composite(children)
    };

    Indicator {
        id,
        name,
        measurement,
        targets,
        kind,
        standalone_dual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    {
      "pillars": [
        {
          "id": "economic",
          "name": "Economic Transformation",
          "indicators": [
            { "id": "1", "name": "Jobs created", "targets": { "q1": "1,000", "q2": 500, "q3": "-", "q4": null, "annual": "1,500" } },
            { "id": "2", "name": "Households with electricity", "measurementType": "percentage", "targets": { "q1": "80%", "q2": "82%", "q3": "85%", "q4": "90%" } },
            {
              "id": "3", "name": "Crop productivity", "isDual": true,
              "subIndicatorIds": { "maize": "3a", "beans": "3b" },
              "subIndicators": [ { "key": "maize", "name": "Maize", "targets": { "q1": 4, "q2": 4, "q3": 4, "q4": 4 } } ]
            }
          ]
        },
        {
          "id": "governance",
          "name": "Transformational Governance",
          "indicators": [
            { "id": "4", "name": "Citizen satisfaction", "isDual": true, "targets": { "q1": 70 } },
            { "id": "5", "name": "Land disputes", "isDual": true, "subIndicatorIds": { "x": "missing" } }
          ]
        }
      ],
      "subIndicators": [
        { "id": "3a", "name": "Maize", "targets": { "q1": 5, "q2": 5, "q3": 5, "q4": 5 } },
        { "id": "3b", "name": "Beans", "measurementType": "percentage", "targets": { "q1": 2, "q2": 2, "q3": 2, "q4": 2 } }
      ]
    }
    "#;

    #[test]
    fn test_targets_are_normalized_on_load() {
        let cat = Catalogue::from_json_str(SAMPLE).unwrap();
        let jobs = cat.indicator("1").unwrap();
        assert_eq!(jobs.targets.q1, 1000.0);
        assert_eq!(jobs.targets.q2, 500.0);
        assert_eq!(jobs.targets.q3, 0.0);
        assert_eq!(jobs.targets.q4, 0.0);
        assert_eq!(jobs.targets.annual, 1500.0);
        assert_eq!(jobs.measurement, MeasurementType::Cumulative);
        assert_eq!(
            cat.indicator("2").unwrap().measurement,
            MeasurementType::Percentage
        );
    }

    #[test]
    fn test_composite_resolution_and_conflict() {
        let cat = Catalogue::from_json_str(SAMPLE).unwrap();
        let crops = cat.indicator("3").unwrap();
        let IndicatorKind::Composite(children) = &crops.kind else {
            panic!("expected composite, got {:?}", crops.kind);
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].key, "maize");
        assert_eq!(children[0].targets.q1, 4.0);
        assert_eq!(children[0].id.as_deref(), Some("3a"));
        assert_eq!(children[1].key, "beans");
        assert_eq!(children[1].measurement, MeasurementType::Percentage);

        assert!(cat
            .issues()
            .iter()
            .any(|i| i.indicator_id == "3" && i.kind == IssueKind::ConflictingSubTargets));
    }

    #[test]
    fn test_standalone_dual_and_unresolved() {
        let cat = Catalogue::from_json_str(SAMPLE).unwrap();
        let satisfaction = cat.indicator("4").unwrap();
        assert_eq!(satisfaction.kind, IndicatorKind::Simple);
        assert!(satisfaction.standalone_dual);

        // Declared children that all fail to resolve fall back to own targets.
        let disputes = cat.indicator("5").unwrap();
        assert_eq!(disputes.kind, IndicatorKind::Simple);
        assert!(disputes.standalone_dual);

        let kinds_for = |id: &str| -> Vec<IssueKind> {
            cat.issues()
                .iter()
                .filter(|i| i.indicator_id == id)
                .map(|i| i.kind)
                .collect()
        };
        assert_eq!(kinds_for("4"), vec![IssueKind::StandaloneDual]);
        assert_eq!(
            kinds_for("5"),
            vec![IssueKind::UnresolvedSubIndicator, IssueKind::StandaloneDual]
        );
    }

    #[test]
    fn test_counts_and_lookup() {
        let cat = Catalogue::from_json_str(SAMPLE).unwrap();
        assert_eq!(cat.total_indicator_count(), 5);
        assert_eq!(cat.pillar(" economic ").unwrap().indicators.len(), 3);
        assert!(cat.pillar("social").is_none());
    }

    #[test]
    fn test_duplicate_registry_targets_flagged() {
        let json = r#"{
          "pillars": [],
          "subIndicators": [
            { "id": "3a", "targets": { "q1": 5 } },
            { "id": "3a", "targets": { "q1": 6 } }
          ]
        }"#;
        let cat = Catalogue::from_json_str(json).unwrap();
        assert_eq!(cat.issues().len(), 1);
        assert_eq!(cat.issues()[0].kind, IssueKind::ConflictingSubTargets);
    }

    #[test]
    fn test_duplicate_indicator_id_is_error() {
        let json = r#"{ "pillars": [
          { "id": "a", "indicators": [ { "id": "1" } ] },
          { "id": "b", "indicators": [ { "id": "1" } ] }
        ] }"#;
        match Catalogue::from_json_str(json) {
            Err(LoadError::DuplicateIndicator(id)) => assert_eq!(id, "1"),
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }
}
