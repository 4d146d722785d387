use imihigo_progress::loader::{entries_from_reader, pillar_records_from_reader, records_from_catalogue};
use imihigo_progress::types::IndicatorKind;
use imihigo_progress::{
    annual_progress, district_summary, indicator_rows, pillar_rows, score_indicator, Catalogue,
    IssueKind, Quarter, Trend,
};

const CATALOGUE: &str = include_str!("../data/catalogue.json");
const ENTRIES: &str = include_str!("../data/entries.csv");

fn load() -> (Catalogue, Vec<imihigo_progress::Entry>) {
    let catalogue = Catalogue::from_json_str(CATALOGUE).unwrap();
    let (entries, report) = entries_from_reader(ENTRIES.as_bytes()).unwrap();
    assert_eq!(report.total_rows, 18);
    assert_eq!(report.parse_errors, 0);
    assert_eq!(report.deleted_rows, 1);
    assert_eq!(report.month_mismatches, 0);
    (catalogue, entries)
}

#[test]
fn test_catalogue_resolution() {
    let (catalogue, _) = load();
    assert_eq!(catalogue.total_indicator_count(), 7);

    let crops = catalogue.indicator("3").unwrap();
    assert!(matches!(&crops.kind, IndicatorKind::Composite(c) if c.len() == 2));

    let issues = catalogue.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].indicator_id, "6");
    assert_eq!(issues[0].kind, IssueKind::StandaloneDual);
}

#[test]
fn test_indicator_scores_q1() {
    let (catalogue, entries) = load();
    let score = |id: &str| score_indicator(catalogue.indicator(id).unwrap(), &entries, Quarter::Q1);

    // Cumulative overachievement is capped.
    let jobs = score("1");
    assert_eq!(jobs.progress.total_actual, 1100.0);
    assert_eq!(jobs.progress.performance, 100.0);

    // Composite: maize 4.2/4.5, beans capped at 100.
    let crops = score("3");
    assert_eq!(crops.components.len(), 2);
    assert!((crops.progress.performance - 96.6667).abs() < 1e-3);

    // Decreasing: 15 + 12 + 10 against 40.
    let stunting = score("4");
    assert_eq!(stunting.progress.total_actual, 37.0);
    assert_eq!(stunting.progress.performance, 100.0);

    // Standalone dual with a placeholder target and nothing reported.
    assert_eq!(score("6").progress.performance, 0.0);

    // The soft-deleted 60 is ignored.
    let disputes = score("7");
    assert_eq!(disputes.progress.total_actual, 35.0);
    assert_eq!(disputes.progress.performance, 70.0);
    assert_eq!(disputes.progress.trend, Trend::Improving);
}

#[test]
fn test_pillar_and_district_q1() {
    let (catalogue, entries) = load();
    let records = records_from_catalogue(&catalogue);
    let rows = pillar_rows(&records, &catalogue, &entries, Some(Quarter::Q1));
    assert_eq!(rows.len(), 3);

    let economic = &rows[0];
    assert_eq!(economic.pillar_id, "economic");
    assert_eq!(economic.pillar_indicator_count, 3);
    assert_eq!(economic.indicator_sum, 295.05);
    assert_eq!(economic.pillar_progress, 98.35);
    assert_eq!(economic.annual_progress, 42.15);

    let social = &rows[1];
    assert_eq!(social.pillar_progress, 99.41);
    assert_eq!(social.annual_progress, 28.4);

    let governance = &rows[2];
    assert_eq!(governance.pillar_progress, 35.0);
    assert_eq!(governance.annual_progress, 10.0);

    let summary = district_summary(&rows);
    assert_eq!(summary.quarters.len(), 1);
    assert_eq!(summary.quarters[0].district_progress, 80.55);
    assert_eq!(summary.degraded_pillars, 0);
}

#[test]
fn test_unknown_pillar_record_does_not_abort_batch() {
    let (catalogue, entries) = load();
    let records = pillar_records_from_reader(
        "PillarId,PillarName\neconomic,Economic\ninfrastructure,Infrastructure\ngovernance,Governance\n"
            .as_bytes(),
    )
    .unwrap();
    let rows = pillar_rows(&records, &catalogue, &entries, None);
    assert_eq!(rows.len(), 12);

    let degraded: Vec<_> = rows.iter().filter(|r| r.error.is_some()).collect();
    assert_eq!(degraded.len(), 4);
    assert!(degraded
        .iter()
        .all(|r| r.pillar_id == "infrastructure" && r.pillar_progress == 0.0 && r.annual_progress == 0.0));

    let economic_q2 = rows
        .iter()
        .find(|r| r.pillar_id == "economic" && r.quarter_id == Quarter::Q2)
        .unwrap();
    // 90 (jobs) + 98.46 (electricity) + 0 (crops) over 3.
    assert_eq!(economic_q2.pillar_progress, 62.82);

    let summary = district_summary(&rows);
    assert_eq!(summary.degraded_pillars, 1);
    assert_eq!(summary.pillar_count, 3);
}

#[test]
fn test_annual_indicator_progress_and_rows() {
    let (catalogue, entries) = load();
    let jobs = catalogue.indicator("1").unwrap();
    // q1 100, q2 90, q3 and q4 nothing reported.
    assert_eq!(annual_progress(jobs, &entries), 47.5);

    let rows = indicator_rows(&catalogue, &entries, None);
    assert_eq!(rows.len(), 28);
    let jobs_rows: Vec<_> = rows.iter().filter(|r| r.indicator_id == "1").collect();
    assert_eq!(jobs_rows.len(), 4);
    assert!(jobs_rows.iter().all(|r| r.annual_performance == 47.5));
    assert!(rows.iter().all(|r| (0.0..=100.0).contains(&r.performance)));
}

const DUALS: &str = r#"
{
  "pillars": [
    {
      "id": "governance",
      "name": "Transformational Governance",
      "indicators": [
        { "id": "8", "name": "Villages with functional committees", "isDual": true,
          "targets": { "q1": 100, "q2": 100, "q3": 100, "q4": 100 } },
        { "id": "9", "name": "Disputes settled by abunzi", "isDual": true, "measurementType": "percentage",
          "subIndicatorIds": { "x": "missing" },
          "targets": { "q1": "80%", "q2": "80%", "q3": "80%", "q4": "80%" } }
      ]
    }
  ]
}
"#;

const DUAL_ENTRIES: &str = "\
IndicatorId,QuarterId,Month,Value,SubValues,IsDeleted
8,q1,August,50,,
9,q1,July,50%,,
9,q1,September,70%,,
";

#[test]
fn test_standalone_duals_score_on_own_targets() {
    let catalogue = Catalogue::from_json_str(DUALS).unwrap();
    let (entries, _) = entries_from_reader(DUAL_ENTRIES.as_bytes()).unwrap();

    // No children declared: cumulative 50 against 100.
    let committees = catalogue.indicator("8").unwrap();
    assert!(committees.standalone_dual);
    assert_eq!(committees.kind, IndicatorKind::Simple);
    let p = score_indicator(committees, &entries, Quarter::Q1).progress;
    assert_eq!(p.performance, 50.0);

    // Declared child does not resolve: percentage mean 60 against 80.
    let disputes = catalogue.indicator("9").unwrap();
    assert!(disputes.standalone_dual);
    assert_eq!(disputes.kind, IndicatorKind::Simple);
    let p = score_indicator(disputes, &entries, Quarter::Q1).progress;
    assert_eq!(p.total_actual, 60.0);
    assert_eq!(p.performance, 75.0);

    // The anomaly stays visible.
    let kinds: Vec<IssueKind> = catalogue
        .issues()
        .iter()
        .filter(|i| i.indicator_id == "9")
        .map(|i| i.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![IssueKind::UnresolvedSubIndicator, IssueKind::StandaloneDual]
    );

    let records = records_from_catalogue(&catalogue);
    let rows = pillar_rows(&records, &catalogue, &entries, Some(Quarter::Q1));
    assert_eq!(rows[0].pillar_progress, 62.5);
}
