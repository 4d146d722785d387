// Entry point and interactive CLI flow.
//
// - Option [1] loads the indicator catalogue, pillar records and submissions,
//   printing diagnostics and catalogue anomalies.
// - Option [2] asks for a quarter (or all), generates the indicator, pillar
//   and district reports, and previews them.
// - After generating reports, the user can go back to the menu or exit.
use anyhow::Context;
use imihigo_progress::config::{self, Config};
use imihigo_progress::types::{Entry, PillarRecord, Quarter};
use imihigo_progress::{loader, logging, output, reports, util, Catalogue};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

// Loaded once, reported many times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<LoadedData>,
}

#[derive(Clone)]
struct LoadedData {
    catalogue: Catalogue,
    records: Vec<PillarRecord>,
    entries: Vec<Entry>,
}

/// `None` once the input is closed or unreadable.
fn read_trimmed_line(reader: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_trimmed_line(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N` or
/// closed the input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(input) = prompt("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match input.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Blank input (or closed input) means all quarters.
fn prompt_quarter() -> Option<Quarter> {
    loop {
        let input = prompt("Quarter (q1-q4, blank for all): ").unwrap_or_default();
        if input.is_empty() {
            return None;
        }
        match Quarter::parse(&input) {
            Some(q) => return Some(q),
            None => println!("Invalid quarter. Please enter q1, q2, q3 or q4."),
        }
    }
}

fn load_all(config: &Config) -> anyhow::Result<LoadedData> {
    let catalogue_path = config.catalogue_path();
    let catalogue = Catalogue::from_path(&catalogue_path)
        .with_context(|| format!("loading catalogue {}", catalogue_path.display()))?;

    let records = match config.pillars_path() {
        Some(path) => loader::load_pillar_records(&path)
            .with_context(|| format!("loading pillar records {}", path.display()))?,
        None => loader::records_from_catalogue(&catalogue),
    };

    let entries_path = config.entries_path();
    let (entries, report) = loader::load_entries(&entries_path)
        .with_context(|| format!("loading submissions {}", entries_path.display()))?;

    println!(
        "Catalogue: {} pillars, {} indicators ({} pillar records).",
        util::format_int(catalogue.pillars().len()),
        util::format_int(catalogue.total_indicator_count()),
        util::format_int(records.len())
    );
    println!(
        "Processing submissions... ({} rows read, {} loaded)",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_rows)
    );
    println!(
        "Note: {} rows skipped due to parse/validation errors.",
        util::format_int(report.parse_errors)
    );
    if report.deleted_rows > 0 {
        println!(
            "Info: {} soft-deleted rows will be ignored.",
            util::format_int(report.deleted_rows)
        );
    }
    if report.month_mismatches > 0 {
        println!(
            "Warning: {} rows have a month outside their quarter.",
            util::format_int(report.month_mismatches)
        );
    }
    if !catalogue.issues().is_empty() {
        println!("Catalogue warnings:");
        for issue in catalogue.issues() {
            println!("  - {}", issue);
        }
    }
    println!();

    Ok(LoadedData {
        catalogue,
        records,
        entries,
    })
}

fn handle_load(config: &Config) {
    match load_all(config) {
        Ok(data) => {
            let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
            state.data = Some(data);
        }
        Err(e) => {
            tracing::error!("load failed: {e:#}");
            eprintln!("Failed to load data: {:#}\n", e);
        }
    }
}

fn generate_reports(config: &Config, data: &LoadedData, quarter: Option<Quarter>) -> anyhow::Result<()> {
    let out_dir = config.output_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let preview = config.output.preview_rows;
    let scope = quarter.map(|q| q.id().to_uppercase()).unwrap_or_else(|| "Q1-Q4".to_string());

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out_dir.display());

    let indicators = reports::indicator_rows(&data.catalogue, &data.entries, quarter);
    let file1 = out_dir.join("indicator_progress.csv");
    output::write_csv(&file1, &indicators)?;
    output::preview_table("Indicator Progress", Some(scope.as_str()), &indicators, preview);
    println!("(Full table exported to {})\n", file1.display());

    let pillars = reports::pillar_rows(&data.records, &data.catalogue, &data.entries, quarter);
    let file2 = out_dir.join("pillar_progress.csv");
    output::write_csv(&file2, &pillars)?;
    output::preview_table("Pillar Progress", Some(scope.as_str()), &pillars, preview * 4);
    println!("(Full table exported to {})\n", file2.display());

    let summary = reports::district_summary(&pillars);
    let file3 = out_dir.join("district_summary.json");
    output::write_json(&file3, &summary)?;
    output::preview_table("District Progress", None, &summary.quarters, 4);
    println!(
        "Summary ({}): annual average {}%, {} pillars, {} degraded\n",
        file3.display(),
        util::format_number(summary.annual_average, 2),
        summary.pillar_count,
        summary.degraded_pillars
    );
    Ok(())
}

fn handle_generate_reports(config: &Config) {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };

    let quarter = prompt_quarter();
    println!();
    if let Err(e) = generate_reports(config, &data, quarter) {
        tracing::error!("report generation failed: {e:#}");
        eprintln!("Write error: {:#}", e);
    }
}

fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    logging::initialize(&config.logging.level);
    tracing::info!(base_dir = %config.base_dir.display(), "configuration loaded");

    loop {
        println!("Imihigo Progress Reports");
        println!("[1] Load catalogue and submissions");
        println!("[2] Generate progress reports\n");
        let Some(choice) = read_choice() else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&config),
            "2" => {
                println!();
                handle_generate_reports(&config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    Ok(())
}
