use std::path::PathBuf;

use anyhow::{Context, Result};

use chrono_interviewer::conf::Settings;
use chrono_interviewer::store::{load_snapshot, CandidateStatus, CandidateStore};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to read settings from environment")?;
    let path = PathBuf::from(&settings.snapshot_path);

    println!("🔧 Listing candidates from {}...", path.display());

    let store = CandidateStore::new();
    load_snapshot(&path, &store).context("Failed to load snapshot")?;

    let candidates = store.list();
    println!("\n📋 Found {} candidate(s):", candidates.len());
    println!("{:-<100}", "");
    println!(
        "{:<38} {:<22} {:<16} {:<10} {:<10}",
        "Candidate ID", "Name", "Status", "Progress", "Score"
    );
    println!("{:-<100}", "");

    for candidate in &candidates {
        let status = match candidate.status {
            CandidateStatus::InfoCollection => "info-collection",
            CandidateStatus::InProgress => "in-progress",
            CandidateStatus::Completed => "completed",
        };
        let score = if candidate.is_completed() {
            format!("{}/100", candidate.final_score)
        } else {
            "-".to_string()
        };
        let name = if candidate.name.is_empty() {
            "(unnamed)"
        } else {
            &candidate.name
        };
        println!(
            "{:<38} {:<22} {:<16} {:<10} {:<10}",
            candidate.id,
            name,
            status,
            format!("{}/6", candidate.questions.len()),
            score
        );
    }

    Ok(())
}
