use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{interval, Duration};
use uuid::Uuid;

use chrono_interviewer::ai::{AiGateway, GeminiClient};
use chrono_interviewer::conf::Settings;
use chrono_interviewer::interview::{missing_fields, InterviewEngine, InterviewError};
use chrono_interviewer::resume::extract_contact_fields;
use chrono_interviewer::store::{
    load_snapshot, save_snapshot, Candidate, CandidateStatus, CandidateStore, Role,
};
use chrono_interviewer::sync::TabSync;

type Engine = InterviewEngine<GeminiClient>;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to read settings from environment")?;
    if settings.gemini_api_key.is_empty() {
        bail!("GEMINI_API_KEY is not set; the interview backend needs it");
    }

    println!("\n=== Chrono Interviewer ===");
    println!("AI-Powered Full Stack Developer Interview\n");

    let store = Arc::new(CandidateStore::new());
    let snapshot_path = PathBuf::from(&settings.snapshot_path);
    let restored = load_snapshot(&snapshot_path, &store)
        .map_err(|e| warn!("Snapshot ignored: {}", e))
        .unwrap_or(None);

    let client = GeminiClient::new(
        settings.gemini_api_key.clone(),
        settings.gemini_model.clone(),
        settings.gemini_base_url.clone(),
        settings.request_timeout_secs,
    );
    let engine = InterviewEngine::new(
        store.clone(),
        AiGateway::new(client),
        TabSync::global(),
        settings.timer_resume_policy,
    )
    .with_restored_interview(restored);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let candidate_id = match pick_session(&engine, &mut lines).await? {
        Some(id) => {
            // Welcome-back: re-ask a missing question, restart the live
            // countdown, or re-run a failed summary.
            if let Err(e) = engine.start_interview(&id).await {
                warn!("Resume failed: {}", e);
            }
            id
        }
        None => intake_resume(&engine, &mut lines).await?,
    };

    run_session(&engine, &candidate_id, &mut lines).await?;

    save_snapshot(&snapshot_path, &store, engine.interview_projection())
        .context("Failed to save the session snapshot")?;
    Ok(())
}

/// Lists unfinished sessions and lets the user resume one; `None` means a
/// fresh interview.
async fn pick_session(
    engine: &Engine,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<Uuid>> {
    let unfinished = engine.unfinished();
    if unfinished.is_empty() {
        return Ok(None);
    }

    println!("Welcome back! Unfinished sessions:");
    for (idx, candidate) in unfinished.iter().enumerate() {
        let name = if candidate.name.is_empty() { "(unnamed)" } else { &candidate.name };
        println!(
            "  [{}] {} - question {}/6",
            idx + 1,
            name,
            candidate.current_question_index + 1
        );
    }
    println!("Type a number to resume, or press Enter to start fresh:");

    let line = lines.next_line().await?.unwrap_or_default();
    let choice = line.trim().parse::<usize>().ok();
    Ok(choice
        .and_then(|n| unfinished.get(n.wrapping_sub(1)))
        .map(|c| c.id))
}

async fn intake_resume(engine: &Engine, lines: &mut Lines<BufReader<Stdin>>) -> Result<Uuid> {
    println!("Paste the resume text, then an empty line to finish:");
    let mut text = String::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        text.push_str(&line);
        text.push('\n');
    }

    let extracted = extract_contact_fields(&text);
    let candidate = match engine.register_candidate(extracted).await {
        Ok(candidate) => candidate,
        Err(InterviewError::ServiceUnavailable(msg)) => {
            // Candidate exists; the first question just failed to generate.
            println!("⚠️ Backend unavailable ({}). Type /retry once it recovers.", msg);
            engine
                .unfinished()
                .into_iter()
                .next()
                .context("Candidate registration failed")?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(candidate.id)
}

async fn run_session(
    engine: &Engine,
    candidate_id: &Uuid,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let mut printed = 0;
    print_transcript(&engine.candidate(candidate_id)?, &mut printed);

    let mut ticker = interval(Duration::from_secs(1));
    loop {
        let candidate = engine.candidate(candidate_id)?;
        if candidate.is_completed() {
            println!("\nInterview finished. Final score: {}/100", candidate.final_score);
            return Ok(());
        }

        tokio::select! {
            _ = ticker.tick() => {
                match engine.on_tick(candidate_id).await {
                    Ok(snapshot) => {
                        print_transcript(&snapshot, &mut printed);
                        let timer = engine.timer_state();
                        if timer.is_timer_running && matches!(timer.time_remaining, 30 | 10 | 5) {
                            println!("⏳ {}s remaining", timer.time_remaining);
                        }
                    }
                    Err(e) => println!("⚠️ {} (type /retry to try again)", e),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { return Ok(()) };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                match input {
                    "/quit" => return Ok(()),
                    "/retry" => {
                        if let Err(e) = engine.start_interview(candidate_id).await {
                            println!("⚠️ {}", e);
                        }
                    }
                    _ => handle_input(engine, candidate_id, input).await,
                }
                print_transcript(&engine.candidate(candidate_id)?, &mut printed);
            }
        }
    }
}

async fn handle_input(engine: &Engine, candidate_id: &Uuid, input: &str) {
    let Ok(candidate) = engine.candidate(candidate_id) else { return };
    let result = match candidate.status {
        CandidateStatus::InfoCollection => {
            let Some(field) = missing_fields(&candidate).into_iter().next() else {
                return;
            };
            engine.collect_field(candidate_id, field, input).await
        }
        CandidateStatus::InProgress => engine.submit_answer(candidate_id, input).await,
        CandidateStatus::Completed => return,
    };
    if let Err(e) = result {
        println!("⚠️ {} (type /retry to try again)", e);
    }
}

fn print_transcript(candidate: &Candidate, printed: &mut usize) {
    for message in candidate.messages.iter().skip(*printed) {
        let who = match message.role {
            Role::User => "You",
            Role::Assistant => "Interviewer",
            Role::System => "---",
        };
        println!("{}: {}", who, message.content);
    }
    *printed = candidate.messages.len();
}
