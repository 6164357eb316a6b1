use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use repcounter::csv_loader::load_frames_from_csv;
use repcounter::{EngineEvent, ExerciseProfile, RepEngine, SessionConfig, SessionController};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Uso: replay_csv [--json] [--sets N] [--reps N] [--rest S] <perfil|perfil.json> <grabacion.csv>";

struct ReplayOptions {
    json: bool,
    session: SessionConfig,
}

fn parse_args() -> Result<(String, PathBuf, ReplayOptions)> {
    let mut json = false;
    let mut session = SessionConfig::default();
    let mut positional: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--sets" | "--reps" | "--rest" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Falta el valor de {}", arg))?;
                let n: u32 = value
                    .parse()
                    .with_context(|| format!("Valor inválido para {}: {}", arg, value))?;
                match arg.as_str() {
                    "--sets" => session.total_sets = n,
                    "--reps" => session.target_reps = n,
                    _ => session.rest_secs = n as u64,
                }
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!("{}", USAGE);
    }
    let csv_path = PathBuf::from(positional.remove(1));
    let profile = positional.remove(0);
    Ok((profile, csv_path, ReplayOptions { json, session }))
}

fn print_event(event: &EngineEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        EngineEvent::RepetitionCounted { .. } => println!("✅ {}", event),
        EngineEvent::InvalidFrame { .. } => println!("⚠️  {}", event),
        EngineEvent::SetCompleted { .. } | EngineEvent::SessionCompleted { .. } => {
            println!("🏁 {}", event)
        }
        _ => println!("   {}", event),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (profile_arg, csv_path, opts) = parse_args()?;

    let profile = ExerciseProfile::resolve(&profile_arg)
        .with_context(|| format!("No se pudo cargar el perfil '{}'", profile_arg))?;
    let frames = load_frames_from_csv(&csv_path)?;

    if !opts.json {
        println!(
            "🎞️  Reproduciendo {} frames de {:?} con el perfil '{}'",
            frames.len(),
            csv_path,
            profile.name
        );
    }

    let mut engine = RepEngine::new(Arc::new(profile));
    let mut session = SessionController::new(opts.session.clone())?;
    for event in session.start() {
        print_event(&event, opts.json)?;
    }

    // El reloj de la sesión avanza con las marcas de tiempo de la grabación
    let mut last_ts: Option<u64> = None;
    for frame in &frames {
        if let Some(prev) = last_ts {
            let elapsed = Duration::from_millis(frame.timestamp_ms.saturating_sub(prev));
            for event in session.tick(elapsed) {
                print_event(&event, opts.json)?;
            }
        }
        last_ts = Some(frame.timestamp_ms);

        engine.set_counting_enabled(session.is_accepting_reps());
        for event in engine.process(frame) {
            print_event(&event, opts.json)?;
            if event.is_repetition() {
                for session_event in session.on_repetition() {
                    print_event(&session_event, opts.json)?;
                }
            }
        }
    }

    if !opts.json {
        let snapshot = session.snapshot();
        println!("\n📊 Total de repeticiones: {}", engine.total());
        println!(
            "   Serie {}/{} ({} reps en curso), por serie: {:?}",
            snapshot.set_index, snapshot.total_sets, snapshot.reps_in_set, snapshot.reps_per_set
        );
    }

    Ok(())
}
