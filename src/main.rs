/*
Contador de repeticiones en tiempo real a partir de landmarks de pose.

Lee frames como JSON (uno por línea) desde stdin, por ejemplo desde el
proceso que ejecuta el modelo de pose, y escribe los eventos como JSON en
stdout. Las líneas que no empiezan por '{' son comandos de control:

    reset        reset del ciclo actual (conserva el total)
    reset-all    reset completo, borra el total
    switch       cambio de cámara
    pause        pausa los temporizadores de la sesión
    resume       reanuda los temporizadores

Para ejecutar:
    ./target/release/repcounter squat --sets 3 --reps 12 --rest 30 < frames.jsonl
    RUST_LOG=repcounter=debug ./target/release/repcounter perfiles/curl.json
*/

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{select, unbounded, Sender};
use std::env;
use std::io::{self, BufRead};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use repcounter::runtime::DEFAULT_TICK;
use repcounter::{
    EngineEvent, ExerciseProfile, LandmarkFrame, LatestFrameSender, Runtime, SessionConfig,
};

const USAGE: &str =
    "Uso: repcounter <perfil|perfil.json> [--sets N] [--reps N] [--rest S] [--time-limit S]";

/// Comandos de control recibidos por stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reset { clear_total: bool },
    SwitchSource,
    Pause,
    Resume,
}

fn parse_command(line: &str) -> Option<Command> {
    match line {
        "reset" => Some(Command::Reset { clear_total: false }),
        "reset-all" => Some(Command::Reset { clear_total: true }),
        "switch" => Some(Command::SwitchSource),
        "pause" => Some(Command::Pause),
        "resume" => Some(Command::Resume),
        _ => None,
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(String, SessionConfig)> {
    let mut config = SessionConfig::default();
    let mut profile: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sets" | "--reps" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Falta el valor de {}", arg))?;
                let n: u32 = value
                    .parse()
                    .with_context(|| format!("Valor inválido para {}: {}", arg, value))?;
                if arg == "--sets" {
                    config.total_sets = n;
                } else {
                    config.target_reps = n;
                }
            }
            "--rest" | "--time-limit" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Falta el valor de {}", arg))?;
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Valor inválido para {}: {}", arg, value))?;
                if arg == "--rest" {
                    config.rest_secs = secs;
                } else {
                    config.set_time_limit_secs = Some(secs);
                }
            }
            "-h" | "--help" => bail!("{}", USAGE),
            _ => {
                if profile.is_some() {
                    bail!("{}", USAGE);
                }
                profile = Some(arg);
            }
        }
    }

    let profile = profile.ok_or_else(|| anyhow!("{}", USAGE))?;
    Ok((profile, config))
}

/// Hilo productor: frames al worker, comandos al hilo principal.
/// Al cerrarse stdin se sueltan ambos canales.
fn spawn_stdin_reader(frames: LatestFrameSender, commands: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for (line_idx, line) in stdin.lock().lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("❌ Error leyendo stdin: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('{') {
                match serde_json::from_str::<LandmarkFrame>(line) {
                    Ok(frame) => {
                        if frames.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("línea {}: frame inválido: {}", line_idx + 1, e),
                }
            } else if let Some(cmd) = parse_command(line) {
                if commands.send(cmd).is_err() {
                    break;
                }
            } else {
                warn!("línea {}: comando desconocido '{}'", line_idx + 1, line);
            }
        }
    });
}

/// JSON por stdout y una línea legible por stderr para los eventos importantes
fn print_event(event: &EngineEvent) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    match event {
        EngineEvent::RepetitionCounted { .. } => eprintln!("✅ {}", event),
        EngineEvent::SessionCompleted { .. } => eprintln!("🏁 {}", event),
        EngineEvent::SetCompleted { .. }
        | EngineEvent::RestStarted { .. }
        | EngineEvent::SetStarted { .. } => eprintln!("📋 {}", event),
        _ => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let (profile_arg, config) = parse_args(env::args().skip(1))?;

    eprintln!("🏋️  Contador de repeticiones\n");
    let profile = ExerciseProfile::resolve(&profile_arg)
        .with_context(|| format!("No se pudo cargar el perfil '{}'", profile_arg))?;
    eprintln!("✅ Perfil '{}' cargado", profile.name);
    eprintln!(
        "🎯 {} series x {} reps, descanso {} s\n",
        config.total_sets, config.target_reps, config.rest_secs
    );

    let (mut runtime, frames) = Runtime::spawn(Arc::new(profile), config, DEFAULT_TICK)?;
    let frame_stats = frames.clone();
    let (cmd_tx, cmd_rx) = unbounded::<Command>();
    spawn_stdin_reader(frames, cmd_tx);

    eprintln!("🎬 Esperando frames en stdin...\n");

    'events: loop {
        select! {
            recv(runtime.events()) -> msg => {
                let event = match msg {
                    Ok(event) => event,
                    Err(_) => break 'events,
                };
                print_event(&event)?;
                if matches!(event, EngineEvent::SessionCompleted { .. }) {
                    break 'events;
                }
            }
            recv(cmd_rx) -> msg => {
                match msg {
                    Ok(Command::Reset { clear_total }) => {
                        runtime.reset(clear_total)?;
                        eprintln!("🔄 Reset (total borrado: {})", clear_total);
                    }
                    Ok(Command::SwitchSource) => {
                        runtime.switch_source()?;
                        eprintln!("📷 Cambio de cámara");
                    }
                    Ok(Command::Pause) => runtime.pause_timers()?,
                    Ok(Command::Resume) => runtime.resume_timers()?,
                    Err(_) => {
                        eprintln!("\n👋 Fin de la entrada");
                        break 'events;
                    }
                }
            }
        }
    }

    // Primero se detienen los hilos, así los eventos del último frame ya están en el canal
    runtime.stop()?;
    for event in runtime.events().try_iter() {
        print_event(&event)?;
    }

    let snapshot = runtime.engine_snapshot();
    let session = runtime.session_snapshot();
    eprintln!(
        "📊 Total: {} reps ({} frames, {} descartados), por serie: {:?}",
        snapshot.total,
        snapshot.frames_processed,
        frame_stats.dropped_frames(),
        session.reps_per_set
    );
    runtime.shutdown()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_session_flags() {
        let (profile, config) =
            parse_args(args(&["squat", "--sets", "4", "--reps", "12", "--rest", "30"])).unwrap();
        assert_eq!(profile, "squat");
        assert_eq!(config.total_sets, 4);
        assert_eq!(config.target_reps, 12);
        assert_eq!(config.rest_secs, 30);
        assert_eq!(config.set_time_limit_secs, None);
    }

    #[test]
    fn test_rep_count_out_of_range_is_rejected() {
        assert!(parse_args(args(&["squat", "--reps", "4294967297"])).is_err());
        assert!(parse_args(args(&["squat", "--sets", "-1"])).is_err());
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_command("reset-all"),
            Some(Command::Reset { clear_total: true })
        );
        assert_eq!(parse_command("switch"), Some(Command::SwitchSource));
        assert_eq!(parse_command("jump"), None);
    }
}
