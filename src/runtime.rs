//! Hilos del sistema en tiempo real.
//!
//! - Worker: dueño del `RepEngine`, procesa un frame a la vez.
//! - Temporizador: dueño del `SessionController`, avanza con un `tick` periódico.
//!
//! Los frames llegan por un canal de capacidad 1 que conserva solo el más
//! reciente. El estado se publica como snapshots detrás de un `RwLock` con un
//! único escritor por lado.

use crate::engine::{EngineSnapshot, RepEngine};
use crate::events::EngineEvent;
use crate::profile::{ExerciseProfile, ProfileError};
use crate::session::{SessionConfig, SessionController, SessionSnapshot};
use crate::types::LandmarkFrame;
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Periodo por defecto de los temporizadores de sesión
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ProfileError),

    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Frame worker is no longer running")]
    WorkerGone,

    #[error("Session timer is no longer running")]
    TimerGone,

    #[error("Thread '{0}' panicked")]
    ThreadPanicked(&'static str),
}

/// Operaciones de control sobre el worker. Las que llevan `ack` son síncronas.
enum Control {
    Reset { clear_total: bool, ack: Sender<()> },
    SwitchSource { ack: Sender<()> },
    Shutdown,
}

enum SessionMsg {
    Repetition,
    Pause,
    Resume,
    Shutdown,
}

/// Productor de frames con política "solo el último"
#[derive(Clone)]
pub struct LatestFrameSender {
    tx: Sender<LandmarkFrame>,
    /// Copia del receptor usada solo para descartar el frame pendiente
    drain: Receiver<LandmarkFrame>,
    alive: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl LatestFrameSender {
    /// Entrega un frame sin bloquear. Si hay uno pendiente, se descarta.
    pub fn send(&self, frame: LandmarkFrame) -> Result<(), RuntimeError> {
        if !self.alive.load(Ordering::Acquire) {
            return Err(RuntimeError::WorkerGone);
        }

        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(frame)) => {
                if self.drain.try_recv().is_ok() {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                match self.tx.try_send(frame) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(_)) => {
                        // Otro productor llenó el hueco: se pierde este frame
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }
                    Err(TrySendError::Disconnected(_)) => Err(RuntimeError::WorkerGone),
                }
            }
            Err(TrySendError::Disconnected(_)) => Err(RuntimeError::WorkerGone),
        }
    }

    /// Frames descartados por la política de backpressure
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle del sistema en ejecución
pub struct Runtime {
    control_tx: Sender<Control>,
    session_tx: Sender<SessionMsg>,
    events_rx: Receiver<EngineEvent>,
    engine_snapshot: Arc<RwLock<EngineSnapshot>>,
    session_snapshot: Arc<RwLock<SessionSnapshot>>,
    worker: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Lanza worker y temporizador. Retorna el handle y el productor de frames.
    pub fn spawn(
        profile: Arc<ExerciseProfile>,
        config: SessionConfig,
        tick_interval: Duration,
    ) -> Result<(Self, LatestFrameSender), RuntimeError> {
        profile.validate()?;
        let session = SessionController::new(config)?;
        let engine = RepEngine::new(profile);

        let (frame_tx, frame_rx) = bounded::<LandmarkFrame>(1);
        let (control_tx, control_rx) = unbounded::<Control>();
        let (session_tx, session_rx) = unbounded::<SessionMsg>();
        let (events_tx, events_rx) = unbounded::<EngineEvent>();

        let engine_snapshot = Arc::new(RwLock::new(engine.snapshot()));
        let session_snapshot = Arc::new(RwLock::new(session.snapshot()));
        let counting_enabled = Arc::new(AtomicBool::new(session.is_accepting_reps()));
        let alive = Arc::new(AtomicBool::new(true));

        for event in session.start() {
            let _ = events_tx.send(event);
        }

        let worker = {
            let ctx = WorkerContext {
                engine,
                frame_rx: frame_rx.clone(),
                control_rx,
                session_tx: session_tx.clone(),
                events_tx: events_tx.clone(),
                snapshot: Arc::clone(&engine_snapshot),
                counting_enabled: Arc::clone(&counting_enabled),
            };
            let alive = Arc::clone(&alive);
            thread::Builder::new()
                .name("rep-worker".to_string())
                .spawn(move || {
                    ctx.run();
                    alive.store(false, Ordering::Release);
                })?
        };

        let timer = {
            let ctx = TimerContext {
                session,
                session_rx,
                events_tx,
                snapshot: Arc::clone(&session_snapshot),
                counting_enabled,
                tick_interval,
            };
            thread::Builder::new()
                .name("session-timer".to_string())
                .spawn(move || ctx.run())?
        };

        let sender = LatestFrameSender {
            tx: frame_tx,
            drain: frame_rx,
            alive,
            dropped: Arc::new(AtomicU64::new(0)),
        };

        Ok((
            Self {
                control_tx,
                session_tx,
                events_rx,
                engine_snapshot,
                session_snapshot,
                worker: Some(worker),
                timer: Some(timer),
            },
            sender,
        ))
    }

    /// Reset síncrono: al retornar, ningún frame posterior ve el estado anterior
    pub fn reset(&self, clear_total: bool) -> Result<(), RuntimeError> {
        let (ack_tx, ack_rx) = bounded(1);
        self.control_tx
            .send(Control::Reset {
                clear_total,
                ack: ack_tx,
            })
            .map_err(|_| RuntimeError::WorkerGone)?;
        ack_rx.recv().map_err(|_| RuntimeError::WorkerGone)
    }

    /// Cambio de cámara: limpia el estado transitorio sin tocar el total
    pub fn switch_source(&self) -> Result<(), RuntimeError> {
        let (ack_tx, ack_rx) = bounded(1);
        self.control_tx
            .send(Control::SwitchSource { ack: ack_tx })
            .map_err(|_| RuntimeError::WorkerGone)?;
        ack_rx.recv().map_err(|_| RuntimeError::WorkerGone)
    }

    pub fn pause_timers(&self) -> Result<(), RuntimeError> {
        self.session_tx
            .send(SessionMsg::Pause)
            .map_err(|_| RuntimeError::TimerGone)
    }

    pub fn resume_timers(&self) -> Result<(), RuntimeError> {
        self.session_tx
            .send(SessionMsg::Resume)
            .map_err(|_| RuntimeError::TimerGone)
    }

    /// Canal de eventos de salida (motor y sesión)
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events_rx
    }

    pub fn engine_snapshot(&self) -> EngineSnapshot {
        self.engine_snapshot.read().clone()
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session_snapshot.read().clone()
    }

    /// Detiene ambos hilos en orden y espera a que terminen. El worker
    /// procesa antes el frame que tenga en cola. Los eventos producidos
    /// hasta ese momento siguen disponibles en `events()`.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        let _ = self.control_tx.send(Control::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| RuntimeError::ThreadPanicked("rep-worker"))?;
        }

        // Las repeticiones del último frame ya están en la cola de la sesión
        let _ = self.session_tx.send(SessionMsg::Shutdown);
        if let Some(timer) = self.timer.take() {
            timer
                .join()
                .map_err(|_| RuntimeError::ThreadPanicked("session-timer"))?;
        }
        info!("runtime detenido");
        Ok(())
    }

    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.stop()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let _ = self.control_tx.send(Control::Shutdown);
        let _ = self.session_tx.send(SessionMsg::Shutdown);
    }
}

struct WorkerContext {
    engine: RepEngine,
    frame_rx: Receiver<LandmarkFrame>,
    control_rx: Receiver<Control>,
    session_tx: Sender<SessionMsg>,
    events_tx: Sender<EngineEvent>,
    snapshot: Arc<RwLock<EngineSnapshot>>,
    counting_enabled: Arc<AtomicBool>,
}

impl WorkerContext {
    fn run(mut self) {
        debug!("worker iniciado ({})", self.engine.profile().name);
        let control_rx = self.control_rx.clone();
        let frame_rx = self.frame_rx.clone();
        loop {
            select! {
                recv(control_rx) -> msg => {
                    match msg {
                        Ok(control) => {
                            if !self.apply(control) {
                                self.finish(&frame_rx);
                                return;
                            }
                        }
                        Err(_) => return,
                    }
                }
                recv(frame_rx) -> msg => {
                    match msg {
                        Ok(frame) => {
                            // Los controles pendientes se aplican antes del frame
                            let pending: Vec<Control> = control_rx.try_iter().collect();
                            let mut stop = false;
                            for control in pending {
                                if !self.apply(control) {
                                    stop = true;
                                    break;
                                }
                            }
                            self.process(&frame);
                            if stop {
                                self.finish(&frame_rx);
                                return;
                            }
                        }
                        Err(_) => {
                            debug!("productor de frames cerrado, worker termina");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Procesa lo que quede en la cola de frames antes de terminar
    fn finish(&mut self, frame_rx: &Receiver<LandmarkFrame>) {
        for frame in frame_rx.try_iter() {
            self.process(&frame);
        }
        debug!(
            "worker detenido tras {} frames",
            self.engine.snapshot().frames_processed
        );
    }

    /// Retorna false si el worker debe terminar
    fn apply(&mut self, control: Control) -> bool {
        match control {
            Control::Reset { clear_total, ack } => {
                self.engine.reset(clear_total);
                self.publish();
                let _ = ack.send(());
            }
            Control::SwitchSource { ack } => {
                self.engine.switch_source();
                self.publish();
                let _ = ack.send(());
            }
            Control::Shutdown => return false,
        }
        true
    }

    fn process(&mut self, frame: &LandmarkFrame) {
        self.engine
            .set_counting_enabled(self.counting_enabled.load(Ordering::Acquire));

        let events = self.engine.process(frame);
        self.publish();

        for event in events {
            if event.is_repetition() {
                let _ = self.session_tx.send(SessionMsg::Repetition);
            }
            if self.events_tx.send(event).is_err() {
                warn!("nadie escucha los eventos del motor");
            }
        }
    }

    fn publish(&self) {
        *self.snapshot.write() = self.engine.snapshot();
    }
}

struct TimerContext {
    session: SessionController,
    session_rx: Receiver<SessionMsg>,
    events_tx: Sender<EngineEvent>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    counting_enabled: Arc<AtomicBool>,
    tick_interval: Duration,
}

impl TimerContext {
    fn run(mut self) {
        let ticker = tick(self.tick_interval);
        let session_rx = self.session_rx.clone();
        let mut last_tick = Instant::now();

        loop {
            select! {
                recv(ticker) -> msg => {
                    let now = msg.unwrap_or_else(|_| Instant::now());
                    let elapsed = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    let events = self.session.tick(elapsed);
                    self.publish(events);
                }
                recv(session_rx) -> msg => {
                    match msg {
                        Ok(SessionMsg::Repetition) => {
                            let events = self.session.on_repetition();
                            self.publish(events);
                        }
                        Ok(SessionMsg::Pause) => {
                            info!("⏸️  temporizadores en pausa");
                            self.session.pause();
                            self.publish(Vec::new());
                        }
                        Ok(SessionMsg::Resume) => {
                            info!("▶️  temporizadores reanudados");
                            // El tiempo en pausa no cuenta
                            last_tick = Instant::now();
                            self.session.resume();
                            self.publish(Vec::new());
                        }
                        Ok(SessionMsg::Shutdown) | Err(_) => return,
                    }
                }
            }
        }
    }

    fn publish(&self, events: Vec<EngineEvent>) {
        self.counting_enabled
            .store(self.session.is_accepting_reps(), Ordering::Release);
        *self.snapshot.write() = self.session.snapshot();
        for event in events {
            let _ = self.events_tx.send(event);
        }
    }
}
