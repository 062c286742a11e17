// Control loop: drain control words from zenoh, decode the latest, drive the motors
//
// The subscriber queue is the handoff between the transport and this loop, so
// a word is only ever seen whole. The optional watchdog stops the motors when
// the remote goes quiet; without one the last command keeps running.

use std::time::{Duration, Instant};
use tokio::time::{interval, Interval};
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, LOOP_HZ, TOPIC_HEALTH, TOPIC_RT_DRIVE};
use crate::control::decode;
use crate::messages::{parse_control_word, DriveReport, RuntimeHealth};
use crate::motor::MotorActuator;

pub struct Runtime<A: MotorActuator> {
    motors: A,
    watchdog: Option<Duration>,
    pending: Option<i32>,
    cmd_received_at: Option<Instant>,
    health: RuntimeHealth,
}

impl<A: MotorActuator> Runtime<A> {
    pub fn new(motors: A, watchdog: Option<Duration>) -> Self {
        Self {
            motors,
            watchdog,
            pending: None,
            cmd_received_at: None,
            health: RuntimeHealth::Idle, // until the first command
        }
    }

    /// Queue a control word. Only the newest one queued before the next
    /// [`step`](Self::step) is decoded.
    pub fn on_command(&mut self, raw: i32, now: Instant) {
        if let Some(dropped) = self.pending.replace(raw) {
            debug!("Superseded control word {}", dropped);
        }
        self.cmd_received_at = Some(now);
    }

    /// Decode and apply the pending word, or run the watchdog if there is none.
    /// Returns what was applied to the motors, if anything.
    pub fn step(&mut self, now: Instant) -> Option<DriveReport> {
        if let Some(raw) = self.pending.take() {
            let drive = decode(raw);
            drive.apply(&mut self.motors);
            self.health = RuntimeHealth::Ok;
            return Some(DriveReport::new(raw, &drive));
        }

        self.check_watchdog(now)
    }

    fn check_watchdog(&mut self, now: Instant) -> Option<DriveReport> {
        let timeout = self.watchdog?;
        let received_at = self.cmd_received_at?;
        if self.health != RuntimeHealth::Ok {
            return None;
        }

        let cmd_age = now.saturating_duration_since(received_at);
        if cmd_age <= timeout {
            return None;
        }

        warn!("Command stale ({:?} old), stopping robot", cmd_age);
        self.health = RuntimeHealth::CmdStale;
        let stop = decode(0);
        stop.apply(&mut self.motors);
        Some(DriveReport::new(0, &stop))
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    #[cfg(test)]
    pub(crate) fn motors(&self) -> &A {
        &self.motors
    }
}

/// Wait for the next loop tick. Returns false once `shutdown` has resolved;
/// a shutdown that is already pending wins over a ready tick.
async fn next_tick<F: Future + Unpin>(tick: &mut Interval, shutdown: &mut F) -> bool {
    tokio::select! {
        biased;
        _ = shutdown => false,
        _ = tick.tick() => true,
    }
}

pub async fn run<A: MotorActuator>(
    config: &RuntimeConfig,
    motors: A,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(config.topic.as_str()).await?;
    let pub_drive = session.declare_publisher(TOPIC_RT_DRIVE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut runtime = Runtime::new(motors, config.watchdog);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let mut published_health = None;

    match config.watchdog {
        Some(timeout) => info!(
            "Runtime started: {}Hz loop, {}ms watchdog timeout",
            LOOP_HZ,
            timeout.as_millis()
        ),
        None => info!("Runtime started: {}Hz loop, no watchdog", LOOP_HZ),
    }
    info!("Subscribed to: {}", config.topic);
    if config.publish {
        info!("Publishing to: {}, {}", TOPIC_RT_DRIVE, TOPIC_HEALTH);
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        if !next_tick(&mut tick, &mut shutdown).await {
            info!("Shutting down");
            return Ok(());
        }

        // 1. Drain all pending control words (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            let raw = parse_control_word(&String::from_utf8_lossy(&payload));
            runtime.on_command(raw, Instant::now());
        }

        // 2. Decode and actuate (includes watchdog logic)
        let applied = runtime.step(Instant::now());

        if !config.publish {
            continue;
        }

        // 3. Publish what was applied
        if let Some(report) = applied {
            pub_drive.put(serde_json::to_string(&report)?).await?;
        }

        // 4. Publish health on change
        if published_health != Some(runtime.health()) {
            pub_health.put(serde_json::to_string(&runtime.health())?).await?;
            published_health = Some(runtime.health());
        }
    }
}
