// Keyboard remote: WASD = buttons, arrow keys = joystick, Q quit
//
// Publishes the control word as a decimal string on the rc-sumo topic, the
// same way the handheld remote does. Terminals only report key presses and
// repeats, so a key counts as held until it has been quiet for HOLD_MS.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use rc_sumo_runtime::config::TOPIC_RC;

const HOLD_MS: u64 = 150;

// Bit for each key: buttons in the low nibble, joystick in the high one
fn key_bit(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char('w') => Some(0),
        KeyCode::Char('s') => Some(1),
        KeyCode::Char('a') => Some(2),
        KeyCode::Char('d') => Some(3),
        KeyCode::Up => Some(4),
        KeyCode::Down => Some(5),
        KeyCode::Left => Some(6),
        KeyCode::Right => Some(7),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_RC).await?;

    info!("Controls: WASD=buttons, arrows=joystick, Q=quit");

    enable_raw_mode()?;
    let result = run_remote(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_remote(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let hold = Duration::from_millis(HOLD_MS);
    let mut last_seen: [Option<Instant>; 8] = [None; 8];
    let mut last_word = -1;

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    _ => {
                        if let Some(bit) = key_bit(code) {
                            last_seen[bit] = pressed.then(Instant::now);
                        }
                    }
                }
            }
        }

        let word = last_seen
            .iter()
            .enumerate()
            .filter(|(_, seen)| seen.is_some_and(|t| t.elapsed() < hold))
            .fold(0i32, |word, (bit, _)| word | (1 << bit));

        if word != last_word {
            info!("Control word: 0x{:02X}", word);
            last_word = word;
        }

        // Always publish at ~50Hz
        publisher.put(word.to_string()).await?;
    }

    // Let go of everything on the way out
    publisher.put(0.to_string()).await?;
    Ok(())
}
