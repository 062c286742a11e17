// Motor test: step-by-step bench test of every drive the remote can produce
//
// Usage: cargo run --example motor_test -- [port]
// Example: cargo run --example motor_test -- /dev/ttyACM0
//
// Safety features:
// - Explicit confirmation before any writes
// - Starts with zero duty
// - Short bursts with a stop in between
// - Easy abort with Ctrl+C

use rc_sumo_runtime::config::{PinMap, BRIDGE_BAUDRATE, BRIDGE_PORT, MAX_DUTY};
use rc_sumo_runtime::control::decode;
use rc_sumo_runtime::motor::{Direction, MotorActuator, MotorId, PinBridge, Tb6612};
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    // Get port from args or use default
    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| BRIDGE_PORT.to_string());

    println!("RC Sumo motor test (WITH WRITES)");
    println!("  This tool WILL drive the motors!");
    println!("  Make sure the wheels are OFF THE GROUND before proceeding!");
    println!();
    println!("Serial port: {}", port);
    println!();

    if !confirm("Are the robot's wheels OFF THE GROUND (robot elevated/on blocks)?") {
        println!("Please elevate the robot so wheels can spin freely without moving the robot.");
        return Ok(());
    }

    // ========== STEP 1: Bring up the driver ==========
    println!("Step 1: Opening pin bridge and initializing the driver...");
    let pins = PinBridge::open(&port, BRIDGE_BAUDRATE)?.into_driver_pins(&PinMap::XENON, MAX_DUTY)?;
    let mut motors = Tb6612::new(pins);
    motors.initialize()?;
    println!("  ✓ All pins low, standby released");
    println!();

    // ========== STEP 2: Drive sequence ==========
    println!("Step 2: Drive sequence");
    println!("  Duration: 0.3 seconds per drive");
    println!("  Press Ctrl+C at any time to abort!");
    println!();

    if !confirm("Proceed with motion test?") {
        return Ok(());
    }

    let test_duration = Duration::from_millis(300);
    let pause_duration = Duration::from_millis(500);

    // Control words, button domain
    let tests = [
        ("Forward", 0x01),
        ("Reverse", 0x02),
        ("Pivot left", 0x04),
        ("Pivot right", 0x08),
        ("Forward + Left", 0x05),
        ("Forward + Right", 0x09),
        ("Reverse + Left", 0x06),
        ("Reverse + Right", 0x0A),
    ];

    for (name, word) in tests {
        println!("  Testing: {}...", name);

        let drive = decode(word);
        println!(
            "    left={:?} @ {}%, right={:?} @ {}%",
            drive.left.direction, drive.left.speed, drive.right.direction, drive.right.speed
        );

        drive.apply(&mut motors);
        sleep(test_duration);

        // Stop between tests
        decode(0).apply(&mut motors);
        sleep(pause_duration);
    }

    // ========== FINAL: Stop and cleanup ==========
    println!();
    println!("Step 3: Stopping motors...");
    motors.set_speed(MotorId::Both, 0);
    motors.set_direction(MotorId::Both, Direction::Forward);
    motors.enable(false);
    println!("  ✓ Motors stopped, driver in standby");

    println!();
    println!("If the wheels moved as expected, the motor control is working correctly.");
    println!("You can now try the full runtime with: cargo run");

    Ok(())
}
