//! BLE command tool for Smart Microondas devices
//!
//! Usage:
//!   microondas-ble scan [--duration SECS]       - Scan for devices
//!   microondas-ble ping [--device NAME]         - Send PING, expect PONG
//!   microondas-ble send [--device NAME] TEXT    - Send TEXT, print the reply
//!   microondas-ble listen [--device NAME]       - Print notifications as they arrive

use clap::{Parser, Subcommand};
use microondas_ble_controller::ble;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "microondas-ble")]
#[command(about = "Send commands to Smart Microondas devices over BLE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for Smart Microondas devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Check that a device answers PING with PONG
    Ping {
        /// Device name or address to connect to
        #[arg(short = 'D', long)]
        device: Option<String>,
    },
    /// Send a text command and print the reply
    Send {
        /// Device name or address to connect to
        #[arg(short = 'D', long)]
        device: Option<String>,
        /// Command text
        text: String,
    },
    /// Print notifications until the timeout passes without one
    Listen {
        /// Device name or address to connect to
        #[arg(short = 'D', long)]
        device: Option<String>,
        /// Seconds to wait for each notification
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { duration } => cmd_scan(duration).await?,
        Commands::Ping { device } => cmd_ping(device.as_deref()).await?,
        Commands::Send { device, text } => cmd_send(device.as_deref(), &text).await?,
        Commands::Listen { device, timeout } => cmd_listen(device.as_deref(), timeout).await?,
    }

    Ok(())
}

async fn cmd_scan(duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for BLE devices ({} seconds)...", duration);
    let devices = ble::scan(duration).await?;

    let ours: Vec<_> = devices.iter().filter(|d| d.is_microondas).collect();
    let others: Vec<_> = devices.iter().filter(|d| !d.is_microondas).collect();

    if !ours.is_empty() {
        println!("\nSmart Microondas devices:");
        for device in &ours {
            let rssi = device.rssi.map(|r| format!(" ({}dBm)", r)).unwrap_or_default();
            println!("  {} - {}{}", device.name, device.address, rssi);
        }
    }

    if !others.is_empty() {
        println!("\nOther devices:");
        for device in &others {
            let rssi = device.rssi.map(|r| format!(" ({}dBm)", r)).unwrap_or_default();
            println!("  {} - {}{}", device.name, device.address, rssi);
        }
    }

    if ours.is_empty() {
        println!("\nNo Smart Microondas devices found.");
        println!("Make sure the device is powered on and not connected to another client.");
    }

    Ok(())
}

async fn connect(target: Option<&str>) -> Result<ble::Link, Box<dyn std::error::Error>> {
    println!("Connecting...");
    let link = ble::Link::connect(target).await?;
    println!("Connected to {}", link.describe().await?);
    Ok(link)
}

async fn cmd_ping(target: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut link = connect(target).await?;

    let result = link.ping().await;
    let _ = link.disconnect().await;

    let elapsed = result?;
    println!("PONG in {} ms", elapsed.as_millis());
    Ok(())
}

async fn cmd_send(target: Option<&str>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut link = connect(target).await?;

    let result = link.send(text).await;
    let _ = link.disconnect().await;

    println!("{}", result?);
    Ok(())
}

async fn cmd_listen(target: Option<&str>, timeout: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut link = connect(target).await?;
    let timeout = Duration::from_secs(timeout);

    println!("Listening for notifications (Ctrl-C to stop)...");
    while let Ok(text) = link.next_notification(timeout).await {
        println!("  {}", text);
    }

    println!("No notification for {} seconds, disconnecting.", timeout.as_secs());
    let _ = link.disconnect().await;
    Ok(())
}
