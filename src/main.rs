//! Ash Beacon CLI
//!
//! Runs the beacon logic against an emulator over adb, or against a
//! directory of recorded screenshots for offline testing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ash_beacon::beacon::{should_preempt, OpsiAsh};
use ash_beacon::combat::DropImage;
use ash_beacon::device::{AdbDevice, Device, ReplayDevice};
use ash_beacon::vision::{AssetTable, Screen, TemplateDigits, VisionSystem};
use ash_beacon::{Config, Error};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ash", version, about = "Operation Siren ash beacon automation")]
struct Cli {
    /// User configuration file
    #[arg(long, global = true, default_value = "config/ash.json")]
    config: PathBuf,
    /// Button asset table
    #[arg(long, global = true, default_value = "assets/buttons.json")]
    assets: PathBuf,
    /// Directory with digit glyphs `0.png` to `9.png` and `slash.png`
    #[arg(long, global = true, default_value = "assets/digits")]
    glyphs: PathBuf,
    /// Replay screenshots from a directory instead of using a device
    #[arg(long, global = true, conflicts_with = "adb")]
    frames: Option<PathBuf>,
    /// adb serial of the device to use
    #[arg(long, global = true)]
    adb: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ash beacon completion
    Status,
    /// Call the beacon task if a beacon is ready
    Attack,
    /// Fight a beacon battle, starting from the beacon page
    Combat {
        /// Save result screens to this directory
        #[arg(long)]
        drops: Option<PathBuf>,
    },
    /// Print whether a task would be called early
    Preempt { task: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match (&cli.frames, &cli.adb) {
        (Some(dir), _) => replay_device(dir).and_then(|device| run(&cli, device)),
        (None, Some(serial)) => {
            let device = AdbDevice::with_serial(serial.clone());
            log::info!("Using adb device {}", device.serial().unwrap_or_default());
            run(&cli, device)
        }
        (None, None) => run(&cli, AdbDevice::new()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Recorded frames, waiting for real between polls so phase deadlines
/// measure the same time as on a device
fn replay_device(dir: &Path) -> Result<ReplayDevice, Error> {
    Ok(ReplayDevice::from_dir(dir)?.with_real_sleep(true))
}

fn run<D: Device>(cli: &Cli, device: D) -> Result<(), Error> {
    let mut config = Config::load(&cli.config)?;

    if let Command::Preempt { task } = &cli.command {
        println!("{}: {}", task, should_preempt(&config, task));
        return Ok(());
    }

    let settings = config.settings().clone();
    let assets = AssetTable::load(&cli.assets)?;
    let digits = TemplateDigits::from_dir(&cli.glyphs)?;
    let mut ash = OpsiAsh::from_table(&assets, &settings)?;
    let mut vision =
        VisionSystem::new(device, Box::new(digits)).with_stealth(settings.stealth.clone());

    match &cli.command {
        Command::Status => {
            vision.screenshot()?;
            println!("Ash beacon: {}%", ash.status_mut().estimate(&mut vision));
        }
        Command::Attack => {
            vision.screenshot()?;
            if !ash.is_in_map(&mut vision) {
                log::warn!("Not in map, the indicator may be misread");
            }
            let called = ash.handle_ash_beacon_attack(&mut vision, &mut config)?;
            println!("Beacon task called: {}", called);
        }
        Command::Combat { drops } => {
            let mut drop = DropImage::new();
            let end = ash.run_beacon_attack(&mut vision, Some(&mut drop))?;
            println!("Combat end: {:?}", end);
            if let Some(dir) = drops {
                drop.save(dir)?;
            }
        }
        Command::Preempt { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba, RgbaImage};
    use std::time::{Duration, Instant};

    #[test]
    fn test_replay_device_waits_for_real() {
        let dir = tempfile::tempdir().unwrap();
        let frame: RgbaImage = ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        frame.save(dir.path().join("0001.png")).unwrap();

        let mut device = replay_device(dir.path()).unwrap();
        let started = Instant::now();
        device.sleep(Duration::from_millis(50));

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(device.slept(), Duration::from_millis(50));
    }
}
