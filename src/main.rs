//! Hinge - laptop lid sonification

use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};
use tokio::sync::broadcast::error::RecvError;

use hinge::config::{self, SensorConfig, SensorKind};
use hinge::engine::{list_midi_ports, MidiFeedback, MidiFeedbackConfig, Player, Recorder, SoundManager};
use hinge::modes::SoundMode;
use hinge::sensor::{AngleSample, ReplayConfig, ReplaySensor, Sensor, SweepConfig, SweepSensor};
use hinge::viz::{self, MonitorState};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            mode,
            midi,
            midi_port,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let mut manager = SoundManager::with_startup_mode(cfg.clone())?;
            if let Some(name) = mode {
                let mode = SoundMode::from_name(&name)
                    .ok_or_else(|| anyhow!("Unknown sound mode '{}'", name))?;
                manager.set_mode(mode)?;
            }

            println!("Starting Hinge...");
            println!("  Mode: {}", manager.mode().label());
            println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
            println!("  Master volume: {:.0}%", manager.master_volume() * 100.0);
            if manager.mode().is_track_based() {
                println!("  Tracks: {}", manager.track_names().len());
            }

            let manager = Arc::new(Mutex::new(manager));

            let mut player = Player::new();
            player.start_on(Arc::clone(&manager), cfg.audio.device.as_deref())?;

            let mut feedback = if midi {
                Some(MidiFeedback::new(
                    midi_port.as_deref(),
                    MidiFeedbackConfig::default(),
                )?)
            } else {
                None
            };

            let rt = tokio::runtime::Runtime::new()?;
            let mut sensor = build_sensor(&cfg.sensor)?;
            let mut rx = sensor.subscribe();
            {
                let _guard = rt.enter();
                sensor.start()?;
            }
            println!("  Sensor: {}", sensor.name());

            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = Arc::clone(&stop);
                ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
            }

            println!("\nPlaying. Ctrl-C to stop.");

            let feed_manager = Arc::clone(&manager);
            rt.block_on(async {
                let mut last_track: Option<usize> = None;

                while !stop.load(Ordering::SeqCst) {
                    let sample = tokio::select! {
                        result = rx.recv() => match result {
                            Ok(sample) => sample,
                            Err(RecvError::Lagged(_)) => continue,
                            Err(RecvError::Closed) => break,
                        },
                        _ = tokio::time::sleep(Duration::from_millis(100)) => {
                            // A finished replay stops its sensor
                            if !sensor.is_running() {
                                break;
                            }
                            continue;
                        }
                    };

                    let (angle, velocity, gain, fired) = {
                        let mut mgr = feed_manager.lock().unwrap();
                        mgr.update(sample);
                        (
                            mgr.current_angle(),
                            mgr.current_velocity(),
                            mgr.current_gain(),
                            mgr.last_triggered_track(),
                        )
                    };

                    if let Some(fb) = feedback.as_mut() {
                        let _ = fb.send_signal(angle, velocity);
                        if fired != last_track {
                            if let Some(track) = fired {
                                let _ = fb.send_track_trigger(track, gain);
                            }
                            last_track = fired;
                        }
                    }
                }
            });

            sensor.stop();
            player.stop();
            manager.lock().unwrap().stop_all();
            println!("Stopped.");
        }

        Commands::Record {
            config: config_path,
            output,
            duration,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            println!("Rendering {} seconds of lid sweep to {:?}...", duration, output);

            let mut manager = SoundManager::with_startup_mode(cfg.clone())?;
            let sweep = SweepConfig::from_settings(&cfg.sensor.settings);
            let sample_rate = cfg.audio.sample_rate;

            let mut recorder = Recorder::new(&output, sample_rate)?;

            let t0 = Instant::now();
            let tick = sweep.interval;
            let total = Duration::from_secs(duration);
            let samples_per_tick =
                (sample_rate as f64 * tick.as_secs_f64()).round().max(1.0) as usize;

            let mut elapsed = Duration::ZERO;
            let mut reported = 0u64;
            while elapsed < total {
                manager.update(AngleSample::at(sweep.angle_at(elapsed), t0 + elapsed));
                for _ in 0..samples_per_tick {
                    recorder.write_sample(manager.process() as f32)?;
                }
                elapsed += tick;

                if elapsed.as_secs() > reported {
                    reported = elapsed.as_secs();
                    print!("\r  Progress: {}s / {}s", reported, duration);
                    std::io::stdout().flush()?;
                }
            }

            recorder.finalize()?;
            println!("\nRecorded to {:?}", output);
        }

        Commands::Monitor {
            config: config_path,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let manager = Arc::new(Mutex::new(SoundManager::with_startup_mode(cfg.clone())?));

            let mut player = Player::new();
            player.start_on(Arc::clone(&manager), cfg.audio.device.as_deref())?;

            let rt = tokio::runtime::Runtime::new()?;
            let mut sensor = build_sensor(&cfg.sensor)?;
            let mut rx = sensor.subscribe();
            {
                let _guard = rt.enter();
                sensor.start()?;
            }

            let state = MonitorState::new();
            {
                let flag = state.flag();
                ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;
            }

            let feed_manager = Arc::clone(&manager);
            rt.spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(sample) => feed_manager.lock().unwrap().update(sample),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let result = viz::run_monitor(Arc::clone(&manager), &state);

            sensor.stop();
            player.stop();
            manager.lock().unwrap().stop_all();
            result?;
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            let host = cpal::default_host();

            if let Some(device) = host.default_output_device() {
                println!("Default output: {}", device.name().unwrap_or_default());
                if let Ok(config) = device.default_output_config() {
                    println!(
                        "  Sample rate: {} Hz, Channels: {}",
                        config.sample_rate().0,
                        config.channels()
                    );
                }
                println!();
            }

            println!("Output devices:");
            match host.output_devices() {
                Ok(devices) => {
                    for device in devices {
                        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                        print!("  - {}", name);

                        if let Ok(config) = device.default_output_config() {
                            print!(
                                " ({} Hz, {} ch)",
                                config.sample_rate().0,
                                config.channels()
                            );
                        }
                        println!();
                    }
                }
                Err(e) => {
                    println!("  Error listing devices: {}", e);
                }
            }

            println!("\nMIDI output ports:");
            match list_midi_ports() {
                Ok(ports) if ports.is_empty() => println!("  (none)"),
                Ok(ports) => {
                    for port in ports {
                        println!("  - {}", port);
                    }
                }
                Err(e) => {
                    println!("  Error listing ports: {}", e);
                }
            }
        }

        Commands::Check {
            config: config_path,
        } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!(
                        "  Output device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!("  Startup mode: {}", cfg.startup_mode().label());
                    println!("  Velocity smoothing: {} ms", cfg.master.velocity_tau_ms);
                    println!("  Sensor: {:?}", cfg.sensor.kind);
                    println!("  Track directories:");
                    println!("    - gachi: {:?}", cfg.modes.gachi.dir);
                    println!("    - anime: {:?}", cfg.modes.anime.dir);
                    println!("    - system_sounds: {:?}", cfg.modes.system_sounds.dir);
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../hinge.example.yaml");

            let path = "hinge.yaml";
            if Path::new(path).exists() {
                println!("hinge.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created hinge.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Construct the configured lid-angle sensor
fn build_sensor(config: &SensorConfig) -> Result<Box<dyn Sensor>> {
    match config.kind {
        SensorKind::Sweep => Ok(Box::new(SweepSensor::new(
            "sweep",
            SweepConfig::from_settings(&config.settings),
        ))),
        SensorKind::Replay => Ok(Box::new(ReplaySensor::new(
            "replay",
            ReplayConfig::from_settings(&config.settings)?,
        ))),
    }
}
