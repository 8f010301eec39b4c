//! MIDI feedback output
//!
//! Mirrors the lid signal onto a MIDI port so external synths can be
//! played by the hinge: angle maps to one CC, hinge speed to another,
//! and track triggers fire notes.

use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{anyhow, Result};
use midir::MidiOutput;

/// MIDI message types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
}

impl MidiMessage {
    /// Convert to raw MIDI bytes
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            MidiMessage::NoteOn(ch, note, vel) => [0x90 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::NoteOff(ch, note, vel) => [0x80 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::ControlChange(ch, ctrl, val) => {
                [0xB0 | (ch & 0x0F), ctrl & 0x7F, val & 0x7F]
            }
        }
    }
}

/// Configuration for MIDI feedback
#[derive(Debug, Clone)]
pub struct MidiFeedbackConfig {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// CC number carrying the lid angle
    pub angle_cc: u8,
    /// CC number carrying hinge speed
    pub velocity_cc: u8,
    /// Angle treated as fully open when scaling to CC range
    pub angle_max: f64,
    /// Speed (deg/s) mapped to CC value 127
    pub speed_max: f64,
    /// Base note for track-trigger events
    pub base_note: u8,
}

impl Default for MidiFeedbackConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            angle_cc: 1,    // modulation wheel
            velocity_cc: 11, // expression
            angle_max: 135.0,
            speed_max: 180.0,
            base_note: 48, // C3
        }
    }
}

enum Command {
    Send(MidiMessage),
    Stop,
}

/// Sends the lid signal to a MIDI output port
pub struct MidiFeedback {
    sender: Sender<Command>,
    config: MidiFeedbackConfig,
    /// Last CC values, to skip redundant sends
    last_angle_cc: Option<u8>,
    last_velocity_cc: Option<u8>,
}

impl MidiFeedback {
    /// Connect to the given port (None = first available)
    pub fn new(port_name: Option<&str>, config: MidiFeedbackConfig) -> Result<Self> {
        let midi_out = MidiOutput::new("Hinge MIDI Output")?;
        let ports = midi_out.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI output ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_out.port_name(&port)?;
        let conn = midi_out
            .connect(&port, "hinge-output")
            .map_err(|e| anyhow!("{}", e))?;

        let (sender, receiver) = mpsc::channel::<Command>();

        thread::spawn(move || {
            let mut conn = conn;
            while let Ok(cmd) = receiver.recv() {
                match cmd {
                    Command::Send(msg) => {
                        let _ = conn.send(&msg.to_bytes());
                    }
                    Command::Stop => break,
                }
            }
        });

        eprintln!("MIDI feedback connected to: {}", port_name_actual);

        Ok(Self {
            sender,
            config,
            last_angle_cc: None,
            last_velocity_cc: None,
        })
    }

    /// Send the current angle and speed as CC messages.
    ///
    /// Values are quantized to 7 bits; unchanged values are not resent.
    pub fn send_signal(&mut self, angle: f64, velocity: f64) -> Result<()> {
        let angle_cc = scale_to_cc(angle, self.config.angle_max);
        if self.last_angle_cc != Some(angle_cc) {
            self.sender.send(Command::Send(MidiMessage::ControlChange(
                self.config.channel,
                self.config.angle_cc,
                angle_cc,
            )))?;
            self.last_angle_cc = Some(angle_cc);
        }

        let velocity_cc = scale_to_cc(velocity.abs(), self.config.speed_max);
        if self.last_velocity_cc != Some(velocity_cc) {
            self.sender.send(Command::Send(MidiMessage::ControlChange(
                self.config.channel,
                self.config.velocity_cc,
                velocity_cc,
            )))?;
            self.last_velocity_cc = Some(velocity_cc);
        }

        Ok(())
    }

    /// Fire a note for a triggered track index
    pub fn send_track_trigger(&self, track: usize, gain: f64) -> Result<()> {
        let note = (self.config.base_note as usize + track).min(127) as u8;
        let velocity = scale_to_cc(gain, 1.0).max(1);

        self.sender.send(Command::Send(MidiMessage::NoteOn(
            self.config.channel,
            note,
            velocity,
        )))?;
        self.sender.send(Command::Send(MidiMessage::NoteOff(
            self.config.channel,
            note,
            0,
        )))?;
        Ok(())
    }

    /// Stop the sender thread
    pub fn stop(&self) {
        let _ = self.sender.send(Command::Stop);
    }
}

impl Drop for MidiFeedback {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scale `value` in `0..=max` to a 7-bit CC value
fn scale_to_cc(value: f64, max: f64) -> u8 {
    if max <= 0.0 {
        return 0;
    }
    ((value / max).clamp(0.0, 1.0) * 127.0).round() as u8
}

/// List available MIDI output ports
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("Hinge MIDI List")?;
    let ports = midi_out.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_message_note_on() {
        let msg = MidiMessage::NoteOn(0, 60, 100);
        assert_eq!(msg.to_bytes(), [0x90, 60, 100]);
    }

    #[test]
    fn test_midi_message_note_on_channel() {
        let msg = MidiMessage::NoteOn(5, 72, 80);
        assert_eq!(msg.to_bytes(), [0x95, 72, 80]);
    }

    #[test]
    fn test_midi_message_cc() {
        let msg = MidiMessage::ControlChange(0, 1, 64);
        assert_eq!(msg.to_bytes(), [0xB0, 1, 64]);
    }

    #[test]
    fn test_scale_to_cc_range() {
        assert_eq!(scale_to_cc(0.0, 135.0), 0);
        assert_eq!(scale_to_cc(135.0, 135.0), 127);
        assert_eq!(scale_to_cc(200.0, 135.0), 127); // clamped
        assert_eq!(scale_to_cc(67.5, 135.0), 64); // rounded midpoint
    }

    #[test]
    fn test_scale_to_cc_degenerate_max() {
        assert_eq!(scale_to_cc(10.0, 0.0), 0);
    }

    #[test]
    fn test_feedback_config_default() {
        let config = MidiFeedbackConfig::default();
        assert_eq!(config.channel, 0);
        assert_eq!(config.angle_cc, 1);
        assert_eq!(config.velocity_cc, 11);
    }

    #[test]
    fn test_list_midi_ports() {
        // Just verify it doesn't panic
        let result = list_midi_ports();
        assert!(result.is_ok());
    }
}
