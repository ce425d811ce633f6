//! Audio cues and music
//!
//! Maps named cues to clip files and scales their volume by the player's
//! settings before handing them to the platform backend.

use crate::platform::{AudioBackend, ClipOptions};
use crate::settings::Settings;

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Menu button pressed
    MenuSelect,
    /// Collectible picked up
    Pickup,
    /// Win overlay return button
    Quit,
    /// Firework rocket leaves the ground
    FireworkLaunch,
    /// Firework bursts
    FireworkExplosion,
}

impl SoundCue {
    pub fn clip(&self) -> &'static str {
        match self {
            SoundCue::MenuSelect => "sounds/vgmenuselect.wav",
            SoundCue::Pickup => "sounds/coin.wav",
            SoundCue::Quit => "sounds/quit.wav",
            SoundCue::FireworkLaunch => "sounds/fw_05.wav",
            SoundCue::FireworkExplosion => "sounds/fw_03.wav",
        }
    }

    fn base_volume(&self) -> f32 {
        match self {
            SoundCue::FireworkLaunch | SoundCue::FireworkExplosion => 0.5,
            _ => 1.0,
        }
    }
}

/// Background music, one per presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicTrack {
    Title,
    Gameplay,
    Ending,
    Defeat,
}

impl MusicTrack {
    pub fn clip(&self) -> &'static str {
        match self {
            MusicTrack::Title => "sounds/start.mp3",
            MusicTrack::Gameplay => "sounds/game.mp3",
            MusicTrack::Ending => "sounds/end.mp3",
            MusicTrack::Defeat => "sounds/Eye of the Storm.mp3",
        }
    }

    fn base_volume(&self) -> f32 {
        match self {
            MusicTrack::Gameplay => 0.2,
            _ => 0.25,
        }
    }

    /// The ending theme plays once; everything else loops
    fn looped(&self) -> bool {
        !matches!(self, MusicTrack::Ending)
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>, settings: &Settings) -> Self {
        let mut manager = Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        };
        manager.set_master_volume(settings.master_volume);
        manager.set_sfx_volume(settings.sfx_volume);
        manager.set_music_volume(settings.music_volume);
        manager.set_muted(settings.muted);
        manager
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, cue: SoundCue) {
        let volume = cue.base_volume() * self.effective(self.sfx_volume);
        if volume <= 0.0 {
            return;
        }
        self.backend.play_clip(
            cue.clip(),
            ClipOptions {
                looped: false,
                volume,
            },
        );
    }

    /// Start a music track
    pub fn play_music(&mut self, track: MusicTrack) {
        let volume = track.base_volume() * self.effective(self.music_volume);
        self.backend.play_clip(
            track.clip(),
            ClipOptions {
                looped: track.looped(),
                volume,
            },
        );
    }

    pub fn stop_music(&mut self, track: MusicTrack) {
        self.backend.stop_clip(track.clip());
    }
}
