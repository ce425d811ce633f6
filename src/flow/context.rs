//! Presentation contexts: the render/audio/UI bundle owned by one phase

use crate::audio::{AudioManager, MusicTrack};
use crate::platform::{ContextHandle, ContextKind, Renderer};

use super::fade::FadeTransition;

#[derive(Debug)]
pub struct PresentationContext {
    kind: ContextKind,
    handle: ContextHandle,
    music: Option<MusicTrack>,
    input_attached: bool,
    fade: FadeTransition,
}

impl PresentationContext {
    /// Create the render context and start its music, if any
    pub fn open(
        kind: ContextKind,
        music: Option<MusicTrack>,
        renderer: &mut dyn Renderer,
        audio: &mut AudioManager,
    ) -> Self {
        let handle = renderer.create_context(kind);
        if let Some(track) = music {
            audio.play_music(track);
        }
        Self {
            kind,
            handle,
            music,
            input_attached: false,
            fade: FadeTransition::default(),
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    pub fn music(&self) -> Option<MusicTrack> {
        self.music
    }

    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    pub fn fade(&self) -> &FadeTransition {
        &self.fade
    }

    pub fn attach_input(&mut self, renderer: &mut dyn Renderer) {
        if !self.input_attached {
            renderer.attach_input(self.handle);
            self.input_attached = true;
        }
    }

    pub fn detach_input(&mut self, renderer: &mut dyn Renderer) {
        if self.input_attached {
            renderer.detach_input(self.handle);
            self.input_attached = false;
        }
    }

    /// Stop the current track and start `track`
    pub fn switch_music(&mut self, track: MusicTrack, audio: &mut AudioManager) {
        if let Some(current) = self.music.take() {
            audio.stop_music(current);
        }
        audio.play_music(track);
        self.music = Some(track);
    }

    pub fn start_fade(&mut self) {
        self.fade.start();
    }

    /// Advance the fade and push its level to the renderer.
    /// Returns true on the frame the fade completes.
    pub fn tick_fade(&mut self, renderer: &mut dyn Renderer) -> bool {
        if !self.fade.is_active() {
            return false;
        }
        let done = self.fade.tick();
        renderer.set_fade_level(self.handle, self.fade.level());
        done
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.render(self.handle);
    }

    /// Detach, stop music and release the render context
    pub fn dispose(mut self, renderer: &mut dyn Renderer, audio: &mut AudioManager) {
        self.detach_input(renderer);
        if let Some(track) = self.music.take() {
            audio.stop_music(track);
        }
        renderer.dispose(self.handle);
    }
}
