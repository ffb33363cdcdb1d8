//! The not-found surface: field, tone controller and their timers
//! tied to one mount/teardown lifecycle

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AppConfig;
use crate::particles::{Particle, ParticleField};
use crate::scheduler::{FrameLoop, Scheduler};
use crate::tones::{InvalidSymbol, Symbol, ToneController, TonePlayer, TriggerEffects};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Deferred {
    ResetIntensity,
    ClearPulse,
}

/// Deferred task stamped with the mount it belongs to
#[derive(Debug)]
struct Stamped {
    generation: u64,
    task: Deferred,
}

/// State that only exists while mounted
struct Mounted {
    field: ParticleField,
    tones: ToneController,
    frame_loop: FrameLoop,
}

pub struct Surface {
    config: AppConfig,
    rng: StdRng,
    scheduler: Scheduler<Stamped>,
    generation: u64,
    mounted: Option<Mounted>,
}

impl Surface {
    pub fn new(config: AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn with_seed(config: AppConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: AppConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            scheduler: Scheduler::new(),
            generation: 0,
            mounted: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mount(&mut self) {
        if self.mounted.is_some() {
            return;
        }
        self.generation += 1;

        let colors = self.config.get_color_scheme();
        let field = ParticleField::spawn(&self.config.field, &colors, &mut self.rng);
        log::info!(
            "Mounted field #{} with {} particles",
            self.generation,
            field.len()
        );

        self.mounted = Some(Mounted {
            field,
            tones: ToneController::new(&self.config.tones),
            frame_loop: FrameLoop::start(),
        });
    }

    /// Stop the frame loop and drop the field. Pending timers stay queued
    /// and are discarded when they fire. Returns false if already torn down.
    pub fn teardown(&mut self) -> bool {
        let Some(mut mounted) = self.mounted.take() else {
            return false;
        };
        mounted.frame_loop.cancel();
        log::info!(
            "Tore down field #{} after {} frames ({} timers left to expire)",
            self.generation,
            mounted.frame_loop.frames(),
            self.scheduler.pending()
        );
        true
    }

    /// Fresh field; timers from the previous mount can no longer touch it.
    pub fn remount(&mut self) {
        self.teardown();
        self.mount();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// One animation frame: fire due timers, then tick.
    /// Returns whether the field advanced.
    pub fn frame(&mut self, dt: Duration) -> bool {
        for stamped in self.scheduler.advance(dt) {
            self.apply(stamped);
        }

        match self.mounted.as_mut() {
            Some(mounted) => {
                if mounted.frame_loop.next_frame() {
                    mounted.field.tick();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn apply(&mut self, stamped: Stamped) {
        let Some(mounted) = self.mounted.as_mut() else {
            log::trace!("Dropping {:?} after teardown", stamped.task);
            return;
        };
        if stamped.generation != self.generation {
            log::trace!(
                "Dropping {:?} from field #{} (live #{})",
                stamped.task,
                stamped.generation,
                self.generation
            );
            return;
        }

        match stamped.task {
            Deferred::ResetIntensity => mounted.field.reset_intensity(&mut self.rng),
            Deferred::ClearPulse => mounted.tones.clear_active(),
        }
    }

    fn schedule(&mut self, delay_ms: u64, task: Deferred) {
        let stamped = Stamped {
            generation: self.generation,
            task,
        };
        self.scheduler
            .schedule(Duration::from_millis(delay_ms), stamped);
    }

    pub fn trigger(&mut self, symbol: Symbol, player: &mut dyn TonePlayer) -> TriggerEffects {
        let Some(mounted) = self.mounted.as_mut() else {
            return TriggerEffects::default();
        };

        let effects = mounted.tones.trigger(symbol, player);
        if effects.perturb {
            mounted.field.perturb();
        }

        if effects.pulsed {
            self.schedule(self.config.tones.pulse_ms, Deferred::ClearPulse);
        }
        if effects.perturb {
            self.schedule(self.config.field.intensity_reset_ms, Deferred::ResetIntensity);
        }
        effects
    }

    /// Raw-index entry point; out-of-range slots are rejected untouched.
    pub fn trigger_index(
        &mut self,
        index: usize,
        player: &mut dyn TonePlayer,
    ) -> Result<TriggerEffects, InvalidSymbol> {
        let symbol = Symbol::try_from(index)?;
        Ok(self.trigger(symbol, player))
    }

    pub fn toggle_mute(&mut self) {
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.tones.toggle_mute();
        }
    }

    pub fn is_muted(&self) -> bool {
        self.mounted
            .as_ref()
            .map(|m| m.tones.is_muted())
            .unwrap_or(false)
    }

    pub fn active_symbol(&self) -> Option<Symbol> {
        self.mounted.as_ref().and_then(|m| m.tones.active())
    }

    /// Snapshot for rendering; empty when unmounted
    pub fn particles(&self) -> Arc<[Particle]> {
        match self.mounted.as_ref() {
            Some(m) => m.field.snapshot(),
            None => Vec::<Particle>::new().into(),
        }
    }

    /// Time on the surface clock
    pub fn elapsed(&self) -> Duration {
        self.scheduler.now()
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tones::testing::RecordingPlayer;

    const FRAME: Duration = Duration::from_millis(16);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn mounted_surface() -> Surface {
        let mut surface = Surface::with_seed(AppConfig::default(), 42);
        surface.mount();
        surface
    }

    fn intensities_in(surface: &Surface, lo: f32, hi: f32) -> bool {
        surface
            .particles()
            .iter()
            .all(|p| (lo..=hi).contains(&p.intensity))
    }

    #[test]
    fn test_mount_spawns_default_field() {
        let surface = mounted_surface();
        assert!(surface.is_mounted());
        assert_eq!(surface.particles().len(), 50);
        assert_eq!(surface.active_symbol(), None);
        assert!(!surface.is_muted());
    }

    #[test]
    fn test_frame_ticks_once() {
        let mut surface = mounted_surface();
        let before = surface.particles();
        assert!(surface.frame(FRAME));
        let after = surface.particles();
        assert_eq!(&after[..], &crate::particles::tick(&before)[..]);
    }

    #[test]
    fn test_trigger_pulses_for_300ms() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();

        surface.trigger(Symbol::One, &mut player);
        assert_eq!(player.played, vec![(Symbol::One, 0.5)]);
        assert_eq!(surface.active_symbol(), Some(Symbol::One));

        surface.frame(ms(299));
        assert_eq!(surface.active_symbol(), Some(Symbol::One));
        surface.frame(ms(1));
        assert_eq!(surface.active_symbol(), None);
    }

    #[test]
    fn test_rapid_triggers_schedule_independent_resets() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();

        surface.trigger(Symbol::Zero, &mut player);
        surface.frame(ms(100));
        surface.trigger(Symbol::Two, &mut player);
        assert_eq!(surface.active_symbol(), Some(Symbol::Two));
        // two pulse clears plus two intensity resets
        assert_eq!(surface.pending_timers(), 4);

        surface.frame(ms(150));
        assert_eq!(surface.active_symbol(), Some(Symbol::Two));

        // the first trigger's clear fires at 300ms regardless of the second
        surface.frame(ms(50));
        assert_eq!(surface.active_symbol(), None);

        surface.frame(ms(100));
        assert_eq!(surface.active_symbol(), None);
        assert_eq!(surface.pending_timers(), 0);
    }

    #[test]
    fn test_invalid_index_mutates_nothing() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();
        let before = surface.particles();

        assert_eq!(
            surface.trigger_index(5, &mut player),
            Err(InvalidSymbol(5))
        );
        assert_eq!(surface.active_symbol(), None);
        assert_eq!(&surface.particles()[..], &before[..]);
        assert!(player.played.is_empty());
        assert_eq!(surface.pending_timers(), 0);
    }

    #[test]
    fn test_trigger_index_accepts_valid_slot() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();
        let effects = surface.trigger_index(2, &mut player).unwrap();
        assert!(effects.perturb);
        assert_eq!(surface.active_symbol(), Some(Symbol::Two));
    }

    #[test]
    fn test_perturb_then_reset_across_ticks() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();
        let before = surface.particles();

        surface.trigger(Symbol::Zero, &mut player);
        for (old, new) in before.iter().zip(surface.particles().iter()) {
            assert_eq!(new.vy, old.vy - 0.3);
            assert_eq!(new.intensity, 0.8);
        }

        let mut elapsed = Duration::ZERO;
        while elapsed < ms(192) {
            surface.frame(FRAME);
            elapsed += FRAME;
            assert!(intensities_in(&surface, 0.8, 0.8));
        }
        surface.frame(FRAME);
        assert!(intensities_in(&surface, 0.2, 0.5));
    }

    #[test]
    fn test_earlier_reset_is_not_cancelled_by_later_perturb() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();

        surface.trigger(Symbol::Zero, &mut player);
        surface.frame(ms(150));
        surface.trigger(Symbol::One, &mut player);
        assert!(intensities_in(&surface, 0.8, 0.8));

        surface.frame(ms(60));
        assert!(intensities_in(&surface, 0.2, 0.5));

        surface.frame(ms(150));
        assert!(intensities_in(&surface, 0.2, 0.5));
    }

    #[test]
    fn test_muted_trigger_pulses_without_perturbing() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();
        surface.toggle_mute();
        let before = surface.particles();

        let effects = surface.trigger(Symbol::One, &mut player);
        assert!(!effects.perturb);
        assert!(player.played.is_empty());
        assert_eq!(surface.active_symbol(), Some(Symbol::One));
        assert_eq!(&surface.particles()[..], &before[..]);

        surface.frame(ms(300));
        assert_eq!(surface.active_symbol(), None);
    }

    #[test]
    fn test_silent_device_still_perturbs() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer {
            fail: true,
            ..Default::default()
        };
        let effects = surface.trigger(Symbol::Zero, &mut player);
        assert!(effects.perturb);
        assert!(intensities_in(&surface, 0.8, 0.8));
    }

    #[test]
    fn test_teardown_stops_frames_and_drops_late_timers() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();
        surface.trigger(Symbol::One, &mut player);

        assert!(surface.teardown());
        assert!(!surface.teardown());
        assert!(!surface.frame(ms(500)));
        assert_eq!(surface.pending_timers(), 0);
        assert!(surface.particles().is_empty());
        assert_eq!(surface.active_symbol(), None);

        let effects = surface.trigger(Symbol::Two, &mut player);
        assert_eq!(effects, TriggerEffects::default());
        assert_eq!(player.played.len(), 1);
    }

    #[test]
    fn test_stale_timers_skip_new_mount() {
        let mut surface = mounted_surface();
        let mut player = RecordingPlayer::default();

        surface.trigger(Symbol::Zero, &mut player);
        surface.frame(ms(50));
        surface.remount();
        surface.frame(ms(50));
        surface.trigger(Symbol::One, &mut player);

        // old reset (due 200ms) and old clear (due 300ms) must be ignored
        surface.frame(ms(150));
        assert!(intensities_in(&surface, 0.8, 0.8));
        surface.frame(ms(100));
        assert!(intensities_in(&surface, 0.2, 0.5));
        assert_eq!(surface.active_symbol(), Some(Symbol::One));

        surface.frame(ms(50));
        assert_eq!(surface.active_symbol(), None);
    }

    #[test]
    fn test_remount_resets_mute() {
        let mut surface = mounted_surface();
        surface.toggle_mute();
        assert!(surface.is_muted());
        surface.remount();
        assert!(!surface.is_muted());
        assert_eq!(surface.particles().len(), 50);
    }
}
