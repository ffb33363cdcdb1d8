//! Tone trigger controller
//! Three fixed slots bound to samples, a mute flag and the active-glyph pulse

use thiserror::Error;

use crate::config::{MuteBehavior, ToneConfig};

/// One of the three tone slots
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    Zero,
    One,
    Two,
}

impl Symbol {
    pub const ALL: [Symbol; 3] = [Symbol::Zero, Symbol::One, Symbol::Two];

    pub fn index(self) -> usize {
        match self {
            Symbol::Zero => 0,
            Symbol::One => 1,
            Symbol::Two => 2,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("tone slot {0} does not exist (expected 0, 1 or 2)")]
pub struct InvalidSymbol(pub usize);

impl TryFrom<usize> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Symbol::Zero),
            1 => Ok(Symbol::One),
            2 => Ok(Symbol::Two),
            other => Err(InvalidSymbol(other)),
        }
    }
}

/// Audio output for the tone slots.
/// `play` restarts the slot's sample from the beginning at `volume`.
pub trait TonePlayer {
    fn play(&mut self, symbol: Symbol, volume: f32) -> anyhow::Result<()>;
}

/// What the caller has to follow up on after a trigger
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TriggerEffects {
    /// Glyph was highlighted; schedule the pulse reset
    pub pulsed: bool,
    /// Field must be perturbed
    pub perturb: bool,
}

pub struct ToneController {
    muted: bool,
    active: Option<Symbol>,
    volume: f32,
    mute_behavior: MuteBehavior,
}

impl ToneController {
    pub fn new(config: &ToneConfig) -> Self {
        Self {
            muted: false,
            active: None,
            volume: config.volume,
            mute_behavior: config.mute_behavior,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn active(&self) -> Option<Symbol> {
        self.active
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        log::debug!("Mute {}", if self.muted { "on" } else { "off" });
        self.muted
    }

    pub fn trigger(&mut self, symbol: Symbol, player: &mut dyn TonePlayer) -> TriggerEffects {
        if self.muted && self.mute_behavior == MuteBehavior::SuppressAll {
            return TriggerEffects::default();
        }

        self.active = Some(symbol);

        if self.muted {
            return TriggerEffects {
                pulsed: true,
                perturb: false,
            };
        }

        if let Err(e) = player.play(symbol, self.volume) {
            log::debug!("Tone {} stayed silent: {:#}", symbol.index(), e);
        }

        TriggerEffects {
            pulsed: true,
            perturb: true,
        }
    }

    /// Pulse timer expired. Clears whatever is active.
    pub fn clear_active(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Player double recording every request
    #[derive(Default)]
    pub struct RecordingPlayer {
        pub played: Vec<(Symbol, f32)>,
        pub fail: bool,
    }

    impl TonePlayer for RecordingPlayer {
        fn play(&mut self, symbol: Symbol, volume: f32) -> anyhow::Result<()> {
            self.played.push((symbol, volume));
            if self.fail {
                anyhow::bail!("no output device");
            }
            Ok(())
        }
    }
}
