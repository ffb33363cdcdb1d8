//! Particle Field for Tone Field
//! Bouncing particles in a percent-of-viewport box, nudged by tone triggers

use std::f32::consts::TAU;
use std::sync::Arc;

use egui::{Color32, Painter, Pos2, Rect, Vec2};
use rand::Rng;

use crate::config::{ColorScheme, FieldConfig, VisualConfig};

pub const FIELD_MIN: f32 = 0.0;
pub const FIELD_MAX: f32 = 100.0;

/// Individual particle data
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: Color32,
    pub intensity: f32,
    /// Seconds per cosmetic bob cycle
    pub oscillation_period: f32,
}

/// One axis of motion with elastic reflection against the proposed position.
fn step_axis(pos: f32, vel: f32) -> (f32, f32) {
    let next = pos + vel;
    if next <= FIELD_MIN || next >= FIELD_MAX {
        (next.clamp(FIELD_MIN, FIELD_MAX), -vel)
    } else {
        (next, vel)
    }
}

/// Advance every particle by one frame. Pure: same input, same output.
pub fn tick(particles: &[Particle]) -> Vec<Particle> {
    particles
        .iter()
        .map(|p| {
            let (x, vx) = step_axis(p.x, p.vx);
            let (y, vy) = step_axis(p.y, p.vy);
            Particle { x, y, vx, vy, ..p.clone() }
        })
        .collect()
}

/// Particle set plus the parameters that mutate it.
/// The set is swapped as a whole, so snapshots never see a partial update.
pub struct ParticleField {
    particles: Arc<[Particle]>,
    config: FieldConfig,
}

impl ParticleField {
    pub fn spawn(config: &FieldConfig, colors: &ColorScheme, rng: &mut impl Rng) -> Self {
        let mut palette: Vec<Color32> = colors
            .particles
            .iter()
            .map(|c| Color32::from_rgb(c[0], c[1], c[2]))
            .collect();
        if palette.is_empty() {
            palette.push(Color32::WHITE);
        }

        let speed = config.max_speed;
        let particles = (0..config.count)
            .map(|id| Particle {
                id,
                x: rng.gen_range(FIELD_MIN..=FIELD_MAX),
                y: rng.gen_range(FIELD_MIN..=FIELD_MAX),
                vx: rng.gen_range(-speed..=speed),
                vy: rng.gen_range(-speed..=speed),
                size: rng.gen_range(config.min_size..=config.max_size),
                color: palette[rng.gen_range(0..palette.len())],
                intensity: rng.gen_range(config.base_intensity_min..=config.base_intensity_max),
                oscillation_period: rng.gen_range(config.min_period..=config.max_period),
            })
            .collect();

        Self {
            particles,
            config: config.clone(),
        }
    }

    #[cfg(test)]
    pub fn from_particles(particles: Vec<Particle>, config: &FieldConfig) -> Self {
        Self {
            particles: particles.into(),
            config: config.clone(),
        }
    }

    /// Read-only snapshot for rendering
    pub fn snapshot(&self) -> Arc<[Particle]> {
        Arc::clone(&self.particles)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn tick(&mut self) {
        self.particles = tick(&self.particles).into();
    }

    /// Kick every particle upward and flare it to peak intensity.
    pub fn perturb(&mut self) {
        let impulse = self.config.perturb_impulse;
        let peak = self.config.peak_intensity;
        self.particles = self
            .particles
            .iter()
            .map(|p| Particle {
                vy: p.vy - impulse,
                intensity: peak,
                ..p.clone()
            })
            .collect();
    }

    /// Redraw every intensity from the baseline range.
    pub fn reset_intensity(&mut self, rng: &mut impl Rng) {
        let range = self.config.base_intensity_min..=self.config.base_intensity_max;
        self.particles = self
            .particles
            .iter()
            .map(|p| Particle {
                intensity: rng.gen_range(range.clone()),
                ..p.clone()
            })
            .collect();
    }
}

/// Vertical bob in points; presentational only.
pub fn bob_offset(p: &Particle, time: f32, amplitude: f32) -> f32 {
    let phase = p.id as f32 * 0.7;
    (time * TAU / p.oscillation_period.max(0.001) + phase).sin() * amplitude
}

/// Glow radius grows with intensity.
pub fn glow_radius(p: &Particle, glow_scale: f32) -> f32 {
    p.size * (1.0 + p.intensity * glow_scale)
}

/// Intensity clamped for drawing; non-finite values draw dim.
fn render_intensity(p: &Particle) -> f32 {
    if p.intensity.is_finite() {
        p.intensity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// (glow, core) alpha for a drawing intensity in 0..1
fn alphas(intensity: f32) -> (u8, u8) {
    let glow = (intensity * 0.35 * 255.0) as u8;
    let core = ((0.4 + 0.6 * intensity) * 255.0) as u8;
    (glow, core)
}

/// Render particles to egui painter
pub fn render(particles: &[Particle], painter: &Painter, rect: Rect, visual: &VisualConfig, time: f32) {
    for p in particles {
        let pos = Pos2::new(
            rect.min.x + p.x / FIELD_MAX * rect.width(),
            rect.min.y + p.y / FIELD_MAX * rect.height(),
        ) + Vec2::new(0.0, bob_offset(p, time, visual.bob_amplitude));

        let intensity = render_intensity(p);
        let (glow_alpha, core_alpha) = alphas(intensity);

        let [r, g, b, _] = p.color.to_array();
        painter.circle_filled(
            pos,
            glow_radius(p, visual.glow_scale),
            Color32::from_rgba_unmultiplied(r, g, b, glow_alpha / 2),
        );
        painter.circle_filled(
            pos,
            p.size * (1.0 + intensity),
            Color32::from_rgba_unmultiplied(r, g, b, glow_alpha),
        );
        painter.circle_filled(pos, p.size, Color32::from_rgba_unmultiplied(r, g, b, core_alpha));
    }
}
