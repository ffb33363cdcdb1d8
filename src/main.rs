//! Tone Field - Main Application
//! Not-found page with a bouncing particle field and three tone glyphs

mod audio;
mod config;
mod particles;
mod scheduler;
mod surface;
mod tones;

use std::time::{Duration, Instant};

use eframe::egui;

use audio::ToneBank;
use config::AppConfig;
use surface::Surface;
use tones::Symbol;

const GLYPH_SIZE: f32 = 140.0;
const GLYPH_SPACING: f32 = 40.0;

/// Main application state
struct ToneFieldApp {
    surface: Surface,
    tone_bank: ToneBank,
    last_update: Instant,
}

impl ToneFieldApp {
    fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = egui::Color32::TRANSPARENT;
        cc.egui_ctx.set_visuals(visuals);

        let tone_bank = ToneBank::open(&config.tones);
        let mut surface = Surface::new(config);
        surface.mount();

        Self {
            surface,
            tone_bank,
            last_update: Instant::now(),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (slot_keys, mute, regenerate) = ctx.input(|i| {
            let slots: Vec<usize> = [egui::Key::Num1, egui::Key::Num2, egui::Key::Num3]
                .iter()
                .enumerate()
                .filter(|(_, key)| i.key_pressed(**key))
                .map(|(slot, _)| slot)
                .collect();
            (slots, i.key_pressed(egui::Key::M), i.key_pressed(egui::Key::R))
        });

        for slot in slot_keys {
            if let Err(e) = self.surface.trigger_index(slot, &mut self.tone_bank) {
                log::warn!("{}", e);
            }
        }
        if mute {
            self.surface.toggle_mute();
        }
        if regenerate {
            self.surface.remount();
        }
    }

    fn render_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
            let painter = ui.painter_at(rect);
            let colors = self.surface.config().get_color_scheme();

            painter.rect_filled(
                rect,
                0.0,
                egui::Color32::from_rgb(
                    colors.background[0],
                    colors.background[1],
                    colors.background[2],
                ),
            );

            let time = self.surface.elapsed().as_secs_f32();
            particles::render(
                &self.surface.particles(),
                &painter,
                rect,
                &self.surface.config().visual,
                time,
            );

            self.render_glyphs(ui, rect, &colors);
            self.render_footer(ui, rect);
        });
    }

    fn render_glyphs(&mut self, ui: &mut egui::Ui, rect: egui::Rect, colors: &config::ColorScheme) {
        let total = GLYPH_SIZE * 3.0 + GLYPH_SPACING * 2.0;
        let left = rect.center().x - total / 2.0;
        let top = rect.center().y - GLYPH_SIZE / 2.0;

        let active = self.surface.active_symbol();
        let mut clicked = None;

        for symbol in Symbol::ALL {
            let i = symbol.index();
            let glyph_rect = egui::Rect::from_min_size(
                egui::Pos2::new(left + i as f32 * (GLYPH_SIZE + GLYPH_SPACING), top),
                egui::Vec2::splat(GLYPH_SIZE),
            );
            let response = ui.interact(
                glyph_rect,
                ui.id().with(("tone_glyph", i)),
                egui::Sense::click(),
            );
            if response.clicked() {
                clicked = Some(symbol);
            }

            let is_active = active == Some(symbol);
            let rgb = if is_active {
                colors.glyph_active
            } else {
                colors.glyph
            };
            let scale = if is_active || response.hovered() { 1.1 } else { 1.0 };
            ui.painter().text(
                glyph_rect.center(),
                egui::Align2::CENTER_CENTER,
                &self.surface.config().tones.slots[i].label,
                egui::FontId::proportional(GLYPH_SIZE * scale),
                egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2]),
            );
        }

        if let Some(symbol) = clicked {
            self.surface.trigger(symbol, &mut self.tone_bank);
        }
    }

    fn render_footer(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let area = egui::Rect::from_center_size(
            egui::Pos2::new(rect.center().x, rect.bottom() - 60.0),
            egui::Vec2::new(420.0, 80.0),
        );
        ui.allocate_ui_at_rect(area, |ui| {
            ui.vertical_centered(|ui| {
                ui.label("This page got lost somewhere in the field.");
                let mute_text = if self.surface.is_muted() {
                    "🔇 Sound off"
                } else {
                    "🔊 Sound on"
                };
                if ui.selectable_label(self.surface.is_muted(), mute_text).clicked() {
                    self.surface.toggle_mute();
                }
                if self.surface.config().visual.show_key_hints {
                    ui.weak("1 2 3 play tones · M mute · R regenerate");
                }
            });
        });
    }
}

impl eframe::App for ToneFieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update);
        self.last_update = now;

        self.handle_keys(ctx);
        self.surface.frame(dt.min(Duration::from_millis(250)));
        self.render_canvas(ctx);

        if self.surface.is_mounted() {
            ctx.request_repaint();
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = AppConfig::load_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 760.0])
            .with_title("404 · Tone Field")
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tone Field",
        options,
        Box::new(move |cc| Box::new(ToneFieldApp::new(cc, config))),
    )
}
