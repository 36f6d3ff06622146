use image::RgbaImage;
use log::info;

use crate::core::{
    ControlEvent, ControlSurface, DisplaySurface, ParameterLimits, RenderParameters, RenderStatus,
    SamplerMode, SceneMode, SurfaceSize,
};

/// egui control panel state; the host's control surface
#[derive(Debug, Clone)]
pub struct ControlPanel {
    interactive: bool,
    status: RenderStatus,
    width_text: String,
    height_text: String,
    samples: u32,
    max_samples: u32,
    scene: SceneMode,
    sampler: SamplerMode,
}

impl ControlPanel {
    pub fn new(params: RenderParameters, limits: ParameterLimits) -> Self {
        Self {
            interactive: true,
            status: RenderStatus::Idle,
            width_text: params.width.to_string(),
            height_text: params.height.to_string(),
            samples: params.sample_count,
            max_samples: limits.max_sample_count.max(1),
            scene: params.scene_mode,
            sampler: params.sampler_mode,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn status(&self) -> &RenderStatus {
        &self.status
    }

    /// Put the inputs back to the stored values after a rejected edit
    pub fn sync(&mut self, params: RenderParameters) {
        self.width_text = params.width.to_string();
        self.height_text = params.height.to_string();
        self.samples = params.sample_count;
        self.scene = params.scene_mode;
        self.sampler = params.sampler_mode;
    }

    /// Draw the settings panel and collect the events it produced
    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        ui.add_enabled_ui(self.interactive, |ui| {
            egui::Grid::new("render_settings").num_columns(2).show(ui, |ui| {
                ui.label("Width");
                let response = ui.text_edit_singleline(&mut self.width_text);
                if response.lost_focus() {
                    events.push(ControlEvent::WidthChanged(self.width_text.clone()));
                }
                ui.end_row();

                ui.label("Height");
                let response = ui.text_edit_singleline(&mut self.height_text);
                if response.lost_focus() {
                    events.push(ControlEvent::HeightChanged(self.height_text.clone()));
                }
                ui.end_row();

                ui.label("Rays per pixel");
                let response = ui.add(egui::Slider::new(&mut self.samples, 1..=self.max_samples));
                if response.changed() {
                    events.push(ControlEvent::SampleCountChanged(self.samples.to_string()));
                }
                ui.end_row();
            });

            ui.separator();
            ui.label("Scene");
            if ui
                .radio_value(&mut self.scene, SceneMode::Predefined, "Predefined scene")
                .changed()
                | ui.radio_value(&mut self.scene, SceneMode::Random, "Random scene").changed()
            {
                events.push(ControlEvent::SceneSelected(self.scene));
            }

            ui.label("Sampling");
            if ui
                .radio_value(&mut self.sampler, SamplerMode::Jittered, "Jittered sampling")
                .changed()
                | ui.radio_value(&mut self.sampler, SamplerMode::Uniform, "Uniform sampling").changed()
            {
                events.push(ControlEvent::SamplerSelected(self.sampler));
            }

            ui.separator();
            if ui.button("Render").clicked() {
                events.push(ControlEvent::RenderTriggered);
            }
        });

        let text = egui::RichText::new(self.status.to_string());
        let text = if self.status.is_failure() {
            text.color(egui::Color32::from_rgb(230, 80, 80))
        } else {
            text
        };
        ui.label(text);

        events
    }
}

impl ControlSurface for ControlPanel {
    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn set_status(&mut self, status: &RenderStatus) {
        self.status = status.clone();
    }
}

/// Display surface backed by an egui texture
pub struct CanvasSurface {
    ctx: egui::Context,
    size: SurfaceSize,
    texture: Option<egui::TextureHandle>,
}

impl CanvasSurface {
    pub fn new(ctx: egui::Context, size: SurfaceSize) -> Self {
        Self {
            ctx,
            size,
            texture: None,
        }
    }

    /// Draw the canvas at one image pixel per physical pixel
    pub fn show(&self, ui: &mut egui::Ui) {
        let points = egui::vec2(self.size.width as f32, self.size.height as f32)
            / ui.ctx().pixels_per_point();

        match &self.texture {
            Some(texture) => {
                ui.add(egui::Image::new(egui::load::SizedTexture::new(texture.id(), points)));
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(points, egui::Sense::hover());
                ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);
            }
        }
    }
}

impl DisplaySurface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.texture = None;
    }

    fn put_image(&mut self, image: &RgbaImage) {
        let width = image.width().min(self.size.width);
        let height = image.height().min(self.size.height);
        let clipped;
        let image = if (width, height) == image.dimensions() {
            image
        } else {
            clipped = image::imageops::crop_imm(image, 0, 0, width, height).to_image();
            &clipped
        };

        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        self.texture = Some(
            self.ctx
                .load_texture("render-canvas", color_image, egui::TextureOptions::NEAREST),
        );
    }
}

/// Control surface for headless runs: status changes go to the log
#[derive(Debug, Default)]
pub struct LogControlSurface {
    interactive: bool,
    status: RenderStatus,
}

impl LogControlSurface {
    pub fn status(&self) -> &RenderStatus {
        &self.status
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl ControlSurface for LogControlSurface {
    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn set_status(&mut self, status: &RenderStatus) {
        info!("{}", status);
        self.status = status.clone();
    }
}
