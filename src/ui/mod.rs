mod presenter;

pub use presenter::{DetectionOverlay, EguiPresenter};

use crate::capture::FrameSource;
use crate::config::{IMAGE_EXTENSIONS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::detection::{label_color, Detector};
use crate::playback::{run_due_tick, start_live, Mode, Session, TickScheduler};
use crate::presentation::{box_in_pane, tag_origin, tag_text, ControlSet, PreviewTarget};
use eframe::egui;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

pub const WINDOW_TITLE: &str = "Waste Classification using YOLOv8";

const BG_COLOR: egui::Color32 = egui::Color32::from_rgb(0x2b, 0x2b, 0x2b);
const FRAME_COLOR: egui::Color32 = egui::Color32::from_rgb(0x40, 0x40, 0x40);
const EMPTY_PANE_COLOR: egui::Color32 = egui::Color32::from_rgb(0x36, 0x36, 0x36);
const BUTTON_COLOR: egui::Color32 = egui::Color32::from_rgb(0x4c, 0xaf, 0x50);
const TEXT_COLOR: egui::Color32 = egui::Color32::WHITE;

const TITLE_HEIGHT: f32 = 48.0;
const STATUS_HEIGHT: f32 = 36.0;
const SOURCE_PANEL_WIDTH: f32 = 190.0;
const OBJECTS_PANEL_WIDTH: f32 = 130.0;
const CENTRAL_MARGIN: f32 = 10.0;
// Panel separators and side panel margins
const CHROME_SLACK: f32 = 24.0;
const TAG_FONT_SIZE: f32 = 12.0;

/// Inner window size that fits the live pane plus the surrounding panels
fn window_size() -> [f32; 2] {
    let central_w = VIEWPORT_WIDTH as f32 + 2.0 * CENTRAL_MARGIN;
    let central_h = VIEWPORT_HEIGHT as f32 + 2.0 * CENTRAL_MARGIN;
    [
        SOURCE_PANEL_WIDTH + OBJECTS_PANEL_WIDTH + central_w + CHROME_SLACK,
        TITLE_HEIGHT + STATUS_HEIGHT + central_h + CHROME_SLACK,
    ]
}

/// Open the window and drive `session` from the UI event loop until it closes
pub fn run<S, D>(session: Session<S, D, EguiPresenter>) -> eframe::Result<()>
where
    S: FrameSource + 'static,
    D: Detector + 'static,
{
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(window_size())
            .with_resizable(false)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(DetectorApp::new(cc, session)))),
    )
}

enum UiAction {
    Select(Mode),
    Browse,
    Open(PathBuf),
    Detect,
    Start,
    Stop,
}

pub struct DetectorApp<S: FrameSource, D: Detector> {
    session: Session<S, D, EguiPresenter>,
    scheduler: TickScheduler,
    textures: HashMap<PreviewTarget, egui::TextureHandle>,
}

impl<S: FrameSource, D: Detector> DetectorApp<S, D> {
    pub fn new(cc: &eframe::CreationContext<'_>, session: Session<S, D, EguiPresenter>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = BG_COLOR;
        visuals.window_fill = BG_COLOR;
        visuals.override_text_color = Some(TEXT_COLOR);
        cc.egui_ctx.set_visuals(visuals);

        Self {
            session,
            scheduler: TickScheduler::default(),
            textures: HashMap::new(),
        }
    }

    fn handle(&mut self, action: UiAction) {
        // Failures are already on the status line and in the log
        match action {
            UiAction::Select(mode) => self.session.select(mode),
            UiAction::Browse => {
                let _ = self.session.load(pick_image_file);
            }
            UiAction::Open(path) => {
                if self.session.mode() == Mode::Image {
                    let _ = self.session.load(|| Some(path));
                } else {
                    tracing::debug!("Ignoring dropped file outside image mode");
                }
            }
            UiAction::Detect => {
                let _ = self.session.detect();
            }
            UiAction::Start => {
                let _ = start_live(&mut self.session, &mut self.scheduler, Instant::now());
            }
            UiAction::Stop => self.session.stop(),
        }
    }

    fn upload_previews(&mut self, ctx: &egui::Context) {
        for (target, image) in self.session.presenter_mut().take_pending() {
            match self.textures.get_mut(&target) {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    let texture =
                        ctx.load_texture(format!("{:?}", target), image, egui::TextureOptions::LINEAR);
                    self.textures.insert(target, texture);
                }
            }
        }
    }

    fn pane(&self, ui: &mut egui::Ui, target: PreviewTarget) {
        let (w, h) = target.size();
        let size = egui::vec2(w as f32, h as f32);
        match self.textures.get(&target) {
            Some(texture) => {
                let response = ui.image((texture.id(), size));
                self.draw_tags(ui, target, response.rect);
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                ui.painter().rect_filled(rect, 0.0, EMPTY_PANE_COLOR);
            }
        }
    }

    /// Label each detection box with "label NN%" on a tag in its class colour
    fn draw_tags(&self, ui: &egui::Ui, target: PreviewTarget, rect: egui::Rect) {
        let Some(overlay) = self.session.presenter().overlay_for(target) else {
            return;
        };
        let painter = ui.painter().with_clip_rect(rect);
        for det in &overlay.detections {
            let [r, g, b] = label_color(&det.label);
            let color = egui::Color32::from_rgb(r, g, b);

            let bbox = box_in_pane(&det.bbox, overlay.frame_size, target.size());
            let galley = painter.layout_no_wrap(
                tag_text(det),
                egui::FontId::proportional(TAG_FONT_SIZE),
                TEXT_COLOR,
            );
            let tag_size = galley.size() + egui::vec2(6.0, 2.0);
            let (x, y) = tag_origin(&bbox, tag_size.y);
            let tag_rect = egui::Rect::from_min_size(rect.min + egui::vec2(x, y), tag_size);

            painter.rect_filled(tag_rect, egui::Rounding::same(3.0), color);
            painter.galley(tag_rect.min + egui::vec2(3.0, 1.0), galley, TEXT_COLOR);
        }
    }

    fn source_panel(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.add_space(12.0);
        ui.label(egui::RichText::new("Source Selection").size(18.0).strong());
        ui.add_space(12.0);

        let current = self.session.mode();
        for (mode, text) in [(Mode::Image, "Image"), (Mode::Webcam, "Webcam")] {
            if ui.radio(current == mode, text).clicked() {
                actions.push(UiAction::Select(mode));
            }
        }
        ui.add_space(16.0);

        let buttons: [(&str, UiAction); 2] = match self.session.presenter().controls() {
            ControlSet::Image => [("Browse Files", UiAction::Browse), ("Detect Objects", UiAction::Detect)],
            ControlSet::Webcam => [("Start Camera", UiAction::Start), ("Stop Camera", UiAction::Stop)],
        };
        for (text, action) in buttons {
            let button = egui::Button::new(egui::RichText::new(text).size(15.0).color(TEXT_COLOR))
                .fill(BUTTON_COLOR)
                .min_size(egui::vec2(150.0, 32.0));
            if ui.add(button).clicked() {
                actions.push(action);
            }
            ui.add_space(10.0);
        }
    }

    fn objects_panel(&self, ui: &mut egui::Ui) {
        ui.heading("Objects");
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for det in self.session.presenter().detections() {
                let [r, g, b] = label_color(&det.label);
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    ui.painter()
                        .circle_filled(rect.center(), 4.0, egui::Color32::from_rgb(r, g, b));
                    ui.label(tag_text(det));
                });
            }
        });
    }
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Image files", &IMAGE_EXTENSIONS[..])
        .pick_file()
}

impl<S: FrameSource, D: Detector> eframe::App for DetectorApp<S, D> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        run_due_tick(&mut self.session, &mut self.scheduler, Instant::now());
        self.upload_previews(ctx);

        let mut actions = Vec::new();

        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    actions.push(UiAction::Open(path.clone()));
                }
            }
        });

        egui::TopBottomPanel::top("title")
            .exact_height(TITLE_HEIGHT)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new("Waste Classification").size(26.0).strong());
                    ui.add_space(6.0);
                });
            });

        egui::TopBottomPanel::bottom("status")
            .exact_height(STATUS_HEIGHT)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(self.session.presenter().status()).size(15.0));
                    ui.add_space(6.0);
                });
            });

        egui::SidePanel::left("source")
            .exact_width(SOURCE_PANEL_WIDTH)
            .resizable(false)
            .frame(egui::Frame::default().fill(FRAME_COLOR).inner_margin(12.0))
            .show(ctx, |ui| self.source_panel(ui, &mut actions));

        egui::SidePanel::right("objects")
            .exact_width(OBJECTS_PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| self.objects_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(FRAME_COLOR).inner_margin(CENTRAL_MARGIN))
            .show(ctx, |ui| match self.session.presenter().controls() {
                ControlSet::Image => {
                    ui.horizontal(|ui| {
                        self.pane(ui, PreviewTarget::Input);
                        self.pane(ui, PreviewTarget::Output);
                    });
                }
                ControlSet::Webcam => self.pane(ui, PreviewTarget::Live),
            });

        if !actions.is_empty() {
            for action in actions {
                self.handle(action);
            }
            ctx.request_repaint();
        }

        if let Some(wait) = self.scheduler.remaining(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
