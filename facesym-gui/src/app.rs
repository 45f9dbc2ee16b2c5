//! Application lifecycle: construction, worker polling, and file intake.

use std::{
    path::Path,
    sync::mpsc,
};

use eframe::{App, CreationContext, Frame};
use egui::{ColorImage, Context as EguiContext, DroppedFile, TextureOptions};
use facesym_core::{
    Applied, DetectorOptions, LandmarkProvider, ModelArtifacts, OnnxLandmarkProvider,
    Orchestrator, OverlayStyle, SelectedFile, UploadError, UploadRejected,
};
use facesym_utils::config::{AppSettings, default_settings_path};
use image::RgbaImage;
use log::{debug, info, warn};

use crate::{
    FaceSymApp, JobMessage, PreviewState,
    core::{jobs, settings::load_settings},
    theme,
};

/// Extensions offered by the file dialog.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "webp", "gif"];

impl FaceSymApp<OnnxLandmarkProvider> {
    /// Creates the app with the ONNX provider described by the settings file.
    pub fn new(cc: &CreationContext<'_>) -> Self {
        let settings_path = default_settings_path();
        info!("Loading GUI settings from {}", settings_path.display());
        let settings = load_settings(&settings_path);
        let provider = OnnxLandmarkProvider::new(
            ModelArtifacts::from(settings.models.clone()),
            settings.landmarks.clone(),
        );
        Self::create(&cc.egui_ctx, settings, provider)
    }
}

impl<P: LandmarkProvider + 'static> FaceSymApp<P> {
    /// Creates the app around `provider` and starts loading its models in the background.
    pub fn create(ctx: &EguiContext, settings: AppSettings, provider: P) -> Self {
        theme::apply(ctx);

        settings.telemetry.apply();
        if settings.telemetry.enabled {
            info!(
                "Telemetry logging enabled (level={:?})",
                settings.telemetry.level_filter()
            );
        }

        let orchestrator = Orchestrator::new(
            DetectorOptions::from(settings.detector.clone()),
            OverlayStyle::from(&settings.overlay),
        );
        let (job_tx, job_rx) = mpsc::channel();
        jobs::spawn_model_load(provider, job_tx.clone());

        Self {
            settings,
            orchestrator,
            job_tx,
            job_rx,
            preview: PreviewState::default(),
            jobs_in_flight: 1,
        }
    }

    /// Whether any background job has not reported back yet.
    pub fn is_busy(&self) -> bool {
        self.jobs_in_flight > 0
    }

    /// Polls the worker pool for finished jobs.
    pub fn poll_worker(&mut self, ctx: &EguiContext) {
        let mut updated = false;
        while let Ok(message) = self.job_rx.try_recv() {
            self.jobs_in_flight = self.jobs_in_flight.saturating_sub(1);
            self.handle_job_message(ctx, message);
            updated = true;
        }

        if updated {
            ctx.request_repaint();
        }
    }

    fn handle_job_message(&mut self, ctx: &EguiContext, message: JobMessage<P>) {
        match message {
            JobMessage::ModelsLoaded(result) => self.orchestrator.models_loaded(result),
            JobMessage::Decoded(outcome) => {
                if let Some(job) = self.orchestrator.image_decoded(outcome) {
                    self.sync_preview(ctx);
                    self.jobs_in_flight += 1;
                    jobs::spawn_detection(job, self.job_tx.clone());
                }
            }
            JobMessage::Detected(outcome) => match self.orchestrator.detection_finished(outcome) {
                Applied::Stale => {}
                Applied::Detected(score) => {
                    debug!("applied symmetry score {score}");
                    self.sync_preview(ctx);
                }
                Applied::Failed(failure) => debug!("detection ended with {}", failure.label()),
            },
        }
    }

    /// Start a cycle for `file`, or for a failed read of it.
    pub fn select_upload(&mut self, file: Result<SelectedFile, UploadError>) {
        self.preview.clear();
        match self.orchestrator.select_upload(file) {
            Ok(job) => {
                self.jobs_in_flight += 1;
                jobs::spawn_decode(job, self.job_tx.clone());
            }
            Err(UploadRejected::ModelsNotReady) => {
                warn!("ignoring upload while models are unavailable");
            }
            Err(UploadRejected::Upload(err)) => warn!("upload failed: {err}"),
        }
    }

    /// Read `path` and start a cycle for it.
    pub fn select_path(&mut self, path: &Path) {
        self.select_upload(SelectedFile::from_path(path));
    }

    /// Shows the native image picker; a cancelled dialog leaves everything untouched.
    pub fn open_file_dialog(&mut self) {
        use rfd::FileDialog;

        if let Some(path) = FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.select_path(&path);
        }
    }

    /// Consumes files dropped onto the window. Only the first one is analyzed.
    pub fn process_dropped_files(&mut self, ctx: &EguiContext) {
        let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped_files.is_empty() {
            return;
        }
        ctx.input_mut(|i| i.raw.dropped_files.clear());

        if !self.orchestrator.state().can_upload() {
            debug!("ignoring dropped files while models are unavailable");
            return;
        }
        if dropped_files.len() > 1 {
            info!(
                "{} files dropped; analyzing the first one",
                dropped_files.len()
            );
        }
        if let Some(file) = dropped_files.into_iter().next() {
            self.select_upload(dropped_file_to_upload(file));
        }
    }

    /// Rebuild textures when the displayed generation changed.
    fn sync_preview(&mut self, ctx: &EguiContext) {
        let state = self.orchestrator.state();
        let generation = state.generation();
        if generation.is_none() {
            self.preview.clear();
            return;
        }

        if self.preview.generation != generation || self.preview.image.is_none() {
            self.preview.clear();
            if let Some(image) = state.image() {
                let rgba = image.to_rgba8();
                self.preview.image_size = Some(rgba.dimensions());
                self.preview.image = Some(ctx.load_texture(
                    format!("facesym-preview-{}", generation.unwrap_or_default()),
                    color_image(&rgba),
                    TextureOptions::LINEAR,
                ));
            }
            self.preview.generation = generation;
        }

        if self.preview.overlay.is_none()
            && let Some(canvas) = state.overlay()
        {
            self.preview.overlay = Some(ctx.load_texture(
                format!("facesym-overlay-{}", generation.unwrap_or_default()),
                color_image(canvas.pixels()),
                TextureOptions::LINEAR,
            ));
        }
    }
}

impl<P: LandmarkProvider + 'static> App for FaceSymApp<P> {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        self.poll_worker(ctx);
        self.process_dropped_files(ctx);
        self.show_main_panel(ctx);

        if self.is_busy() {
            ctx.request_repaint();
        }
    }
}

fn dropped_file_to_upload(file: DroppedFile) -> Result<SelectedFile, UploadError> {
    if let Some(path) = file.path.as_ref() {
        return SelectedFile::from_path(path);
    }
    match file.bytes {
        Some(bytes) => {
            let upload = SelectedFile::new(file.name, bytes.to_vec());
            Ok(if file.mime.is_empty() {
                upload
            } else {
                upload.with_media_type(file.mime)
            })
        }
        None => Err(UploadError::NoFile),
    }
}

fn color_image(rgba: &RgbaImage) -> ColorImage {
    let size = [rgba.width() as usize, rgba.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_bytes_keep_name_and_mime() {
        let file = DroppedFile {
            name: "face.png".into(),
            mime: "image/png".into(),
            bytes: Some(vec![1u8, 2, 3].into()),
            ..Default::default()
        };
        let upload = dropped_file_to_upload(file).expect("bytes upload");
        assert_eq!(upload.name, "face.png");
        assert_eq!(upload.media_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn dropped_file_without_content_is_an_upload_error() {
        let file = DroppedFile {
            name: "ghost".into(),
            ..Default::default()
        };
        assert!(matches!(
            dropped_file_to_upload(file),
            Err(UploadError::NoFile)
        ));
    }

    #[test]
    fn color_image_matches_dimensions() {
        let rgba = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let color = color_image(&rgba);
        assert_eq!(color.size, [3, 2]);
    }
}
