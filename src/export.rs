use image::ImageFormat;
use parking_lot::Mutex;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::canvas::CanvasState;
use crate::compositor::Compositor;
use crate::error::ExportError;
use crate::loader::ImageLoader;
use crate::overlay::OverlayId;
use crate::state::EditorContext;
use crate::util::time::epoch_millis;

/// Where finished PNGs go
pub trait ExportSink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError>;
}

/// Writes exports into a directory, creating it if needed
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, png)?;
        log::info!("Wrote {} ({} bytes)", path.display(), png.len());
        Ok(())
    }
}

/// Keeps exports in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl ExportSink for MemorySink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError> {
        self.files.push((file_name.to_owned(), png.to_vec()));
        Ok(())
    }
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub skipped: Vec<OverlayId>,
}

/// `{product}-design-{millis}.png`, with the product name lowercased and
/// anything outside `[a-z0-9-]` folded to `-`
pub fn export_file_name(product_name: &str, millis: u128) -> String {
    let slug: String = product_name
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' }
        })
        .collect();
    let slug = if slug.is_empty() { "design".to_owned() } else { slug };
    format!("{slug}-design-{millis}.png")
}

/// Clears the exporting flag when dropped
#[derive(Debug)]
struct ExportGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A frozen canvas waiting to be rendered
#[derive(Debug)]
pub struct ExportJob {
    canvas: CanvasState,
    file_name: String,
    _guard: ExportGuard,
}

impl ExportJob {
    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Runs exports one at a time.
///
/// `begin` checks preconditions, puts the view back to 100% with no pan
/// and freezes the canvas; `run` renders and saves it. A second export
/// started while one is in flight fails with `ExportError::Busy`.
#[derive(Debug)]
pub struct Exporter<L> {
    compositor: Compositor<L>,
    exporting: Arc<AtomicBool>,
    last_error: Mutex<Option<String>>,
}

impl<L: ImageLoader> Exporter<L> {
    pub fn new(compositor: Compositor<L>) -> Self {
        Self {
            compositor,
            exporting: Arc::new(AtomicBool::new(false)),
            last_error: Mutex::new(None),
        }
    }

    pub fn compositor(&self) -> &Compositor<L> {
        &self.compositor
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Message of the most recent failed export, for display
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn begin(&self, ctx: &mut EditorContext) -> Result<ExportJob, ExportError> {
        if ctx.canvas().base_image().is_none() {
            return Err(self.fail(ExportError::NoBaseImage));
        }
        if self
            .exporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ExportError::Busy);
        }
        let guard = ExportGuard {
            flag: Arc::clone(&self.exporting),
        };

        ctx.reset_view();
        let file_name = export_file_name(&self.compositor.config().product_name, epoch_millis());
        log::info!("Export started: {file_name}");
        Ok(ExportJob {
            canvas: ctx.canvas().clone(),
            file_name,
            _guard: guard,
        })
    }

    pub async fn run(
        &self,
        job: ExportJob,
        sink: &mut dyn ExportSink,
    ) -> Result<ExportArtifact, ExportError> {
        let result = self.render_and_save(&job, sink).await;
        drop(job);
        result.map_err(|err| self.fail(err))
    }

    /// `begin` followed by `run`
    pub async fn export(
        &self,
        ctx: &mut EditorContext,
        sink: &mut dyn ExportSink,
    ) -> Result<ExportArtifact, ExportError> {
        let job = self.begin(ctx)?;
        self.run(job, sink).await
    }

    async fn render_and_save(
        &self,
        job: &ExportJob,
        sink: &mut dyn ExportSink,
    ) -> Result<ExportArtifact, ExportError> {
        let composition = self.compositor.compose(&job.canvas).await?;
        let (width, height) = composition.image.dimensions();

        let mut png = Cursor::new(Vec::new());
        composition.image.write_to(&mut png, ImageFormat::Png)?;
        sink.save(&job.file_name, png.get_ref())?;

        if !composition.skipped.is_empty() {
            log::warn!(
                "{} left out {} overlay(s) that failed to load",
                job.file_name,
                composition.skipped.len()
            );
        }
        *self.last_error.lock() = None;
        Ok(ExportArtifact {
            file_name: job.file_name.clone(),
            width,
            height,
            skipped: composition.skipped,
        })
    }

    fn fail(&self, err: ExportError) -> ExportError {
        log::error!("Export failed: {err}");
        *self.last_error.lock() = Some(err.to_string());
        err
    }
}
