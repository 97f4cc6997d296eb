//! Trim orchestration
//!
//! A [`TrimJob`] drives one run from `Idle` to `Succeeded` or `Failed`:
//! open the input, detect a content box per page, clip every page into a
//! fresh document, remap the outline, copy metadata and write the result.
//!
//! In parallel mode the calling thread still renders pages in order, since
//! rasterizer handles are not shareable across threads. Rendered buffers go
//! through a bounded channel to a pool of scoped detection workers, which
//! send `(page index, box)` pairs back. Reconstruction always runs on the
//! calling thread in page order, so output order never depends on which
//! worker finishes first.

use crate::clip::PageAssembler;
use crate::config::{ExecutionMode, TrimOptions};
use crate::detect::detect_content_bbox;
use crate::error::TrimError;
use crate::raster::{PixelBuffer, RasterBackend, Rasterizer};
use crossbeam_channel::{bounded, unbounded};
use shared_pdf::outline::read_outline;
use shared_pdf::page::{page_geometry, page_ids};
use shared_pdf::{Metadata, PageGeometry, PageIndexMap, PdfError, Rect};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// `<stem>_cropped.pdf` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    shared_pdf::io::suffixed_path(input, "_cropped")
}

#[derive(Debug, Clone)]
pub struct TrimRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: TrimOptions,
}

impl TrimRequest {
    /// Request with default options writing to [`default_output_path`]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = default_output_path(&input);
        Self {
            input,
            output,
            options: TrimOptions::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_options(mut self, options: TrimOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct TrimReport {
    pub page_count: usize,
    pub input_size: u64,
    pub output_size: u64,
    pub reduction_percent: f64,
    /// Detected boxes in raster orientation, one per input page
    pub boxes: Vec<Rect>,
    pub page_map: PageIndexMap,
    pub processing_time_ms: u64,
}

impl TrimReport {
    pub fn message(&self) -> String {
        format!(
            "Trim complete: file size reduced by {:.2}%",
            self.reduction_percent
        )
    }
}

/// `(1 - output / input) * 100`; zero for an empty input
pub fn reduction_percent(input_size: u64, output_size: u64) -> f64 {
    if input_size == 0 {
        return 0.0;
    }
    (1.0 - output_size as f64 / input_size as f64) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    /// Completion as an integer percentage, 100 for an empty document
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.current.min(self.total) * 100) / self.total) as u8
    }
}

/// Notifications emitted while a job runs
#[derive(Debug, Clone)]
pub enum TrimEvent {
    Started { input: PathBuf },
    /// One more page has been processed
    Progress(Progress),
    Succeeded {
        message: String,
        reduction_percent: f64,
    },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub enum JobState {
    Idle,
    Running,
    Succeeded(TrimReport),
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded(_) | JobState::Failed(_))
    }
}

/// Cooperative cancellation, checked between pages
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), TrimError> {
        if self.is_cancelled() {
            Err(TrimError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One trim run. Terminal states are final; start a new job to trim again.
#[derive(Debug)]
pub struct TrimJob {
    state: JobState,
    cancel: CancelHandle,
}

impl Default for TrimJob {
    fn default() -> Self {
        Self::new()
    }
}

impl TrimJob {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
            cancel: CancelHandle::default(),
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Handle that can stop this job from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run the trim, reporting events to `on_event`.
    ///
    /// Fails without emitting events if the job has already run.
    pub fn run<F>(
        &mut self,
        request: &TrimRequest,
        backend: &dyn RasterBackend,
        mut on_event: F,
    ) -> Result<TrimReport, TrimError>
    where
        F: FnMut(TrimEvent),
    {
        if !matches!(self.state, JobState::Idle) {
            return Err(TrimError::InvalidOption("job already ran".into()));
        }

        self.state = JobState::Running;
        on_event(TrimEvent::Started {
            input: request.input.clone(),
        });

        match execute(request, backend, &self.cancel, &mut on_event) {
            Ok(report) => {
                let message = report.message();
                info!("{}", message);
                on_event(TrimEvent::Succeeded {
                    message,
                    reduction_percent: report.reduction_percent,
                });
                self.state = JobState::Succeeded(report.clone());
                Ok(report)
            }
            Err(e) => {
                let message = format!("Trim failed: {}", e);
                warn!("{}", message);
                on_event(TrimEvent::Failed {
                    message: message.clone(),
                });
                self.state = JobState::Failed(message);
                Err(e)
            }
        }
    }
}

/// Trim `request` with a fresh job, logging progress
pub fn trim_pdf(request: &TrimRequest, backend: &dyn RasterBackend) -> Result<TrimReport, TrimError> {
    TrimJob::new().run(request, backend, |event| {
        if let TrimEvent::Progress(progress) = event {
            debug!("Trim progress: {}/{}", progress.current, progress.total);
        }
    })
}

fn execute(
    request: &TrimRequest,
    backend: &dyn RasterBackend,
    cancel: &CancelHandle,
    on_event: &mut dyn FnMut(TrimEvent),
) -> Result<TrimReport, TrimError> {
    let start = Instant::now();
    let options = &request.options;
    options.validate()?;

    if !request.input.is_file() {
        return Err(TrimError::InputNotFound(request.input.clone()));
    }
    let input_bytes = fs::read(&request.input)?;
    let input_size = input_bytes.len() as u64;
    let source = shared_pdf::load_document(&input_bytes).map_err(|e| match e {
        PdfError::ParseError(message) => TrimError::Parse(message),
        other => TrimError::Pdf(other),
    })?;

    let source_pages = page_ids(&source);
    let total = source_pages.len();
    let geometries: Vec<PageGeometry> = source_pages
        .iter()
        .map(|&id| page_geometry(&source, id))
        .collect();

    let rasterizer = backend.open(&request.input)?;
    if rasterizer.page_count() != total {
        return Err(TrimError::PageCountMismatch {
            rendered: rasterizer.page_count(),
            parsed: total,
        });
    }

    info!(
        "Trimming {} ({} pages, {:?})",
        request.input.display(),
        total,
        options.execution_mode()
    );

    let mut assembler = PageAssembler::new(&source);
    let mut page_map = PageIndexMap::new();
    let mut boxes = Vec::with_capacity(total);

    match options.execution_mode() {
        ExecutionMode::Sequential => {
            for (index, &page_id) in source_pages.iter().enumerate() {
                cancel.check()?;
                let bbox = detect_page(rasterizer.as_ref(), index, &geometries[index], options)?;
                page_map.insert(index, assembler.clip_page(&source, page_id, &bbox)?);
                boxes.push(bbox);
                on_event(TrimEvent::Progress(Progress {
                    current: index + 1,
                    total,
                }));
            }
        }
        ExecutionMode::Parallel { workers } => {
            let detected = detect_parallel(
                rasterizer.as_ref(),
                &geometries,
                options,
                workers,
                cancel,
                on_event,
            )?;
            for (index, (&page_id, bbox)) in source_pages.iter().zip(detected).enumerate() {
                page_map.insert(index, assembler.clip_page(&source, page_id, &bbox)?);
                boxes.push(bbox);
            }
        }
    }

    if !page_map.is_permutation(total) {
        return Err(PdfError::OperationError(format!(
            "page map covers {} of {} pages",
            page_map.len(),
            total
        ))
        .into());
    }

    let outline = read_outline(&source);
    let remapped = outline.remap(&page_map);
    if remapped.len() != outline.len() {
        warn!(
            "Dropped {} outline entries without a mapped target",
            outline.len() - remapped.len()
        );
    }
    let metadata = Metadata::read(&source);

    let mut output = assembler.finish(&remapped, &metadata)?;
    let output_bytes = shared_pdf::save_document(&mut output)?;

    cancel.check()?;
    shared_pdf::io::write_atomically(&request.output, &output_bytes).map_err(|e| {
        TrimError::Write(format!("{}: {}", request.output.display(), e))
    })?;

    let output_size = output_bytes.len() as u64;
    Ok(TrimReport {
        page_count: total,
        input_size,
        output_size,
        reduction_percent: reduction_percent(input_size, output_size),
        boxes,
        page_map,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Detect one page's box; rotated pages are kept whole
fn detect_page(
    rasterizer: &dyn Rasterizer,
    index: usize,
    geometry: &PageGeometry,
    options: &TrimOptions,
) -> Result<Rect, TrimError> {
    if geometry.rotation != 0 {
        warn!(
            "Page {} is rotated by {} degrees, keeping full page",
            index + 1,
            geometry.rotation
        );
        return Ok(geometry.rect);
    }
    let pixels = rasterizer.render(index)?;
    let bbox = detect_content_bbox(&pixels, &geometry.rect, options);
    trace!("Page {} content box {:?}", index + 1, bbox);
    Ok(bbox)
}

/// Render on this thread, detect on `workers` threads, collect in page order
fn detect_parallel(
    rasterizer: &dyn Rasterizer,
    geometries: &[PageGeometry],
    options: &TrimOptions,
    workers: usize,
    cancel: &CancelHandle,
    on_event: &mut dyn FnMut(TrimEvent),
) -> Result<Vec<Rect>, TrimError> {
    let total = geometries.len();
    let workers = workers.clamp(1, total.max(1));
    let mut boxes: Vec<Option<Rect>> = vec![None; total];
    let mut completed = 0;

    let mut record = |index: usize, bbox: Rect| {
        boxes[index] = Some(bbox);
        completed += 1;
        on_event(TrimEvent::Progress(Progress {
            current: completed,
            total,
        }));
    };

    std::thread::scope(|scope| -> Result<(), TrimError> {
        // Dropping the job sender on any early return lets workers drain and exit
        let (job_tx, job_rx) = bounded::<(usize, PixelBuffer, Rect)>(workers * 2);
        let (result_tx, result_rx) = unbounded::<(usize, Rect)>();

        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                let mut handled = 0usize;
                for (index, pixels, page) in job_rx {
                    let bbox = detect_content_bbox(&pixels, &page, options);
                    if result_tx.send((index, bbox)).is_err() {
                        break;
                    }
                    handled += 1;
                }
                trace!("Detection worker {} handled {} pages", worker, handled);
            });
        }
        drop(job_rx);
        drop(result_tx);

        for (index, geometry) in geometries.iter().enumerate() {
            cancel.check()?;
            if geometry.rotation != 0 {
                record(index, detect_page(rasterizer, index, geometry, options)?);
                continue;
            }
            let pixels = rasterizer.render(index)?;
            job_tx
                .send((index, pixels, geometry.rect))
                .map_err(|_| TrimError::Render {
                    page: index,
                    message: "detection workers stopped".into(),
                })?;
            while let Ok((done, bbox)) = result_rx.try_recv() {
                record(done, bbox);
            }
        }
        drop(job_tx);

        for (done, bbox) in result_rx {
            record(done, bbox);
        }
        Ok(())
    })?;

    boxes
        .into_iter()
        .enumerate()
        .map(|(index, bbox)| {
            bbox.ok_or(TrimError::Render {
                page: index,
                message: "no detection result".into(),
            })
        })
        .collect()
}
