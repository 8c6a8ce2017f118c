//! Processor: parallel detection, sequential tracking and annotation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::Receiver;
use tracing::{debug, info, trace, warn};

use super::{
    Annotator, CancellationToken, Color, Detector, FrameContext, FrameInput, ReorderBuffer,
};
use crate::config::ProcessorConfig;
use crate::error::{BoxError, Error, Result};
use crate::integration::frame::{Frame, Video};
use crate::tracker::{
    ActionZone, CarTracker, Detection, LabelFilter, Trace, TrackerConfig, ZoneSpec,
};

/// Where the running counter is drawn.
const COUNTER_POSITION: (i32, i32) = (70, 20);

type DetectionResult = std::result::Result<Vec<Detection>, BoxError>;

/// Output of a run.
#[derive(Debug, Clone)]
pub struct AnnotatedVideo {
    /// Annotated frames in original order, at the input frame rate
    pub video: Video,
    pub car_count: usize,
    /// Every trace created during the run, ascending by identity
    pub traces: Vec<Trace>,
    /// True when the run stopped before the last frame; `video` then holds
    /// the frames annotated up to that point.
    pub cancelled: bool,
}

/// Combines a `Detector`, the `CarTracker` and an `Annotator` into one run
/// over a video.
///
/// Detection is spread over a pool of worker threads. Zone filtering,
/// tracking and annotation run on the calling thread, one frame at a time
/// in frame order, whatever order the workers finish in.
pub struct Processor<D, A> {
    detector: D,
    annotator: A,
    zone: ZoneSpec,
    tracker_config: TrackerConfig,
    label_filter: LabelFilter,
    workers: usize,
    draw_labels: bool,
}

impl<D: Detector, A: Annotator> Processor<D, A> {
    /// Create a processor. Invalid configuration is rejected here, before
    /// any frame is touched.
    pub fn new(detector: D, annotator: A, config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector,
            annotator,
            zone: config.zone,
            tracker_config: config.tracker_config(),
            label_filter: config.label_filter(),
            workers: config.worker_count(),
            draw_labels: config.draw_labels,
        })
    }

    /// Create a processor with the default configuration.
    pub fn with_default_config(detector: D, annotator: A) -> Result<Self> {
        Self::new(detector, annotator, ProcessorConfig::default())
    }

    /// Replace the car label predicate.
    pub fn with_label_filter(mut self, filter: LabelFilter) -> Self {
        self.label_filter = filter;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a reference to the underlying annotator.
    pub fn annotator(&self) -> &A {
        &self.annotator
    }

    /// Detect, track and annotate every frame of `video`.
    pub fn process(&self, video: &Video) -> Result<AnnotatedVideo> {
        self.process_with_cancel(video, &CancellationToken::new())
    }

    /// Like `process`, stopping early once `cancel` is triggered.
    pub fn process_with_cancel(
        &self,
        video: &Video,
        cancel: &CancellationToken,
    ) -> Result<AnnotatedVideo> {
        let Some(mut reduction) = self.start(video)? else {
            return Ok(AnnotatedVideo::empty(video.fps()));
        };
        let context = self.detector.context();
        let workers = self.workers.min(video.len());
        info!(frames = video.len(), workers, ?context, "processing video");

        if workers <= 1 {
            self.detect_sequential(video.frames(), context, &mut reduction, cancel)?;
        } else {
            self.detect_parallel(video.frames(), context, workers, &mut reduction, cancel)?;
        }
        Ok(reduction.finish(video))
    }

    /// Run the whole-video detector first, then track and annotate.
    pub fn process_whole_video(&self, video: &Video) -> Result<AnnotatedVideo> {
        let per_frame = self
            .detector
            .detect_video(video)
            .map_err(|e| Error::VideoDetection(e.into()))?;
        self.process_detections(video, per_frame)
    }

    /// Track and annotate using detections computed elsewhere, one list per
    /// frame in frame order.
    pub fn process_detections(
        &self,
        video: &Video,
        per_frame: Vec<Vec<Detection>>,
    ) -> Result<AnnotatedVideo> {
        if per_frame.len() != video.len() {
            return Err(Error::DetectionCountMismatch {
                expected: video.len(),
                got: per_frame.len(),
            });
        }
        let Some(mut reduction) = self.start(video)? else {
            return Ok(AnnotatedVideo::empty(video.fps()));
        };
        for (index, (frame, detections)) in video.frames().iter().zip(per_frame).enumerate() {
            reduction.step(index, frame, detections)?;
        }
        Ok(reduction.finish(video))
    }

    /// Resolve the zone and set up tracking, or `None` for an empty video.
    fn start(&self, video: &Video) -> Result<Option<Reduction<'_, A>>> {
        let Some((width, height)) = video.dimensions() else {
            info!("empty video, nothing to process");
            return Ok(None);
        };
        let zone = self.zone.resolve(width, height)?;
        debug!(zone = ?zone.rect(), "action zone resolved");
        Ok(Some(Reduction {
            annotator: &self.annotator,
            labels: &self.label_filter,
            draw_labels: self.draw_labels,
            zone,
            tracker: CarTracker::new(self.tracker_config.clone())?,
            frames: Vec::with_capacity(video.len()),
        }))
    }

    fn detect_sequential(
        &self,
        frames: &[Frame],
        context: FrameContext,
        reduction: &mut Reduction<'_, A>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for index in 0..frames.len() {
            if cancel.is_cancelled() {
                warn!(frame = index, "run cancelled");
                return Ok(());
            }
            let detections = self
                .detector
                .detect_frame(FrameInput::at(frames, index, context))
                .map_err(|e| Error::detection(index, e))?;
            reduction.step(index, &frames[index], detections)?;
        }
        Ok(())
    }

    fn detect_parallel(
        &self,
        frames: &[Frame],
        context: FrameContext,
        workers: usize,
        reduction: &mut Reduction<'_, A>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
        for index in 0..frames.len() {
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<(usize, DetectionResult)>(workers * 2);
        // Set when the reduction stops early, so workers quit picking up frames.
        let abort = AtomicBool::new(false);
        let detector = &self.detector;

        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let abort = &abort;
                scope.spawn(move || {
                    for index in job_rx.iter() {
                        if abort.load(Ordering::Relaxed) || cancel.is_cancelled() {
                            break;
                        }
                        let result = detector
                            .detect_frame(FrameInput::at(frames, index, context))
                            .map_err(Into::into);
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                    trace!(worker, "detection worker done");
                });
            }
            drop(result_tx);

            let outcome = reduce_in_order(frames, &result_rx, reduction, cancel);
            abort.store(true, Ordering::Relaxed);
            drop(result_rx);
            outcome
        })
    }
}

/// Feed detection results to the reduction strictly by frame index,
/// waiting for a missing index rather than skipping ahead.
fn reduce_in_order<A: Annotator>(
    frames: &[Frame],
    results: &Receiver<(usize, DetectionResult)>,
    reduction: &mut Reduction<'_, A>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut buffer = ReorderBuffer::<DetectionResult>::new();
    while buffer.next_index() < frames.len() {
        if cancel.is_cancelled() {
            warn!(frame = buffer.next_index(), "run cancelled");
            return Ok(());
        }
        if let Some((index, result)) = buffer.pop_ready() {
            let detections = result.map_err(|source| Error::Detection {
                frame: index,
                source,
            })?;
            reduction.step(index, &frames[index], detections)?;
            continue;
        }
        match results.recv() {
            Ok((index, result)) => buffer.push(index, result),
            // Workers only hang up early on cancellation.
            Err(_) => return Ok(()),
        }
    }
    Ok(())
}

/// State owned by the sequential stage: the tracker and the output frames.
struct Reduction<'a, A> {
    annotator: &'a A,
    labels: &'a LabelFilter,
    draw_labels: bool,
    zone: ActionZone,
    tracker: CarTracker,
    frames: Vec<Frame>,
}

impl<A: Annotator> Reduction<'_, A> {
    fn step(&mut self, index: usize, source: &Frame, detections: Vec<Detection>) -> Result<()> {
        let detected = detections.len();
        let in_zone = self.zone.filter(detections);
        let zoned = in_zone.len();
        let cars = self.labels.apply(in_zone);

        let mut frame = source.clone();
        let reported = self.tracker.track(cars.clone()).len();
        let count = self.tracker.car_counter();
        let traces = self.tracker.reported_traces();
        debug!(
            frame = index,
            detected,
            in_zone = zoned,
            cars = cars.len(),
            reported,
            count,
            "frame tracked"
        );

        let annotator = self.annotator;
        let draw = |frame: &mut Frame| -> std::result::Result<(), A::Error> {
            annotator.draw_rectangles(frame, &cars, Color::CYAN, self.draw_labels)?;
            annotator.draw_outline(frame, self.zone.rect(), Color::GREEN)?;
            annotator.draw_text(
                frame,
                &format!("Car counter: {count}"),
                COUNTER_POSITION,
                Color::GREEN,
            )?;
            for t in &traces {
                let points: Vec<(i32, i32)> = t
                    .centers()
                    .map(|c| (c.x.round() as i32, c.y.round() as i32))
                    .collect();
                for pair in points.windows(2) {
                    annotator.draw_line(frame, pair[0], pair[1], Color::RED)?;
                }
            }
            Ok(())
        };
        draw(&mut frame).map_err(|e| Error::annotation(index, e))?;

        self.frames.push(frame);
        Ok(())
    }

    fn finish(self, video: &Video) -> AnnotatedVideo {
        let processed = self.frames.len();
        let cancelled = processed < video.len();
        let car_count = self.tracker.car_counter();
        info!(
            frames = processed,
            car_count,
            traces = self.tracker.traces().count(),
            cancelled,
            "run finished"
        );
        AnnotatedVideo {
            traces: self.tracker.traces().cloned().collect(),
            video: Video::new(self.frames, video.fps()),
            car_count,
            cancelled,
        }
    }
}

impl AnnotatedVideo {
    fn empty(fps: f64) -> Self {
        Self {
            video: Video::new(Vec::new(), fps),
            car_count: 0,
            traces: Vec::new(),
            cancelled: false,
        }
    }
}
