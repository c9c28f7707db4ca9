//! Background generation worker
//!
//! Service calls run on a dedicated thread with a current-thread tokio
//! runtime. Jobs go in over a tokio channel; results come back as
//! [`GenerationEvent`]s over a std channel that the UI thread drains once
//! per frame with [`GenerationWorker::poll_events`].

use super::error::GenerationError;
use super::request::{EditRequest, GenerationConfig, ImageRequest};
use super::retry::{with_retry, RetryPolicy};
use super::service::GenerationService;
use crate::document::ImageRef;
use crate::error::{Error, Result};
use crate::markdown::CapturedCursor;
use crate::streaming::SessionToken;
use futures::StreamExt;
use log::{debug, info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Called after every emitted event so the UI can wake up.
pub type RepaintCallback = Arc<dyn Fn() + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Jobs and Events
// ─────────────────────────────────────────────────────────────────────────────

/// Where a finished image request should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    /// Replace the candidate image set
    Gallery,
    /// Insert into the article text at a cursor captured at request time
    Inline(CapturedCursor),
}

/// Work submitted to the generation worker.
#[derive(Debug, Clone)]
pub enum GenerationJob {
    /// Stream a full article
    Article {
        token: SessionToken,
        config: GenerationConfig,
    },
    /// Generate a set of images from a prompt
    Images {
        token: SessionToken,
        request: ImageRequest,
        target: ImageTarget,
    },
    /// Derive a keyword from `context`, then generate one image for it
    InlineImage {
        token: SessionToken,
        context: String,
        request: ImageRequest,
        cursor: CapturedCursor,
    },
    /// Modify the image at `index`
    EditImage {
        token: SessionToken,
        index: usize,
        request: EditRequest,
    },
    SuggestKeywords {
        token: SessionToken,
        topic: String,
        category: String,
    },
    AnalyzeOriginality {
        token: SessionToken,
        text: String,
    },
}

impl GenerationJob {
    pub fn token(&self) -> SessionToken {
        match self {
            Self::Article { token, .. }
            | Self::Images { token, .. }
            | Self::InlineImage { token, .. }
            | Self::EditImage { token, .. }
            | Self::SuggestKeywords { token, .. }
            | Self::AnalyzeOriginality { token, .. } => *token,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Article { .. } => "stream_text",
            Self::Images { .. } => "generate_images",
            Self::InlineImage { .. } => "inline_image",
            Self::EditImage { .. } => "edit_image",
            Self::SuggestKeywords { .. } => "suggest_keywords",
            Self::AnalyzeOriginality { .. } => "analyze_originality",
        }
    }
}

/// Result of a job, tagged with the token of the job that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Fragment {
        token: SessionToken,
        text: String,
        received_at: Instant,
    },
    TextFinished {
        token: SessionToken,
    },
    TextFailed {
        token: SessionToken,
        error: GenerationError,
    },
    ImagesReady {
        token: SessionToken,
        target: ImageTarget,
        images: Vec<ImageRef>,
        requested: usize,
    },
    ImagesFailed {
        token: SessionToken,
        target: ImageTarget,
        error: GenerationError,
    },
    ImageEdited {
        token: SessionToken,
        index: usize,
        image: ImageRef,
    },
    ImageEditFailed {
        token: SessionToken,
        index: usize,
        error: GenerationError,
    },
    KeywordsSuggested {
        token: SessionToken,
        keywords: Vec<String>,
    },
    OriginalityReport {
        token: SessionToken,
        report: String,
    },
    AssistFailed {
        token: SessionToken,
        error: GenerationError,
    },
}

impl GenerationEvent {
    pub fn token(&self) -> SessionToken {
        match self {
            Self::Fragment { token, .. }
            | Self::TextFinished { token }
            | Self::TextFailed { token, .. }
            | Self::ImagesReady { token, .. }
            | Self::ImagesFailed { token, .. }
            | Self::ImageEdited { token, .. }
            | Self::ImageEditFailed { token, .. }
            | Self::KeywordsSuggested { token, .. }
            | Self::OriginalityReport { token, .. }
            | Self::AssistFailed { token, .. } => *token,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Sending half of the event channel.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<GenerationEvent>,
    repaint: Option<RepaintCallback>,
}

impl EventSink {
    pub fn new(sender: Sender<GenerationEvent>, repaint: Option<RepaintCallback>) -> Self {
        Self { sender, repaint }
    }

    pub fn emit(&self, event: GenerationEvent) {
        if self.sender.send(event).is_err() {
            debug!("Event receiver dropped");
            return;
        }
        if let Some(repaint) = &self.repaint {
            repaint();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Job Execution
// ─────────────────────────────────────────────────────────────────────────────

/// Run one job to completion, emitting its events in order.
///
/// Overloaded calls are retried per `policy`. For articles only opening the
/// stream is retried; an error inside the stream ends it.
pub async fn run_job(
    service: &dyn GenerationService,
    job: GenerationJob,
    policy: RetryPolicy,
    sink: &EventSink,
) {
    let label = job.label();
    debug!("Running {} for {}", label, job.token());

    match job {
        GenerationJob::Article { token, config } => {
            let opened = with_retry(policy, label, || service.stream_text(&config)).await;
            let mut stream = match opened {
                Ok(stream) => stream,
                Err(error) => {
                    sink.emit(GenerationEvent::TextFailed { token, error });
                    return;
                }
            };
            while let Some(item) = stream.next().await {
                match item {
                    Ok(text) => sink.emit(GenerationEvent::Fragment {
                        token,
                        text,
                        received_at: Instant::now(),
                    }),
                    Err(error) => {
                        sink.emit(GenerationEvent::TextFailed { token, error });
                        return;
                    }
                }
            }
            sink.emit(GenerationEvent::TextFinished { token });
        }

        GenerationJob::Images {
            token,
            request,
            target,
        } => {
            let result = with_retry(policy, label, || service.generate_images(&request)).await;
            sink.emit(images_event(token, target, request.count, result));
        }

        GenerationJob::InlineImage {
            token,
            context,
            mut request,
            cursor,
        } => {
            let target = ImageTarget::Inline(cursor);
            let keyword = with_retry(policy, "extract_keyword", || {
                service.extract_keyword(&context)
            })
            .await;
            match keyword {
                Ok(keyword) => {
                    info!("Inline image keyword: {}", keyword);
                    request.prompt = format!("{}: {}", request.prompt, keyword);
                    let result =
                        with_retry(policy, label, || service.generate_images(&request)).await;
                    sink.emit(images_event(token, target, request.count, result));
                }
                Err(error) => sink.emit(GenerationEvent::ImagesFailed {
                    token,
                    target,
                    error,
                }),
            }
        }

        GenerationJob::EditImage {
            token,
            index,
            request,
        } => {
            let result = with_retry(policy, label, || service.edit_image(&request)).await;
            sink.emit(match result {
                Ok(image) => GenerationEvent::ImageEdited {
                    token,
                    index,
                    image,
                },
                Err(error) => GenerationEvent::ImageEditFailed {
                    token,
                    index,
                    error,
                },
            });
        }

        GenerationJob::SuggestKeywords {
            token,
            topic,
            category,
        } => {
            let result = with_retry(policy, label, || {
                service.suggest_keywords(&topic, &category)
            })
            .await;
            sink.emit(match result {
                Ok(keywords) => GenerationEvent::KeywordsSuggested { token, keywords },
                Err(error) => GenerationEvent::AssistFailed { token, error },
            });
        }

        GenerationJob::AnalyzeOriginality { token, text } => {
            let result = with_retry(policy, label, || service.analyze_originality(&text)).await;
            sink.emit(match result {
                Ok(report) => GenerationEvent::OriginalityReport { token, report },
                Err(error) => GenerationEvent::AssistFailed { token, error },
            });
        }
    }
}

fn images_event(
    token: SessionToken,
    target: ImageTarget,
    requested: usize,
    result: std::result::Result<Vec<ImageRef>, GenerationError>,
) -> GenerationEvent {
    match result {
        Ok(images) => GenerationEvent::ImagesReady {
            token,
            target,
            images,
            requested,
        },
        Err(error) => GenerationEvent::ImagesFailed {
            token,
            target,
            error,
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the generation thread and both ends of its channels.
pub struct GenerationWorker {
    jobs: UnboundedSender<GenerationJob>,
    events: Receiver<GenerationEvent>,
    _thread: JoinHandle<()>,
}

impl GenerationWorker {
    /// Start the worker thread.
    pub fn spawn(
        service: Arc<dyn GenerationService>,
        policy: RetryPolicy,
        repaint: Option<RepaintCallback>,
    ) -> Result<Self> {
        let (job_tx, mut job_rx) = unbounded_channel::<GenerationJob>();
        let (event_tx, event_rx) = channel();
        let sink = EventSink::new(event_tx, repaint);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        info!("Starting generation worker ({})", service.name());
        let thread = std::thread::Builder::new()
            .name("generation".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    while let Some(job) = job_rx.recv().await {
                        let service = service.clone();
                        let sink = sink.clone();
                        tokio::spawn(async move {
                            run_job(service.as_ref(), job, policy, &sink).await;
                        });
                    }
                });
                debug!("Generation worker stopped");
            })?;

        Ok(Self {
            jobs: job_tx,
            events: event_rx,
            _thread: thread,
        })
    }

    /// Queue a job. Fails only if the worker thread has exited.
    pub fn submit(&self, job: GenerationJob) -> Result<()> {
        self.jobs.send(job).map_err(|err| {
            warn!("Generation worker is gone; dropping {}", err.0.label());
            Error::Generation(GenerationError::WorkerUnavailable)
        })
    }

    /// Poll for pending events.
    ///
    /// Returns all events that have arrived since the last poll.
    /// This is non-blocking.
    pub fn poll_events(&self) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::request::{AspectRatio, ImageSize};
    use crate::generation::ScriptedGenerator;
    use crate::streaming::SessionCounter;
    use std::time::Duration;

    fn token() -> SessionToken {
        SessionCounter::new().begin()
    }

    async fn run(service: &ScriptedGenerator, job: GenerationJob) -> Vec<GenerationEvent> {
        let (tx, rx) = channel();
        let sink = EventSink::new(tx, None);
        run_job(service, job, RetryPolicy::default(), &sink).await;
        rx.try_iter().collect()
    }

    fn article_job(token: SessionToken) -> GenerationJob {
        GenerationJob::Article {
            token,
            config: GenerationConfig {
                topic: "Tea".to_string(),
                ..Default::default()
            },
        }
    }

    fn image_request(count: usize) -> ImageRequest {
        ImageRequest::new("a teapot", ImageSize::OneK, AspectRatio::Square, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_article_streams_fragments_then_finishes() {
        let service = ScriptedGenerator::new().with_article("one two three");
        let token = token();
        let events = run(&service, article_job(token)).await;

        assert_eq!(events.len(), 4);
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                GenerationEvent::Fragment { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "one two three");
        assert_eq!(events[3], GenerationEvent::TextFinished { token });
        assert!(events.iter().all(|e| e.token() == token));
    }

    #[tokio::test(start_paused = true)]
    async fn test_article_failure_mid_stream() {
        let service = ScriptedGenerator::new()
            .with_article("one two three")
            .failing_after(1);
        let events = run(&service, article_job(token())).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GenerationEvent::Fragment { .. }));
        assert!(matches!(
            events[1],
            GenerationEvent::TextFailed {
                error: GenerationError::Network(_),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_article_open_retried_on_overload() {
        let service = ScriptedGenerator::new()
            .with_article("hi")
            .overloaded_for(2);
        let events = run(&service, article_job(token())).await;
        assert!(matches!(events.last(), Some(GenerationEvent::TextFinished { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_exhaustion_is_reported() {
        let service = ScriptedGenerator::new().overloaded_for(10);
        let events = run(&service, article_job(token())).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            GenerationEvent::TextFailed {
                error: GenerationError::Overloaded,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_image_result() {
        let service = ScriptedGenerator::new().with_image_limit(2);
        let events = run(
            &service,
            GenerationJob::Images {
                token: token(),
                request: image_request(4),
                target: ImageTarget::Gallery,
            },
        )
        .await;
        match &events[0] {
            GenerationEvent::ImagesReady {
                images, requested, ..
            } => {
                assert_eq!(images.len(), 2);
                assert_eq!(*requested, 4);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_image_uses_keyword_and_cursor() {
        let service = ScriptedGenerator::new();
        let cursor = CapturedCursor::new(3, 3);
        let events = run(
            &service,
            GenerationJob::InlineImage {
                token: token(),
                context: "Brewing oolong properly".to_string(),
                request: image_request(1),
                cursor,
            },
        )
        .await;
        match &events[0] {
            GenerationEvent::ImagesReady { target, images, .. } => {
                assert_eq!(*target, ImageTarget::Inline(cursor));
                assert!(images[0].prompt.ends_with(": properly"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_failure_reports_index() {
        let service = ScriptedGenerator::new();
        let events = run(
            &service,
            GenerationJob::EditImage {
                token: token(),
                index: 2,
                request: EditRequest {
                    image: ImageRef::new("not a data uri", "p"),
                    instruction: "brighter".to_string(),
                    mask: None,
                },
            },
        )
        .await;
        assert!(matches!(
            events[0],
            GenerationEvent::ImageEditFailed { index: 2, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_assist_jobs() {
        let service = ScriptedGenerator::new();
        let events = run(
            &service,
            GenerationJob::SuggestKeywords {
                token: token(),
                topic: "Tea".to_string(),
                category: String::new(),
            },
        )
        .await;
        assert!(matches!(&events[0], GenerationEvent::KeywordsSuggested { keywords, .. } if keywords.len() == 3));

        let events = run(
            &service,
            GenerationJob::AnalyzeOriginality {
                token: token(),
                text: "one two".to_string(),
            },
        )
        .await;
        assert!(matches!(events[0], GenerationEvent::OriginalityReport { .. }));
    }

    #[test]
    fn test_worker_delivers_events() {
        let service = Arc::new(
            ScriptedGenerator::new()
                .with_article("a b")
                .with_fragment_delay(Duration::ZERO),
        );
        let worker = GenerationWorker::spawn(service, RetryPolicy::default(), None).unwrap();
        let token = token();
        worker.submit(article_job(token)).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while std::time::Instant::now() < deadline {
            events.extend(worker.poll_events());
            if matches!(events.last(), Some(GenerationEvent::TextFinished { .. })) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], GenerationEvent::TextFinished { token });
    }
}
