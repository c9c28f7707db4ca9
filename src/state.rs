//! Application state management for Draftsmith
//!
//! This module defines the screen state machine, the `AuthoringSession`
//! that owns the article being written, and the central `AppState` that
//! ties settings, the library and the generation worker together.

// - redundant_closure: Sometimes closure is clearer for method reference
#![allow(clippy::redundant_closure)]

use crate::config::{save_config_silent, EditMode, Settings};
use crate::document::{Document, ImageRef, ImageSet};
use crate::editor::EditModeController;
use crate::error::{Error, Result, ResultExt};
use crate::generation::{
    EditRequest, GenerationConfig, GenerationError, GenerationEvent, GenerationJob,
    GenerationWorker, ImageRequest, ImageTarget,
};
use crate::markdown::MarkdownFormatCommand;
use crate::storage::{Draft, Library, SavedArticle, UserProfile};
use crate::streaming::{SessionCounter, SessionToken, StreamAssembler, StreamEnd};
use chrono::Utc;
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Screens
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level views of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Dashboard,
    /// Generation form
    Create,
    /// The article being written, in preview or edit mode
    Article,
    History,
    Settings,
}

impl Screen {
    /// Whether navigation from `self` to `to` is allowed.
    ///
    /// Signing out is always possible; everything else follows the menu.
    pub fn can_transition_to(self, to: Screen) -> bool {
        use Screen::*;
        if self == to || to == Login {
            return true;
        }
        matches!(
            (self, to),
            (Login, Dashboard)
                | (Dashboard, Create | History | Settings | Article)
                | (Create, Article | Dashboard)
                | (Article, Create | Dashboard | History)
                | (History, Article | Dashboard | Create)
                | (Settings, Dashboard)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Dashboard => "Dashboard",
            Screen::Create => "New article",
            Screen::Article => "Article",
            Screen::History => "History",
            Screen::Settings => "Settings",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operation Status
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of the article text stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextStatus {
    #[default]
    Idle,
    Streaming,
    Completed,
    Failed(String),
}

/// Progress of an image request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    #[default]
    Idle,
    Generating,
    Ready,
    /// Fewer images than requested came back
    Partial { received: usize, requested: usize },
    Failed(String),
}

impl ImageStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, ImageStatus::Generating)
    }

    /// Partial and failed results offer a retry.
    pub fn can_retry(&self) -> bool {
        matches!(self, ImageStatus::Partial { .. } | ImageStatus::Failed(_))
    }

    pub fn message(&self) -> Option<String> {
        match self {
            ImageStatus::Idle | ImageStatus::Ready => None,
            ImageStatus::Generating => Some("Generating images…".to_string()),
            ImageStatus::Partial {
                received,
                requested,
            } => Some(format!("Only {} of {} images arrived", received, requested)),
            ImageStatus::Failed(msg) => Some(msg.clone()),
        }
    }

    fn from_result(received: usize, requested: usize) -> Self {
        if received == 0 {
            ImageStatus::Failed("No images were returned".to_string())
        } else if received < requested {
            ImageStatus::Partial {
                received,
                requested,
            }
        } else {
            ImageStatus::Ready
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authoring Session
// ─────────────────────────────────────────────────────────────────────────────

/// One article being generated and edited.
///
/// Each kind of asynchronous operation has its own token counter, so a new
/// gallery request invalidates the previous gallery request but leaves the
/// text stream alone.
#[derive(Debug)]
pub struct AuthoringSession {
    pub config: GenerationConfig,
    document: Document,
    assembler: StreamAssembler,
    editor: EditModeController,

    text_session: SessionCounter,
    gallery_session: SessionCounter,
    inline_session: SessionCounter,
    edit_session: SessionCounter,
    assist_session: SessionCounter,

    text_status: TextStatus,
    image_status: ImageStatus,
    inline_status: ImageStatus,
    editing_index: Option<usize>,
    edit_error: Option<String>,
    suggested_keywords: Vec<String>,
    originality_report: Option<String>,
    assist_error: Option<String>,

    /// Set by every change worth persisting; cleared by `take_dirty`
    dirty: bool,
}

impl AuthoringSession {
    pub fn new(config: GenerationConfig, mode: EditMode) -> Self {
        Self {
            config,
            document: Document::new(),
            assembler: StreamAssembler::new(),
            editor: EditModeController::new(mode),
            text_session: SessionCounter::new(),
            gallery_session: SessionCounter::new(),
            inline_session: SessionCounter::new(),
            edit_session: SessionCounter::new(),
            assist_session: SessionCounter::new(),
            text_status: TextStatus::Idle,
            image_status: ImageStatus::Idle,
            inline_status: ImageStatus::Idle,
            editing_index: None,
            edit_error: None,
            suggested_keywords: Vec::new(),
            originality_report: None,
            assist_error: None,
            dirty: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn editor(&self) -> &EditModeController {
        &self.editor
    }

    pub fn text_status(&self) -> &TextStatus {
        &self.text_status
    }

    pub fn image_status(&self) -> &ImageStatus {
        &self.image_status
    }

    pub fn inline_status(&self) -> &ImageStatus {
        &self.inline_status
    }

    /// Index of the image currently being edited, if any.
    pub fn editing_index(&self) -> Option<usize> {
        self.editing_index
    }

    pub fn edit_error(&self) -> Option<&str> {
        self.edit_error.as_deref()
    }

    pub fn suggested_keywords(&self) -> &[String] {
        &self.suggested_keywords
    }

    pub fn originality_report(&self) -> Option<&str> {
        self.originality_report.as_deref()
    }

    pub fn assist_error(&self) -> Option<&str> {
        self.assist_error.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.assembler.is_active()
    }

    /// Whether any request for this session is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_streaming()
            || self.image_status.is_busy()
            || self.inline_status.is_busy()
            || self.editing_index.is_some()
    }

    /// Returns whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Starting Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a new article: one text stream plus the cover image set.
    ///
    /// Any operation still running for the previous article is invalidated.
    pub fn begin_generation(&mut self, now: Instant) -> Result<Vec<GenerationJob>> {
        self.config.validate()?;

        let text_token = self.text_session.begin();
        let gallery_token = self.gallery_session.begin();
        self.inline_session.cancel();
        self.edit_session.cancel();
        self.assist_session.cancel();

        self.document.images.clear();
        self.assembler.start(text_token, now, &mut self.document);
        self.editor.set_stream_active(true);
        self.editor.set_selection(0, 0);

        self.text_status = TextStatus::Streaming;
        self.image_status = ImageStatus::Generating;
        self.inline_status = ImageStatus::Idle;
        self.editing_index = None;
        self.edit_error = None;
        self.originality_report = None;
        self.dirty = true;

        info!(
            "Generating article {} about \"{}\" with {} images",
            text_token,
            self.config.topic.trim(),
            self.config.clamped_image_count()
        );

        Ok(vec![
            GenerationJob::Article {
                token: text_token,
                config: self.config.clone(),
            },
            GenerationJob::Images {
                token: gallery_token,
                request: self.config.image_request(),
                target: ImageTarget::Gallery,
            },
        ])
    }

    /// Regenerate the cover image set only.
    ///
    /// An edit still in flight targets a slot of the set being replaced, so
    /// it is invalidated along with the old gallery.
    pub fn begin_image_generation(&mut self) -> Result<GenerationJob> {
        self.config.validate()?;
        let token = self.gallery_session.begin();
        if self.editing_index.take().is_some() {
            debug!("Dropping in-flight image edit; gallery is being regenerated");
        }
        self.edit_session.cancel();
        self.edit_error = None;
        self.image_status = ImageStatus::Generating;
        Ok(GenerationJob::Images {
            token,
            request: self.config.image_request(),
            target: ImageTarget::Gallery,
        })
    }

    /// Modify the image at `index` following `instruction`.
    pub fn begin_image_edit(
        &mut self,
        index: usize,
        instruction: &str,
        mask: Option<String>,
    ) -> Result<GenerationJob> {
        let image = self
            .document
            .images
            .get(index)
            .cloned()
            .ok_or(Error::ImageIndexOutOfRange {
                index,
                len: self.document.images.len(),
            })?;
        let request = EditRequest {
            image,
            instruction: instruction.trim().to_string(),
            mask,
        };
        request.validate()?;

        let token = self.edit_session.begin();
        self.editing_index = Some(index);
        self.edit_error = None;
        Ok(GenerationJob::EditImage {
            token,
            index,
            request,
        })
    }

    /// Generate one image for the text around the cursor and insert it there.
    ///
    /// The cursor is captured now; moving it before the image arrives does
    /// not change where the image lands.
    pub fn begin_inline_image(&mut self) -> Result<GenerationJob> {
        if self.editor.is_locked() {
            return Err(Error::StreamActive);
        }
        let cursor = self.editor.capture_cursor(&self.document.text);
        let context = self.editor.selection_context(&self.document.text).trim();
        if context.is_empty() {
            return Err(Error::Validation(
                "Place the cursor in a paragraph to illustrate it".to_string(),
            ));
        }
        let context = context.to_string();
        let request = ImageRequest::new(
            format!(
                "An illustration for an article about {}",
                self.config.topic.trim()
            ),
            self.config.image_size,
            self.config.aspect_ratio,
            1,
        );

        let token = self.inline_session.begin();
        self.inline_status = ImageStatus::Generating;
        debug!("Inline image {} requested at {:?}", token, cursor);
        Ok(GenerationJob::InlineImage {
            token,
            context,
            request,
            cursor,
        })
    }

    pub fn begin_keyword_suggestions(&mut self) -> Result<GenerationJob> {
        let topic = self.config.topic.trim();
        if topic.is_empty() {
            return Err(Error::Validation("Enter a topic first".to_string()));
        }
        let job = GenerationJob::SuggestKeywords {
            token: self.assist_session.begin(),
            topic: topic.to_string(),
            category: self.config.category.trim().to_string(),
        };
        self.assist_error = None;
        Ok(job)
    }

    pub fn begin_originality_check(&mut self) -> Result<GenerationJob> {
        if self.document.text.trim().is_empty() {
            return Err(Error::Validation("There is no text to check".to_string()));
        }
        let job = GenerationJob::AnalyzeOriginality {
            token: self.assist_session.begin(),
            text: self.document.text.clone(),
        };
        self.originality_report = None;
        self.assist_error = None;
        Ok(job)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Applying Results
    // ─────────────────────────────────────────────────────────────────────────

    fn counter_for(&self, event: &GenerationEvent) -> &SessionCounter {
        match event {
            GenerationEvent::Fragment { .. }
            | GenerationEvent::TextFinished { .. }
            | GenerationEvent::TextFailed { .. } => &self.text_session,
            GenerationEvent::ImagesReady { target, .. }
            | GenerationEvent::ImagesFailed { target, .. } => match target {
                ImageTarget::Gallery => &self.gallery_session,
                ImageTarget::Inline(_) => &self.inline_session,
            },
            GenerationEvent::ImageEdited { .. } | GenerationEvent::ImageEditFailed { .. } => {
                &self.edit_session
            }
            GenerationEvent::KeywordsSuggested { .. }
            | GenerationEvent::OriginalityReport { .. }
            | GenerationEvent::AssistFailed { .. } => &self.assist_session,
        }
    }

    /// Apply one worker event. Returns `false` if it was stale and dropped.
    pub fn apply_event(&mut self, event: GenerationEvent) -> bool {
        let token = event.token();
        if !self.counter_for(&event).is_current(token) {
            debug!("Dropping stale result for session {}", token);
            return false;
        }

        match event {
            GenerationEvent::Fragment {
                token,
                text,
                received_at,
            } => {
                if self
                    .assembler
                    .push_fragment(token, &text, received_at, &mut self.document)
                {
                    self.dirty = true;
                }
            }
            GenerationEvent::TextFinished { token } => {
                self.end_stream(token, StreamEnd::Completed);
                self.text_status = TextStatus::Completed;
            }
            GenerationEvent::TextFailed { token, error } => {
                self.end_stream(token, StreamEnd::Failed);
                self.text_status = TextStatus::Failed(error.to_string());
            }
            GenerationEvent::ImagesReady {
                target: ImageTarget::Gallery,
                images,
                requested,
                ..
            } => {
                self.image_status = ImageStatus::from_result(images.len(), requested);
                if !images.is_empty() {
                    self.document.images.set_all(images);
                    self.dirty = true;
                }
                self.gallery_session.cancel();
            }
            GenerationEvent::ImagesReady {
                target: ImageTarget::Inline(cursor),
                images,
                ..
            } => {
                self.inline_session.cancel();
                self.inline_status = match images.first() {
                    Some(image) => {
                        match self.editor.insert_image(&mut self.document, cursor, image) {
                            Ok(()) => {
                                self.dirty = true;
                                ImageStatus::Ready
                            }
                            Err(e) => ImageStatus::Failed(e.to_string()),
                        }
                    }
                    None => ImageStatus::Failed("No image was returned".to_string()),
                };
            }
            GenerationEvent::ImagesFailed { target, error, .. } => {
                let status = ImageStatus::Failed(error.to_string());
                match target {
                    ImageTarget::Gallery => {
                        self.gallery_session.cancel();
                        self.image_status = status;
                    }
                    ImageTarget::Inline(_) => {
                        self.inline_session.cancel();
                        self.inline_status = status;
                    }
                }
            }
            GenerationEvent::ImageEdited { index, image, .. } => {
                self.edit_session.cancel();
                self.editing_index = None;
                match self.document.images.replace_at(index, image) {
                    Ok(()) => self.dirty = true,
                    Err(e) => {
                        warn!("Edited image no longer has a slot: {}", e);
                        self.edit_error = Some(e.to_string());
                    }
                }
            }
            GenerationEvent::ImageEditFailed { error, .. } => {
                self.edit_session.cancel();
                self.editing_index = None;
                self.edit_error = Some(error.to_string());
            }
            GenerationEvent::KeywordsSuggested { keywords, .. } => {
                self.assist_session.cancel();
                self.suggested_keywords = keywords;
            }
            GenerationEvent::OriginalityReport { report, .. } => {
                self.assist_session.cancel();
                self.originality_report = Some(report);
            }
            GenerationEvent::AssistFailed { error, .. } => {
                self.assist_session.cancel();
                self.assist_error = Some(error.to_string());
            }
        }
        true
    }

    fn end_stream(&mut self, token: SessionToken, end: StreamEnd) {
        self.assembler.finish(token, end, &mut self.document);
        self.text_session.cancel();
        self.editor.set_stream_active(false);
        self.dirty = true;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Edits
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_edit_mode(&mut self) -> Result<EditMode> {
        self.editor.toggle()
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.editor.set_selection(start, end);
    }

    /// Replace the text with what the user typed in the raw editor.
    pub fn edit_text(&mut self, text: String) -> Result<()> {
        if text == self.document.text {
            return Ok(());
        }
        self.editor.replace_text(&mut self.document, text)?;
        self.dirty = true;
        Ok(())
    }

    pub fn apply_format(&mut self, command: MarkdownFormatCommand) -> Result<()> {
        self.editor.format(&mut self.document, command)?;
        self.dirty = true;
        Ok(())
    }

    pub fn select_image(&mut self, index: usize) -> Result<()> {
        self.document.images.select(index)?;
        self.dirty = true;
        Ok(())
    }

    /// Move the carousel selection one image forward or back, wrapping.
    pub fn step_image(&mut self, forward: bool) {
        let images = &mut self.document.images;
        if forward {
            images.select_next();
        } else {
            images.select_previous();
        }
        if images.selected_index().is_some() {
            self.dirty = true;
        }
    }

    /// Insert the selected candidate image at the current cursor.
    pub fn insert_selected_image(&mut self) -> Result<()> {
        let image = self
            .document
            .images
            .selected()
            .cloned()
            .ok_or_else(|| Error::Validation("No image is selected".to_string()))?;
        let cursor = self.editor.capture_cursor(&self.document.text);
        self.editor
            .insert_image(&mut self.document, cursor, &image)?;
        self.dirty = true;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drafts and History
    // ─────────────────────────────────────────────────────────────────────────

    pub fn to_draft(&self) -> Draft {
        Draft {
            config: self.config.clone(),
            content: self
                .assembler
                .accumulated()
                .unwrap_or(&self.document.text)
                .to_string(),
            images: self.document.images.images().to_vec(),
            selected_image: self.document.images.selected_index(),
            updated_at: Utc::now(),
        }
    }

    /// Replace the session contents with a saved draft.
    pub fn restore_draft(&mut self, draft: Draft) {
        self.cancel_all();
        self.config = draft.config;
        self.document = Document {
            text: draft.content,
            images: ImageSet::from_parts(draft.images, draft.selected_image),
        };
        self.text_status = if self.document.text.is_empty() {
            TextStatus::Idle
        } else {
            TextStatus::Completed
        };
        debug!("Restored draft from {}", draft.updated_at);
    }

    /// Snapshot the article for history. The selected image becomes the cover.
    pub fn to_saved_article(&self) -> Result<SavedArticle> {
        if self.is_streaming() {
            return Err(Error::StreamActive);
        }
        if self.document.text.trim().is_empty() {
            return Err(Error::Validation("The article is empty".to_string()));
        }
        let topic = match self.config.topic.trim() {
            "" => self
                .document
                .title()
                .unwrap_or_else(|| "Untitled article".to_string()),
            topic => topic.to_string(),
        };
        Ok(SavedArticle::new(
            topic,
            self.document.text.clone(),
            self.config.category.trim(),
            self.document.images.selected().cloned(),
        ))
    }

    /// Open a history entry for reading and editing.
    pub fn load_article(&mut self, article: &SavedArticle) {
        self.cancel_all();
        self.config.topic = article.topic.clone();
        self.config.category = article.category.clone();
        let images: Vec<ImageRef> = article.cover_image.iter().cloned().collect();
        self.document = Document::with_text(article.content.clone());
        self.document.images.set_all(images);
        self.text_status = TextStatus::Completed;
        self.dirty = true;
    }

    /// Start over with an empty article and the given form.
    pub fn reset(&mut self, config: GenerationConfig) {
        self.cancel_all();
        self.config = config;
        self.document.clear();
        self.text_status = TextStatus::Idle;
        self.dirty = true;
    }

    fn cancel_all(&mut self) {
        self.assembler.abandon();
        self.text_session.cancel();
        self.gallery_session.cancel();
        self.inline_session.cancel();
        self.edit_session.cancel();
        self.assist_session.cancel();
        self.editor.set_stream_active(false);
        self.image_status = ImageStatus::Idle;
        self.inline_status = ImageStatus::Idle;
        self.editing_index = None;
        self.edit_error = None;
        self.suggested_keywords.clear();
        self.originality_report = None;
        self.assist_error = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state.
pub struct AppState {
    /// Application settings
    pub settings: Settings,
    /// Whether settings have been modified and need saving
    settings_dirty: bool,
    pub library: Library,
    pub session: AuthoringSession,
    screen: Screen,
    profile: Option<UserProfile>,
    /// `None` when the worker thread could not be started
    worker: Option<GenerationWorker>,
    /// Status bar message
    pub status_message: Option<String>,
    /// Error message to display (if any)
    pub error_message: Option<String>,
}

impl AppState {
    /// Create the state, restoring the signed-in profile and any saved draft.
    pub fn new(settings: Settings, mut library: Library, worker: Option<GenerationWorker>) -> Self {
        library.set_max_history(settings.max_history);

        let language = library.preferences().default_language;
        let mut session = AuthoringSession::new(
            settings.new_generation_config(&language),
            settings.default_edit_mode,
        );
        if let Some(draft) = library.draft() {
            info!("Restoring draft ({} bytes)", draft.content.len());
            session.restore_draft(draft);
        }
        session.take_dirty();

        let profile = library.profile();
        let screen = if profile.is_some() {
            Screen::Dashboard
        } else {
            Screen::Login
        };

        Self {
            settings,
            settings_dirty: false,
            library,
            session,
            screen,
            profile,
            worker,
            status_message: None,
            error_message: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Move to another screen. Returns `false` if the move is not allowed.
    pub fn navigate(&mut self, to: Screen) -> bool {
        if to != Screen::Login && self.profile.is_none() {
            debug!("Navigation to {:?} requires sign-in", to);
            return false;
        }
        if !self.screen.can_transition_to(to) {
            debug!("Rejected navigation {:?} -> {:?}", self.screen, to);
            return false;
        }
        self.screen = to;
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    pub fn sign_in(&mut self, display_name: &str, email: &str) -> Result<()> {
        let profile = UserProfile {
            display_name: display_name.to_string(),
            email: email.to_string(),
        };
        self.library.sign_in(profile)?;
        self.profile = self.library.profile();
        self.navigate(Screen::Dashboard);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.library
            .sign_out()
            .unwrap_or_warn_default((), "Failed to clear profile");
        self.profile = None;
        self.screen = Screen::Login;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generation
    // ─────────────────────────────────────────────────────────────────────────

    fn submit(&self, job: GenerationJob) -> Result<()> {
        match &self.worker {
            Some(worker) => worker.submit(job),
            None => Err(Error::Generation(GenerationError::WorkerUnavailable)),
        }
    }

    /// Start generating a new article from the current form.
    pub fn generate_article(&mut self) -> Result<()> {
        if self.worker.is_none() {
            return Err(Error::Generation(GenerationError::WorkerUnavailable));
        }
        for job in self.session.begin_generation(Instant::now())? {
            self.submit(job)?;
        }
        self.navigate(Screen::Article);
        Ok(())
    }

    pub fn regenerate_images(&mut self) -> Result<()> {
        let job = self.session.begin_image_generation()?;
        self.submit(job)
    }

    pub fn edit_image(&mut self, index: usize, instruction: &str) -> Result<()> {
        let job = self.session.begin_image_edit(index, instruction, None)?;
        self.submit(job)
    }

    pub fn insert_inline_image(&mut self) -> Result<()> {
        let job = self.session.begin_inline_image()?;
        self.submit(job)
    }

    pub fn suggest_keywords(&mut self) -> Result<()> {
        let job = self.session.begin_keyword_suggestions()?;
        self.submit(job)
    }

    pub fn check_originality(&mut self) -> Result<()> {
        let job = self.session.begin_originality_check()?;
        self.submit(job)
    }

    /// Apply pending worker events, then auto-save the draft if it changed.
    ///
    /// Returns the number of events applied.
    pub fn poll_generation(&mut self) -> usize {
        let events = match &self.worker {
            Some(worker) => worker.poll_events(),
            None => return 0,
        };
        let mut applied = 0;
        for event in events {
            let finished = matches!(event, GenerationEvent::TextFinished { .. });
            if self.session.apply_event(event) {
                applied += 1;
                if finished {
                    self.set_status("Article ready");
                }
            }
        }
        self.autosave_draft();
        applied
    }

    /// Draft writes wait until the stream ends; mid-stream text is transient.
    fn autosave_draft(&mut self) {
        if !self.settings.auto_save || self.session.is_streaming() {
            return;
        }
        if self.session.take_dirty() {
            let draft = self.session.to_draft();
            self.library
                .save_draft(&draft)
                .unwrap_or_warn_default((), "Failed to auto-save draft");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    pub fn save_to_history(&mut self) -> Result<SavedArticle> {
        let article = self.session.to_saved_article()?;
        self.library.save_article(article.clone())?;
        info!("Saved \"{}\" to history", article.topic);
        self.set_status("Saved to history");
        Ok(article)
    }

    /// Open a saved article. Returns `false` if it no longer exists.
    pub fn open_article(&mut self, id: Uuid) -> bool {
        let Some(article) = self.library.find_article(id) else {
            warn!("Article {} not found in history", id);
            return false;
        };
        self.session.load_article(&article);
        self.navigate(Screen::Article)
    }

    pub fn delete_article(&mut self, id: Uuid) -> Result<bool> {
        self.library.delete_article(id)
    }

    /// Clear the form and article for a fresh start.
    pub fn new_article(&mut self) {
        let language = self.library.preferences().default_language;
        self.session
            .reset(self.settings.new_generation_config(&language));
        self.library
            .clear_draft()
            .unwrap_or_warn_default((), "Failed to clear draft");
        self.session.take_dirty();
        self.navigate(Screen::Create);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Update settings and mark them for saving.
    pub fn update_settings<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        f(&mut self.settings);
        self.settings.sanitize();
        self.library.set_max_history(self.settings.max_history);
        self.settings_dirty = true;
    }

    /// Save settings if they have been modified.
    ///
    /// Returns true if settings were saved successfully.
    pub fn save_settings_if_dirty(&mut self) -> bool {
        if !self.settings_dirty {
            return false;
        }
        if save_config_silent(&self.settings) {
            self.settings_dirty = false;
            true
        } else {
            false
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.error_message = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    /// Persist settings and the draft before exit.
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.save_settings_if_dirty();
        if self.settings.auto_save && !self.session.document().is_empty() {
            let draft = self.session.to_draft();
            self.library
                .save_draft(&draft)
                .unwrap_or_warn_default((), "Failed to save draft on exit");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
