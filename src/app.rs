//! Main application module for Draftsmith
//!
//! This module implements the eframe App trait for the main application:
//! screen navigation, the generation form, the article workspace with its
//! image carousel, export, history and settings.

// - option_map_unit_fn: Keyboard handling closure pattern is clearer than suggested alternative
#![allow(clippy::option_map_unit_fn)]

use crate::config::{load_config, EditMode, Theme, WindowSize};
use crate::document::MAX_IMAGES;
use crate::editor::TextStats;
use crate::export::{copy_article_to_clipboard, export_to_file, suggested_file_name, ExportFormat};
use crate::generation::{
    ArticleLength, AspectRatio, GenerationService, GenerationWorker, ImageSize, RepaintCallback,
    RetryPolicy, ScriptedGenerator, Tone,
};
use crate::markdown::MarkdownFormatCommand;
use crate::preview::{render_blocks, show_texture, ArticleColors, TextureCache};
use crate::state::{AppState, ImageStatus, Screen, TextStatus};
use crate::storage::{Category, JsonFileStore, Library, MemoryStore, Preferences, SavedArticle};
use crate::string_utils::char_index_to_byte_index;
use eframe::egui;
use log::{debug, info, warn};
use std::sync::Arc;

/// Application name constant.
pub const APP_NAME: &str = "Draftsmith";

/// Keyboard shortcut actions that need to be deferred.
///
/// These actions are detected in the input handling closure and executed
/// afterwards to avoid borrow conflicts.
#[derive(Debug, Clone, Copy)]
enum KeyboardAction {
    /// Toggle preview/edit (Ctrl+E)
    ToggleMode,
    /// Formatting command (Ctrl+B, Ctrl+I, Ctrl+1..3)
    Format(MarkdownFormatCommand),
    /// Save the article to history (Ctrl+S)
    SaveToHistory,
    /// Start a new article (Ctrl+N)
    NewArticle,
}

/// The main application struct.
pub struct DraftsmithApp {
    state: AppState,
    textures: TextureCache,
    applied_theme: Option<Theme>,
    last_window_size: Option<egui::Vec2>,

    // Form buffers
    login_name: String,
    login_email: String,
    keywords_input: String,
    edit_instruction: String,
    new_category: String,
    language_input: String,

    // Library data shown on screen, refreshed when it changes
    history: Vec<SavedArticle>,
    categories: Vec<Category>,
}

impl DraftsmithApp {
    /// Create the app: load settings, open the library and start the worker.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        info!("Initializing {}", APP_NAME);

        let settings = load_config();
        let library = match JsonFileStore::open_default() {
            Ok(store) => Library::new(Box::new(store)),
            Err(e) => {
                warn!("Library unavailable ({}), keeping data in memory", e);
                Library::new(Box::new(MemoryStore::new()))
            }
        };

        let ctx = cc.egui_ctx.clone();
        let repaint: RepaintCallback = Arc::new(move || ctx.request_repaint());
        let service: Arc<dyn GenerationService> = Arc::new(ScriptedGenerator::new());
        let worker = match GenerationWorker::spawn(service, RetryPolicy::default(), Some(repaint))
        {
            Ok(worker) => Some(worker),
            Err(e) => {
                warn!("Failed to start generation worker: {}", e);
                None
            }
        };

        let state = AppState::new(settings, library, worker);
        let language_input = state.library.preferences().default_language;
        let mut app = Self {
            state,
            textures: TextureCache::new(),
            applied_theme: None,
            last_window_size: None,
            login_name: String::new(),
            login_email: String::new(),
            keywords_input: String::new(),
            edit_instruction: String::new(),
            new_category: String::new(),
            language_input,
            history: Vec::new(),
            categories: Vec::new(),
        };
        app.refresh_library();
        app.apply_theme(&cc.egui_ctx);
        app
    }

    fn refresh_library(&mut self) {
        self.history = self.state.library.history();
        self.categories = self.state.library.categories();
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.state.settings.theme;
        if self.applied_theme == Some(theme) {
            return;
        }
        match theme {
            Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
            Theme::Light => ctx.set_visuals(egui::Visuals::light()),
            Theme::System => {}
        }
        debug!("Applied theme: {:?}", theme);
        self.applied_theme = Some(theme);
    }

    /// Update window size in settings if changed.
    fn update_window_state(&mut self, ctx: &egui::Context) {
        let Some(size) = ctx.input(|i| i.viewport().inner_rect.map(|r| r.size())) else {
            return;
        };
        let changed = self
            .last_window_size
            .map(|s| (s - size).length() > 1.0)
            .unwrap_or(true);
        if !changed {
            return;
        }
        self.last_window_size = Some(size);
        let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
        self.state.update_settings(|settings| {
            settings.window_size = WindowSize {
                width: size.x,
                height: size.y,
                maximized,
            };
        });
    }

    fn window_title(&self) -> String {
        match self.state.session.document().title() {
            Some(title) if self.state.screen() == Screen::Article => {
                format!("{} - {}", title, APP_NAME)
            }
            _ => APP_NAME.to_string(),
        }
    }

    fn go(&mut self, screen: Screen) {
        if self.state.navigate(screen) {
            if matches!(screen, Screen::History | Screen::Create | Screen::Settings) {
                self.refresh_library();
            }
            if screen == Screen::Settings {
                self.language_input = self.state.library.preferences().default_language;
            }
        }
    }

    fn report<T>(&mut self, result: crate::error::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.state.show_error(e.to_string());
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Top-Level Layout
    // ─────────────────────────────────────────────────────────────────────────

    fn render_ui(&mut self, ctx: &egui::Context) {
        if self.state.profile().is_some() {
            egui::TopBottomPanel::top("navigation").show(ctx, |ui| self.render_navigation(ui));
        }
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.render_status_bar(ui));

        if self.state.screen() == Screen::Article {
            egui::SidePanel::right("image_carousel")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| self.render_carousel(ui));
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.state.screen() {
            Screen::Login => self.render_login(ui),
            Screen::Dashboard => self.render_dashboard(ui),
            Screen::Create => self.render_create(ui),
            Screen::Article => self.render_article(ui),
            Screen::History => self.render_history(ui),
            Screen::Settings => self.render_settings(ui),
        });
    }

    fn render_navigation(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(APP_NAME);
            ui.separator();
            let current = self.state.screen();
            for screen in [
                Screen::Dashboard,
                Screen::Create,
                Screen::Article,
                Screen::History,
                Screen::Settings,
            ] {
                let allowed = current.can_transition_to(screen);
                if ui
                    .add_enabled(
                        allowed,
                        egui::SelectableLabel::new(current == screen, screen.label()),
                    )
                    .clicked()
                {
                    self.go(screen);
                }
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Sign out").clicked() {
                    self.state.sign_out();
                }
                if let Some(profile) = self.state.profile() {
                    ui.label(format!("{} ({})", profile.display_name, profile.initials()));
                }
            });
        });
    }

    fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(error) = self.state.error_message.clone() {
                ui.colored_label(ui.visuals().error_fg_color, error);
                if ui.small_button("✕").clicked() {
                    self.state.dismiss_error();
                }
            } else if let Some(status) = &self.state.status_message {
                ui.label(status);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let stats = TextStats::from_markdown(&self.state.session.document().text);
                ui.label(stats.format_compact());
                if self.state.session.is_busy() {
                    ui.spinner();
                }
            });
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Screens
    // ─────────────────────────────────────────────────────────────────────────

    fn render_login(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading(format!("Welcome to {}", APP_NAME));
            ui.add_space(16.0);
            egui::Grid::new("login_form").num_columns(2).show(ui, |ui| {
                ui.label("Name");
                ui.text_edit_singleline(&mut self.login_name);
                ui.end_row();
                ui.label("Email");
                ui.text_edit_singleline(&mut self.login_email);
                ui.end_row();
            });
            ui.add_space(8.0);
            if ui.button("Sign in").clicked() {
                let (name, email) = (self.login_name.clone(), self.login_email.clone());
                let result = self.state.sign_in(&name, &email);
                if self.report(result).is_some() {
                    self.login_email.clear();
                    self.state.dismiss_error();
                }
            }
        });
    }

    fn render_dashboard(&mut self, ui: &mut egui::Ui) {
        if let Some(profile) = self.state.profile() {
            ui.heading(format!("Hello, {}", profile.display_name));
        }
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("✚ New article").clicked() {
                self.state.new_article();
                self.keywords_input.clear();
            }
            let has_draft = !self.state.session.document().is_empty();
            if ui
                .add_enabled(has_draft, egui::Button::new("Continue draft"))
                .clicked()
            {
                self.go(Screen::Article);
            }
        });

        ui.add_space(16.0);
        ui.label(egui::RichText::new("Recent articles").strong());
        let recent: Vec<(uuid::Uuid, String)> = self
            .history
            .iter()
            .take(5)
            .map(|a| (a.id, format!("{}  ·  {}", a.topic, a.date.format("%Y-%m-%d"))))
            .collect();
        if recent.is_empty() {
            ui.label("Nothing saved yet.");
        }
        for (id, label) in recent {
            if ui.link(label).clicked() && !self.state.open_article(id) {
                self.state.show_error("That article no longer exists");
                self.refresh_library();
            }
        }
    }

    fn render_create(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.session.is_busy();
        let parsed = parse_keywords(&self.keywords_input);
        if parsed != self.state.session.config.keywords {
            self.keywords_input = self.state.session.config.keywords.join(", ");
        }
        let categories: Vec<String> = self.categories.iter().map(|c| c.name.clone()).collect();

        ui.heading("New article");
        ui.add_space(8.0);

        let mut suggest = false;
        let config = &mut self.state.session.config;
        egui::Grid::new("generation_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Topic");
                ui.add(egui::TextEdit::singleline(&mut config.topic).desired_width(360.0));
                ui.end_row();

                ui.label("Tone");
                egui::ComboBox::from_id_source("tone")
                    .selected_text(config.tone.label())
                    .show_ui(ui, |ui| {
                        for tone in Tone::all() {
                            ui.selectable_value(&mut config.tone, *tone, tone.label());
                        }
                    });
                ui.end_row();

                ui.label("Length");
                egui::ComboBox::from_id_source("length")
                    .selected_text(config.length.label())
                    .show_ui(ui, |ui| {
                        for length in ArticleLength::all() {
                            ui.selectable_value(&mut config.length, *length, length.label());
                        }
                    });
                ui.end_row();

                ui.label("Language");
                ui.text_edit_singleline(&mut config.language);
                ui.end_row();

                ui.label("Category");
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut config.category);
                    egui::ComboBox::from_id_source("category")
                        .selected_text("Saved")
                        .show_ui(ui, |ui| {
                            for name in &categories {
                                if ui.selectable_label(config.category == *name, name).clicked() {
                                    config.category = name.clone();
                                }
                            }
                        });
                });
                ui.end_row();

                ui.label("Keywords");
                ui.horizontal(|ui| {
                    if ui
                        .add(egui::TextEdit::singleline(&mut self.keywords_input).hint_text("comma, separated"))
                        .changed()
                    {
                        config.keywords = parse_keywords(&self.keywords_input);
                    }
                    suggest = ui.button("Suggest").clicked();
                });
                ui.end_row();

                ui.label("Images");
                ui.add(egui::Slider::new(&mut config.image_count, 1..=MAX_IMAGES));
                ui.end_row();

                ui.label("Aspect ratio");
                egui::ComboBox::from_id_source("aspect_ratio")
                    .selected_text(config.aspect_ratio.as_str())
                    .show_ui(ui, |ui| {
                        for ratio in AspectRatio::all() {
                            ui.selectable_value(&mut config.aspect_ratio, *ratio, ratio.as_str());
                        }
                    });
                ui.end_row();

                ui.label("Image size");
                egui::ComboBox::from_id_source("image_size")
                    .selected_text(config.image_size.as_str())
                    .show_ui(ui, |ui| {
                        for size in ImageSize::all() {
                            ui.selectable_value(&mut config.image_size, *size, size.as_str());
                        }
                    });
                ui.end_row();
            });

        let suggestions = self.state.session.suggested_keywords().to_vec();
        if !suggestions.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("Suggestions:");
                for keyword in suggestions {
                    let config = &mut self.state.session.config;
                    let taken = config.keywords.contains(&keyword);
                    if ui.add_enabled(!taken, egui::Button::new(&keyword)).clicked() {
                        config.keywords.push(keyword);
                        self.keywords_input = config.keywords.join(", ");
                    }
                }
            });
        }
        if let Some(error) = self.state.session.assist_error().map(str::to_string) {
            ui.colored_label(ui.visuals().warn_fg_color, error);
        }
        if suggest {
            let result = self.state.suggest_keywords();
            self.report(result);
        }

        ui.add_space(12.0);
        if ui
            .add_enabled(!busy, egui::Button::new("✨ Generate article"))
            .clicked()
        {
            let result = self.state.generate_article();
            if self.report(result).is_some() {
                self.textures.clear();
                self.state.dismiss_error();
            }
        }
    }

    fn render_article(&mut self, ui: &mut egui::Ui) {
        let mut format: Option<MarkdownFormatCommand> = None;
        let locked = self.state.session.editor().is_locked();
        let mode = self.state.session.editor().mode();

        ui.horizontal_wrapped(|ui| {
            let toggle_label = format!("{} {}", mode.toggle().icon(), mode.toggle().label());
            if ui
                .add_enabled(!locked, egui::Button::new(toggle_label))
                .on_hover_text("Ctrl+E")
                .clicked()
            {
                let result = self.state.session.toggle_edit_mode();
                self.report(result);
            }
            if mode == EditMode::Editing {
                ui.separator();
                for command in MarkdownFormatCommand::toolbar() {
                    if ui
                        .add_enabled(!locked, egui::Button::new(command.icon()))
                        .on_hover_text(command.tooltip())
                        .clicked()
                    {
                        format = Some(command);
                    }
                }
                ui.separator();
                let can_insert = !locked && self.state.session.document().images.selected().is_some();
                if ui
                    .add_enabled(can_insert, egui::Button::new("Insert image"))
                    .on_hover_text("Insert the selected image at the cursor")
                    .clicked()
                {
                    let result = self.state.session.insert_selected_image();
                    self.report(result);
                }
                let inline_busy = self.state.session.inline_status().is_busy();
                if ui
                    .add_enabled(!locked && !inline_busy, egui::Button::new("Illustrate here"))
                    .on_hover_text("Generate an image for the paragraph at the cursor")
                    .clicked()
                {
                    let result = self.state.insert_inline_image();
                    self.report(result);
                }
            }
            ui.separator();
            if ui
                .add_enabled(!locked, egui::Button::new("💾 Save"))
                .on_hover_text("Save to history (Ctrl+S)")
                .clicked()
            {
                self.handle_save_to_history();
            }
            for export in ExportFormat::all() {
                if ui
                    .add_enabled(!locked, egui::Button::new(export.icon()))
                    .on_hover_text(export.label())
                    .clicked()
                {
                    self.handle_export(*export);
                }
            }
            if ui
                .add_enabled(!locked, egui::Button::new("Originality"))
                .clicked()
            {
                let result = self.state.check_originality();
                self.report(result);
            }
        });

        match self.state.session.text_status() {
            TextStatus::Streaming => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Writing…");
                });
            }
            TextStatus::Failed(message) => {
                ui.colored_label(
                    ui.visuals().warn_fg_color,
                    format!("Generation stopped: {}", message),
                );
            }
            TextStatus::Idle | TextStatus::Completed => {}
        }
        if let ImageStatus::Failed(message) = self.state.session.inline_status() {
            ui.colored_label(ui.visuals().warn_fg_color, message.clone());
        }
        if let Some(report) = self.state.session.originality_report() {
            ui.label(egui::RichText::new(report).italics());
        }
        ui.separator();

        let font_size = self.state.settings.font_size;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if mode.is_editing() {
                    self.render_raw_editor(ui, locked, font_size);
                } else {
                    let colors = ArticleColors::from_theme(self.state.settings.theme, ui.visuals());
                    let blocks = self.state.session.document().blocks();
                    render_blocks(ui, &blocks, &mut self.textures, &colors, font_size);
                }
            });

        if let Some(command) = format {
            let result = self.state.session.apply_format(command);
            self.report(result);
        }
    }

    fn render_raw_editor(&mut self, ui: &mut egui::Ui, locked: bool, font_size: f32) {
        let mut text = self.state.session.document().text.clone();
        let output = egui::TextEdit::multiline(&mut text)
            .font(egui::FontId::monospace(font_size))
            .desired_width(f32::INFINITY)
            .desired_rows(30)
            .interactive(!locked)
            .show(ui);

        if let Some(range) = output.cursor_range {
            let primary = char_index_to_byte_index(&text, range.primary.ccursor.index);
            let secondary = char_index_to_byte_index(&text, range.secondary.ccursor.index);
            self.state
                .session
                .set_selection(primary.min(secondary), primary.max(secondary));
        }
        if output.response.changed() {
            let result = self.state.session.edit_text(text);
            self.report(result);
        }
    }

    fn render_carousel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Images");
        let status = self.state.session.image_status().clone();
        if let Some(message) = status.message() {
            ui.label(message);
        }
        if status.can_retry()
            && ui
                .add_enabled(!status.is_busy(), egui::Button::new("↻ Retry images"))
                .clicked()
        {
            let result = self.state.regenerate_images();
            self.report(result);
        }

        let images = self.state.session.document().images.images();
        let selected = self.state.session.document().images.selected_index();
        let editing = self.state.session.editing_index();
        let mut clicked = None;
        let mut step = None;

        if let Some(index) = selected {
            let width = ui.available_width();
            if let Some(texture) = self.textures.get_or_load(ui.ctx(), &images[index].data_uri) {
                show_texture(ui, &texture, width).on_hover_text(&images[index].prompt);
            }
            ui.horizontal(|ui| {
                if ui.button("◀").clicked() {
                    step = Some(false);
                }
                ui.label(format!("{} / {}", index + 1, images.len()));
                if ui.button("▶").clicked() {
                    step = Some(true);
                }
                if editing == Some(index) {
                    ui.spinner();
                }
            });
        }

        ui.horizontal_wrapped(|ui| {
            for (index, image) in images.iter().enumerate() {
                if let Some(texture) = self.textures.get_or_load(ui.ctx(), &image.data_uri) {
                    let response = show_texture(ui, &texture, 56.0)
                        .interact(egui::Sense::click())
                        .on_hover_text(image.alt_text());
                    if selected == Some(index) {
                        ui.painter().rect_stroke(
                            response.rect,
                            2.0,
                            ui.visuals().selection.stroke,
                        );
                    }
                    if response.clicked() {
                        clicked = Some(index);
                    }
                }
            }
        });

        if let Some(index) = clicked {
            let result = self.state.session.select_image(index);
            self.report(result);
        }
        if let Some(forward) = step {
            self.state.session.step_image(forward);
        }

        if let Some(index) = selected {
            ui.separator();
            ui.label("Edit selected image");
            ui.text_edit_singleline(&mut self.edit_instruction);
            let can_edit = editing.is_none() && !self.edit_instruction.trim().is_empty();
            if ui
                .add_enabled(can_edit, egui::Button::new("Apply edit"))
                .clicked()
            {
                let instruction = self.edit_instruction.clone();
                let result = self.state.edit_image(index, &instruction);
                if self.report(result).is_some() {
                    self.edit_instruction.clear();
                }
            }
            if let Some(error) = self.state.session.edit_error().map(str::to_string) {
                ui.colored_label(ui.visuals().warn_fg_color, error);
            }
        }
    }

    fn render_history(&mut self, ui: &mut egui::Ui) {
        ui.heading("History");
        if self.history.is_empty() {
            ui.label("Saved articles appear here.");
            return;
        }
        let mut open = None;
        let mut delete = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for article in &self.history {
                ui.horizontal(|ui| {
                    if ui.link(&article.topic).clicked() {
                        open = Some(article.id);
                    }
                    if !article.category.is_empty() {
                        ui.label(format!("[{}]", article.category));
                    }
                    ui.label(article.date.format("%Y-%m-%d %H:%M").to_string());
                    ui.label(TextStats::from_markdown(&article.content).format_compact());
                    if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                        delete = Some(article.id);
                    }
                });
            }
        });

        if let Some(id) = delete {
            let result = self.state.delete_article(id);
            self.report(result);
            self.refresh_library();
        }
        if let Some(id) = open {
            if self.state.open_article(id) {
                self.textures.clear();
            } else {
                self.state.show_error("That article no longer exists");
                self.refresh_library();
            }
        }
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        let mut settings = self.state.settings.clone();

        egui::Grid::new("settings_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Theme");
                ui.horizontal(|ui| {
                    for theme in Theme::all() {
                        ui.selectable_value(&mut settings.theme, *theme, theme.label());
                    }
                });
                ui.end_row();

                ui.label("Font size");
                ui.add(egui::Slider::new(&mut settings.font_size, 8.0..=32.0));
                ui.end_row();

                ui.label("Open articles in");
                ui.horizontal(|ui| {
                    for mode in [EditMode::Preview, EditMode::Editing] {
                        ui.selectable_value(&mut settings.default_edit_mode, mode, mode.label());
                    }
                });
                ui.end_row();

                ui.label("Default tone");
                egui::ComboBox::from_id_source("default_tone")
                    .selected_text(settings.default_tone.label())
                    .show_ui(ui, |ui| {
                        for tone in Tone::all() {
                            ui.selectable_value(&mut settings.default_tone, *tone, tone.label());
                        }
                    });
                ui.end_row();

                ui.label("Default length");
                egui::ComboBox::from_id_source("default_length")
                    .selected_text(settings.default_length.label())
                    .show_ui(ui, |ui| {
                        for length in ArticleLength::all() {
                            ui.selectable_value(
                                &mut settings.default_length,
                                *length,
                                length.label(),
                            );
                        }
                    });
                ui.end_row();

                ui.label("Default image count");
                ui.add(egui::Slider::new(
                    &mut settings.default_image_count,
                    1..=MAX_IMAGES,
                ));
                ui.end_row();

                ui.label("Auto-save draft");
                ui.checkbox(&mut settings.auto_save, "");
                ui.end_row();

                ui.label("History size");
                ui.add(egui::Slider::new(&mut settings.max_history, 1..=500));
                ui.end_row();

                ui.label("Open after export");
                ui.checkbox(&mut settings.open_after_export, "");
                ui.end_row();
            });

        if settings != self.state.settings {
            self.state.update_settings(|s| *s = settings);
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Default language");
            ui.text_edit_singleline(&mut self.language_input);
            if ui.button("Save").clicked() {
                let preferences = Preferences {
                    default_language: self.language_input.trim().to_string(),
                };
                let result = self.state.library.save_preferences(&preferences);
                if self.report(result).is_some() {
                    self.state.set_status("Preferences saved");
                }
            }
        });

        ui.separator();
        ui.label(egui::RichText::new("Categories").strong());
        let mut remove = None;
        for category in &self.categories {
            ui.horizontal(|ui| {
                ui.label(&category.name);
                if ui.small_button("✕").clicked() {
                    remove = Some(category.id);
                }
            });
        }
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.new_category);
            if ui.button("Add").clicked() {
                let name = self.new_category.clone();
                let result = self.state.library.add_category(&name);
                if self.report(result).is_some() {
                    self.new_category.clear();
                }
                self.refresh_library();
            }
        });
        if let Some(id) = remove {
            let result = self.state.library.remove_category(id);
            self.report(result);
            self.refresh_library();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_save_to_history(&mut self) {
        let result = self.state.save_to_history();
        if self.report(result).is_some() {
            self.refresh_library();
        }
    }

    fn handle_export(&mut self, format: ExportFormat) {
        let document = self.state.session.document();
        if document.text.trim().is_empty() {
            self.state.show_error("Nothing to export yet");
            return;
        }

        if format == ExportFormat::Clipboard {
            let text = document.text.clone();
            match copy_article_to_clipboard(&text) {
                Ok(outcome) => self.state.set_status(outcome.message()),
                Err(e) => self.state.show_error(format!("Copy failed: {}", e)),
            }
            return;
        }

        let Some(extension) = format.extension() else {
            return;
        };
        let title = document
            .title()
            .unwrap_or_else(|| self.state.session.config.topic.clone());

        let dialog = rfd::FileDialog::new()
            .add_filter(format.label(), &[extension])
            .set_file_name(suggested_file_name(&title, extension));
        let dialog = match self.state.settings.last_export_directory.as_ref() {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        };
        let Some(path) = dialog.save_file() else {
            debug!("Export cancelled");
            return;
        };

        let result = export_to_file(
            self.state.session.document(),
            format,
            self.state.settings.theme,
            &path,
        );
        match result {
            Ok(()) => {
                let dir = path.parent().map(|p| p.to_path_buf());
                self.state
                    .update_settings(|settings| settings.last_export_directory = dir);
                self.state
                    .set_status(format!("Exported to {}", path.display()));
                if self.state.settings.open_after_export {
                    if let Err(e) = open::that(&path) {
                        warn!("Failed to open exported file: {}", e);
                    }
                }
            }
            Err(e) => self.state.show_error(format!("Export failed: {}", e)),
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        if self.state.screen() != Screen::Article {
            return;
        }
        let mut action = None;
        ctx.input_mut(|i| {
            let cmd = egui::Modifiers::COMMAND;
            let shortcuts = [
                (egui::Key::E, KeyboardAction::ToggleMode),
                (egui::Key::S, KeyboardAction::SaveToHistory),
                (egui::Key::N, KeyboardAction::NewArticle),
                (egui::Key::B, KeyboardAction::Format(MarkdownFormatCommand::Bold)),
                (egui::Key::I, KeyboardAction::Format(MarkdownFormatCommand::Italic)),
            ];
            for (key, candidate) in shortcuts {
                if i.consume_key(cmd, key) {
                    action = Some(candidate);
                }
            }
            for (key, command) in [
                egui::Key::Num1,
                egui::Key::Num2,
                egui::Key::Num3,
            ]
            .into_iter()
            .zip(&MarkdownFormatCommand::toolbar()[2..])
            {
                if i.consume_key(cmd, key) {
                    action = Some(KeyboardAction::Format(*command));
                }
            }
        });

        let Some(action) = action else {
            return;
        };
        debug!("Keyboard action: {:?}", action);
        match action {
            KeyboardAction::ToggleMode => {
                let result = self.state.session.toggle_edit_mode();
                self.report(result);
            }
            KeyboardAction::Format(command) => {
                if self.state.session.editor().is_editing() {
                    let result = self.state.session.apply_format(command);
                    self.report(result);
                }
            }
            KeyboardAction::SaveToHistory => self.handle_save_to_history(),
            KeyboardAction::NewArticle => {
                if !self.state.session.is_streaming() {
                    self.state.new_article();
                    self.keywords_input.clear();
                }
            }
        }
    }
}

fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl eframe::App for DraftsmithApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);

        // Apply worker results before drawing so this frame shows them
        self.state.poll_generation();

        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));
        self.update_window_state(ctx);

        self.render_ui(ctx);

        // Shortcuts run after render so the selection is up to date
        self.handle_keyboard_shortcuts(ctx);
    }

    /// Called when the application is about to close.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application exiting");
        self.state.shutdown();
    }

    /// Save persistent state.
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        debug!("Saving application state");
        self.state.save_settings_if_dirty();
    }

    /// Auto-save interval in seconds.
    fn auto_save_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_keywords(" bees, , hives ,honey"),
            vec!["bees", "hives", "honey"]
        );
        assert!(parse_keywords("").is_empty());
    }
}
