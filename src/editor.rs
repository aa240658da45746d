//! Command layer between a user interface and the collage core.
//!
//! The editor implements the canvas menu (place, save, open, export image,
//! undo, clear, add random labels, text and background color) on top of a
//! [`UiCollaborator`], which is the only thing a concrete toolkit has to
//! provide. Every command runs to completion on the calling thread; failures
//! are logged, reported through [`UiCollaborator::show_error`], and leave the
//! editor ready for the next command.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    codec::CollageCodec,
    collage::Collage,
    error::CollageResult,
    item::{Rgb, TextItem},
    renderer::{Rasterizer, Surface, export_image},
    scatter::ScatterGenerator,
    settings::CanvasSettings,
};

/// Number of labels added by the "add random strings" command.
pub const RANDOM_BATCH: usize = 30;

/// File name suggested when exporting an image.
pub const IMAGE_FILE_NAME: &str = "textimage.png";

/// Dialogs and repaint requests the editor needs from the user interface.
///
/// Prompts block until the user answers; `None` means the user cancelled.
pub trait UiCollaborator {
    /// The label text the user wants to place next.
    fn prompt_for_text(&mut self) -> String;

    fn prompt_for_color(&mut self, initial: Rgb) -> Option<Rgb>;

    fn prompt_for_open_path(&mut self) -> Option<PathBuf>;

    fn prompt_for_save_path(&mut self, suggested_name: &str) -> Option<PathBuf>;

    /// The canvas must be repainted from [`Editor::render`].
    fn notify_redraw(&mut self);

    /// Shows a user-visible error message.
    fn show_error(&mut self, message: &str);
}

/// Owns the collage being edited and executes menu commands on it.
pub struct Editor<U: UiCollaborator> {
    ui: U,
    settings: CanvasSettings,
    collage: Collage,
    codec: CollageCodec,
    rasterizer: Rasterizer,
    scatter: ScatterGenerator,
    /// Color for newly placed labels; `None` follows the canvas foreground.
    text_color: Option<Rgb>,
    dirty: Rc<Cell<bool>>,
}

impl<U: UiCollaborator> Editor<U> {
    /// Creates an editor with an empty collage and a rasterizer using the
    /// system fonts.
    pub fn new(ui: U, settings: CanvasSettings) -> Self {
        let rasterizer = Rasterizer::with_system_fonts(&settings);
        Self::with_rasterizer(ui, settings, rasterizer)
    }

    /// Creates an editor drawing through `rasterizer`.
    pub fn with_rasterizer(ui: U, settings: CanvasSettings, rasterizer: Rasterizer) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let mut collage = Collage::new();
        let hook_dirty = Rc::clone(&dirty);
        collage.set_redraw_hook(move || hook_dirty.set(true));

        Self {
            codec: CollageCodec::from_settings(&settings),
            scatter: ScatterGenerator::for_surface(settings.width, settings.height),
            ui,
            settings,
            collage,
            rasterizer,
            text_color: None,
            dirty,
        }
    }

    /// Replaces the random generator, e.g. with a seeded one.
    pub fn set_scatter_generator(&mut self, scatter: ScatterGenerator) {
        self.scatter = scatter;
        self.scatter.resize(self.settings.width, self.settings.height);
    }

    pub fn collage(&self) -> &Collage {
        &self.collage
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    pub fn text_color(&self) -> Option<Rgb> {
        self.text_color
    }

    /// Whether the undo command should be enabled.
    pub fn can_undo(&self) -> bool {
        self.collage.undo_available()
    }

    /// Changes the canvas size; random labels follow the new bounds.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.settings.width = width;
        self.settings.height = height;
        self.scatter.resize(width, height);
        self.ui.notify_redraw();
    }

    /// Draws the current collage at the canvas size, for the live view.
    pub fn render(&self) -> Surface {
        self.rasterizer
            .render(&self.collage, self.settings.width, self.settings.height)
    }
}

/// menu commands
impl<U: UiCollaborator> Editor<U> {
    /// Places the prompted text centered on `(x, y)`.
    ///
    /// The text is trimmed and line breaks become spaces; blank input places
    /// the fallback text instead.
    pub fn place(&mut self, x: i32, y: i32) {
        let input = self.ui.prompt_for_text();
        let text = match input.trim() {
            "" => self.settings.fallback_text.clone(),
            trimmed => trimmed.to_string(),
        };

        let item = TextItem::builder(text, x, y)
            .maybe_text_color(self.text_color)
            .build();
        self.collage.add(item);
        self.flush_redraw();
    }

    /// Removes the most recent label, unless it is the only one.
    pub fn undo(&mut self) {
        if self.collage.remove_last().is_none() {
            log::debug!("Undo ignored with {} item(s)", self.collage.len());
        }
        self.flush_redraw();
    }

    pub fn clear(&mut self) {
        self.collage.clear();
        self.flush_redraw();
    }

    /// Adds `n` randomly placed and colored labels with a single redraw.
    pub fn add_random(&mut self, n: usize) {
        let items = self.scatter.generate(n);
        self.collage.extend(items);
        self.flush_redraw();
    }

    /// Lets the user pick the color of labels placed from now on.
    pub fn choose_text_color(&mut self) {
        let initial = self
            .text_color
            .unwrap_or(self.settings.default_foreground);
        if let Some(color) = self.ui.prompt_for_color(initial) {
            self.text_color = Some(color);
        }
    }

    /// Lets the user pick the canvas background.
    pub fn choose_background_color(&mut self) {
        if let Some(color) = self.ui.prompt_for_color(self.rasterizer.background()) {
            self.settings.background = color;
            self.rasterizer.set_background(color);
            self.ui.notify_redraw();
        }
    }

    /// Saves the collage to a user-chosen text file.
    pub fn save(&mut self) {
        let suggested = match self.collage.items().first() {
            Some(item) => format!("{}.txt", item.text()),
            None => "collage.txt".to_string(),
        };
        let Some(path) = self.ui.prompt_for_save_path(&suggested) else {
            return;
        };

        let result = self.codec.save(&self.collage, &path);
        self.report("save the file", result);
    }

    /// Replaces the collage with the contents of a user-chosen file.
    ///
    /// A file that fails to parse part way leaves the labels read before the
    /// bad line on the canvas.
    pub fn open(&mut self) {
        let Some(path) = self.ui.prompt_for_open_path() else {
            return;
        };

        let result = self.codec.open(&path, &mut self.collage);
        self.flush_redraw();
        self.report("open the file", result);
    }

    /// Renders the collage at the canvas size and writes it as a PNG.
    pub fn export_image(&mut self) {
        let Some(path) = self.ui.prompt_for_save_path(IMAGE_FILE_NAME) else {
            return;
        };

        let surface = self.render();
        let result = export_image(&surface, &path);
        self.report("save the image", result);
    }

    fn flush_redraw(&mut self) {
        if self.dirty.replace(false) {
            self.ui.notify_redraw();
        }
    }

    fn report(&mut self, action: &str, result: CollageResult<()>) {
        if let Err(e) = result {
            log::error!("Failed to {action}: {e}");
            self.ui
                .show_error(&format!("Sorry, an error occurred while trying to {action}:\n{e}"));
        }
    }
}
