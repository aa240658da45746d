use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::item::{FontFamily, FontSpec};

/// Font database plus the faces that have been parsed so far.
///
/// `fontdb` knows which faces exist; `fontdue` faces are parsed lazily the
/// first time a label asks for them and kept for the lifetime of the storage.
pub struct FontStorage {
    font_db: fontdb::Database,
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
    /// Resolved faces per spec key, including failed lookups.
    resolved: HashMap<SpecKey, Option<fontdb::ID>, fxhash::FxBuildHasher>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct SpecKey {
    family: FontFamily,
    bold: bool,
    italic: bool,
}

impl From<&FontSpec> for SpecKey {
    fn from(spec: &FontSpec) -> Self {
        Self {
            family: spec.family.clone(),
            bold: spec.bold,
            italic: spec.italic,
        }
    }
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates an empty storage. Call one of the `load_*` methods before
    /// rendering, otherwise labels are drawn without text.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            resolved: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }
}

/// Loading fonts.
///
/// Every load invalidates earlier spec resolutions because a better match may
/// have appeared.
impl FontStorage {
    /// Loads a font from binary data.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) {
        self.font_db.load_font_data(data.into());
        self.resolved.clear();
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&mut self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_db.load_font_file(path)?;
        self.resolved.clear();
        Ok(())
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&mut self, dir: PathBuf) {
        self.font_db.load_fonts_dir(dir);
        self.resolved.clear();
    }

    /// Loads the fonts installed on the system.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
        self.resolved.clear();
    }

    /// Checks if no face has been loaded.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of loaded faces.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }

    /// Sets the family name behind the generic "serif" family.
    pub fn set_serif_family(&mut self, family: impl Into<String>) {
        self.font_db.set_serif_family(family);
        self.resolved.clear();
    }

    /// Sets the family name behind the generic "sans-serif" family.
    pub fn set_sans_serif_family(&mut self, family: impl Into<String>) {
        self.font_db.set_sans_serif_family(family);
        self.resolved.clear();
    }

    /// Sets the family name behind the generic "cursive" family.
    pub fn set_cursive_family(&mut self, family: impl Into<String>) {
        self.font_db.set_cursive_family(family);
        self.resolved.clear();
    }

    /// Sets the family name behind the generic "fantasy" family.
    pub fn set_fantasy_family(&mut self, family: impl Into<String>) {
        self.font_db.set_fantasy_family(family);
        self.resolved.clear();
    }

    /// Sets the family name behind the generic "monospace" family.
    pub fn set_monospace_family(&mut self, family: impl Into<String>) {
        self.font_db.set_monospace_family(family);
        self.resolved.clear();
    }
}

/// Get `Font`
impl FontStorage {
    /// Finds the face that best matches `spec`.
    ///
    /// The requested family is tried first, then the generic serif and
    /// sans-serif families, then any loaded face, so a label is rendered
    /// whenever at least one font is available.
    pub fn resolve(&mut self, spec: &FontSpec) -> Option<(fontdb::ID, Arc<fontdue::Font>)> {
        let key = SpecKey::from(spec);
        let id = match self.resolved.get(&key) {
            Some(id) => *id,
            None => {
                let id = self.lookup(spec);
                if id.is_none() {
                    log::warn!("No font face available for {:?}", spec.family);
                }
                self.resolved.insert(key, id);
                id
            }
        };

        let id = id?;
        self.font(id).map(|font| (id, font))
    }

    fn lookup(&self, spec: &FontSpec) -> Option<fontdb::ID> {
        let requested = match &spec.family {
            FontFamily::Serif => fontdb::Family::Serif,
            FontFamily::SansSerif => fontdb::Family::SansSerif,
            FontFamily::Monospace => fontdb::Family::Monospace,
            FontFamily::Cursive => fontdb::Family::Cursive,
            FontFamily::Fantasy => fontdb::Family::Fantasy,
            FontFamily::Named(name) => fontdb::Family::Name(name.as_str()),
        };
        let families = [
            requested,
            fontdb::Family::Serif,
            fontdb::Family::SansSerif,
        ];

        let query = fontdb::Query {
            families: &families,
            weight: if spec.bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if spec.italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };

        self.font_db
            .query(&query)
            .or_else(|| self.font_db.faces().next().map(|face| face.id))
    }

    /// Retrieves a parsed face by ID, parsing it on first use.
    pub fn font(&mut self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self.font_db.with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data,
                        fontdue::FontSettings {
                            collection_index: index,
                            scale: 40.0,
                            load_substitutions: true,
                        },
                    )
                })?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Some(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        None
                    }
                }
            }
        }
    }

    pub fn faces(&self) -> impl Iterator<Item = &fontdb::FaceInfo> {
        self.font_db.faces()
    }
}
