use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::font_storage::FontStorage;

/// Sizes are stored in 1/256 px steps so that nearly equal magnifications
/// share cache entries.
pub const SUB_PIXEL_QUANTIZE: f32 = 256f32;

/// Identifies one rasterized glyph: face, glyph index and quantized size.
///
/// Face IDs come from the running font database, so keys are not stable
/// across program runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    font_id: fontdb::ID,
    glyph_index: u16,
    font_size: u32,
}

impl GlyphKey {
    pub fn new(font_id: fontdb::ID, glyph_index: u16, font_size: f32) -> Self {
        Self {
            font_id,
            glyph_index,
            font_size: (font_size * SUB_PIXEL_QUANTIZE).round() as u32,
        }
    }

    pub fn font_id(&self) -> fontdb::ID {
        self.font_id
    }

    pub fn glyph_index(&self) -> u16 {
        self.glyph_index
    }

    pub fn font_size(&self) -> f32 {
        self.font_size as f32 / SUB_PIXEL_QUANTIZE
    }
}

#[derive(Default, Clone, Copy)]
struct LruNodes {
    newer: Option<usize>,
    older: Option<usize>,
}

/// Fixed number of equally sized blocks with least-recently-used eviction.
struct VecAtlas {
    capacity: usize,
    block_size: usize,
    data: Vec<u8>,

    lru_nodes: Vec<LruNodes>,
    lru_head: Option<usize>,
    lru_tail: Option<usize>,
    lru_map: HashMap<GlyphKey, usize, fxhash::FxBuildHasher>,
    lru_empties: Vec<usize>,
    lru_keys: Vec<Option<GlyphKey>>,
}

impl VecAtlas {
    fn new(capacity: NonZeroUsize, block_size: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        let block_size = block_size.get();

        Self {
            capacity,
            block_size,
            data: vec![0; capacity * block_size],
            lru_nodes: vec![LruNodes::default(); capacity],
            lru_head: None,
            lru_tail: None,
            lru_map: HashMap::with_capacity_and_hasher(capacity, fxhash::FxBuildHasher::default()),
            lru_empties: (0..capacity).collect(),
            lru_keys: vec![None; capacity],
        }
    }

    fn clear(&mut self) {
        self.lru_map.clear();
        self.lru_empties = (0..self.capacity).collect();
        self.lru_keys.fill(None);
        self.lru_head = None;
        self.lru_tail = None;
    }

    /// Returns the first `len` bytes of the block for `key`, filling a block
    /// with `f()` on a miss.
    fn get_or_insert_with(
        &mut self,
        key: &GlyphKey,
        len: usize,
        f: impl FnOnce() -> Vec<u8>,
    ) -> &[u8] {
        let len = len.min(self.block_size);

        let block_index = match self.lru_map.get(key).copied() {
            Some(index) => {
                self.move_to_front(index);
                index
            }
            None => {
                let index = self.push_front(*key);
                let rasterized = f();
                let copy_len = rasterized.len().min(len);
                let from = index * self.block_size;
                self.data[from..from + copy_len].copy_from_slice(&rasterized[..copy_len]);
                self.data[from + copy_len..from + len].fill(0);
                index
            }
        };

        let from = block_index * self.block_size;
        &self.data[from..from + len]
    }

    fn attach_to_head(&mut self, node_idx: usize, key: GlyphKey) {
        self.lru_nodes[node_idx].newer = None;
        self.lru_nodes[node_idx].older = self.lru_head;
        self.lru_map.insert(key, node_idx);
        self.lru_keys[node_idx] = Some(key);

        if let Some(old_head_idx) = self.lru_head {
            self.lru_nodes[old_head_idx].newer = Some(node_idx);
        }

        self.lru_head = Some(node_idx);
        if self.lru_tail.is_none() {
            self.lru_tail = Some(node_idx);
        }
    }

    /// Takes a free block, or evicts the least recently used one.
    fn push_front(&mut self, key: GlyphKey) -> usize {
        let target_idx = match self.lru_empties.pop() {
            Some(empty) => empty,
            None => {
                let tail_idx = self
                    .lru_tail
                    .expect("tail must be set when all slots are used");

                if let Some(second_tail) = self.lru_nodes[tail_idx].newer {
                    self.lru_nodes[second_tail].older = None;
                    self.lru_tail = Some(second_tail);
                } else {
                    // capacity 1
                    self.lru_head = None;
                    self.lru_tail = None;
                }

                if let Some(old_key) = self.lru_keys[tail_idx].take() {
                    self.lru_map.remove(&old_key);
                }

                tail_idx
            }
        };

        self.attach_to_head(target_idx, key);
        target_idx
    }

    fn move_to_front(&mut self, index: usize) {
        if self.lru_head == Some(index) {
            return;
        }

        let LruNodes { newer, older } = self.lru_nodes[index];

        // unlink
        if let Some(newer) = newer {
            self.lru_nodes[newer].older = older;
        }
        match older {
            Some(older) => self.lru_nodes[older].newer = newer,
            None => self.lru_tail = newer,
        }

        // relink at head
        if let Some(old_head) = self.lru_head {
            self.lru_nodes[old_head].newer = Some(index);
        }
        self.lru_nodes[index] = LruNodes {
            newer: None,
            older: self.lru_head,
        };
        self.lru_head = Some(index);
    }
}

/// Coverage bitmap of one glyph: `width * height` bytes, row-major.
pub struct GlyphCacheItem<'a> {
    pub width: usize,
    pub height: usize,
    pub data: Cow<'a, [u8]>,
}

/// Rasterized glyph coverage, bucketed by bitmap size.
///
/// Each glyph lands in the atlas with the smallest block that fits it.
/// Glyphs bigger than every block, such as heavily magnified labels, are
/// rasterized on every request instead of being dropped.
pub struct GlyphCache {
    /// must be sorted by block size
    caches: Vec<VecAtlas>,
}

impl GlyphCache {
    /// `blocksize_capacity` holds `(block_size, capacity)` pairs in bytes and
    /// blocks respectively; the order does not matter.
    pub fn new(blocksize_capacity: &[(NonZeroUsize, NonZeroUsize)]) -> Self {
        let mut sorted = blocksize_capacity.to_vec();
        sorted.sort_by_key(|(block_size, _)| *block_size);

        let caches = sorted
            .into_iter()
            .map(|(block_size, capacity)| VecAtlas::new(capacity, block_size))
            .collect();

        Self { caches }
    }

    pub fn clear(&mut self) {
        for cache in &mut self.caches {
            cache.clear();
        }
    }

    pub fn get(
        &'_ mut self,
        key: &GlyphKey,
        font_storage: &mut FontStorage,
    ) -> Option<GlyphCacheItem<'_>> {
        let glyph_index = key.glyph_index();
        let font_size = key.font_size();

        let font = font_storage.font(key.font_id())?;
        let metrics = font.metrics_indexed(glyph_index, font_size);
        let len = metrics.width * metrics.height;
        if len == 0 {
            return None;
        }

        let data = match self.caches.iter_mut().find(|cache| cache.block_size >= len) {
            Some(cache) => Cow::Borrowed(cache.get_or_insert_with(key, len, || {
                font.rasterize_indexed(glyph_index, font_size).1
            })),
            None => Cow::Owned(font.rasterize_indexed(glyph_index, font_size).1),
        };

        Some(GlyphCacheItem {
            width: metrics.width,
            height: metrics.height,
            data,
        })
    }
}
