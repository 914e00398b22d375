use crate::audio::OutputFormat;
use std::collections::{HashMap, VecDeque};

/// Bounded synthesis cache with insertion-order eviction.
///
/// Reads never reorder entries: once capacity is exceeded the earliest
/// inserted key goes first, however recently it was hit.
/// Thread safety is handled at the SynthesisService level via Arc<RwLock<SynthesisCache>>.
pub struct SynthesisCache {
    entries: HashMap<CacheKey, Vec<u8>>,
    max_entries: usize,
    /// Insertion order (oldest at the front)
    insertion_order: VecDeque<CacheKey>,
}

/// Full parameter tuple of a request. Floats are keyed by their bit pattern,
/// so distinct values never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    character: String,
    emotion: String,
    voice_style: String,
    speed_bits: Option<u32>,
    pitch_bits: Option<u32>,
    energy_bits: Option<u32>,
    format: OutputFormat,
}

impl CacheKey {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: &str,
        character: &str,
        emotion: &str,
        voice_style: &str,
        speed: Option<f32>,
        pitch: Option<f32>,
        energy: Option<f32>,
        format: OutputFormat,
    ) -> Self {
        Self {
            text: text.to_string(),
            character: character.to_string(),
            emotion: emotion.to_string(),
            voice_style: voice_style.to_string(),
            speed_bits: speed.map(f32::to_bits),
            pitch_bits: pitch.map(f32::to_bits),
            energy_bits: energy.map(f32::to_bits),
            format,
        }
    }
}

impl SynthesisCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            insertion_order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store audio, evicting the oldest insertions while over capacity.
    /// Re-putting an existing key replaces its audio in place.
    pub fn put(&mut self, key: CacheKey, audio: Vec<u8>) {
        if self.max_entries == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = audio;
            return;
        }

        self.insertion_order.push_back(key.clone());
        self.entries.insert(key, audio);

        while self.entries.len() > self.max_entries {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
