use std::sync::{PoisonError, RwLock};

/// Cached repository slug, written by the config resolver and read by the
/// poller when it builds the "Show in Travis" link.
///
/// Each configuration change opens a new generation. A resolution may only
/// store its result while its generation is still current, so a slow lookup
/// for an old configuration cannot overwrite the slug of a newer one.
#[derive(Debug, Default)]
pub struct SlugCache {
    inner: RwLock<SlugEntry>,
}

#[derive(Debug, Default)]
struct SlugEntry {
    generation: u64,
    slug: String,
}

impl SlugCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and clear the cached slug.
    pub fn begin(&self) -> u64 {
        let mut entry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        entry.generation += 1;
        entry.slug.clear();
        entry.generation
    }

    /// Store `slug` if `generation` is still current. Returns whether it was stored.
    pub fn store(&self, generation: u64, slug: String) -> bool {
        let mut entry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if entry.generation != generation {
            return false;
        }
        entry.slug = slug;
        true
    }

    /// Current slug, empty when unresolved.
    pub fn get(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slug
            .clone()
    }
}
