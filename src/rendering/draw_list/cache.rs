/// Owned, lazily built value with an explicit lifecycle: built on first use,
/// reused until `release` is called.
///
/// Not synchronized. Callers drive it from the render thread only.
pub struct DrawListCache<T> {
    label: &'static str,
    value: Option<T>,
    build_count: u32,
}

impl<T> DrawListCache<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: None,
            build_count: 0,
        }
    }

    /// Runs `build` only if nothing is cached. A failed build leaves the cache
    /// empty so the next call tries again.
    pub fn build_if_absent<E>(&mut self, build: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        let value = match self.value.take() {
            Some(value) => value,
            None => {
                let value = build()?;
                self.build_count += 1;
                log::debug!("Built {} (build #{})", self.label, self.build_count);
                value
            }
        };

        Ok(self.value.insert(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn is_built(&self) -> bool {
        self.value.is_some()
    }

    /// How many times a value has been built over the cache's lifetime.
    pub fn build_count(&self) -> u32 {
        self.build_count
    }

    /// Hands the cached value back to the caller for teardown.
    pub fn release(&mut self) -> Option<T> {
        let value = self.value.take();
        if value.is_some() {
            log::debug!("Released {}", self.label);
        }
        value
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_once() {
        let mut cache = DrawListCache::new("numbers");

        let first = *cache.build_if_absent(|| Ok::<_, ()>(1)).unwrap();
        let second = *cache.build_if_absent(|| Ok::<_, ()>(2)).unwrap();

        assert_eq!((first, second), (1, 1));
        assert_eq!(cache.build_count(), 1);
        assert_eq!(cache.get(), Some(&1));
    }

    #[test]
    fn failed_build_leaves_cache_empty() {
        let mut cache = DrawListCache::<u32>::new("numbers");

        assert_eq!(cache.build_if_absent(|| Err("nope")), Err("nope"));
        assert!(!cache.is_built());
        assert_eq!(cache.build_count(), 0);

        assert_eq!(cache.build_if_absent(|| Ok::<_, &str>(7)), Ok(&7));
    }

    #[test]
    fn release_returns_value_and_allows_rebuild() {
        let mut cache = DrawListCache::new("numbers");
        cache.build_if_absent(|| Ok::<_, ()>(3)).unwrap();

        assert_eq!(cache.release(), Some(3));
        assert_eq!(cache.release(), None);
        assert!(cache.get().is_none());

        cache.build_if_absent(|| Ok::<_, ()>(4)).unwrap();
        assert_eq!(cache.build_count(), 2);
    }
}
