//! Transient Surface Pool
//!
//! Provides short-lived surfaces whose lifetime is a contiguous range of
//! passes within one frame (the blur intermediate). A surface is acquired as a
//! [`TemporarySurface`] guard and goes back to the pool when the guard is
//! dropped, so a temporary can neither leak nor outlive the passes that use
//! it.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            TransientSurfacePool<S>                  │
//! │                                                     │
//! │  free: HashMap<PoolKey, Vec<S>>                     │
//! │                                                     │
//! │  acquire() → TemporarySurface   (guard, &mut pool)  │
//! │  drop(guard)                    (back to free list) │
//! │  clear()                        (end of frame)      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Memory Strategy
//!
//! - A dropped guard parks its surface in the free list, so a chain replayed
//!   twice within one frame reuses it.
//! - The pool grows on demand: if no compatible free surface exists, a new
//!   one is created through the [`SurfaceAllocator`].
//! - [`TransientSurfacePool::clear`] destroys every free surface. The frame
//!   driver calls it at every frame boundary, so no temporary survives into
//!   the next frame.

use std::ops::Deref;

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::renderer::surface::{SurfaceAllocator, SurfaceDesc};

/// Key for surface recycling. The debug label is not part of the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    filter: wgpu::FilterMode,
}

impl PoolKey {
    fn from_desc(desc: &SurfaceDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            filter: desc.filter,
        }
    }
}

/// Pool of transient surfaces, generic over the backend handle.
///
/// A guard borrows the pool mutably, so at most one temporary is live at a
/// time.
pub struct TransientSurfacePool<S> {
    free: FxHashMap<PoolKey, Vec<S>>,
}

impl<S> Default for TransientSurfacePool<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TransientSurfacePool<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: FxHashMap::default(),
        }
    }

    /// Acquire a surface matching `desc`, creating one if no compatible free
    /// surface exists. The surface returns to the pool when the guard drops.
    pub fn acquire<A>(
        &mut self,
        allocator: &mut A,
        desc: &SurfaceDesc,
    ) -> Result<TemporarySurface<'_, S>>
    where
        A: SurfaceAllocator<Surface = S>,
    {
        let key = PoolKey::from_desc(desc);

        let reused = self.free.get_mut(&key).and_then(Vec::pop);
        let surface = match reused {
            Some(surface) => surface,
            None => allocator.create_surface(desc)?,
        };

        Ok(TemporarySurface {
            pool: self,
            key,
            desc: *desc,
            surface: Some(surface),
        })
    }

    fn give_back(&mut self, key: PoolKey, surface: S) {
        self.free.entry(key).or_default().push(surface);
    }

    /// Destroy every free surface.
    pub fn clear<A>(&mut self, allocator: &mut A)
    where
        A: SurfaceAllocator<Surface = S>,
    {
        for (_, bucket) in self.free.drain() {
            for surface in bucket {
                allocator.destroy_surface(surface);
            }
        }
    }

    /// Number of surfaces waiting in the free pool.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }
}

/// Scoped handle to a pooled surface.
///
/// Dereferences to the backend surface. Dropping the guard returns the
/// surface to the pool it came from.
pub struct TemporarySurface<'p, S> {
    pool: &'p mut TransientSurfacePool<S>,
    key: PoolKey,
    desc: SurfaceDesc,
    surface: Option<S>,
}

impl<S> TemporarySurface<'_, S> {
    #[inline]
    #[must_use]
    pub fn desc(&self) -> &SurfaceDesc {
        &self.desc
    }
}

impl<S> Deref for TemporarySurface<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        // Only `Drop` takes the surface out.
        match &self.surface {
            Some(surface) => surface,
            None => unreachable!("temporary surface accessed after release"),
        }
    }
}

impl<S> Drop for TemporarySurface<'_, S> {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.pool.give_back(self.key, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::surface::HeadlessAllocator;

    fn temp_desc(width: u32, height: u32) -> SurfaceDesc {
        SurfaceDesc::blur_temp((width, height))
    }

    #[test]
    fn guard_returns_surface_on_drop() {
        let mut alloc = HeadlessAllocator::new();
        let mut pool = TransientSurfacePool::new();

        let first = {
            let temp = pool.acquire(&mut alloc, &temp_desc(64, 64)).unwrap();
            *temp
        };
        assert_eq!(pool.free_count(), 1);

        let second = {
            let temp = pool.acquire(&mut alloc, &temp_desc(64, 64)).unwrap();
            *temp
        };
        assert_eq!(first, second, "compatible surface should be reused");
        assert_eq!(alloc.created_count(), 1);
    }

    #[test]
    fn mismatched_extent_allocates_new_surface() {
        let mut alloc = HeadlessAllocator::new();
        let mut pool = TransientSurfacePool::new();

        drop(pool.acquire(&mut alloc, &temp_desc(64, 64)).unwrap());
        drop(pool.acquire(&mut alloc, &temp_desc(128, 64)).unwrap());

        assert_eq!(alloc.created_count(), 2);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn clear_destroys_everything_free() {
        let mut alloc = HeadlessAllocator::new();
        let mut pool = TransientSurfacePool::new();

        drop(pool.acquire(&mut alloc, &temp_desc(32, 32)).unwrap());
        drop(pool.acquire(&mut alloc, &temp_desc(16, 16)).unwrap());
        pool.clear(&mut alloc);

        assert_eq!(pool.free_count(), 0);
        assert_eq!(alloc.destroyed_count(), 2);
    }
}
