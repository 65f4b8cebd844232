//! Light-Pass Listeners
//!
//! Per-light renderers need the frame's adjusted view-projection matrix and
//! the surface they should render their contribution into. The
//! [`FrameDriver`](super::FrameDriver) publishes a [`LightPassContext`] once
//! per frame to every listener registered here.
//!
//! Listeners are either boxed [`LightPassListener`] objects or `flume`
//! channels (for renderers that live behind a queue). Both are addressed by
//! a [`ListenerKey`] returned on registration and removed explicitly.

use glam::Mat4;
use slotmap::{SlotMap, new_key_type};

use crate::renderer::settings::QualityTier;
use crate::renderer::surface::SurfaceSlot;

new_key_type! {
    /// Handle to a registered listener.
    pub struct ListenerKey;
}

/// Everything a per-light renderer needs to draw into the light buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPassContext {
    /// Monotonic frame counter of the driver.
    pub frame_index: u64,
    /// Adjusted projection × view for rendering into the light buffer.
    pub view_projection: Mat4,
    pub tier: QualityTier,
    /// The light buffer to render into (already cleared this frame).
    pub target: SurfaceSlot,
    pub target_extent: (u32, u32),
    /// Depth attachment to test against, if the tier renders at scene
    /// resolution.
    pub depth_attachment: Option<SurfaceSlot>,
}

/// Receives the per-frame light-pass context.
pub trait LightPassListener {
    fn on_light_pass(&mut self, ctx: &LightPassContext);
}

impl<F> LightPassListener for F
where
    F: FnMut(&LightPassContext),
{
    fn on_light_pass(&mut self, ctx: &LightPassContext) {
        self(ctx);
    }
}

enum Listener {
    Callback(Box<dyn LightPassListener>),
    Channel(flume::Sender<LightPassContext>),
}

/// Registry of light-pass listeners with explicit add/remove lifecycle.
#[derive(Default)]
pub struct LightPassListeners {
    listeners: SlotMap<ListenerKey, Listener>,
}

impl LightPassListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener object.
    pub fn add(&mut self, listener: impl LightPassListener + 'static) -> ListenerKey {
        self.listeners.insert(Listener::Callback(Box::new(listener)))
    }

    /// Registers a channel and returns its receiving end.
    ///
    /// The channel is unbounded; a receiver that is dropped unregisters the
    /// channel on the next broadcast.
    pub fn subscribe(&mut self) -> (ListenerKey, flume::Receiver<LightPassContext>) {
        let (tx, rx) = flume::unbounded();
        let key = self.listeners.insert(Listener::Channel(tx));
        (key, rx)
    }

    /// Unregisters a listener. Returns `false` when the key is unknown.
    pub fn remove(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    #[must_use]
    pub fn contains(&self, key: ListenerKey) -> bool {
        self.listeners.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `ctx` to every listener.
    pub fn broadcast(&mut self, ctx: &LightPassContext) {
        let mut disconnected = Vec::new();

        for (key, listener) in &mut self.listeners {
            match listener {
                Listener::Callback(callback) => callback.on_light_pass(ctx),
                Listener::Channel(tx) => {
                    if tx.send(*ctx).is_err() {
                        disconnected.push(key);
                    }
                }
            }
        }

        for key in disconnected {
            log::debug!("Light-pass channel {key:?} disconnected, unregistering");
            self.listeners.remove(key);
        }
    }
}
