//! Per-host context handle replacing a process-wide engine singleton.

use crate::engine::StyleEngine;
use crate::events::{EngineEvent, ExceptionKind};
use crate::fonts::FontIdCache;
use core::fmt;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::mem;
use std::sync::Arc;

type AttachedFn = Box<dyn FnOnce(&Arc<StyleEngine>) + Send + 'static>;

/// [`EngineHost::attach`] was called while an engine is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachError {
    AlreadyAttached,
}

impl fmt::Display for AttachError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAttached => formatter.write_str("a style engine is already attached"),
        }
    }
}

impl std::error::Error for AttachError {}

/// Holds at most one attached engine and the callbacks waiting for it.
///
/// Callbacks registered with [`EngineHost::on_attached`] run exactly once:
/// immediately if an engine is attached, otherwise on the next attach.
pub struct EngineHost {
    engine: RwLock<Option<Arc<StyleEngine>>>,
    pending: Mutex<Vec<AttachedFn>>,
    font_ids: Arc<FontIdCache>,
}

impl Default for EngineHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHost {
    pub fn new() -> Self {
        Self {
            engine: RwLock::new(None),
            pending: Mutex::new(Vec::new()),
            font_ids: Arc::new(FontIdCache::new()),
        }
    }

    /// Font ids shared by every engine attached to this host. Pass it to
    /// [`crate::EngineServices::with_font_registry`].
    pub fn font_ids(&self) -> Arc<FontIdCache> {
        Arc::clone(&self.font_ids)
    }

    /// # Errors
    /// [`AttachError::AlreadyAttached`] if another engine is attached; the
    /// rejected engine also receives an `EngineAlreadyAttached` exception.
    pub fn attach(&self, engine: Arc<StyleEngine>) -> Result<(), AttachError> {
        {
            let mut slot = self.engine.write();
            if slot.is_some() {
                warn!("there is already a style engine attached, ignoring the new one");
                engine.events().publish(&EngineEvent::exception(
                    ExceptionKind::EngineAlreadyAttached,
                    "There is already a StyleEngine attached to this host.",
                ));
                return Err(AttachError::AlreadyAttached);
            }
            *slot = Some(Arc::clone(&engine));
        }
        let callbacks = mem::take(&mut *self.pending.lock());
        info!("style engine attached, running {} pending callbacks", callbacks.len());
        for callback in callbacks {
            callback(&engine);
        }
        Ok(())
    }

    /// Remove the attached engine, if any.
    pub fn detach(&self) -> Option<Arc<StyleEngine>> {
        let detached = self.engine.write().take();
        if detached.is_some() {
            debug!("style engine detached");
        }
        detached
    }

    pub fn engine(&self) -> Option<Arc<StyleEngine>> {
        self.engine.read().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.engine.read().is_some()
    }

    pub fn on_attached(&self, callback: impl FnOnce(&Arc<StyleEngine>) + Send + 'static) {
        // Checked under the pending lock; attach drains it after installing.
        let mut pending = self.pending.lock();
        match self.engine() {
            Some(engine) => {
                drop(pending);
                callback(&engine);
            }
            None => pending.push(Box::new(callback)),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl fmt::Debug for EngineHost {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EngineHost")
            .field("attached", &self.is_attached())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
