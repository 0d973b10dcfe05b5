use crate::display::surface::DisplaySurface;
use crate::foundation::abort::AbortHandle;
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::render::buffer::DisplayBuffer;
use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::thread::JoinHandle;

/// Number of texture slots alternated between uploads.
pub const BUFFER_SLOTS: usize = 2;

/// What the context owner did with one handed-off frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandoffReport {
    /// Slot the frame was uploaded into, or `None` when abort was observed first.
    pub buffer_index: Option<usize>,
}

impl HandoffReport {
    pub fn uploaded(&self) -> bool {
        self.buffer_index.is_some()
    }
}

struct UploadTask {
    buffer: DisplayBuffer,
    abort: AbortHandle,
    reply: mpsc::SyncSender<HandoffReport>,
}

/// Hands finished tiles to the thread that owns the graphics context.
///
/// Asynchronous handoffs are queued to a dedicated owner thread and the caller blocks until that
/// thread answers. Synchronous handoffs run inline because caller and owner are the same thread.
/// At most one handoff is pending per instance.
pub struct DisplaySyncHandoff {
    surface: Arc<dyn DisplaySurface>,
    slot: Arc<Mutex<usize>>,
    pending: Mutex<()>,
    tx: Option<mpsc::Sender<UploadTask>>,
    owner: Option<JoinHandle<()>>,
}

impl DisplaySyncHandoff {
    /// Start the context-owner thread for `surface`.
    pub fn spawn(surface: Arc<dyn DisplaySurface>) -> ViewerResult<Self> {
        let slot = Arc::new(Mutex::new(0usize));
        let (tx, rx) = mpsc::channel::<UploadTask>();

        let owner_surface = Arc::clone(&surface);
        let owner_slot = Arc::clone(&slot);
        let owner = std::thread::Builder::new()
            .name("mipview-display".to_owned())
            .spawn(move || {
                while let Ok(task) = rx.recv() {
                    let UploadTask {
                        buffer,
                        abort,
                        reply,
                    } = task;
                    let report = present(owner_surface.as_ref(), &owner_slot, &buffer, &abort);
                    // Release the frame before the caller wakes so it can reclaim the allocation.
                    drop(buffer);
                    let _ = reply.send(report);
                }
            })
            .map_err(|e| ViewerError::Other(anyhow::anyhow!("spawn display owner thread: {e}")))?;

        Ok(Self {
            surface,
            slot,
            pending: Mutex::new(()),
            tx: Some(tx),
            owner: Some(owner),
        })
    }

    /// Slot the next upload will use.
    pub fn buffer_index(&self) -> usize {
        *lock(&self.slot)
    }

    /// Upload `buffer`, refresh the pixel probe and request a redraw, blocking until done.
    pub fn handoff(
        &self,
        buffer: DisplayBuffer,
        abort: &AbortHandle,
        synchronous: bool,
    ) -> ViewerResult<HandoffReport> {
        let _pending = lock(&self.pending);
        if synchronous {
            return Ok(present(self.surface.as_ref(), &self.slot, &buffer, abort));
        }

        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ViewerError::Other(anyhow::anyhow!("display owner thread stopped")))?;
        let (reply, done) = mpsc::sync_channel(1);
        tx.send(UploadTask {
            buffer,
            abort: abort.clone(),
            reply,
        })
        .map_err(|_| ViewerError::Other(anyhow::anyhow!("display owner thread disconnected")))?;
        done.recv()
            .map_err(|_| ViewerError::Other(anyhow::anyhow!("display owner dropped the handoff")))
    }
}

impl Drop for DisplaySyncHandoff {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(owner) = self.owner.take() {
            let _ = owner.join();
        }
    }
}

fn present(
    surface: &dyn DisplaySurface,
    slot: &Mutex<usize>,
    buffer: &DisplayBuffer,
    abort: &AbortHandle,
) -> HandoffReport {
    let mut idx = lock(slot);
    let buffer_index = if abort.is_aborted() {
        None
    } else {
        let bytes = buffer.bytes();
        surface.upload_region(bytes, bytes.len(), buffer.texture(), *idx);
        let used = *idx;
        *idx = (*idx + 1) % BUFFER_SLOTS;
        Some(used)
    };
    surface.refresh_pixel_probe();
    surface.request_redraw();
    HandoffReport { buffer_index }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/display/handoff.rs"]
mod tests;
