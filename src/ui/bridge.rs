// EventLoopBridge - Coordinates between background threads and the Slint event loop
//
// Slint's event loop is single-threaded; serial lines arrive on the reader
// thread and file exports run on tokio. The bridge provides:
// - Ordered, lossless UI updates from any thread via upgrade_in_event_loop
// - Spawning async tasks from Slint callbacks

use slint::ComponentHandle;
use std::future::Future;
use tokio::sync::mpsc;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Coordinates between background threads and the Slint event loop
///
/// Updates go through an unbounded channel to a forwarding thread that
/// queues each one on the event loop, so they run in submission order and
/// none is dropped while the window is alive.
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone());
/// let handle = bridge.clone_handle();
///
/// std::thread::spawn(move || {
///     handle.update_ui(|ui| ui.set_is_connected(false));
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    handle: EventLoopBridgeHandle<T>,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create a new EventLoopBridge
    ///
    /// Starts the forwarding thread. It exits when every handle is dropped
    /// or the event loop stops accepting work.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let forward_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::unbounded_channel::<UiUpdate<T>>();

        std::thread::Builder::new()
            .name("ui-bridge".to_string())
            .spawn(move || {
                tracing::debug!("EventLoopBridge handler thread started");

                while let Some(update_fn) = ui_update_rx.blocking_recv() {
                    let result = forward_weak.upgrade_in_event_loop(move |ui| {
                        update_fn(&ui);
                    });

                    if let Err(e) = result {
                        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                        break;
                    }
                }

                tracing::debug!("EventLoopBridge handler thread terminated");
            })
            .map_err(|e| tracing::error!("Failed to start UI bridge thread: {}", e))
            .ok();

        Self {
            handle: EventLoopBridgeHandle {
                tokio_handle,
                ui_update_tx,
            },
        }
    }

    /// Cloneable handle for capture in callbacks and worker threads
    pub fn clone_handle(&self) -> EventLoopBridgeHandle<T> {
        self.handle.clone()
    }
}

/// Lightweight handle that can be cloned and passed to callbacks
pub struct EventLoopBridgeHandle<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::UnboundedSender<UiUpdate<T>>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridgeHandle<T> {
    /// Schedule a UI update from any thread
    ///
    /// The closure runs on the Slint event loop with the upgraded component.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        if self.ui_update_tx.send(Box::new(update)).is_err() {
            tracing::warn!("Failed to send UI update - handler thread has stopped");
        }
    }

    /// Spawn an async task on the tokio runtime
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }
}
