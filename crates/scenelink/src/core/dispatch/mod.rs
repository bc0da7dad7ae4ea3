//! Scene-Thread Marshaling
//!
//! The host scene graph is affine to one thread, so every scene-touching
//! operation runs on a single serialized execution context. `SceneHandle`
//! posts a closure from any thread and blocks until the scene side has
//! executed it — strictly request/response, never fire-and-forget.
//!
//! Shutdown is asynchronous: `shutdown()` enqueues a drain marker and
//! returns immediately. The pump finishes every request queued before the
//! marker, runs the stop hook, and only then goes away; requests posted
//! after the pump has stopped fail with `Disconnected`.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use tokio::sync::oneshot;

use crate::core::{BridgeError, BridgeResult};

type Task<C> = Box<dyn FnOnce(&mut C) + Send>;

enum Message<C> {
    Invoke(Task<C>),
    Shutdown,
}

/// Builds a marshaling pair around `core`, which moves to the scene side
pub fn channel<C>(core: C, capacity: usize) -> (SceneHandle<C>, ScenePump<C>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        SceneHandle { tx },
        ScenePump {
            rx,
            core,
            on_stopped: None,
        },
    )
}

// =============================================================================
// Handle
// =============================================================================

/// Clonable, thread-safe entry point posting operations to the scene thread
pub struct SceneHandle<C> {
    tx: SyncSender<Message<C>>,
}

impl<C> Clone for SceneHandle<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C> SceneHandle<C> {
    /// Runs `op` on the scene thread, blocking until it completes
    pub fn call<R, F>(&self, op: F) -> BridgeResult<R>
    where
        F: FnOnce(&mut C) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task: Task<C> = Box::new(move |core| {
            let _ = reply_tx.send(op(core));
        });
        self.tx
            .send(Message::Invoke(task))
            .map_err(|_| BridgeError::Disconnected)?;
        reply_rx.blocking_recv().map_err(|_| BridgeError::Disconnected)
    }

    /// Requests shutdown and returns immediately. Requests already queued
    /// still drain before the pump stops.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

// =============================================================================
// Pump
// =============================================================================

/// Scene-side executor; drive it from the thread that owns the host scene
pub struct ScenePump<C> {
    rx: Receiver<Message<C>>,
    core: C,
    on_stopped: Option<Task<C>>,
}

impl<C> ScenePump<C> {
    /// Installs a hook that runs once the pump stops, before handles start
    /// failing with `Disconnected`
    pub fn with_stop_hook(mut self, hook: impl FnOnce(&mut C) + Send + 'static) -> Self {
        self.on_stopped = Some(Box::new(hook));
        self
    }

    /// Runs until shutdown is requested or every handle has gone away,
    /// then runs the stop hook and returns the core
    pub fn run(mut self) -> C {
        while let Ok(message) = self.rx.recv() {
            match message {
                Message::Invoke(task) => task(&mut self.core),
                Message::Shutdown => break,
            }
        }
        self.finish()
    }

    /// Processes queued requests without blocking, for integration into a
    /// host idle callback. Returns `false` once shutdown has been
    /// requested; the host then calls [`ScenePump::finish`].
    pub fn process_pending(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(Message::Invoke(task)) => task(&mut self.core),
                Ok(Message::Shutdown) => return false,
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Runs the stop hook and releases the core
    pub fn finish(mut self) -> C {
        if let Some(hook) = self.on_stopped.take() {
            hook(&mut self.core);
        }
        self.core
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_calls_block_until_executed() {
        let (handle, pump) = channel(Vec::<String>::new(), 8);
        let worker = thread::spawn(move || pump.run());

        handle
            .call(|log: &mut Vec<String>| log.push("first".to_string()))
            .unwrap();
        let len = handle.call(|log: &mut Vec<String>| log.len()).unwrap();
        assert_eq!(len, 1);

        handle.shutdown();
        let log = worker.join().unwrap();
        assert_eq!(log, vec!["first"]);
    }

    #[test]
    fn test_requests_run_in_post_order() {
        let (handle, pump) = channel(Vec::<u32>::new(), 8);
        let worker = thread::spawn(move || pump.run());

        for i in 0..10 {
            handle.call(move |log: &mut Vec<u32>| log.push(i)).unwrap();
        }

        handle.shutdown();
        let log = worker.join().unwrap();
        assert_eq!(log, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_calls_after_shutdown_disconnect() {
        let (handle, pump) = channel(0u32, 8);
        let worker = thread::spawn(move || pump.run());

        handle.shutdown();
        worker.join().unwrap();

        let result = handle.call(|count: &mut u32| *count += 1);
        assert!(matches!(result, Err(BridgeError::Disconnected)));
    }

    #[test]
    fn test_stop_hook_runs_on_drain() {
        let (handle, pump) = channel(Vec::<String>::new(), 8);
        let pump = pump.with_stop_hook(|log: &mut Vec<String>| log.push("stopped".to_string()));
        let worker = thread::spawn(move || pump.run());

        handle
            .call(|log: &mut Vec<String>| log.push("work".to_string()))
            .unwrap();
        handle.shutdown();

        let log = worker.join().unwrap();
        assert_eq!(log, vec!["work", "stopped"]);
    }

    #[test]
    fn test_process_pending_for_idle_integration() {
        let (handle, mut pump) = channel(Vec::<u32>::new(), 8);

        let poster = thread::spawn(move || {
            let result = handle.call(move |log: &mut Vec<u32>| {
                log.push(7);
                log.len()
            });
            handle.shutdown();
            result
        });

        // Simulate the host idle loop until shutdown is observed
        while pump.process_pending() {
            thread::yield_now();
        }
        let log = pump.finish();

        assert_eq!(poster.join().unwrap().unwrap(), 1);
        assert_eq!(log, vec![7]);
    }
}
