//! Watch sessions
//!
//! A [`WatchSession`] runs one build immediately and another each time a
//! watched file changes. Filesystem events are debounced, and triggers that
//! pile up while a build is running are coalesced into a single rebuild.
//!
//! Results arrive on the session as [`BuildEvent`]s, failures included; a
//! failed rebuild never ends the session. Stopping (or dropping) the session
//! releases the file watcher and joins the worker thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

use crate::bundler::Bundler;
use crate::error::{Error, Result};
use crate::fragment::ComposedConfig;
use crate::phases::orchestrator::{build, BuildSummary};

/// How often the worker checks the stop flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of one build in a watch session
#[derive(Debug)]
pub struct BuildEvent {
    /// 0 for the initial build, then 1, 2, ... for rebuilds
    pub sequence: usize,
    pub result: Result<BuildSummary>,
}

impl BuildEvent {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A running watch session
pub struct WatchSession {
    events: Receiver<BuildEvent>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl WatchSession {
    /// Watch `paths` recursively and rebuild `config` on every change.
    ///
    /// Changes under any of the `ignore` directories (the bundle output, the
    /// cache) never trigger a rebuild.
    pub fn start(
        bundler: Arc<dyn Bundler>,
        config: ComposedConfig,
        paths: &[PathBuf],
        ignore: &[PathBuf],
        debounce: Duration,
    ) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::Watch {
                message: "no existing directories to watch".to_string(),
            });
        }

        let (trigger_tx, trigger_rx) = mpsc::channel::<Vec<PathBuf>>();
        let ignore = ignore.to_vec();
        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed: Vec<PathBuf> = events
                        .into_iter()
                        .map(|event| event.path)
                        .filter(|path| !ignore.iter().any(|dir| path.starts_with(dir)))
                        .collect();
                    if !changed.is_empty() && trigger_tx.send(changed).is_err() {
                        debug!("Watch session gone; dropping change notification");
                    }
                }
                Err(err) => warn!("Watch error: {:?}", err),
            }
        })?;

        for path in paths {
            debouncer.watcher().watch(path, RecursiveMode::Recursive)?;
            info!("Watching {}", path.display());
        }

        let mut session = Self::with_triggers(bundler, config, trigger_rx);
        session.debouncer = Some(debouncer);
        Ok(session)
    }

    /// Run a session driven by an arbitrary trigger channel.
    ///
    /// Each message is a batch of changed paths. The session ends when the
    /// sending side is dropped or [`WatchSession::stop`] is called.
    pub fn with_triggers(
        bundler: Arc<dyn Bundler>,
        config: ComposedConfig,
        triggers: Receiver<Vec<PathBuf>>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = thread::spawn(move || {
            run_loop(bundler.as_ref(), &config, &triggers, &event_tx, &worker_stop);
        });

        Self {
            events: event_rx,
            stop,
            worker: Some(worker),
            debouncer: None,
        }
    }

    /// Block until the next build finishes; `None` once the session ended.
    pub fn recv(&self) -> Option<BuildEvent> {
        self.events.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<BuildEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<BuildEvent> {
        self.events.try_recv().ok()
    }

    /// Blocking iterator over build results; ends with the session.
    pub fn iter(&self) -> impl Iterator<Item = BuildEvent> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    /// Deliver every build result to `handler` until the session ends.
    pub fn for_each<F>(self, handler: F)
    where
        F: FnMut(BuildEvent),
    {
        self.iter().for_each(handler);
    }

    /// Stop watching and wait for an in-flight build to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Dropping the debouncer closes the trigger channel.
        self.debouncer.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Watch worker panicked");
            }
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(
    bundler: &dyn Bundler,
    config: &ComposedConfig,
    triggers: &Receiver<Vec<PathBuf>>,
    events: &Sender<BuildEvent>,
    stop: &AtomicBool,
) {
    let mut sequence = 0;
    let emit = |sequence: usize, result: Result<BuildSummary>| {
        events.send(BuildEvent { sequence, result }).is_ok()
    };

    if !emit(sequence, build(bundler, config)) {
        return;
    }

    while !stop.load(Ordering::SeqCst) {
        match triggers.recv_timeout(POLL_INTERVAL) {
            Ok(mut changed) => {
                while let Ok(more) = triggers.try_recv() {
                    changed.extend(more);
                }
                changed.sort();
                changed.dedup();
                for path in &changed {
                    info!("Invalidated: {}", path.display());
                }

                sequence += 1;
                if !emit(sequence, build(bundler, config)) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Watch session ended after {} rebuild(s)", sequence);
}
