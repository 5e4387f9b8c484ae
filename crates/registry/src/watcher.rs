//! Filesystem watcher for registry roots.
//!
//! Watches roots for document and manifest create/modify/delete events and
//! sends notifications through a channel so the host can rescan.

use std::{path::PathBuf, time::Duration};

use {
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
        notify::{EventKind, RecommendedWatcher, RecursiveMode},
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::error::{Error, Result};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Events emitted by the registry watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryWatchEvent {
    /// A document or manifest was created, modified, or deleted.
    Changed,
}

/// Watches registry roots for changes with debouncing.
pub struct RegistryWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

/// Only markdown documents and JSON manifests affect the registry.
fn is_relevant(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("json")
    )
}

impl RegistryWatcher {
    /// Start watching the given roots. Returns the watcher and a receiver for events.
    ///
    /// The watcher must be kept alive (not dropped) for events to continue.
    pub fn start(
        roots: &[PathBuf],
    ) -> Result<(Self, mpsc::UnboundedReceiver<RegistryWatchEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed = events.iter().any(|event| {
                        matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) && event.paths.iter().any(|p| {
                            let relevant = is_relevant(p);
                            if relevant {
                                debug!(path = %p.display(), "registry watcher event");
                            }
                            relevant
                        })
                    });
                    if changed {
                        let _ = tx.send(RegistryWatchEvent::Changed);
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "registry watcher error");
                    }
                },
            }
        })
        .map_err(|e| Error::message(format!("failed to start watcher: {e}")))?;

        for root in roots {
            if root.exists() {
                debouncer
                    .watch(root, RecursiveMode::Recursive)
                    .map_err(|e| {
                        Error::message(format!("failed to watch {}: {e}", root.display()))
                    })?;
                info!(root = %root.display(), "registry watcher: watching directory");
            }
        }

        Ok((
            Self {
                _debouncer: debouncer,
            },
            rx,
        ))
    }
}
