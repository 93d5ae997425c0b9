//! Simple file system watcher for the two compared files
//!
//! Watches the directories holding the inputs and reports which of them
//! changed.

use anyhow::Context;
use log::{debug, info, trace, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Which input needs to be re-read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// The source (old) file
    Source,
    /// The changed (new) file
    Changed,
    /// Both files
    Both,
}

/// Watches the source and changed files for modifications
pub struct InputWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<Result<Event, notify::Error>>,
    source: PathBuf,
    changed: PathBuf,
}

impl InputWatcher {
    /// Create a new watcher for the two input files
    pub fn new(source: &Path, changed: &Path) -> anyhow::Result<Self> {
        let source = source
            .canonicalize()
            .with_context(|| format!("cannot watch {}", source.display()))?;
        let changed = changed
            .canonicalize()
            .with_context(|| format!("cannot watch {}", changed.display()))?;
        info!("Creating InputWatcher for: {:?} and {:?}", source, changed);

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(500)),
        )?;

        // Editors often replace files on save, so watch the parent directories
        let mut dirs: Vec<&Path> = Vec::new();
        for path in [&source, &changed] {
            if let Some(dir) = path.parent() {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        for dir in dirs {
            info!("Watching directory: {:?}", dir);
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        info!("InputWatcher initialized successfully");
        Ok(Self {
            _watcher: watcher,
            rx,
            source,
            changed,
        })
    }

    /// Check for pending changes and return which inputs need re-reading
    pub fn poll_changes(&self) -> Option<InputKind> {
        let mut result: Option<InputKind> = None;

        // Drain all pending events
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) => {
                    // Filter out Access events - we only care about actual changes
                    if matches!(event.kind, EventKind::Access(_)) {
                        trace!("Ignoring access event: {:?}", event);
                        continue;
                    }

                    trace!("Received fs event: {:?}", event);
                    let Some(kind) = classify_event(&self.source, &self.changed, &event) else {
                        continue;
                    };
                    debug!("Classified event as: {:?}", kind);
                    result = Some(merge_kinds(result, kind));
                }
                Err(e) => {
                    warn!("File watcher error: {:?}", e);
                }
            }
        }

        if let Some(ref kind) = result {
            info!("poll_changes returning: {:?}", kind);
        }

        result
    }
}

/// Classify a file system event by the input it touches, if any
fn classify_event(source: &Path, changed: &Path, event: &Event) -> Option<InputKind> {
    let mut result = None;
    for path in &event.paths {
        trace!("Classifying path: {}", path.display());
        let kind = if path == source && path == changed {
            InputKind::Both
        } else if path == source {
            InputKind::Source
        } else if path == changed {
            InputKind::Changed
        } else {
            continue;
        };
        result = Some(merge_kinds(result, kind));
    }
    result
}

/// Merge two input kinds, preferring Both if they differ
fn merge_kinds(current: Option<InputKind>, new: InputKind) -> InputKind {
    match current {
        None => new,
        Some(InputKind::Both) => InputKind::Both,
        Some(current_kind) if current_kind == new => current_kind,
        Some(_) => InputKind::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{ModifyKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn classifies_by_path() {
        let source = Path::new("/work/old.js");
        let changed = Path::new("/work/new.js");

        let modify = || EventKind::Modify(ModifyKind::Any);
        assert_eq!(
            classify_event(source, changed, &event(modify(), &["/work/old.js"])),
            Some(InputKind::Source)
        );
        assert_eq!(
            classify_event(source, changed, &event(modify(), &["/work/new.js", "/work/old.js"])),
            Some(InputKind::Both)
        );
        assert_eq!(
            classify_event(
                source,
                changed,
                &event(EventKind::Remove(RemoveKind::File), &["/work/other.js"])
            ),
            None
        );
    }

    #[test]
    fn merges_kinds() {
        assert_eq!(merge_kinds(None, InputKind::Changed), InputKind::Changed);
        assert_eq!(
            merge_kinds(Some(InputKind::Changed), InputKind::Changed),
            InputKind::Changed
        );
        assert_eq!(
            merge_kinds(Some(InputKind::Source), InputKind::Changed),
            InputKind::Both
        );
    }
}
