// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{ChangeKind, WatchEvent};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and forwards
/// every create/modify/remove as a [`WatchEvent::Changed`] on `runtime_tx`.
///
/// Filtering and routing happen in the coordinator; this only translates
/// notify's event model.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("cielo: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("cielo: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for change in translate(&event, |p| p.exists()) {
                if let Err(err) = runtime_tx.send(change).await {
                    warn!("failed to send WatchEvent::Changed: {err}");
                    // The runtime is gone; nothing left to feed.
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Map one notify event to zero or more [`WatchEvent::Changed`].
///
/// Renames become a removal of the old name and a creation of the new one.
/// When a backend can't say which side of a rename a path is on, `exists`
/// decides.
pub fn translate(event: &Event, exists: impl Fn(&Path) -> bool) -> Vec<WatchEvent> {
    let changed = |kind: ChangeKind, path: &PathBuf| WatchEvent::Changed {
        kind,
        path: path.clone(),
    };
    let by_existence = |path: &PathBuf| {
        let kind = if exists(path) {
            ChangeKind::Created
        } else {
            ChangeKind::Removed
        };
        changed(kind, path)
    };

    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| changed(ChangeKind::Created, p))
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .map(|p| changed(ChangeKind::Removed, p))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .map(|p| changed(ChangeKind::Removed, p))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .map(|p| changed(ChangeKind::Created, p))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            changed(ChangeKind::Removed, &event.paths[0]),
            changed(ChangeKind::Created, &event.paths[1]),
        ],
        EventKind::Modify(ModifyKind::Name(_)) => event.paths.iter().map(by_existence).collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| changed(ChangeKind::Modified, p))
            .collect(),
        EventKind::Any | EventKind::Other => event.paths.iter().map(by_existence).collect(),
        EventKind::Access(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    fn ev(kind: EventKind, paths: &[&str]) -> Event {
        let mut e = Event::new(kind);
        for p in paths {
            e = e.add_path(PathBuf::from(p));
        }
        e
    }

    fn ch(kind: ChangeKind, p: &str) -> WatchEvent {
        WatchEvent::Changed {
            kind,
            path: PathBuf::from(p),
        }
    }

    #[test]
    fn basic_kinds() {
        let never = |_: &Path| false;
        assert_eq!(
            translate(&ev(EventKind::Create(CreateKind::File), &["/p/a.cielo"]), never),
            vec![ch(ChangeKind::Created, "/p/a.cielo")]
        );
        assert_eq!(
            translate(
                &ev(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/p/a.cielo"]),
                never
            ),
            vec![ch(ChangeKind::Modified, "/p/a.cielo")]
        );
        assert_eq!(
            translate(&ev(EventKind::Remove(RemoveKind::File), &["/p/a.cielo"]), never),
            vec![ch(ChangeKind::Removed, "/p/a.cielo")]
        );
        assert!(translate(&ev(EventKind::Access(AccessKind::Any), &["/p/a.cielo"]), never).is_empty());
    }

    #[test]
    fn renames_split_into_remove_and_create() {
        let event = ev(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/p/old_name.starbucks", "/p/new.starbucks"],
        );
        assert_eq!(
            translate(&event, |_| true),
            vec![
                ch(ChangeKind::Removed, "/p/old_name.starbucks"),
                ch(ChangeKind::Created, "/p/new.starbucks"),
            ]
        );
    }

    #[test]
    fn ambiguous_rename_uses_existence() {
        let event = ev(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), &["/p/x.taml"]);
        assert_eq!(translate(&event, |_| false), vec![ch(ChangeKind::Removed, "/p/x.taml")]);
        assert_eq!(translate(&event, |_| true), vec![ch(ChangeKind::Created, "/p/x.taml")]);
    }
}
