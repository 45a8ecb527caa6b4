use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Watch error: {0}")]
    WatchError(String),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Directory watcher delivering events to async code
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: UnboundedReceiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> WatcherResult<Self> {
        if !path.is_dir() {
            return Err(WatcherError::WatchError(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let (tx, rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Wait for the next event; `None` once the watcher is gone
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await? {
                Ok(event) => return Some(event),
                Err(e) => tracing::warn!(error = %e, "file watch error"),
            }
        }
    }
}

/// Whether `event` wrote to the file named `name`
pub fn touches(event: &Event, name: &str) -> bool {
    let writes = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    writes
        && event
            .paths
            .iter()
            .any(|p| p.file_name().and_then(|n| n.to_str()) == Some(name))
}

/// Whether `event` touched anything inside `dir`
pub fn touches_dir(event: &Event, dir: &Path) -> bool {
    event.paths.iter().any(|p| p.parent() == Some(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_watcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut watcher = FileWatcher::new(temp_dir.path().to_path_buf()).unwrap();

        let path = temp_dir.path().join("template.json");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(path, "{}").unwrap();
        });

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.next_event())
            .await
            .unwrap();
        assert!(event.is_some());
    }

    #[test]
    fn test_missing_directory_rejected() {
        let result = FileWatcher::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(result, Err(WatcherError::WatchError(_))));
    }
}
