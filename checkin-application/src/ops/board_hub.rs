use checkin_domain::{AttendeeView, Notice, ScanMode};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

const CHANNEL_BUFFER: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub mode: ScanMode,
    pub view: Option<AttendeeView>,
    pub scanning: bool,
    pub input_enabled: bool,
    pub notices: Vec<Notice>,
    pub updated_at: i64,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            mode: ScanMode::default(),
            view: None,
            scanning: false,
            input_enabled: true,
            notices: Vec::new(),
            updated_at: 0,
        }
    }
}

/// Render adapter: keeps the latest snapshot and fans every change out to
/// subscribed front-ends.
pub struct ScanBoard {
    snapshot: RwLock<BoardSnapshot>,
    tx: broadcast::Sender<BoardSnapshot>,
}

impl Default for ScanBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanBoard {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_BUFFER);
        Self {
            snapshot: RwLock::new(BoardSnapshot::default()),
            tx,
        }
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.snapshot.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardSnapshot> {
        self.tx.subscribe()
    }

    pub async fn update<F>(&self, apply: F) -> BoardSnapshot
    where
        F: FnOnce(&mut BoardSnapshot),
    {
        let published = {
            let mut snapshot = self.snapshot.write().await;
            apply(&mut snapshot);
            snapshot.updated_at = chrono::Utc::now().timestamp_millis();
            snapshot.clone()
        };
        let _ = self.tx.send(published.clone());
        published
    }
}
