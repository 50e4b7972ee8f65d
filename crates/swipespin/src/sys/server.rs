use crate::embed::ResizeMessage;
use crate::events::AppEvent;
use async_channel::Sender;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use strum::{Display as StrumDisplay, EnumString};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::broadcast;

pub const SOCKET_PATH: &str = "/tmp/swipespin.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Command {
    Show,
    Hide,
    Reload,
    Follow,
}

/// Content heights reported by the host, fanned out to `follow` clients.
#[derive(Debug, Clone)]
pub struct HeightFeed {
    tx: broadcast::Sender<ResizeMessage>,
    last: Arc<Mutex<Option<ResizeMessage>>>,
}

impl Default for HeightFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            last: Arc::new(Mutex::new(None)),
        }
    }
}

impl HeightFeed {
    pub fn publish(&self, msg: ResizeMessage) {
        let mut last = self.last.lock();
        *last = Some(msg.clone());
        // No subscribers is fine.
        let _ = self.tx.send(msg);
    }

    pub fn last(&self) -> Option<ResizeMessage> {
        self.last.lock().clone()
    }

    /// Last known height plus every later one, with nothing lost in between.
    pub fn subscribe(&self) -> (Option<ResizeMessage>, broadcast::Receiver<ResizeMessage>) {
        let last = self.last.lock();
        (last.clone(), self.tx.subscribe())
    }
}

pub async fn run_server(tx: Sender<AppEvent>, feed: HeightFeed) {
    run_server_at(Path::new(SOCKET_PATH), tx, feed).await;
}

pub async fn run_server_at(path: &Path, tx: Sender<AppEvent>, feed: HeightFeed) {
    // Stale socket from a previous run
    if fs_err::metadata(path).is_ok() {
        let _ = fs_err::remove_file(path);
    }

    let listener = match UnixListener::bind(path) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket {}: {}", path.display(), e);
            return;
        }
    };
    log::info!("Listening on {}", path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                let feed = feed.clone();
                tokio::spawn(async move {
                    let (read, write) = stream.into_split();
                    let mut lines = BufReader::new(read).lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        let command = match line.trim().parse::<Command>() {
                            Ok(c) => c,
                            Err(_) => {
                                log::warn!("Unknown command: {:?}", line.trim());
                                continue;
                            }
                        };
                        log::debug!("Socket command: {}", command);

                        let event = match command {
                            Command::Show => AppEvent::Show,
                            Command::Hide => AppEvent::Hide,
                            Command::Reload => AppEvent::ConfigReload,
                            Command::Follow => {
                                follow(write, &feed).await;
                                return;
                            }
                        };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn write_message(write: &mut OwnedWriteHalf, msg: &ResizeMessage) -> bool {
    let line = match msg.to_json() {
        Ok(json) => json + "\n",
        Err(e) => {
            log::error!("Failed to encode height message: {}", e);
            return true;
        }
    };
    write.write_all(line.as_bytes()).await.is_ok()
}

async fn follow(mut write: OwnedWriteHalf, feed: &HeightFeed) {
    let (last, mut rx) = feed.subscribe();
    if let Some(msg) = last
        && !write_message(&mut write, &msg).await
    {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if !write_message(&mut write, &msg).await {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Follower lagged, skipped {} height reports", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
