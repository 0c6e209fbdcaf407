//! Tokio driver for a [`Cluster`].
//!
//! The cluster runs on a single task. Virtual time follows tokio time, so
//! a test with a paused clock moves the whole cluster forward by sleeping.
//! [`spawn_with_config`] starts the virtual clock at the Unix time.
//! Every engine call travels to the driving task as a command and runs
//! there, between events, never concurrently with event handling.
//!
//! ```rust
//! use confsync::{runtime, Cluster, DiscoveryConfig};
//! use confsync_core::{ConferenceMetadata, Name};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let (handle, driver) = runtime::spawn(Cluster::new(DiscoveryConfig::default()));
//! let alice = handle.add_peer().await?;
//! handle.start(alice).await?;
//! let local = Name::parse("/ndn/alice")?;
//! assert!(handle.publish_conference(alice, "weekly", local, ConferenceMetadata::default()).await?);
//! assert_eq!(handle.hosted(alice).await?.len(), 1);
//!
//! drop(handle);
//! let cluster = driver.await?;
//! assert_eq!(cluster.peer(alice)?.hosted_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use confsync_core::{ConferenceInfo, ConferenceMetadata, Millis, Name, NodeId};
use confsync_face::MemoryNetwork;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::cluster::Cluster;
use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::observer::ConferenceObserver;

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    AddPeer {
        observer: Option<Box<dyn ConferenceObserver + Send>>,
        reply: Reply<NodeId>,
    },
    Start {
        node: NodeId,
        reply: Reply<Result<()>>,
    },
    Publish {
        node: NodeId,
        name: String,
        prefix: Name,
        metadata: ConferenceMetadata,
        reply: Reply<Result<bool>>,
    },
    StopPublishing {
        node: NodeId,
        name: String,
        prefix: Name,
        reply: Reply<Result<bool>>,
    },
    Discovered {
        node: NodeId,
        reply: Reply<Result<BTreeMap<String, ConferenceInfo>>>,
    },
    Hosted {
        node: NodeId,
        reply: Reply<Result<BTreeMap<String, ConferenceInfo>>>,
    },
    Shutdown {
        node: NodeId,
        reply: Reply<Result<()>>,
    },
    Now {
        reply: Reply<Millis>,
    },
}

/// Cloneable handle to a cluster running on a tokio task.
///
/// The driver stops once every handle is dropped and returns the cluster
/// through its [`JoinHandle`].
#[derive(Clone)]
pub struct ClusterHandle {
    commands: mpsc::Sender<Command>,
}

/// Run `cluster` on a new tokio task.
pub fn spawn(cluster: Cluster) -> (ClusterHandle, JoinHandle<Cluster>) {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let driver = tokio::spawn(drive(cluster, receiver));
    (ClusterHandle { commands }, driver)
}

/// Run a fresh cluster on a new tokio task with its clock at the current
/// Unix time, so notification timestamps are milliseconds since the epoch.
pub fn spawn_with_config(config: DiscoveryConfig) -> (ClusterHandle, JoinHandle<Cluster>) {
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default();
    spawn(Cluster::with_network(MemoryNetwork::starting_at(epoch_ms), config))
}

/// Tracks how far tokio time has moved since the driver started.
struct Clock {
    origin: Instant,
    base: Millis,
}

impl Clock {
    fn now(&self) -> Millis {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base.saturating_add(elapsed)
    }

    fn instant_of(&self, at: Millis) -> Instant {
        self.origin + Duration::from_millis(at.saturating_sub(self.base))
    }
}

async fn drive(mut cluster: Cluster, mut commands: mpsc::Receiver<Command>) -> Cluster {
    let clock = Clock {
        origin: Instant::now(),
        base: cluster.now(),
    };

    loop {
        cluster.run_until(clock.now());

        let wake = cluster
            .next_deadline()
            .map(|at| clock.instant_of(at));
        let sleep = async {
            match wake {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    // Commands act at the current instant, not the last event's.
                    cluster.run_until(clock.now());
                    apply(&mut cluster, command);
                }
                None => break,
            },
            _ = sleep => {}
        }
    }

    debug!(now = cluster.now(), "cluster driver stopped");
    cluster
}

fn apply(cluster: &mut Cluster, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::AddPeer { observer, reply } => {
            let node = match observer {
                Some(observer) => cluster.add_peer_with_observer(observer),
                None => cluster.add_peer(),
            };
            let _ = reply.send(node);
        }
        Command::Start { node, reply } => {
            let _ = reply.send(cluster.start(node));
        }
        Command::Publish {
            node,
            name,
            prefix,
            metadata,
            reply,
        } => {
            let _ = reply.send(cluster.publish_conference(node, &name, &prefix, metadata));
        }
        Command::StopPublishing {
            node,
            name,
            prefix,
            reply,
        } => {
            let _ = reply.send(cluster.stop_publishing_conference(node, &name, &prefix));
        }
        Command::Discovered { node, reply } => {
            let _ = reply.send(cluster.discovered(node));
        }
        Command::Hosted { node, reply } => {
            let _ = reply.send(cluster.hosted(node));
        }
        Command::Shutdown { node, reply } => {
            let _ = reply.send(cluster.shutdown(node));
        }
        Command::Now { reply } => {
            let _ = reply.send(cluster.now());
        }
    }
}

impl ClusterHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> anyhow::Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| anyhow!("cluster driver is not running"))?;
        response.await.context("cluster driver dropped the request")
    }

    /// Add a peer that logs its notifications.
    pub async fn add_peer(&self) -> anyhow::Result<NodeId> {
        self.request(|reply| Command::AddPeer {
            observer: None,
            reply,
        })
        .await
    }

    /// Add a peer reporting to `observer`.
    pub async fn add_peer_with_observer(
        &self,
        observer: Box<dyn ConferenceObserver + Send>,
    ) -> anyhow::Result<NodeId> {
        self.request(|reply| Command::AddPeer {
            observer: Some(observer),
            reply,
        })
        .await
    }

    pub async fn start(&self, node: NodeId) -> anyhow::Result<()> {
        Ok(self.request(|reply| Command::Start { node, reply }).await??)
    }

    pub async fn publish_conference(
        &self,
        node: NodeId,
        name: impl Into<String>,
        prefix: Name,
        metadata: ConferenceMetadata,
    ) -> anyhow::Result<bool> {
        let name = name.into();
        Ok(self
            .request(|reply| Command::Publish {
                node,
                name,
                prefix,
                metadata,
                reply,
            })
            .await??)
    }

    pub async fn stop_publishing_conference(
        &self,
        node: NodeId,
        name: impl Into<String>,
        prefix: Name,
    ) -> anyhow::Result<bool> {
        let name = name.into();
        Ok(self
            .request(|reply| Command::StopPublishing {
                node,
                name,
                prefix,
                reply,
            })
            .await??)
    }

    pub async fn discovered(&self, node: NodeId) -> anyhow::Result<BTreeMap<String, ConferenceInfo>> {
        Ok(self.request(|reply| Command::Discovered { node, reply }).await??)
    }

    pub async fn hosted(&self, node: NodeId) -> anyhow::Result<BTreeMap<String, ConferenceInfo>> {
        Ok(self.request(|reply| Command::Hosted { node, reply }).await??)
    }

    pub async fn shutdown_peer(&self, node: NodeId) -> anyhow::Result<()> {
        Ok(self.request(|reply| Command::Shutdown { node, reply }).await??)
    }

    /// Current virtual time of the cluster.
    pub async fn now(&self) -> anyhow::Result<Millis> {
        self.request(|reply| Command::Now { reply }).await
    }
}
