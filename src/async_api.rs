use crate::catalog::{CatalogEntry, CatalogFilter};
use crate::model::{CompletionPolicy, Grid};
use crate::store::{new_store, DesignRecord, DesignStore, StoredDesign};
use crate::{Error, GridConfig, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Create(String, String, Grid, oneshot::Sender<Result<StoredDesign>>),
    Load(String, oneshot::Sender<Result<StoredDesign>>),
    Save {
        id: String,
        grid: Grid,
        editor: String,
        expected_version: Option<String>,
        resp: oneshot::Sender<Result<String>>,
    },
    List(oneshot::Sender<Result<Vec<DesignRecord>>>),
    Catalog(CompletionPolicy, CatalogFilter, oneshot::Sender<Result<Vec<CatalogEntry>>>),
    Close(String, u64, oneshot::Sender<Result<()>>),

    Shutdown(oneshot::Sender<Result<()>>),
}

/// An async-friendly design service backed by a dedicated worker thread.
///
/// The worker owns the `DesignStore`, so saves for every design are applied
/// one at a time in arrival order; concurrent writers are told apart by the
/// version check, not by locks.
#[derive(Clone)]
pub struct DesignService {
    cmd_tx: Sender<Command>,
}

impl DesignService {
    /// Build the store described by `config` on a new worker thread.
    pub async fn new(config: Option<GridConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Build the store on the worker thread
            let store = match new_store(&config) {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));
            run_worker(store, cmd_rx);
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Serve an already-built store.
    pub fn with_store(store: Box<dyn DesignStore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        thread::spawn(move || run_worker(store, cmd_rx));
        Self { cmd_tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::ServiceClosed)?;
        rx.await.map_err(|_| Error::ServiceClosed)?
    }

    pub async fn create(&self, id: &str, name: &str, grid: Grid) -> Result<StoredDesign> {
        let (id, name) = (id.to_string(), name.to_string());
        self.request(|tx| Command::Create(id, name, grid, tx)).await
    }

    pub async fn load(&self, id: &str) -> Result<StoredDesign> {
        let id = id.to_string();
        self.request(|tx| Command::Load(id, tx)).await
    }

    pub async fn save(
        &self,
        id: &str,
        grid: Grid,
        editor: &str,
        expected_version: Option<&str>,
    ) -> Result<String> {
        let id = id.to_string();
        let editor = editor.to_string();
        let expected_version = expected_version.map(|s| s.to_string());
        self.request(|resp| Command::Save {
            id,
            grid,
            editor,
            expected_version,
            resp,
        })
        .await
    }

    pub async fn list(&self) -> Result<Vec<DesignRecord>> {
        self.request(Command::List).await
    }

    pub async fn catalog(
        &self,
        policy: CompletionPolicy,
        filter: CatalogFilter,
    ) -> Result<Vec<CatalogEntry>> {
        self.request(|tx| Command::Catalog(policy, filter, tx)).await
    }

    pub async fn close_design(&self, id: &str, at: u64) -> Result<()> {
        let id = id.to_string();
        self.request(|tx| Command::Close(id, at, tx)).await
    }

    /// Stop the worker; later calls on any clone fail with `ServiceClosed`.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }
}

fn run_worker(mut store: Box<dyn DesignStore>, cmd_rx: mpsc::Receiver<Command>) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            Command::Create(id, name, grid, resp) => {
                let _ = resp.send(store.create(&id, &name, grid));
            }
            Command::Load(id, resp) => {
                let _ = resp.send(store.load(&id));
            }
            Command::Save {
                id,
                grid,
                editor,
                expected_version,
                resp,
            } => {
                let res = store.save(&id, grid, &editor, expected_version.as_deref());
                let _ = resp.send(res);
            }
            Command::List(resp) => {
                let _ = resp.send(store.list());
            }
            Command::Catalog(policy, filter, resp) => {
                let _ = resp.send(store.catalog(&policy, &filter));
            }
            Command::Close(id, at, resp) => {
                let _ = resp.send(store.close(&id, at));
            }
            Command::Shutdown(resp) => {
                let _ = resp.send(Ok(()));
                break;
            }
        }
    }
}
