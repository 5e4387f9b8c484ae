use {
    anyhow::Result,
    playbook_registry::{FsRegistryLoader, RegistryLoader, watcher::RegistryWatcher},
    tracing::{error, info},
};

/// Load once, then reload on every debounced change until Ctrl-C.
pub async fn watch(loader: &FsRegistryLoader) -> Result<()> {
    reload(loader).await;

    let (_watcher, mut rx) = RegistryWatcher::start(loader.roots())?;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(_) => reload(loader).await,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("stopping watcher");
                break;
            },
        }
    }
    Ok(())
}

async fn reload(loader: &FsRegistryLoader) {
    match loader.load().await {
        Ok(report) => {
            for d in &report.diagnostics {
                info!(severity = %d.severity, path = %d.path.display(), "{}", d.message);
            }
            info!(
                collections = report.registry.len(),
                documents = report.registry.document_count(),
                "registry reloaded"
            );
        },
        Err(e) => error!(%e, "registry reload failed"),
    }
}
