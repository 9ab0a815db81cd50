// src/lifecycle.rs

//! The `release` and `dev` entry points.
//!
//! Every task node is built once here. The dev watch bindings hold clones of
//! the same [`Task`] handles that appear in the dev tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{Result, TransformError};
use crate::exec::TaskRunBackend;
use crate::server::{LiveReload, NoopLiveReload, PreviewServer, ServerOptions};
use crate::task::{self, parallel, recoverable, series, LeafOutput, Task};
use crate::transform::{
    batch_task, clean_task, streaming_task, Avif, CopyFiles, Markup, RasterOptimize, Scripts,
    SourceSet, Sprite, Styles, SvgMinify, Transform, Webp,
};
use crate::watch::{spawn_watcher, PostAction, WatchBinding};

const RASTER: &[&str] = &["**/*.{jpg,jpeg,png}"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Lossy raster optimization, fatal failures, no live reload.
    Release,
    /// Verbatim raster copies, recoverable styles, live reload.
    Dev,
}

/// The asset tasks that run in parallel after `clean`.
#[derive(Debug, Clone)]
pub struct Assets {
    pub copy: Task,
    /// `optimize-images` in release, `copy-images` in dev.
    pub images: Task,
    pub avif: Task,
    pub webp: Task,
    pub styles: Task,
    pub html: Task,
    pub scripts: Task,
    pub svg: Task,
    pub sprite: Task,
}

fn sources<S: AsRef<str>>(base: PathBuf, include: &[S]) -> Result<SourceSet> {
    Ok(SourceSet::new(base, include).map_err(anyhow::Error::from)?)
}

fn shared(transform: impl Transform + 'static) -> Arc<dyn Transform> {
    Arc::new(transform)
}

impl Assets {
    pub fn new(cfg: &ConfigFile, mode: Mode, live: Arc<dyn LiveReload>) -> Result<Self> {
        let src = cfg.source_dir();
        let out = cfg.output_dir().to_path_buf();
        let images = cfg.images();

        let copy = batch_task(
            "copy",
            sources(
                src.to_path_buf(),
                &["fonts/*.{woff2,woff}", "*.ico", "manifest.webmanifest"],
            )?,
            shared(CopyFiles::new("")),
            out.clone(),
        );

        let raster = sources(src.join("img"), RASTER)?;
        let images_task = match mode {
            Mode::Release => batch_task(
                "optimize-images",
                raster.clone(),
                shared(RasterOptimize::new("img", images.jpeg_quality)),
                out.clone(),
            ),
            Mode::Dev => batch_task(
                "copy-images",
                raster.clone(),
                shared(CopyFiles::new("img")),
                out.clone(),
            ),
        };
        let avif = batch_task(
            "avif",
            raster.clone(),
            shared(Avif::new("img", images.avif_quality, images.avif_speed)),
            out.clone(),
        );
        let webp = batch_task("webp", raster, shared(Webp::new("img")), out.clone());

        let style_sources = sources(src.join("sass"), &["style.scss"])?;
        let script_sources = sources(src.join("js"), &["*.js"])?;
        let (styles, scripts) = match mode {
            Mode::Release => (
                batch_task("styles", style_sources, shared(Styles::new("css")), out.clone()),
                batch_task("scripts", script_sources, shared(Scripts::new("js")), out.clone()),
            ),
            Mode::Dev => {
                let styles = streaming_task(
                    "styles",
                    style_sources,
                    shared(Styles::new("css")),
                    out.clone(),
                    Arc::clone(&live),
                );
                let scripts = streaming_task(
                    "scripts",
                    script_sources,
                    shared(Scripts::new("js")),
                    out.clone(),
                    Arc::clone(&live),
                );
                (recoverable(styles, Arc::clone(&live)), scripts)
            }
        };

        let html = batch_task(
            "html",
            sources(src.to_path_buf(), &["*.html"])?,
            shared(Markup::new("")),
            out.clone(),
        );

        let svg_sources = sources(src.join("img"), &["**/*.svg"])?
            .exclude(&["sprite-icons/**"])
            .map_err(anyhow::Error::from)?;
        let svg = batch_task("svg", svg_sources, shared(SvgMinify::new("img")), out.clone());

        let sprite = batch_task(
            "sprite",
            sources(src.join("img").join("sprite-icons"), &["**/*.svg"])?,
            shared(Sprite::new("img/sprite.svg")),
            out,
        );

        Ok(Self {
            copy,
            images: images_task,
            avif,
            webp,
            styles,
            html,
            scripts,
            svg,
            sprite,
        })
    }

    /// Listing order inside the parallel composite.
    pub fn all(&self) -> Vec<Task> {
        vec![
            self.copy.clone(),
            self.images.clone(),
            self.avif.clone(),
            self.webp.clone(),
            self.styles.clone(),
            self.html.clone(),
            self.scripts.clone(),
            self.svg.clone(),
            self.sprite.clone(),
        ]
    }
}

/// `series(clean, parallel(assets...))`
pub fn build_task(cfg: &ConfigFile, assets: &Assets) -> Result<Task> {
    let clean = clean_task(cfg.output_dir().to_path_buf());
    Ok(series([clean, parallel(assets.all())?.renamed("assets")])?.renamed("build"))
}

pub fn release_task(cfg: &ConfigFile) -> Result<Task> {
    let assets = Assets::new(cfg, Mode::Release, Arc::new(NoopLiveReload))?;
    build_task(cfg, &assets)
}

/// Source patterns that re-run a task in dev mode.
pub fn dev_bindings(assets: &Assets) -> Result<Vec<WatchBinding>> {
    Ok(vec![
        WatchBinding::new(["sass/**/*.scss"], assets.styles.clone())?,
        WatchBinding::new(["js/**/*.js"], assets.scripts.clone())?,
        WatchBinding::new(["*.html"], assets.html.clone())?.then(PostAction::Reload),
    ])
}

/// Leaf that runs the file watcher and the watch engine until `shutdown`
/// flips to true, then stops `server` if one is given.
pub fn watch_task(
    source: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    live: Arc<dyn LiveReload>,
    options: RuntimeOptions,
    use_hash: bool,
    shutdown: watch::Receiver<bool>,
    server: Option<Arc<PreviewServer>>,
) -> Task {
    Task::leaf("watch", move || {
        let source = source.clone();
        let bindings = Arc::clone(&bindings);
        let live = Arc::clone(&live);
        let mut shutdown = shutdown.clone();
        let server = server.clone();

        async move {
            let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
            let _watcher = spawn_watcher(source, Arc::clone(&bindings), rt_tx.clone(), use_hash)
                .map_err(|e| TransformError::Failed(format!("starting file watcher: {e:#}")))?;

            {
                let tx = rt_tx.clone();
                tokio::spawn(async move {
                    let signalled = shutdown.wait_for(|stop| *stop).await.is_ok();
                    if !signalled {
                        warn!("shutdown signal dropped; stopping watcher");
                    }
                    let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
                });
            }

            let core = CoreRuntime::new(bindings.len(), options);
            let backend = TaskRunBackend::new(Arc::clone(&bindings), live, rt_tx.clone());
            let result = Runtime::new(core, rt_rx, rt_tx, backend).run().await;

            if let Some(server) = server {
                server.shutdown().await;
            }
            result.map_err(|e| TransformError::Failed(e.to_string()))?;
            Ok(LeafOutput::Complete(Vec::new()))
        }
    })
}

/// Everything `dev` needs: the tree to run plus the pieces it shares.
#[derive(Debug)]
pub struct DevPlan {
    pub root: Task,
    pub server: Arc<PreviewServer>,
    pub bindings: Arc<Vec<WatchBinding>>,
}

/// `series(clean, parallel(assets...), series(serve, watch))`
pub fn dev_plan(cfg: &ConfigFile, shutdown: watch::Receiver<bool>) -> Result<DevPlan> {
    let server = Arc::new(PreviewServer::new(
        cfg.output_dir(),
        ServerOptions::from(cfg.server()),
    ));
    let live = server.live_reload();

    let assets = Assets::new(cfg, Mode::Dev, Arc::clone(&live))?;
    let bindings = Arc::new(dev_bindings(&assets)?);

    let serve = {
        let server = Arc::clone(&server);
        Task::leaf("serve", move || {
            let server = Arc::clone(&server);
            async move {
                server
                    .start()
                    .await
                    .map_err(|e| TransformError::Failed(e.to_string()))?;
                Ok(LeafOutput::Complete(Vec::new()))
            }
        })
    };

    let watch = watch_task(
        cfg.source_dir().to_path_buf(),
        Arc::clone(&bindings),
        live,
        RuntimeOptions {
            debounce: std::time::Duration::from_millis(cfg.watch().debounce_ms),
        },
        cfg.watch().use_hash,
        shutdown,
        Some(Arc::clone(&server)),
    );

    let root = series([
        build_task(cfg, &assets)?,
        series([serve, watch])?.renamed("serve-and-watch"),
    ])?
    .renamed("dev");

    Ok(DevPlan {
        root,
        server,
        bindings,
    })
}

/// Run the release lifecycle once.
pub async fn run_release(cfg: &ConfigFile) -> Result<()> {
    let root = release_task(cfg)?;
    let report = task::run(&root).await?;
    info!(
        elapsed_ms = report.elapsed.as_millis() as u64,
        files = report.outputs().len(),
        "release build finished"
    );
    Ok(())
}

/// Run the dev lifecycle until Ctrl-C.
pub async fn run_dev(cfg: &ConfigFile) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let plan = dev_plan(cfg, shutdown_rx)?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("interrupted; shutting down");
        let _ = shutdown_tx.send(true);
    });

    run_dev_plan(&plan).await
}

/// Run a prepared dev plan until its shutdown channel flips.
pub async fn run_dev_plan(plan: &DevPlan) -> Result<()> {
    task::run(&plan.root).await?;
    Ok(())
}

/// Dry-run description: the lifecycle tree plus, for dev, the bindings.
pub fn describe(cfg: &ConfigFile, mode: Mode) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "source: {}\noutput: {}\n\n",
        display(cfg.source_dir()),
        display(cfg.output_dir())
    ));

    match mode {
        Mode::Release => out.push_str(&release_task(cfg)?.render_tree()),
        Mode::Dev => {
            let (_tx, rx) = watch::channel(false);
            let plan = dev_plan(cfg, rx)?;
            out.push_str(&plan.root.render_tree());
            out.push_str(&format!(
                "\npreview: http://{}:{}\nwatch (debounce {} ms):\n",
                cfg.server().host,
                cfg.server().port,
                cfg.watch().debounce_ms
            ));
            for binding in plan.bindings.iter() {
                let post = match binding.post() {
                    Some(PostAction::Reload) => " then reload",
                    None => "",
                };
                out.push_str(&format!(
                    "  {} -> {}{post}\n",
                    binding.patterns().join(", "),
                    binding.task().name()
                ));
            }
        }
    }
    Ok(out)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
