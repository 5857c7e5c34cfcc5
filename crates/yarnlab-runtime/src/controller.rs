//! The render lifecycle controller.
//!
//! ```text
//!   Idle ──request──→ Loading ──all loaded──→ ReadyToRender ──→ Rendered
//!                      │  ↑                                        │
//!                      │  └──────────── request ── Stale ←─────────┘ invalidate
//!                      └──load error──→ Failed
//!   any ──teardown──→ Inert
//! ```
//!
//! Each request owns a [`CancellationToken`]. A new request, `invalidate`, or
//! `teardown` cancels the previous token; every continuation of that request
//! checks its token under the state lock before touching shared state, so a
//! superseded request can neither change the state nor reach the callback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use image::DynamicImage;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use yarnlab_core::{
    BitmapRef, BitmapRole, ColorDefinition, GrayMask, PixelBuffer, ProcessingConfig, RenderInputs,
    RenderResult, render_annotated,
};

use crate::cancel::CancellationToken;
use crate::error::ControllerError;
use crate::loader::BitmapLoader;

/// Invoked once per published render.
pub type CompletionCallback = Arc<dyn Fn(&RenderResult) + Send + Sync>;

/// Why a request stopped short of a result. Not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    /// A bitmap could not be fetched or decoded.
    Load {
        role: BitmapRole,
        reference: BitmapRef,
        message: String,
    },
    /// The bitmaps loaded but the pipeline rejected them.
    Pipeline { message: String },
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// No request yet.
    Idle,
    /// Waiting on bitmap loads.
    Loading { loaded: usize, requested: usize },
    /// Every bitmap loaded; the pipeline is running.
    ReadyToRender,
    /// A result for `color_id` is published.
    Rendered { color_id: u32 },
    /// The published result no longer matches the inputs.
    Stale,
    Failed(RenderFailure),
    /// Torn down; nothing further is published.
    Inert,
}

impl ControllerState {
    /// True once the current request can make no further progress.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Rendered { .. } | Self::Failed(_) | Self::Inert)
    }
}

struct Shared {
    state_tx: watch::Sender<ControllerState>,
    current: Option<CancellationToken>,
    result: Option<RenderResult>,
    inert: bool,
}

impl Shared {
    fn set_state(&self, state: ControllerState) {
        tracing::debug!(?state, "controller state");
        self.state_tx.send_replace(state);
    }

    /// Cancel the in-flight request, if any, and drop the published result.
    fn supersede(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        self.result = None;
    }
}

/// Runs `f` only while `token` is still the live request.
fn with_current<R>(shared: &Mutex<Shared>, token: &CancellationToken, f: impl FnOnce(&mut Shared) -> R) -> Option<R> {
    let mut guard = shared.lock();
    if token.is_cancelled() {
        return None;
    }
    Some(f(&mut guard))
}

/// Drives bitmap loading and rendering for one consumer.
///
/// The completion callback runs while the state lock is held, which is what
/// keeps a torn-down controller from publishing; it must not call back into
/// the controller.
pub struct RenderController<L: BitmapLoader> {
    loader: Arc<L>,
    shared: Arc<Mutex<Shared>>,
    on_complete: CompletionCallback,
    runtime: Handle,
}

impl<L: BitmapLoader> RenderController<L> {
    /// Create a controller on the current tokio runtime.
    pub fn new(
        loader: L,
        on_complete: impl Fn(&RenderResult) + Send + Sync + 'static,
    ) -> Result<Self, ControllerError> {
        let runtime = Handle::try_current()?;
        let (state_tx, _) = watch::channel(ControllerState::Idle);
        Ok(Self {
            loader: Arc::new(loader),
            shared: Arc::new(Mutex::new(Shared {
                state_tx,
                current: None,
                result: None,
                inert: false,
            })),
            on_complete: Arc::new(on_complete),
            runtime,
        })
    }

    /// Start a render for `color` under `config`, superseding any request
    /// still in flight.
    pub fn request(&self, color: ColorDefinition, config: ProcessingConfig) {
        let token = CancellationToken::new();
        let requested = config.requested_bitmaps().len();
        {
            let mut shared = self.shared.lock();
            if shared.inert {
                tracing::warn!(color_id = color.id, "request on torn-down controller ignored");
                return;
            }
            shared.supersede();
            shared.current = Some(token.clone());
            shared.set_state(ControllerState::Loading { loaded: 0, requested });
        }
        tracing::info!(color_id = color.id, requested, "render requested");

        let task = RequestTask {
            loader: Arc::clone(&self.loader),
            shared: Arc::clone(&self.shared),
            on_complete: Arc::clone(&self.on_complete),
            token,
            color,
            config,
        };
        self.runtime.spawn(task.run());
    }

    /// Mark the published result as out of date without issuing a request.
    pub fn invalidate(&self) {
        let mut shared = self.shared.lock();
        if shared.inert {
            return;
        }
        shared.supersede();
        shared.set_state(ControllerState::Stale);
    }

    /// Make the controller inert. Pending loads finish but publish nothing.
    pub fn teardown(&self) {
        let mut shared = self.shared.lock();
        if shared.inert {
            return;
        }
        shared.inert = true;
        shared.supersede();
        shared.set_state(ControllerState::Inert);
        tracing::info!("render controller torn down");
    }

    pub fn state(&self) -> ControllerState {
        self.shared.lock().state_tx.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.shared.lock().state_tx.subscribe()
    }

    /// True when a result for the latest inputs is available.
    pub fn is_ready(&self) -> bool {
        matches!(self.state(), ControllerState::Rendered { .. })
    }

    /// The published result for the latest inputs.
    pub fn result(&self) -> Option<RenderResult> {
        self.shared.lock().result.clone()
    }

    /// Save the published result as `yarn-color-<id>.png` in `dir`.
    pub async fn export(&self, dir: &Path) -> Result<PathBuf, ControllerError> {
        let result = self.result().ok_or(ControllerError::NoResult)?;
        let png = result.png_bytes()?;
        let path = dir.join(result.file_name());
        tokio::fs::write(&path, png)
            .await
            .map_err(|source| ControllerError::Export { path: path.clone(), source })?;
        tracing::info!(color_id = result.color_id, path = %path.display(), "render exported");
        Ok(path)
    }
}

impl<L: BitmapLoader> Drop for RenderController<L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Everything one request's background task owns.
struct RequestTask<L: BitmapLoader> {
    loader: Arc<L>,
    shared: Arc<Mutex<Shared>>,
    on_complete: CompletionCallback,
    token: CancellationToken,
    color: ColorDefinition,
    config: ProcessingConfig,
}

impl<L: BitmapLoader> RequestTask<L> {
    async fn run(self) {
        let Self {
            loader,
            shared,
            on_complete,
            token,
            color,
            config,
        } = self;
        let color_id = color.id;

        let requested = config.requested_bitmaps();
        let total = requested.len();
        let mut pending: FuturesUnordered<_> = requested
            .into_iter()
            .map(|(role, reference)| {
                let loader = Arc::clone(&loader);
                async move {
                    let outcome = loader.load(&reference).await;
                    (role, reference, outcome)
                }
            })
            .collect();

        let mut bitmaps = LoadedBitmaps::default();
        while let Some((role, reference, outcome)) = pending.next().await {
            let step = match outcome {
                Ok(image) => {
                    bitmaps.insert(role, image);
                    let loaded = bitmaps.count;
                    with_current(&shared, &token, |s| {
                        s.set_state(ControllerState::Loading { loaded, requested: total });
                    })
                }
                Err(err) => {
                    let message = err.to_string();
                    let failure = RenderFailure::Load {
                        role,
                        reference: reference.clone(),
                        message: message.clone(),
                    };
                    let failed = with_current(&shared, &token, |s| {
                        s.set_state(ControllerState::Failed(failure));
                    });
                    match failed {
                        Some(()) => {
                            tracing::warn!(color_id, %role, %reference, error = %message, "bitmap load failed");
                        }
                        None => {
                            tracing::debug!(color_id, %role, %reference, "load failure of superseded request ignored");
                        }
                    }
                    return;
                }
            };
            if step.is_none() {
                tracing::debug!(color_id, "request superseded while loading");
                return;
            }
        }

        if with_current(&shared, &token, |s| s.set_state(ControllerState::ReadyToRender)).is_none() {
            return;
        }

        let render_token = token.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            if render_token.is_cancelled() {
                return None;
            }
            let outcome = bitmaps
                .into_inputs()
                .map_err(|message| RenderFailure::Pipeline { message })
                .and_then(|inputs| {
                    render_annotated(&inputs, &color, &config)
                        .and_then(|buffer| RenderResult::encode(color.id, &buffer))
                        .map_err(|err| RenderFailure::Pipeline {
                            message: err.to_string(),
                        })
                });
            Some(outcome)
        })
        .await;

        let outcome = match rendered {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                tracing::debug!(color_id, "request superseded before render");
                return;
            }
            Err(err) => Err(RenderFailure::Pipeline {
                message: format!("render task failed: {err}"),
            }),
        };

        match outcome {
            Ok(result) => {
                let published = with_current(&shared, &token, |s| {
                    s.result = Some(result.clone());
                    s.set_state(ControllerState::Rendered { color_id });
                    on_complete(&result);
                });
                match published {
                    Some(()) => tracing::info!(color_id, "render published"),
                    None => tracing::debug!(color_id, "stale render discarded"),
                }
            }
            Err(failure) => {
                tracing::warn!(color_id, ?failure, "render failed");
                let _ = with_current(&shared, &token, |s| {
                    s.set_state(ControllerState::Failed(failure));
                });
            }
        }
    }
}

/// Decoded bitmaps collected as loads complete.
#[derive(Default)]
struct LoadedBitmaps {
    source: Option<DynamicImage>,
    mask: Option<DynamicImage>,
    cavity: Option<DynamicImage>,
    rim_light: Option<DynamicImage>,
    contact_shadow: Option<DynamicImage>,
    count: usize,
}

impl LoadedBitmaps {
    fn insert(&mut self, role: BitmapRole, image: DynamicImage) {
        let slot = match role {
            BitmapRole::Source => &mut self.source,
            BitmapRole::Mask => &mut self.mask,
            BitmapRole::Cavity => &mut self.cavity,
            BitmapRole::RimLight => &mut self.rim_light,
            BitmapRole::ContactShadow => &mut self.contact_shadow,
        };
        *slot = Some(image);
        self.count += 1;
    }

    fn into_inputs(self) -> Result<RenderInputs, String> {
        let source = self.source.ok_or("source bitmap missing")?;
        let mask = self.mask.ok_or("mask bitmap missing")?;
        let color_map = |image: Option<DynamicImage>| image.map(|i| PixelBuffer::from_image(&i));
        Ok(RenderInputs {
            source: PixelBuffer::from_image(&source),
            mask: GrayMask::from_image(&mask),
            cavity: color_map(self.cavity),
            rim_light: color_map(self.rim_light),
            contact_shadow: color_map(self.contact_shadow),
        })
    }
}
