//! Scripted replays against the simulated page.
//!
//! A scenario is a document, preferences, canned relay answers and a list
//! of steps. The replay attaches a session to the simulated page, feeds it
//! the steps in order and reports what the engine did.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use hoverplay_config::{MemoryPreferenceStore, PreferenceLoader, PreferenceValidator, Preferences};
use hoverplay_core::sim::{DocumentSpec, SimPage, SimRuntime};
use hoverplay_core::{AttachRegistry, ContentSession, SessionParts};
use hoverplay_protocols::{
    EventDisposition, KeyEvent, MouseButton, NodeId, Page, PageEvent, PointerEvent,
    PreferenceMap, PreferenceStore, ScrollRequest,
};
use hoverplay_relay::{RelayClient, RelayScript, ScriptedRelay};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Pause after a preference write so the session's change pump catches up.
const PREFERENCE_SETTLE: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferences: PreferenceMap,
    #[serde(default)]
    pub relay: RelayScript,
    pub document: DocumentSpec,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("invalid scenario")
    }
}

/// A pointer gesture. Without a node it targets the overlay root.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PointerStep {
    #[serde(default)]
    pub node: Option<NodeId>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub button: MouseButton,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Step {
    /// Move the pointer onto a node: updates `:hover` and fires `mouseover`.
    Hover(PointerStep),
    Unhover,
    Move(PointerStep),
    Down(PointerStep),
    Up(PointerStep),
    Click(PointerStep),
    Key(KeyEvent),
    /// Media events on the current overlay surface.
    MediaLoaded,
    MediaCanPlay,
    MediaError,
    Volume(f64),
    /// Any raw page event.
    Event(PageEvent),
    /// Milliseconds to let timers and relay calls run.
    Wait(u64),
    /// Persist preferences as the options page would.
    SetPreferences(PreferenceMap),
    /// Orphan the content layer, as an extension reload does.
    KillRuntime,
    Detach,
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Hover(p) => format!("hover {}", target_label(p)),
            Step::Unhover => "unhover".to_string(),
            Step::Move(p) => format!("move {} ({}, {})", target_label(p), p.x, p.y),
            Step::Down(p) => format!("down {} ({}, {})", target_label(p), p.x, p.y),
            Step::Up(p) => format!("up {} ({}, {})", target_label(p), p.x, p.y),
            Step::Click(p) => format!("click {} ({}, {})", target_label(p), p.x, p.y),
            Step::Key(key) => format!("key {}", key.chord()),
            Step::MediaLoaded => "media loaded".to_string(),
            Step::MediaCanPlay => "media can play".to_string(),
            Step::MediaError => "media error".to_string(),
            Step::Volume(volume) => format!("volume {}", volume),
            Step::Event(event) => format!("event {:?}", event),
            Step::Wait(ms) => format!("wait {}ms", ms),
            Step::SetPreferences(values) => format!(
                "set {}",
                values.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            Step::KillRuntime => "kill runtime".to_string(),
            Step::Detach => "detach".to_string(),
        }
    }
}

fn target_label(step: &PointerStep) -> String {
    match step.node {
        Some(node) => node.to_string(),
        None => "overlay".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StepReport {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<EventDisposition>,
    pub phase: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverlayReport {
    pub phase: String,
    pub root: NodeId,
    pub surface: NodeId,
    pub surface_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplayReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub steps: Vec<StepReport>,
    pub state: String,
    pub overlay: Option<OverlayReport>,
    pub relay_calls: Vec<String>,
    pub history: Vec<String>,
    pub scroll_requests: Vec<ScrollRequest>,
    pub struck_links: Vec<NodeId>,
}

/// Everything a replay runs against.
struct Stage {
    page: Arc<SimPage>,
    relay: ScriptedRelay,
    store: Arc<MemoryPreferenceStore>,
    runtime: Arc<SimRuntime>,
    session: ContentSession,
}

impl Stage {
    async fn build(scenario: &Scenario, base: PreferenceMap) -> anyhow::Result<Self> {
        let page = Arc::new(SimPage::from_spec(&scenario.document)?);
        let relay = ScriptedRelay::new(scenario.relay.clone());

        let mut values = base;
        values.extend(scenario.preferences.clone());
        check_preferences(&values)?;
        let store = Arc::new(MemoryPreferenceStore::with_values(values));
        let runtime = Arc::new(SimRuntime::new("hoverplay-replay"));

        let parts = SessionParts {
            page: page.clone(),
            relay: RelayClient::new(Arc::new(relay.transport())),
            store: store.clone(),
            runtime: runtime.clone(),
        };
        // Each replay is its own frame; keep it out of the process registry.
        let session = ContentSession::attach_with_registry(parts, Arc::new(AttachRegistry::new()))
            .await
            .context("attach failed")?;

        Ok(Self {
            page,
            relay,
            store,
            runtime,
            session,
        })
    }

    fn target(&self, step: &PointerStep) -> anyhow::Result<NodeId> {
        let node = match step.node {
            Some(node) => node,
            None => self
                .session
                .overlay_root()
                .context("no overlay to point at")?,
        };
        if !self.page.contains(node) {
            bail!("{} is not in the document", node);
        }
        Ok(node)
    }

    fn pointer(&self, step: &PointerStep) -> anyhow::Result<PointerEvent> {
        let mut event = self.page.pointer_event(self.target(step)?, step.x, step.y);
        event.button = step.button;
        Ok(event)
    }

    fn surface(&self) -> anyhow::Result<NodeId> {
        self.session
            .overlay_surface()
            .map(|(surface, _)| surface)
            .context("no overlay surface")
    }

    async fn run_step(&self, step: &Step) -> anyhow::Result<Option<EventDisposition>> {
        let event = match step {
            Step::Hover(p) => {
                self.page.hover(self.target(p)?);
                PageEvent::PointerOver(self.pointer(p)?)
            }
            Step::Unhover => {
                self.page.unhover();
                return Ok(None);
            }
            Step::Move(p) => PageEvent::PointerMove(self.pointer(p)?),
            Step::Down(p) => PageEvent::PointerDown(self.pointer(p)?),
            Step::Up(p) => PageEvent::PointerUp(self.pointer(p)?),
            Step::Click(p) => PageEvent::Click(self.pointer(p)?),
            Step::Key(key) => PageEvent::KeyDown(key.clone()),
            Step::MediaLoaded => PageEvent::MediaLoaded {
                node: self.surface()?,
            },
            Step::MediaCanPlay => PageEvent::MediaCanPlay {
                node: self.surface()?,
            },
            Step::MediaError => PageEvent::MediaError {
                node: self.surface()?,
            },
            Step::Volume(volume) => PageEvent::VolumeChange {
                node: self.surface()?,
                volume: *volume,
            },
            Step::Event(event) => event.clone(),
            Step::Wait(ms) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                return Ok(None);
            }
            Step::SetPreferences(values) => {
                check_preferences(values)?;
                self.store.save(values.clone()).await?;
                tokio::time::sleep(PREFERENCE_SETTLE).await;
                return Ok(None);
            }
            Step::KillRuntime => {
                self.runtime.kill();
                return Ok(None);
            }
            Step::Detach => {
                self.session.detach();
                return Ok(None);
            }
        };
        Ok(Some(self.session.dispatch(event)))
    }

    fn report(&self, name: Option<String>, steps: Vec<StepReport>) -> ReplayReport {
        let overlay = self.session.overlay_surface().and_then(|(surface, kind)| {
            let root = self.session.overlay_root()?;
            let sources = self
                .page
                .children(surface)
                .into_iter()
                .filter_map(|child| self.page.attribute(child, "src"))
                .collect();
            Some(OverlayReport {
                phase: format!("{:?}", self.session.overlay_phase()),
                root,
                surface,
                surface_kind: format!("{:?}", kind),
                src: self.page.attribute(surface, "src"),
                sources,
            })
        });
        let struck_links = self
            .page
            .find_by_tag("a")
            .into_iter()
            .filter(|a| {
                self.page.style_property(*a, "text-decoration").as_deref() == Some("line-through")
            })
            .collect();

        ReplayReport {
            name,
            steps,
            state: format!("{:?}", self.session.state()),
            overlay,
            relay_calls: self
                .relay
                .calls()
                .iter()
                .map(|call| call.command().to_string())
                .collect(),
            history: self.relay.history(),
            scroll_requests: self.page.scroll_requests(),
            struck_links,
        }
    }
}

/// Reject preference values the engine would skip, and log the ones it
/// accepts but warns about.
fn check_preferences(values: &PreferenceMap) -> anyhow::Result<()> {
    let mut prefs = Preferences::default();
    let outcome = prefs.merge_values(values);
    if let Some(err) = outcome.rejected.into_iter().next() {
        return Err(err).context("invalid preference");
    }
    for warning in PreferenceValidator::check(&prefs)? {
        warn!("Preference {}: {}", warning.key, warning.message);
    }
    Ok(())
}

/// Load the base preferences a replay starts from.
pub(crate) fn load_base_preferences(content: Option<&str>) -> anyhow::Result<PreferenceMap> {
    match content {
        Some(content) => Ok(PreferenceLoader::parse_map(content)?),
        None => Ok(PreferenceMap::new()),
    }
}

/// Run every step of `scenario` and report the outcome.
pub(crate) async fn run(scenario: Scenario, base: PreferenceMap) -> anyhow::Result<ReplayReport> {
    let stage = Stage::build(&scenario, base).await?;
    info!(
        "Replaying {} ({} steps)",
        scenario.name.as_deref().unwrap_or("scenario"),
        scenario.steps.len()
    );

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let disposition = stage
            .run_step(step)
            .await
            .with_context(|| format!("step {} ({}) failed", index + 1, step.label()))?;
        let phase = format!("{:?}", stage.session.overlay_phase());
        debug!("Step {}: {} -> {}", index + 1, step.label(), phase);
        steps.push(StepReport {
            step: step.label(),
            disposition,
            phase,
        });
    }

    let report = stage.report(scenario.name, steps);
    stage.session.detach();
    Ok(report)
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
