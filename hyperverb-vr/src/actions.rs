//! Controller input via the runtime's action system.
//!
//! The host registers named actions with callbacks before the session
//! starts; handles are resolved once against the manifest, and every frame
//! the binder polls the runtime and fires the digital callbacks with the
//! previous and current pressed state so edge detection stays in one place.

use crate::error::{Result, VrError};
use crate::runtime::{
    ActionHandle, ActionSetHandle, ActiveActionSet, AnalogActionState, VrRuntime,
};
use log::{info, warn};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const MANIFEST_FILE: &str = "hypervr_actions.json";

#[derive(Serialize)]
struct ManifestAction {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ManifestActionSet {
    name: String,
    usage: &'static str,
}

#[derive(Serialize)]
struct Manifest {
    default_bindings: Vec<String>,
    actions: Vec<ManifestAction>,
    action_sets: Vec<ManifestActionSet>,
}

/// Digital callbacks receive the previous and the current pressed state.
pub type DigitalCallback = Box<dyn FnMut(bool, bool) + Send>;
/// Analog callbacks receive the current x/y axis values.
pub type AnalogCallback = Box<dyn FnMut(f32, f32) + Send>;
/// Gate evaluated each poll; a gated-off set is not pushed to the runtime
/// and a gated-off action fires no callback. `None` means always active.
pub type WhenPredicate = Box<dyn Fn() -> bool + Send>;

fn gate_open(when: &Option<WhenPredicate>) -> bool {
    when.as_ref().is_none_or(|w| w())
}

struct SetRecord {
    name: String,
    handle: ActionSetHandle,
    priority: i32,
    when: Option<WhenPredicate>,
}

struct DigitalRecord {
    name: String,
    handle: ActionHandle,
    last: bool,
    curr: bool,
    when: Option<WhenPredicate>,
    callback: DigitalCallback,
}

struct AnalogRecord {
    name: String,
    handle: ActionHandle,
    state: AnalogActionState,
    callback: Option<AnalogCallback>,
}

/// Flat registries of action sets, digital actions and analog actions.
pub struct ActionBinder {
    sets: Vec<SetRecord>,
    digital: Vec<DigitalRecord>,
    analog: Vec<AnalogRecord>,
    manifest_dir: Option<PathBuf>,
    bound: bool,
}

impl ActionBinder {
    pub fn new() -> Self {
        Self {
            sets: Vec::new(),
            digital: Vec::new(),
            analog: Vec::new(),
            manifest_dir: None,
            bound: false,
        }
    }

    /// Overrides the directory the manifest is read from and written to.
    /// The default is the working directory, so users can edit the bindings
    /// without touching the install.
    pub fn set_manifest_dir(&mut self, dir: PathBuf) {
        self.manifest_dir = Some(dir);
    }

    pub fn manifest_path(&self) -> Result<PathBuf> {
        let dir = match &self.manifest_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };
        Ok(dir.join(MANIFEST_FILE))
    }

    /// `when` gates the whole set, e.g. menu bindings only while the
    /// simulation is paused.
    pub fn register_set(&mut self, name: &str, priority: i32, when: Option<WhenPredicate>) {
        self.sets.push(SetRecord {
            name: name.to_owned(),
            handle: ActionSetHandle::INVALID,
            priority,
            when,
        });
    }

    /// `name` is the full action path, e.g. `/actions/general/in/recenter`.
    pub fn register_digital(
        &mut self,
        name: &str,
        when: Option<WhenPredicate>,
        callback: DigitalCallback,
    ) {
        self.digital.push(DigitalRecord {
            name: name.to_owned(),
            handle: ActionHandle::INVALID,
            last: false,
            curr: false,
            when,
            callback,
        });
    }

    pub fn register_analog(&mut self, name: &str, callback: Option<AnalogCallback>) {
        self.analog.push(AnalogRecord {
            name: name.to_owned(),
            handle: ActionHandle::INVALID,
            state: AnalogActionState::default(),
            callback,
        });
    }

    /// Writes a manifest covering the registered actions if none exists yet.
    pub fn ensure_manifest(&self) -> Result<PathBuf> {
        let path = self.manifest_path()?;
        if path.exists() {
            return Ok(path);
        }
        let manifest = Manifest {
            default_bindings: Vec::new(),
            actions: self
                .digital
                .iter()
                .map(|d| ManifestAction {
                    name: d.name.clone(),
                    kind: "boolean",
                })
                .chain(self.analog.iter().map(|a| ManifestAction {
                    name: a.name.clone(),
                    kind: "vector2",
                }))
                .collect(),
            action_sets: self
                .sets
                .iter()
                .map(|s| ManifestActionSet {
                    name: s.name.clone(),
                    usage: "leftright",
                })
                .collect(),
        };
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        info!("wrote default action manifest to {}", path.display());
        Ok(path)
    }

    /// Points the runtime at the manifest and resolves all handles.
    pub fn bind(&mut self, runtime: &mut dyn VrRuntime) -> Result<()> {
        let path = self.ensure_manifest()?;
        runtime.set_action_manifest(&path)?;
        for set in &mut self.sets {
            set.handle = runtime.action_set_handle(&set.name);
            if set.handle == ActionSetHandle::INVALID {
                warn!("action set {} did not resolve", set.name);
            }
        }
        for act in &mut self.digital {
            act.handle = runtime.action_handle(&act.name);
        }
        for act in &mut self.analog {
            act.handle = runtime.action_handle(&act.name);
        }
        self.bound = true;
        Ok(())
    }

    /// Polls all registered actions and fires the callbacks. Call once per
    /// frame before pose tracking.
    pub fn poll(&mut self, runtime: &mut dyn VrRuntime) -> Result<()> {
        if !self.bound {
            return Err(VrError::Input("actions polled before bind".into()));
        }
        let active: Vec<ActiveActionSet> = self
            .sets
            .iter()
            .filter(|s| s.handle != ActionSetHandle::INVALID && gate_open(&s.when))
            .map(|s| ActiveActionSet {
                handle: s.handle,
                priority: s.priority,
            })
            .collect();
        runtime.update_action_state(&active);

        for act in &mut self.digital {
            if act.handle == ActionHandle::INVALID || !gate_open(&act.when) {
                continue;
            }
            act.curr = runtime.digital_action_state(act.handle).pressed;
            (act.callback)(act.last, act.curr);
            act.last = act.curr;
        }
        for act in &mut self.analog {
            if act.handle == ActionHandle::INVALID {
                continue;
            }
            act.state = runtime.analog_action_state(act.handle);
            if let Some(cb) = act.callback.as_mut() {
                cb(act.state.x, act.state.y);
            }
        }
        Ok(())
    }

    /// Last polled axis values for a registered analog action.
    pub fn analog_state(&self, name: &str) -> Option<AnalogActionState> {
        self.analog
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.state)
    }
}

impl Default for ActionBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<serde_json::Error> for VrError {
    fn from(err: serde_json::Error) -> Self {
        VrError::Input(err.to_string())
    }
}
