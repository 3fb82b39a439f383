//! Fixed-phase system scheduling.

use crate::component::ComponentId;
use crate::world::World;

/// The five fixed phases a scheduler step runs through, in order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    PreUpdate,
    Update,
    PostUpdate,
    PreRender,
    Render,
}

impl Phase {
    pub const ORDER: [Phase; 5] =
        [Phase::PreUpdate, Phase::Update, Phase::PostUpdate, Phase::PreRender, Phase::Render];
}

/// Declares which components a system reads and writes. Not enforced at
/// execution time; exposed for diagnostics and future parallelization.
#[derive(Clone, Debug, Default)]
pub struct SystemAccess {
    pub reads: Vec<ComponentId>,
    pub writes: Vec<ComponentId>,
}

impl SystemAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(mut self, ids: &[ComponentId]) -> Self {
        self.reads.extend_from_slice(ids);
        self
    }

    pub fn writes(mut self, ids: &[ComponentId]) -> Self {
        self.writes.extend_from_slice(ids);
        self
    }
}

pub type SystemFn = Box<dyn FnMut(&mut World, f32)>;

struct SystemEntry {
    name: String,
    phase: Phase,
    access: SystemAccess,
    enabled: bool,
    func: SystemFn,
}

/// Holds every registered system, in registration order. `World` drives
/// execution (`run_phase`/`run_systems`/`step`) since systems need
/// `&mut World` to run.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<SystemEntry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s.name == name)
    }

    pub fn add(&mut self, name: String, phase: Phase, access: SystemAccess, func: SystemFn) {
        self.systems.push(SystemEntry { name, phase, access, enabled: true, func });
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name != name);
        self.systems.len() != before
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if let Some(entry) = self.systems.iter_mut().find(|s| s.name == name) {
            entry.enabled = enabled;
            true
        } else {
            false
        }
    }

    pub fn access_of(&self, name: &str) -> Option<&SystemAccess> {
        self.systems.iter().find(|s| s.name == name).map(|s| &s.access)
    }

    /// Runs every enabled system registered for `phase`, in registration
    /// order, passing `world` and `dt` to each. Each invocation is
    /// wrapped in a `tracing::debug_span!` naming the system.
    pub(crate) fn run_phase(&mut self, phase: Phase, world: &mut World, dt: f32) {
        for entry in self.systems.iter_mut().filter(|s| s.phase == phase && s.enabled) {
            let _span = tracing::debug_span!("system", name = %entry.name).entered();
            (entry.func)(world, dt);
        }
    }
}
