//! onAdd / onRemove / onChange subscriptions.
//!
//! There's no direct teacher analogue (the rodengine tables have no
//! observer hooks); the shape follows the spec directly, using the same
//! token-indexed `Vec` membership pattern the teacher uses elsewhere for
//! ordered, small collections (e.g. `ecsdb`'s freelist). Hook lists for a
//! firing `(component, kind)` are temporarily removed from the registry
//! before their callbacks run, so `World` can hand callbacks `&mut World`
//! without aliasing the very list being iterated; see
//! `world::World::fire_on_add` and friends.

use std::any::Any;
use std::collections::HashMap;

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::world::World;

/// Token returned by a hook subscription, used to unsubscribe later.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HookToken(u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum HookKind {
    Add,
    Remove,
    Change,
}

/// A handle returned by `World::on_add`/`on_remove`/`on_change`, passed
/// back to `World::unsubscribe_hook` to cancel the subscription.
#[derive(Clone, Copy, Debug)]
pub struct HookHandle {
    pub(crate) token: HookToken,
    pub(crate) component: ComponentId,
    pub(crate) kind: HookKind,
}

pub type AddHook = Box<dyn FnMut(&mut World, Entity, &dyn Any)>;
pub type RemoveHook = Box<dyn FnMut(&mut World, Entity, &dyn Any)>;
pub type ChangeHook = Box<dyn FnMut(&mut World, Entity, &dyn Any, &dyn Any)>;

#[derive(Default)]
pub struct HookRegistry {
    next_token: u64,
    on_add: HashMap<ComponentId, Vec<(HookToken, AddHook)>>,
    on_remove: HashMap<ComponentId, Vec<(HookToken, RemoveHook)>>,
    on_change: HashMap<ComponentId, Vec<(HookToken, ChangeHook)>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> HookToken {
        let token = HookToken(self.next_token);
        self.next_token += 1;
        token
    }

    pub fn on_add(&mut self, component: ComponentId, hook: AddHook) -> HookHandle {
        let token = self.next();
        self.on_add.entry(component).or_default().push((token, hook));
        HookHandle { token, component, kind: HookKind::Add }
    }

    pub fn on_remove(&mut self, component: ComponentId, hook: RemoveHook) -> HookHandle {
        let token = self.next();
        self.on_remove.entry(component).or_default().push((token, hook));
        HookHandle { token, component, kind: HookKind::Remove }
    }

    pub fn on_change(&mut self, component: ComponentId, hook: ChangeHook) -> HookHandle {
        let token = self.next();
        self.on_change.entry(component).or_default().push((token, hook));
        HookHandle { token, component, kind: HookKind::Change }
    }

    pub fn unsubscribe(&mut self, handle: HookHandle) -> bool {
        match handle.kind {
            HookKind::Add => remove_token(&mut self.on_add, handle.component, handle.token),
            HookKind::Remove => remove_token(&mut self.on_remove, handle.component, handle.token),
            HookKind::Change => remove_token(&mut self.on_change, handle.component, handle.token),
        }
    }

    pub(crate) fn take_on_add(&mut self, component: ComponentId) -> Vec<(HookToken, AddHook)> {
        self.on_add.remove(&component).unwrap_or_default()
    }

    pub(crate) fn restore_on_add(&mut self, component: ComponentId, mut list: Vec<(HookToken, AddHook)>) {
        if let Some(grown) = self.on_add.remove(&component) {
            list.extend(grown);
        }
        if !list.is_empty() {
            self.on_add.insert(component, list);
        }
    }

    pub(crate) fn take_on_remove(&mut self, component: ComponentId) -> Vec<(HookToken, RemoveHook)> {
        self.on_remove.remove(&component).unwrap_or_default()
    }

    pub(crate) fn restore_on_remove(&mut self, component: ComponentId, mut list: Vec<(HookToken, RemoveHook)>) {
        if let Some(grown) = self.on_remove.remove(&component) {
            list.extend(grown);
        }
        if !list.is_empty() {
            self.on_remove.insert(component, list);
        }
    }

    pub(crate) fn take_on_change(&mut self, component: ComponentId) -> Vec<(HookToken, ChangeHook)> {
        self.on_change.remove(&component).unwrap_or_default()
    }

    pub(crate) fn restore_on_change(&mut self, component: ComponentId, mut list: Vec<(HookToken, ChangeHook)>) {
        if let Some(grown) = self.on_change.remove(&component) {
            list.extend(grown);
        }
        if !list.is_empty() {
            self.on_change.insert(component, list);
        }
    }
}

fn remove_token<H>(
    map: &mut HashMap<ComponentId, Vec<(HookToken, H)>>,
    component: ComponentId,
    token: HookToken,
) -> bool {
    if let Some(list) = map.get_mut(&component) {
        let before = list.len();
        list.retain(|(t, _)| *t != token);
        let removed = list.len() != before;
        if list.is_empty() {
            map.remove(&component);
        }
        removed
    } else {
        false
    }
}
