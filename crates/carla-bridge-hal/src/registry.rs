//! [`ActorRegistry`] – the set of vehicle actors known to the bridge.
//!
//! The object-list publishers iterate the registry to describe every vehicle
//! around the ego.  Actors are keyed by their simulator id and iterated in id
//! order so published lists are deterministic.

use std::collections::BTreeMap;

use carla_bridge_types::ActorId;

use crate::actor::VehicleActor;

#[derive(Default)]
pub struct ActorRegistry {
    actors: BTreeMap<ActorId, Box<dyn VehicleActor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor.  Any previously registered actor with the same id
    /// is replaced and returned.
    pub fn register(&mut self, actor: Box<dyn VehicleActor>) -> Option<Box<dyn VehicleActor>> {
        self.actors.insert(actor.id(), actor)
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Box<dyn VehicleActor>> {
        self.actors.remove(&id)
    }

    pub fn get(&self, id: ActorId) -> Option<&dyn VehicleActor> {
        self.actors.get(&id).map(|a| a.as_ref())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut (dyn VehicleActor + 'static)> {
        self.actors.get_mut(&id).map(|a| a.as_mut())
    }

    /// All actors in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn VehicleActor> {
        self.actors.values().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimVehicle;

    #[test]
    fn register_replaces_same_id() {
        let mut reg = ActorRegistry::new();
        assert!(reg.register(Box::new(SimVehicle::new(4, "a"))).is_none());
        let previous = reg.register(Box::new(SimVehicle::new(4, "b")));
        assert_eq!(previous.map(|p| p.role_name().to_string()), Some("a".to_string()));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(4).map(|a| a.role_name()), Some("b"));
    }

    #[test]
    fn iter_is_ordered_by_id() {
        let mut reg = ActorRegistry::new();
        for id in [9, 2, 5] {
            reg.register(Box::new(SimVehicle::new(id, "traffic")));
        }
        let ids: Vec<ActorId> = reg.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn remove_drops_actor() {
        let mut reg = ActorRegistry::new();
        reg.register(Box::new(SimVehicle::new(1, "traffic")));
        assert!(reg.remove(1).is_some());
        assert!(reg.is_empty());
        assert!(reg.get(1).is_none());
    }

    #[test]
    fn get_mut_allows_commands() {
        let mut reg = ActorRegistry::new();
        reg.register(Box::new(SimVehicle::new(1, "traffic")));
        let actor = reg.get_mut(1).unwrap();
        actor.set_autopilot(true).unwrap();
    }
}
