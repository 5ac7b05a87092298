use vmreconf::core::rand::rngs::SmallRng;
use vmreconf::core::rand::SeedableRng;
use vmreconf::core::Random;
use vmreconf::model::constraint::Offline;
use vmreconf::model::constraint::SatConstraint;
use vmreconf::model::constraint::Spread;
use vmreconf::model::ActionKind;
use vmreconf::model::Model;
use vmreconf::model::ModelingError;
use vmreconf::model::Node;
use vmreconf::model::ShareableResource;

/// The view every VM consumes from.
pub(crate) const CPU: &str = "cpu";

/// A decommissioning: the VMs of the online source nodes move to offline destination nodes,
/// after which the sources are shut down.
#[derive(Debug)]
pub(crate) struct Decommissioning {
    pub(crate) model: Model,
    pub(crate) constraints: Vec<SatConstraint>,
    pub(crate) sources: Vec<Node>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct DecommissioningShape {
    pub(crate) source_nodes: usize,
    pub(crate) destination_nodes: usize,
    pub(crate) vms_per_node: usize,
    /// Each VM consumes between 1 and this amount of CPU.
    pub(crate) max_consumption: i64,
    /// Each migration lasts between 1 and this many time units.
    pub(crate) max_migration: i32,
    /// Spread the VMs of each source node over the destinations.
    pub(crate) spread: bool,
    pub(crate) seed: u64,
}

impl DecommissioningShape {
    pub(crate) fn generate(&self) -> Result<Decommissioning, ModelingError> {
        let mut random = SmallRng::seed_from_u64(self.seed);
        let mut model = Model::new();
        let node_capacity = self.vms_per_node as i64 * self.max_consumption;
        let mut view = ShareableResource::with_defaults(CPU, 1, node_capacity);

        let sources: Vec<Node> = (0..self.source_nodes).map(|_| model.new_node()).collect();
        let destinations: Vec<Node> = (0..self.destination_nodes)
            .map(|_| model.new_node())
            .collect();
        for node in &sources {
            model.mapping_mut().add_online_node(*node);
        }
        for node in &destinations {
            model.mapping_mut().add_offline_node(*node)?;
        }

        let mut constraints = vec![Offline::new(sources.iter().copied()).into()];
        for source in &sources {
            let vms: Vec<_> = (0..self.vms_per_node).map(|_| model.new_vm()).collect();
            for vm in &vms {
                model.mapping_mut().add_running_vm(*vm, *source)?;
                let consumption = random.generate_i32_in_range(1, self.max_consumption as i32);
                view.set_consumption(*vm, i64::from(consumption))?;
                let migration = random.generate_i32_in_range(1, self.max_migration);
                let _ = model.attributes_mut().put(
                    *vm,
                    ActionKind::MigrateVm.attribute_key(),
                    i64::from(migration),
                );
            }
            if self.spread && vms.len() > 1 {
                constraints.push(Spread::new(vms).continuous(false).into());
            }
        }
        model.add_view(view)?;

        Ok(Decommissioning {
            model,
            constraints,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_sources_hold_every_vm() {
        let shape = DecommissioningShape {
            source_nodes: 2,
            destination_nodes: 3,
            vms_per_node: 4,
            max_consumption: 2,
            max_migration: 3,
            spread: true,
            seed: 7,
        };

        let instance = shape.generate().unwrap();

        let mapping = instance.model.mapping();
        assert_eq!(mapping.running_vms().count(), 8);
        assert_eq!(mapping.offline_nodes().count(), 3);
        assert!(instance
            .sources
            .iter()
            .all(|node| mapping.running_vms_on(*node).count() == 4));
        assert_eq!(instance.constraints.len(), 3);
    }
}
