//! Small datacenters shared by the integration tests.
#![allow(
    dead_code,
    reason = "each integration test binary uses a different part of the helpers"
)]

use vmreconf::checking::check;
use vmreconf::model::constraint::OptConstraint;
use vmreconf::model::constraint::SatConstraint;
use vmreconf::model::Action;
use vmreconf::model::Model;
use vmreconf::model::Node;
use vmreconf::model::ReconfigurationPlan;
use vmreconf::model::ShareableResource;
use vmreconf::model::Vm;
use vmreconf::Parameters;

pub(crate) const CPU: &str = "cpu";

/// Online nodes with a CPU capacity, and VMs consuming one CPU each.
#[derive(Debug)]
pub(crate) struct Cluster {
    pub(crate) model: Model,
    pub(crate) nodes: Vec<Node>,
    pub(crate) vms: Vec<Vm>,
}

impl Cluster {
    /// `capacity` CPUs on each of `num_nodes` online nodes; `placement[i]` VMs on node `i`.
    pub(crate) fn new(num_nodes: usize, capacity: i64, placement: &[usize]) -> Cluster {
        let mut model = Model::new();
        let nodes: Vec<Node> = (0..num_nodes).map(|_| model.new_node()).collect();
        for node in &nodes {
            model.mapping_mut().add_online_node(*node);
        }
        let mut vms = Vec::new();
        for (node, count) in nodes.iter().zip(placement) {
            for _ in 0..*count {
                let vm = model.new_vm();
                model.mapping_mut().add_running_vm(vm, *node).unwrap();
                vms.push(vm);
            }
        }
        model
            .add_view(ShareableResource::with_defaults(CPU, 1, capacity))
            .unwrap();
        Cluster { model, nodes, vms }
    }

    pub(crate) fn set_duration(&mut self, vm: Vm, key: &str, duration: i64) {
        let _ = self.model.attributes_mut().put(vm, key, duration);
    }

    pub(crate) fn set_consumption(&mut self, vm: Vm, consumption: i64) {
        self.model
            .view_mut(CPU)
            .unwrap()
            .set_consumption(vm, consumption)
            .unwrap();
    }

    pub(crate) fn set_capacity(&mut self, node: Node, capacity: i64) {
        self.model
            .view_mut(CPU)
            .unwrap()
            .set_capacity(node, capacity)
            .unwrap();
    }
}

/// Solves with the default parameters, and checks the plan independently of the scheduler.
pub(crate) fn solve(
    model: &Model,
    constraints: &[SatConstraint],
    objective: OptConstraint,
) -> Option<ReconfigurationPlan> {
    let plan = vmreconf::solve(model, constraints, &objective, &Parameters::default())
        .expect("the scheduling call succeeds");
    if let Some(plan) = &plan {
        assert_eq!(check(plan, constraints), Ok(()));
    }
    plan
}

/// The only action of the plan involving the VM.
pub(crate) fn action_of(plan: &ReconfigurationPlan, vm: Vm) -> &Action {
    let actions: Vec<&Action> = plan.actions_of(vm).collect();
    assert_eq!(actions.len(), 1, "expected one action for {vm} in\n{plan}");
    actions[0]
}
