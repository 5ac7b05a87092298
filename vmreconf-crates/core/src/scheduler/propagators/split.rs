use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

/// Hosts of different groups never share a node.
#[derive(Clone, Debug)]
pub(crate) struct SplitPropagator {
    groups: Box<[Box<[DomainId]>]>,
}

impl SplitPropagator {
    pub(crate) fn new(groups: impl Into<Box<[Box<[DomainId]>]>>) -> Self {
        SplitPropagator {
            groups: groups.into(),
        }
    }
}

impl Propagator for SplitPropagator {
    fn name(&self) -> &str {
        "Split"
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for host in self.groups.iter().flat_map(|group| group.iter()) {
            context.register(*host, DomainEvents::ASSIGN);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for (index, group) in self.groups.iter().enumerate() {
            for host in group.iter() {
                if !context.is_fixed(host) {
                    continue;
                }
                let node = context.lower_bound(host);
                let others = self
                    .groups
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .flat_map(|(_, group)| group.iter());
                for other in others {
                    context.remove(other, node)?;
                }
            }
        }
        Ok(())
    }
}
