use std::collections::BTreeMap;

use crate::Attributes;
use crate::ElementRegistry;
use crate::Mapping;
use crate::ModelingError;
use crate::Node;
use crate::ShareableResource;
use crate::Vm;

/// A datacenter: its elements, their placement, the resource views and the attributes.
#[derive(Clone, Debug, Default)]
pub struct Model {
    registry: ElementRegistry,
    mapping: Mapping,
    views: BTreeMap<String, ShareableResource>,
    attributes: Attributes,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn new_vm(&mut self) -> Vm {
        self.registry.new_vm()
    }

    pub fn new_node(&mut self) -> Node {
        self.registry.new_node()
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ElementRegistry {
        &mut self.registry
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Whether the VM is known to the model, either through the registry or the mapping.
    pub fn contains_vm(&self, vm: Vm) -> bool {
        self.registry.contains_vm(vm) || self.mapping.contains_vm(vm)
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.registry.contains_node(node) || self.mapping.contains_node(node)
    }

    pub fn add_view(&mut self, view: ShareableResource) -> Result<(), ModelingError> {
        if self.views.contains_key(view.id()) {
            return Err(ModelingError::DuplicateView(view.id().to_owned()));
        }
        let _ = self.views.insert(view.id().to_owned(), view);
        Ok(())
    }

    pub fn view(&self, id: &str) -> Option<&ShareableResource> {
        self.views.get(id)
    }

    pub fn view_mut(&mut self, id: &str) -> Option<&mut ShareableResource> {
        self.views.get_mut(id)
    }

    pub fn remove_view(&mut self, id: &str) -> Option<ShareableResource> {
        self.views.remove(id)
    }

    /// The views in identifier order.
    pub fn views(&self) -> impl Iterator<Item = &ShareableResource> + '_ {
        self.views.values()
    }
}
