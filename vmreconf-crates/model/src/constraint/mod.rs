//! Satisfaction and optimisation constraints.
//!
//! A satisfaction constraint restricts either the final mapping only (the *discrete*
//! restriction) or the mapping at every moment of the reconfiguration (the *continuous*
//! restriction). Each constraint is a plain record; [`SatConstraint`] gathers them into a closed
//! sum type which is what the scheduler and the plan checker dispatch on.
mod capacity;
mod placement;
mod state;
mod timing;

use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

pub use capacity::*;
use itertools::Itertools;
pub use placement::*;
pub use state::*;
pub use timing::*;

use crate::Model;
use crate::Node;
use crate::Vm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Restriction {
    Discrete,
    Continuous,
}

impl Display for Restriction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Restriction::Discrete => write!(f, "discrete"),
            Restriction::Continuous => write!(f, "continuous"),
        }
    }
}

/// The behaviour shared by every satisfaction constraint.
pub trait SatisfactionConstraint {
    fn kind(&self) -> ConstraintKind;

    /// The VMs the constraint refers to.
    fn vms(&self) -> BTreeSet<Vm>;

    /// The nodes the constraint refers to.
    fn nodes(&self) -> BTreeSet<Node>;

    fn is_continuous(&self) -> bool;

    /// Whether the constraint has a meaning under the given restriction.
    fn supports(&self, restriction: Restriction) -> bool;

    /// Evaluates the constraint on the mapping of the model.
    fn is_satisfied(&self, model: &Model) -> bool;

    /// The VMs whose current placement or state already violates the constraint.
    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm>;
}

/// The stable identifier of a constraint type, used as the key of the injection registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintKind {
    Running,
    Ready,
    Sleeping,
    Killed,
    Online,
    Offline,
    Fence,
    Ban,
    Root,
    Spread,
    Gather,
    Among,
    Split,
    SplitAmong,
    Lonely,
    Quarantine,
    RunningCapacity,
    ResourceCapacity,
    Overbook,
    Preserve,
    MaxOnline,
    Precedence,
    Deadline,
    Serialize,
    Sync,
    NoDelay,
    Seq,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 27] = [
        ConstraintKind::Running,
        ConstraintKind::Ready,
        ConstraintKind::Sleeping,
        ConstraintKind::Killed,
        ConstraintKind::Online,
        ConstraintKind::Offline,
        ConstraintKind::Fence,
        ConstraintKind::Ban,
        ConstraintKind::Root,
        ConstraintKind::Spread,
        ConstraintKind::Gather,
        ConstraintKind::Among,
        ConstraintKind::Split,
        ConstraintKind::SplitAmong,
        ConstraintKind::Lonely,
        ConstraintKind::Quarantine,
        ConstraintKind::RunningCapacity,
        ConstraintKind::ResourceCapacity,
        ConstraintKind::Overbook,
        ConstraintKind::Preserve,
        ConstraintKind::MaxOnline,
        ConstraintKind::Precedence,
        ConstraintKind::Deadline,
        ConstraintKind::Serialize,
        ConstraintKind::Sync,
        ConstraintKind::NoDelay,
        ConstraintKind::Seq,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Running => "running",
            ConstraintKind::Ready => "ready",
            ConstraintKind::Sleeping => "sleeping",
            ConstraintKind::Killed => "killed",
            ConstraintKind::Online => "online",
            ConstraintKind::Offline => "offline",
            ConstraintKind::Fence => "fence",
            ConstraintKind::Ban => "ban",
            ConstraintKind::Root => "root",
            ConstraintKind::Spread => "spread",
            ConstraintKind::Gather => "gather",
            ConstraintKind::Among => "among",
            ConstraintKind::Split => "split",
            ConstraintKind::SplitAmong => "splitAmong",
            ConstraintKind::Lonely => "lonely",
            ConstraintKind::Quarantine => "quarantine",
            ConstraintKind::RunningCapacity => "runningCapacity",
            ConstraintKind::ResourceCapacity => "resourceCapacity",
            ConstraintKind::Overbook => "overbook",
            ConstraintKind::Preserve => "preserve",
            ConstraintKind::MaxOnline => "maxOnline",
            ConstraintKind::Precedence => "precedence",
            ConstraintKind::Deadline => "deadline",
            ConstraintKind::Serialize => "serialize",
            ConstraintKind::Sync => "sync",
            ConstraintKind::NoDelay => "noDelay",
            ConstraintKind::Seq => "seq",
        }
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Expands to a `match` forwarding `$body` to the record held by each variant.
macro_rules! dispatch {
    ($value:expr, $constraint:ident => $body:expr) => {
        match $value {
            SatConstraint::Running($constraint) => $body,
            SatConstraint::Ready($constraint) => $body,
            SatConstraint::Sleeping($constraint) => $body,
            SatConstraint::Killed($constraint) => $body,
            SatConstraint::Online($constraint) => $body,
            SatConstraint::Offline($constraint) => $body,
            SatConstraint::Fence($constraint) => $body,
            SatConstraint::Ban($constraint) => $body,
            SatConstraint::Root($constraint) => $body,
            SatConstraint::Spread($constraint) => $body,
            SatConstraint::Gather($constraint) => $body,
            SatConstraint::Among($constraint) => $body,
            SatConstraint::Split($constraint) => $body,
            SatConstraint::SplitAmong($constraint) => $body,
            SatConstraint::Lonely($constraint) => $body,
            SatConstraint::Quarantine($constraint) => $body,
            SatConstraint::RunningCapacity($constraint) => $body,
            SatConstraint::ResourceCapacity($constraint) => $body,
            SatConstraint::Overbook($constraint) => $body,
            SatConstraint::Preserve($constraint) => $body,
            SatConstraint::MaxOnline($constraint) => $body,
            SatConstraint::Precedence($constraint) => $body,
            SatConstraint::Deadline($constraint) => $body,
            SatConstraint::Serialize($constraint) => $body,
            SatConstraint::Sync($constraint) => $body,
            SatConstraint::NoDelay($constraint) => $body,
            SatConstraint::Seq($constraint) => $body,
        }
    };
}

/// A satisfaction constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum SatConstraint {
    Running(Running),
    Ready(Ready),
    Sleeping(Sleeping),
    Killed(Killed),
    Online(Online),
    Offline(Offline),
    Fence(Fence),
    Ban(Ban),
    Root(Root),
    Spread(Spread),
    Gather(Gather),
    Among(Among),
    Split(Split),
    SplitAmong(SplitAmong),
    Lonely(Lonely),
    Quarantine(Quarantine),
    RunningCapacity(RunningCapacity),
    ResourceCapacity(ResourceCapacity),
    Overbook(Overbook),
    Preserve(Preserve),
    MaxOnline(MaxOnline),
    Precedence(Precedence),
    Deadline(Deadline),
    Serialize(Serialize),
    Sync(Sync),
    NoDelay(NoDelay),
    Seq(Seq),
}

impl SatConstraint {
    pub fn restriction(&self) -> Restriction {
        if self.is_continuous() {
            Restriction::Continuous
        } else {
            Restriction::Discrete
        }
    }

    /// The resource view the constraint refers to, if any.
    pub fn view(&self) -> Option<&str> {
        match self {
            SatConstraint::ResourceCapacity(constraint) => Some(&constraint.view),
            SatConstraint::Overbook(constraint) => Some(&constraint.view),
            SatConstraint::Preserve(constraint) => Some(&constraint.view),
            _ => None,
        }
    }
}

impl SatisfactionConstraint for SatConstraint {
    fn kind(&self) -> ConstraintKind {
        dispatch!(self, constraint => constraint.kind())
    }

    fn vms(&self) -> BTreeSet<Vm> {
        dispatch!(self, constraint => constraint.vms())
    }

    fn nodes(&self) -> BTreeSet<Node> {
        dispatch!(self, constraint => constraint.nodes())
    }

    fn is_continuous(&self) -> bool {
        dispatch!(self, constraint => constraint.is_continuous())
    }

    fn supports(&self, restriction: Restriction) -> bool {
        dispatch!(self, constraint => constraint.supports(restriction))
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        dispatch!(self, constraint => constraint.is_satisfied(model))
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        dispatch!(self, constraint => constraint.misplaced_vms(model))
    }
}

impl Display for SatConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let vms = self.vms();
        let nodes = self.nodes();
        write!(f, "{}(", self.kind())?;
        if !vms.is_empty() {
            write!(f, "vms=[{}], ", vms.iter().join(", "))?;
        }
        if !nodes.is_empty() {
            write!(f, "nodes=[{}], ", nodes.iter().join(", "))?;
        }
        write!(f, "{})", self.restriction())
    }
}

macro_rules! impl_from_record {
    ($($record:ident),+ $(,)?) => {
        $(
            impl From<$record> for SatConstraint {
                fn from(value: $record) -> Self {
                    SatConstraint::$record(value)
                }
            }
        )+
    };
}

impl_from_record!(
    Running,
    Ready,
    Sleeping,
    Killed,
    Online,
    Offline,
    Fence,
    Ban,
    Root,
    Spread,
    Gather,
    Among,
    Split,
    SplitAmong,
    Lonely,
    Quarantine,
    RunningCapacity,
    ResourceCapacity,
    Overbook,
    Preserve,
    MaxOnline,
    Precedence,
    Deadline,
    Serialize,
    Sync,
    NoDelay,
    Seq,
);

/// The stable identifier of an objective, used as the key of the injection registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectiveKind {
    MinMttr,
    MinMttrMig,
    MinMigrations,
    MinPlanDuration,
}

impl Display for ObjectiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveKind::MinMttr => write!(f, "minMTTR"),
            ObjectiveKind::MinMttrMig => write!(f, "minMTTRMig"),
            ObjectiveKind::MinMigrations => write!(f, "minMigrations"),
            ObjectiveKind::MinPlanDuration => write!(f, "minPlanDuration"),
        }
    }
}

/// The optimisation constraint of a scheduling problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OptConstraint {
    /// Minimise the sum of the end times of every action (mean time to repair).
    #[default]
    MinMttr,
    /// The cost of [`OptConstraint::MinMttr`], searched by scheduling the VMs leaving a node to
    /// shut down before the node itself.
    MinMttrMig,
    /// Minimise the total duration of the actions of the VMs that may be relocated.
    MinMigrations,
    /// Minimise the moment the last action completes.
    MinPlanDuration,
}

impl OptConstraint {
    pub fn kind(&self) -> ObjectiveKind {
        match self {
            OptConstraint::MinMttr => ObjectiveKind::MinMttr,
            OptConstraint::MinMttrMig => ObjectiveKind::MinMttrMig,
            OptConstraint::MinMigrations => ObjectiveKind::MinMigrations,
            OptConstraint::MinPlanDuration => ObjectiveKind::MinPlanDuration,
        }
    }
}

impl Display for OptConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.kind().fmt(f)
    }
}

/// The running VMs among `vms`, with their host.
pub(crate) fn running_hosts<'a>(
    model: &'a Model,
    vms: impl IntoIterator<Item = &'a Vm> + 'a,
) -> impl Iterator<Item = (Vm, Node)> + 'a {
    vms.into_iter().filter_map(|vm| {
        if model.mapping().is_running(*vm) {
            model.mapping().host_of(*vm).map(|host| (*vm, host))
        } else {
            None
        }
    })
}

/// The running VMs hosted on any of the given nodes.
pub(crate) fn running_on<'a>(
    model: &'a Model,
    nodes: impl IntoIterator<Item = &'a Node> + 'a,
) -> impl Iterator<Item = Vm> + 'a {
    nodes
        .into_iter()
        .flat_map(|node| model.mapping().running_vms_on(*node))
}
