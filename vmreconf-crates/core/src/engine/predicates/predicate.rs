use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Not;

use crate::engine::variables::DomainId;

/// An atomic constraint over a single domain: `[x >= v]`, `[x <= v]`, `[x == v]` or `[x != v]`.
///
/// Decisions of the search and the objective bounds of the optimisation are predicates.
#[derive(Clone, PartialEq, Eq, Copy, Hash, Debug)]
pub enum Predicate {
    LowerBound {
        domain_id: DomainId,
        lower_bound: i32,
    },
    UpperBound {
        domain_id: DomainId,
        upper_bound: i32,
    },
    NotEqual {
        domain_id: DomainId,
        not_equal_constant: i32,
    },
    Equal {
        domain_id: DomainId,
        equality_constant: i32,
    },
}

impl Predicate {
    pub fn get_domain(&self) -> DomainId {
        match *self {
            Predicate::LowerBound { domain_id, .. }
            | Predicate::UpperBound { domain_id, .. }
            | Predicate::NotEqual { domain_id, .. }
            | Predicate::Equal { domain_id, .. } => domain_id,
        }
    }

    pub fn get_right_hand_side(&self) -> i32 {
        match *self {
            Predicate::LowerBound { lower_bound, .. } => lower_bound,
            Predicate::UpperBound { upper_bound, .. } => upper_bound,
            Predicate::NotEqual {
                not_equal_constant, ..
            } => not_equal_constant,
            Predicate::Equal {
                equality_constant, ..
            } => equality_constant,
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Predicate::LowerBound {
                domain_id,
                lower_bound,
            } => Predicate::UpperBound {
                domain_id,
                upper_bound: lower_bound - 1,
            },
            Predicate::UpperBound {
                domain_id,
                upper_bound,
            } => Predicate::LowerBound {
                domain_id,
                lower_bound: upper_bound + 1,
            },
            Predicate::NotEqual {
                domain_id,
                not_equal_constant,
            } => Predicate::Equal {
                domain_id,
                equality_constant: not_equal_constant,
            },
            Predicate::Equal {
                domain_id,
                equality_constant,
            } => Predicate::NotEqual {
                domain_id,
                not_equal_constant: equality_constant,
            },
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Predicate::LowerBound { .. } => ">=",
            Predicate::UpperBound { .. } => "<=",
            Predicate::NotEqual { .. } => "!=",
            Predicate::Equal { .. } => "==",
        };
        write!(
            f,
            "[{} {operator} {}]",
            self.get_domain(),
            self.get_right_hand_side()
        )
    }
}

/// Builds a [`Predicate`] with a comparison-like syntax, e.g. `predicate![x >= 3]` or
/// `predicate![transition.start == 0]`.
#[macro_export]
macro_rules! predicate {
    ($($var:ident).+$([$index:expr])? >= $bound:expr) => {
        $crate::predicates::Predicate::LowerBound {
            domain_id: $($var).+$([$index])?,
            lower_bound: $bound,
        }
    };
    ($($var:ident).+$([$index:expr])? <= $bound:expr) => {
        $crate::predicates::Predicate::UpperBound {
            domain_id: $($var).+$([$index])?,
            upper_bound: $bound,
        }
    };
    ($($var:ident).+$([$index:expr])? == $value:expr) => {
        $crate::predicates::Predicate::Equal {
            domain_id: $($var).+$([$index])?,
            equality_constant: $value,
        }
    };
    ($($var:ident).+$([$index:expr])? != $value:expr) => {
        $crate::predicates::Predicate::NotEqual {
            domain_id: $($var).+$([$index])?,
            not_equal_constant: $value,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::Predicate;
    use crate::containers::StorageKey;
    use crate::engine::variables::DomainId;
    use crate::predicate;

    #[test]
    fn negation_flips_the_predicate() {
        let x = DomainId::create_from_index(2);

        assert_eq!(!predicate![x >= 3], predicate![x <= 2]);
        assert_eq!(!predicate![x <= 3], predicate![x >= 4]);
        assert_eq!(!predicate![x == 5], predicate![x != 5]);
        assert_eq!(!!predicate![x != 5], predicate![x != 5]);
    }

    #[test]
    fn display_uses_the_domain_name() {
        let x = DomainId::create_from_index(7);
        assert_eq!(predicate![x >= -1].to_string(), "[x7 >= -1]");
        assert_eq!(predicate![x != 4].to_string(), "[x7 != 4]");
    }

    #[test]
    fn fields_and_indexed_variables_are_accepted() {
        struct Transition {
            start: DomainId,
        }

        let transition = Transition {
            start: DomainId::create_from_index(0),
        };
        let hosts = [DomainId::create_from_index(1)];

        assert_eq!(
            predicate![transition.start <= 3],
            Predicate::UpperBound {
                domain_id: transition.start,
                upper_bound: 3,
            }
        );
        assert_eq!(predicate![hosts[0] == 5].get_domain(), hosts[0]);
        assert_eq!(predicate![hosts[0] == 5].get_right_hand_side(), 5);
    }
}
