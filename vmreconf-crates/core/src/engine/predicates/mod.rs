pub(crate) mod predicate;
