mod linear_less_or_equal;

pub(crate) use linear_less_or_equal::LinearLessOrEqualPropagator;
