#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const VMRECONF_ASSERT_LEVEL_DEFINITION: u8 = VMRECONF_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const VMRECONF_ASSERT_LEVEL_DEFINITION: u8 = VMRECONF_ASSERT_MODERATE;

pub const VMRECONF_ASSERT_SIMPLE: u8 = 1;
pub const VMRECONF_ASSERT_MODERATE: u8 = 2;

#[macro_export]
#[doc(hidden)]
macro_rules! vmreconf_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::VMRECONF_ASSERT_LEVEL_DEFINITION >= $crate::asserts::VMRECONF_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! vmreconf_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::VMRECONF_ASSERT_LEVEL_DEFINITION >= $crate::asserts::VMRECONF_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

/// Checks which are too costly to run outside of tests and `debug-checks` builds.
#[macro_export]
#[doc(hidden)]
macro_rules! vmreconf_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::VMRECONF_ASSERT_LEVEL_DEFINITION >= $crate::asserts::VMRECONF_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}
