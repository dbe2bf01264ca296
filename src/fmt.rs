//! Logging shim
//!
//! Library code logs through these macros so the same call sites work on
//! target (`defmt` over RTT) and on the host (`log` facade, used by tests).
//! With neither feature enabled the arguments are only type-checked.
//! Format strings must stay within the subset both backends accept:
//! `{}` and `{:?}` with arguments implementing `Display`/`Debug` and
//! `defmt::Format`.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::trace!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        ::log::trace!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "embedded")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::debug!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        ::log::debug!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "embedded")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::info!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        ::log::info!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "embedded")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::warn!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        ::log::warn!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "embedded")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
