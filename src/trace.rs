//! Optional `tracing` events.
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate;
//! without it they expand to nothing and the map has no logging dependency.

macro_rules! trace {
    ($($arg:tt)*) => {
        {#[cfg(feature = "tracing")] tracing::trace!($($arg)*);}
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        {#[cfg(feature = "tracing")] tracing::debug!($($arg)*);}
    };
}

pub(crate) use debug;
pub(crate) use trace;
