//! Shorter error context for `map_err`, for places where the error
//! isn't an `anyhow::Error` yet.
//!
//! `.map_err(ctx!("reading {path:?}"))` is the same as
//! `.map_err(|e| anyhow::Error::from(e).context(format!("reading {path:?}")))`.

#[macro_export]
macro_rules! ctx {
    ($fmt:tt) => {
        |e| anyhow::Error::from(e).context(format!($fmt))
    };
    ($fmt:tt, $($arg:tt)*) => {
        |e| anyhow::Error::from(e).context(format!($fmt, $($arg)*))
    };
}
