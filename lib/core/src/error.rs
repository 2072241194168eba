//! Error plumbing shared across the membrane crates.
//!
//! Each crate owns its domain error enum (pool, adapter, worker, ...) and
//! wraps it in a rootcause [`Report`] at service boundaries. Lower layers
//! attach their own context with `.context()` on the way up.

use rootcause::Report;

/// A Result type alias over rootcause's [`Report`].
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "rejected")
        }
    }

    impl std::error::Error for Rejected {}

    fn reject() -> Result<(), Rejected> {
        Err(Rejected.into())
    }

    #[test]
    fn typed_result_carries_context() {
        let err = reject().unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }
}
