//! Prototype construction.

use crate::Result;

/// Produces new targets on demand.
///
/// Pools call [`create`](TargetFactory::create) when they need another
/// target, [`validate`](TargetFactory::validate) when borrow or return
/// testing is enabled, and [`destroy`](TargetFactory::destroy) when a
/// target leaves the pool for good.
///
/// Any `Fn() -> Result<T>` closure is a factory with the default hooks.
pub trait TargetFactory<T>: Send + Sync {
    /// Builds a new target.
    fn create(&self) -> Result<T>;

    /// Checks whether a target is still fit to be lent out.
    fn validate(&self, _target: &T) -> bool {
        true
    }

    /// Releases a target's resources.
    fn destroy(&self, target: T) {
        drop(target);
    }
}

impl<T, F> TargetFactory<T> for F
where
    F: Fn() -> Result<T> + Send + Sync,
{
    fn create(&self) -> Result<T> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct EvenOnly;

    impl TargetFactory<u32> for EvenOnly {
        fn create(&self) -> Result<u32> {
            Ok(2)
        }

        fn validate(&self, target: &u32) -> bool {
            target % 2 == 0
        }
    }

    #[test]
    fn test_closure_factory() {
        let factory = || Ok::<_, Error>(String::from("target"));
        assert_eq!(factory.create().unwrap(), "target");
        assert!(factory.validate(&String::new()));
    }

    #[test]
    fn test_custom_validation() {
        let factory = EvenOnly;
        assert_eq!(factory.create().unwrap(), 2);
        assert!(factory.validate(&4));
        assert!(!factory.validate(&3));
    }
}
