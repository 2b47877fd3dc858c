mod definition;
mod factory;
mod inject;
mod point;

use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::util::any::{AsAny, DowncastArc};

pub use definition::{BeanDefinition, HookResult};
pub use factory::{BeanFactory, ClosureFactory, InstanceFactory};
pub use inject::Inject;
pub use point::DependencyPoint;

#[cfg(test)]
pub(crate) use factory::MockBeanFactory;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// A shared, type-erased bean instance.
pub type BeanRef = Arc<dyn Bean>;

/// A type whose instances can be managed by a container.
///
/// A bean is allocated before its dependencies are known, so dependency
/// points are filled afterwards through `&self`. Fields of type [`Inject`]
/// provide the interior mutability this needs. Types without any dependency
/// point can rely on the default [`Bean::inject`].
///
/// Usually, you don't need to implement [`Bean`] manually, since
/// `#[derive(Bean)]` generates it together with [`Injectable`].
pub trait Bean: AsAny {
    /// Assigns `value` to the dependency point named `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point doesn't exist, if `value` has an
    /// unexpected type, or if the point is already filled.
    fn inject(&self, point: &str, value: BeanRef) -> Result<(), InjectError> {
        let _ = value;
        Err(InjectError::unknown_point(point))
    }
}

/// A [`Bean`] which statically knows its dependency points.
pub trait Injectable: Bean + Sized {
    fn dependency_points() -> Vec<DependencyPoint>;
}

/// Converts a type-erased bean back into its concrete type.
///
/// # Errors
///
/// Returns the original reference if the bean is not a `T`.
pub fn downcast<T: Bean>(bean: BeanRef) -> Result<Arc<T>, BeanRef> {
    bean.downcast_arc::<T>()
}

/// Returns the concrete type name of a type-erased bean.
pub fn type_name_of(bean: &dyn Bean) -> &'static str {
    bean.type_name()
}

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum InjectError {
    #[snafu(display("no dependency point named {point}"))]
    #[non_exhaustive]
    UnknownPoint { point: String },
    #[snafu(display("dependency point expects {expected} but got {found}"))]
    #[non_exhaustive]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[snafu(display("dependency point is already filled"))]
    #[non_exhaustive]
    AlreadyInjected,
}

impl InjectError {
    pub fn unknown_point(point: &str) -> Self {
        Self::UnknownPoint {
            point: point.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Bean for Plain {}

    #[test]
    fn default_inject_fails_with_unknown_point() {
        let bean = Plain;
        let res = bean.inject("anything", Arc::new(Plain));
        assert!(matches!(res, Err(InjectError::UnknownPoint { point }) if point == "anything"));
    }

    #[test]
    fn downcast_succeeds_when_type_matches() {
        let bean: BeanRef = Arc::new(Plain);
        assert!(type_name_of(bean.as_ref()).ends_with("Plain"));
        assert!(downcast::<Plain>(bean).is_ok());
    }
}
