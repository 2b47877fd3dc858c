use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bean::{Bean, BeanRef, BoxError};

/// Allocates raw, unwired bean instances.
///
/// A [`BeanFactory`] never resolves dependencies itself: the container fills
/// the dependency points of the allocated instance afterwards, which is what
/// allows cyclic bean graphs. Each call should return a new instance, unless
/// the factory deliberately hands out one pre-built object.
#[cfg_attr(test, mockall::automock)]
pub trait BeanFactory: Send + Sync + 'static {
    /// Allocates a new instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance can't be built.
    fn allocate(&self) -> Result<BeanRef, BoxError>;

    /// Returns the name of the type produced by this factory.
    fn type_name(&self) -> &'static str;
}

/// A [`BeanFactory`] backed by a registration-time closure.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use beanwire::bean::{Bean, ClosureFactory};
/// struct Clock;
/// impl Bean for Clock {}
///
/// let factory = ClosureFactory::new(|| Ok::<_, Infallible>(Clock));
/// ```
pub struct ClosureFactory<T, F, E>
where
    T: Bean,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    closure: F,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, F, E> ClosureFactory<T, F, E>
where
    T: Bean,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    pub fn new(closure: F) -> Self {
        Self {
            closure,
            _marker: PhantomData,
        }
    }
}

impl<T, F, E> Debug for ClosureFactory<T, F, E>
where
    T: Bean,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClosureFactory")
            .field("type", &any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, F, E> BeanFactory for ClosureFactory<T, F, E>
where
    T: Bean,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    fn allocate(&self) -> Result<BeanRef, BoxError> {
        match (self.closure)() {
            Ok(bean) => Ok(Arc::new(bean)),
            Err(err) => Err(err.into()),
        }
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// A [`BeanFactory`] which always hands out the same pre-built instance.
pub struct InstanceFactory<T: Bean> {
    instance: Arc<T>,
}

impl<T: Bean> InstanceFactory<T> {
    pub fn new(instance: Arc<T>) -> Self {
        Self { instance }
    }
}

impl<T: Bean> Debug for InstanceFactory<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceFactory")
            .field("type", &any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: Bean> BeanFactory for InstanceFactory<T> {
    fn allocate(&self) -> Result<BeanRef, BoxError> {
        Ok(Arc::clone(&self.instance) as BeanRef)
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}
