use std::any::{self, Any};
use std::sync::Arc;

pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

pub trait DowncastArc: Sized {
    type Output<T>;

    fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self>;
}

impl<S> DowncastArc for Arc<S>
where
    S: AsAny + ?Sized,
{
    type Output<T> = Arc<T>;

    fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self> {
        if <S as AsAny>::as_any(&*self).is::<T>() {
            let res = <S as AsAny>::into_any_arc(self)
                .downcast::<T>()
                .unwrap_or_else(|_| unreachable!("`self` should be `Arc<T>`"));
            Ok(res)
        } else {
            Err(self)
        }
    }
}
