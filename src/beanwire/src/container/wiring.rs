use tracing::{debug, trace};

use crate::bean::{BeanRef, DependencyPoint};
use crate::container::trace::Trace;
use crate::container::ResolveError;
use crate::wiring::WiringMode;

/// Where a [`WiringResolver`] looks up the values of dependency points.
pub(crate) trait DependencySource {
    fn contains(&self, name: &str) -> bool;

    fn resolve(&self, name: &str, frame: &Trace<'_>) -> Result<BeanRef, ResolveError>;
}

/// Fills the dependency points of one instance.
pub(crate) struct WiringResolver<'a, S: DependencySource + ?Sized> {
    source: &'a S,
    mode: WiringMode,
}

impl<'a, S: DependencySource + ?Sized> WiringResolver<'a, S> {
    /// `mode` is the effective wiring mode of the bean and must not be
    /// [`WiringMode::Default`].
    pub fn new(source: &'a S, mode: WiringMode) -> Self {
        debug_assert!(!mode.is_placeholder());
        Self { source, mode }
    }

    /// Injects a value into every point of `instance` that can be resolved.
    ///
    /// Points resolve to the first registered candidate name. A point with no
    /// registered candidate, or whose candidate lives in a scope that is not
    /// active, fails the wiring in [`WiringMode::Strict`] and is left empty in
    /// [`WiringMode::Optional`]. Any other failure to create the candidate
    /// always propagates.
    pub fn wire(
        &self,
        bean: &str,
        points: &[DependencyPoint],
        instance: &BeanRef,
        frame: &Trace<'_>,
    ) -> Result<(), ResolveError> {
        if self.mode == WiringMode::None {
            trace!("Skipping wiring of bean '{}'", bean);
            return Ok(());
        }

        for point in points {
            let mode = point.mode().resolve(self.mode);
            if mode == WiringMode::None {
                continue;
            }

            match self.resolve_point(point, frame)? {
                Some(value) => {
                    instance
                        .inject(point.name(), value)
                        .map_err(|source| ResolveError::Injection {
                            bean: bean.to_string(),
                            point: point.name().to_string(),
                            source,
                        })?;
                }
                None if mode == WiringMode::Strict => {
                    return Err(ResolveError::UnresolvedDependency {
                        bean: bean.to_string(),
                        point: point.name().to_string(),
                    });
                }
                None => {
                    debug!(
                        "Leaving optional point '{}' of bean '{}' unresolved",
                        point.name(),
                        bean
                    );
                }
            }
        }
        Ok(())
    }

    fn resolve_point(
        &self,
        point: &DependencyPoint,
        frame: &Trace<'_>,
    ) -> Result<Option<BeanRef>, ResolveError> {
        for candidate in point.candidates() {
            if !self.source.contains(&candidate) {
                continue;
            }
            match self.source.resolve(&candidate, frame) {
                Ok(value) => return Ok(Some(value)),
                Err(ResolveError::NotFound { .. } | ResolveError::ScopeNotActive { .. }) => {
                    continue
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::bean::{Bean, Inject, InjectError};
    use crate::scope::ScopeKind;

    use super::*;

    struct Repository;

    impl Bean for Repository {}

    #[derive(Default)]
    struct Service {
        repository: Inject<Repository>,
    }

    impl Bean for Service {
        fn inject(&self, point: &str, value: BeanRef) -> Result<(), InjectError> {
            match point {
                "repository" => self.repository.inject(value),
                _ => Err(InjectError::unknown_point(point)),
            }
        }
    }

    enum Entry {
        Ready(BeanRef),
        Inactive,
        Broken,
    }

    #[derive(Default)]
    struct FakeSource {
        entries: HashMap<String, Entry>,
    }

    impl FakeSource {
        fn with(mut self, name: &str, entry: Entry) -> Self {
            self.entries.insert(name.to_string(), entry);
            self
        }
    }

    impl DependencySource for FakeSource {
        fn contains(&self, name: &str) -> bool {
            self.entries.contains_key(name)
        }

        fn resolve(&self, name: &str, _frame: &Trace<'_>) -> Result<BeanRef, ResolveError> {
            match self.entries.get(name) {
                Some(Entry::Ready(bean)) => Ok(Arc::clone(bean)),
                Some(Entry::Inactive) => Err(ResolveError::ScopeNotActive {
                    name: name.to_string(),
                    scope: ScopeKind::Request,
                    current: ScopeKind::Singleton,
                }),
                Some(Entry::Broken) => Err(ResolveError::CyclicPrototype {
                    name: name.to_string(),
                }),
                None => Err(ResolveError::NotFound {
                    name: name.to_string(),
                }),
            }
        }
    }

    fn service() -> (Arc<Service>, BeanRef) {
        let service = Arc::new(Service::default());
        let instance = Arc::clone(&service) as BeanRef;
        (service, instance)
    }

    fn points() -> Vec<DependencyPoint> {
        vec![DependencyPoint::of::<Repository>("repository")]
    }

    #[test]
    fn wiring_resolver_wire_fills_points_by_convention() {
        let source = FakeSource::default().with("repository", Entry::Ready(Arc::new(Repository)));
        let (service, instance) = service();
        let frame = Trace::new("service", None);

        WiringResolver::new(&source, WiringMode::Strict)
            .wire("service", &points(), &instance, &frame)
            .unwrap();
        assert!(service.repository.is_set());
    }

    #[test]
    fn wiring_resolver_wire_falls_back_to_later_candidates() {
        let source = FakeSource::default()
            .with("repository", Entry::Inactive)
            .with(
                std::any::type_name::<Repository>(),
                Entry::Ready(Arc::new(Repository)),
            );
        let (service, instance) = service();
        let frame = Trace::new("service", None);

        WiringResolver::new(&source, WiringMode::Strict)
            .wire("service", &points(), &instance, &frame)
            .unwrap();
        assert!(service.repository.is_set());
    }

    #[test]
    fn wiring_resolver_wire_fails_when_strict_point_is_unresolved() {
        let source = FakeSource::default().with("repository", Entry::Inactive);
        let (service, instance) = service();
        let frame = Trace::new("service", None);

        let res = WiringResolver::new(&source, WiringMode::Strict).wire(
            "service",
            &points(),
            &instance,
            &frame,
        );
        assert!(matches!(
            res,
            Err(ResolveError::UnresolvedDependency { bean, point })
                if bean == "service" && point == "repository"
        ));
        assert!(!service.repository.is_set());
    }

    #[test]
    fn wiring_resolver_wire_skips_optional_and_disabled_points() {
        let source = FakeSource::default();
        let (service, instance) = service();
        let frame = Trace::new("service", None);

        WiringResolver::new(&source, WiringMode::Optional)
            .wire("service", &points(), &instance, &frame)
            .unwrap();
        assert!(!service.repository.is_set());

        let points = vec![DependencyPoint::of::<Repository>("repository").with_mode(WiringMode::None)];
        WiringResolver::new(&source, WiringMode::Strict)
            .wire("service", &points, &instance, &frame)
            .unwrap();

        let points =
            vec![DependencyPoint::of::<Repository>("repository").with_mode(WiringMode::Strict)];
        WiringResolver::new(&source, WiringMode::None)
            .wire("service", &points, &instance, &frame)
            .unwrap();
    }

    #[test]
    fn wiring_resolver_wire_propagates_creation_failures() {
        let source = FakeSource::default().with("repository", Entry::Broken);
        let (_, instance) = service();
        let frame = Trace::new("service", None);

        let res = WiringResolver::new(&source, WiringMode::Optional).wire(
            "service",
            &points(),
            &instance,
            &frame,
        );
        assert!(matches!(res, Err(ResolveError::CyclicPrototype { .. })));
    }

    #[test]
    fn wiring_resolver_wire_fails_when_injection_fails() {
        let source = FakeSource::default().with("repository", Entry::Ready(Arc::new(Service::default())));
        let (_, instance) = service();
        let frame = Trace::new("service", None);

        let res = WiringResolver::new(&source, WiringMode::Strict).wire(
            "service",
            &points(),
            &instance,
            &frame,
        );
        assert!(matches!(
            res,
            Err(ResolveError::Injection {
                source: InjectError::TypeMismatch { .. },
                ..
            })
        ));
    }
}
