mod context;
mod handle;
mod lifecycle;
mod registry;
mod store;
mod trace;
mod wiring;

use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::bean::InjectError;
use crate::scope::ScopeKind;

pub use handle::Container;
pub use lifecycle::BeanState;
pub use registry::{BeanRegistry, RegistryError};
pub use store::ScopeStore;

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum ResolveError {
    #[snafu(display("no bean named {name} is registered"))]
    #[non_exhaustive]
    NotFound { name: String },
    #[snafu(display("could not resolve dependency point {point} of bean {bean}"))]
    #[non_exhaustive]
    UnresolvedDependency { bean: String, point: String },
    #[snafu(display("prototype bean {name} depends on itself"))]
    #[non_exhaustive]
    CyclicPrototype { name: String },
    #[snafu(display("bean {name} is required to build itself before it is allocated"))]
    #[non_exhaustive]
    CyclicDependency { name: String },
    #[snafu(display("init hook #{hook} of bean {name} failed"))]
    #[non_exhaustive]
    Initialization {
        name: String,
        hook: usize,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("an instance of bean {name} is already stored in scope {scope}"))]
    #[non_exhaustive]
    AlreadyPresent { name: String, scope: ScopeKind },
    #[snafu(display("could not allocate bean {name}"))]
    #[non_exhaustive]
    Allocation {
        name: String,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("could not inject dependency point {point} of bean {bean}"))]
    #[non_exhaustive]
    Injection {
        bean: String,
        point: String,
        source: InjectError,
    },
    #[snafu(display("bean {name} lives in scope {scope}, which is not active in a {current} context"))]
    #[non_exhaustive]
    ScopeNotActive {
        name: String,
        scope: ScopeKind,
        current: ScopeKind,
    },
    #[snafu(display("bean {name} is a {found}, not a {expected}"))]
    #[non_exhaustive]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[snafu(display("creation of bean {name} was aborted"))]
    #[non_exhaustive]
    CreationAborted { name: String },
    #[snafu(display("definition of bean {name} was replaced during its creation"))]
    #[non_exhaustive]
    DefinitionReplaced { name: String },
}
