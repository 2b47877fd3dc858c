#![allow(clippy::new_without_default)]

extern crate self as beanwire;

pub mod bean;
pub mod config;
pub mod container;
pub mod scope;
pub mod wiring;
mod util;

pub use beanwire_derive::Bean;

pub mod prelude {
    pub use crate::bean::{
        Bean, BeanDefinition, BeanFactory, BeanRef, ClosureFactory, DependencyPoint, Inject,
        InjectError, Injectable, InstanceFactory,
    };
    pub use crate::config::{ConfigError, ContainerConfig};
    pub use crate::container::{Container, RegistryError, ResolveError};
    pub use crate::scope::ScopeKind;
    pub use crate::wiring::WiringMode;
    pub use crate::Bean;
}
