use std::marker::PhantomData;

use beanwire::prelude::*;

#[derive(Default, Bean)]
pub struct User;

#[derive(Default, Bean)]
pub struct Repository<T: Send + Sync + 'static> {
    _marker: PhantomData<fn() -> T>,
}

#[derive(Default, Bean)]
pub struct Service<T: Bean> {
    #[inject(strict)]
    repository: Inject<Repository<T>>,
}

fn main() {
    let points = Service::<User>::dependency_points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].name(), "repository");
    assert_eq!(points[0].mode(), WiringMode::Strict);
    assert!(points[0].candidates().contains(&"repository".to_string()));

    let container = Container::new();
    container
        .register_bean(BeanDefinition::of::<Repository<User>>("repository"))
        .unwrap();
    container
        .register_bean(BeanDefinition::of::<Service<User>>("service"))
        .unwrap();
    let service = container.get_as::<Service<User>>("service").unwrap();
    assert!(service.repository.get().is_some());
}
