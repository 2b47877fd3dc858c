use std::sync::Arc;

use beanwire::prelude::*;

#[derive(Default, Bean)]
pub struct Database;

#[derive(Default, Bean)]
pub struct Mailer;

#[derive(Default, Bean)]
pub struct Metrics;

#[derive(Default, Bean)]
pub struct Signup {
    #[inject(ref = "primaryDatabase")]
    pub database: Inject<Database>,
    #[inject(optional)]
    pub mailer: Inject<Mailer>,
    #[inject(none)]
    pub metrics: Inject<Metrics>,
    pub attempts: u32,
}

fn main() {
    let points = Signup::dependency_points();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].reference(), Some("primaryDatabase"));
    assert_eq!(points[1].mode(), WiringMode::Optional);
    assert_eq!(points[2].mode(), WiringMode::None);

    let container = Container::new();
    container
        .register_bean(BeanDefinition::of::<Database>("primaryDatabase"))
        .unwrap();
    container
        .register_bean(BeanDefinition::of::<Metrics>("metrics"))
        .unwrap();
    container
        .register_bean(BeanDefinition::of::<Signup>("signup"))
        .unwrap();

    let signup: Arc<Signup> = container.get_as("signup").unwrap();
    assert!(signup.database.is_set());
    assert!(!signup.mailer.is_set());
    assert!(!signup.metrics.is_set());
    assert_eq!(signup.attempts, 0);
}
