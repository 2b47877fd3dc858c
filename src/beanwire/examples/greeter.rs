use std::convert::Infallible;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use beanwire::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = ContainerConfig::from_toml_str(
        r#"
        default_wiring_mode = "strict"
        detect_duplicated_bean_names = true
        "#,
    )?;
    let container = Container::with_config(config);
    configure(&container, "greeter")?;

    let app = container.get_as::<App>("app")?;
    app.run();

    for visitor in ["alice", "bob"] {
        let session = container
            .sub_container()
            .ok_or("the container has no session scope")?;
        let visit = session.get_as::<Visit>("visit")?;
        visit.greet(visitor);
        visit.greet(visitor);
    }

    container.shutdown();
    Ok(())
}

fn configure(container: &Container, app_name: &'static str) -> Result<(), RegistryError> {
    container.register_bean(
        BeanDefinition::new(
            "logger",
            ClosureFactory::new(move || Ok::<_, Infallible>(ConsoleLogger { app_name })),
        )
        .with_destroy(|logger: &ConsoleLogger| logger.log("Goodbye!")),
    )?;
    container.register_bean(BeanDefinition::of::<EnglishGreeter>("english"))?;
    container.register_bean(BeanDefinition::of::<ChineseGreeter>("chinese"))?;
    container.register_bean(
        BeanDefinition::of::<App>("app")
            .with_init(|app: &App| app.logger().log("Greeters are wired")),
    )?;
    container.register_bean(BeanDefinition::of::<Visit>("visit").with_scope(ScopeKind::Session))?;
    Ok(())
}

#[derive(Bean)]
struct ConsoleLogger {
    app_name: &'static str,
}

impl ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

#[derive(Default, Bean)]
struct EnglishGreeter {
    logger: Inject<ConsoleLogger>,
}

impl EnglishGreeter {
    fn greet(&self, name: &str) {
        if let Some(logger) = self.logger.get() {
            logger.log(&format!("Hello, {name}!"));
        }
    }
}

#[derive(Default, Bean)]
struct ChineseGreeter {
    logger: Inject<ConsoleLogger>,
}

impl ChineseGreeter {
    fn greet(&self, name: &str) {
        if let Some(logger) = self.logger.get() {
            logger.log(&format!("你好, {name}!"));
        }
    }
}

#[derive(Default, Bean)]
struct App {
    logger: Inject<ConsoleLogger>,
    english: Inject<EnglishGreeter>,
    chinese: Inject<ChineseGreeter>,
}

impl App {
    fn logger(&self) -> Arc<ConsoleLogger> {
        self.logger
            .get()
            .unwrap_or_else(|| Arc::new(ConsoleLogger { app_name: "unwired" }))
    }

    fn run(&self) {
        self.logger().log("Greeting from beanwire managed objects:");
        if let Some(english) = self.english.get() {
            english.greet("world");
        }
        if let Some(chinese) = self.chinese.get() {
            chinese.greet("world");
        }
    }
}

#[derive(Default, Bean)]
struct Visit {
    #[inject(ref = "english")]
    greeter: Inject<EnglishGreeter>,
    count: AtomicU32,
}

impl Visit {
    fn greet(&self, name: &str) {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(greeter) = self.greeter.get() {
            greeter.greet(&format!("{name} (visit #{count} in this session)"));
        }
    }
}
