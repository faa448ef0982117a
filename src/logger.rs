use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};

#[ctor::ctor]
fn init() {
    if log4rs::init_file("log4rs.yaml", Default::default()).is_ok() {
        return;
    }
    // Console fallback when no log4rs.yaml sits in the working directory.
    let stdout = ConsoleAppender::builder().build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Warn));
    if let Ok(config) = config {
        let _ = log4rs::init_config(config);
    }
}
