use relm4::prelude::*;
use swipespin::config;
use swipespin::gui::app::AppModel;
use swipespin::sys::runtime;
use swipespin::sys::server::HeightFeed;

fn main() {
    env_logger::init();

    if let Err(e) = config::write_default_config() {
        log::warn!("Could not write default config: {}", e);
    }
    let config = config::load_or_setup();

    let (tx, rx) = async_channel::bounded(32);
    let feed = HeightFeed::default();

    // Start Background Services
    runtime::start_background_services(tx, feed.clone());

    let app = RelmApp::new("org.swipespin.swipespin");

    app.run::<AppModel>((config, rx, feed));
}
