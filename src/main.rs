use hellod::{monitor, service};

/// Port the service listens on.
const PORT: u16 = 8080;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let mut app = service::build();
    if let Some(agent) = monitor::init_from_env() {
        app.plugin(agent);
    }

    app.listen(PORT)
}
