use duskview::{ViewerConfig, init_logging, run};

fn main() {
    let env_assets = std::env::var_os("DUSKVIEW_ASSETS").map(Into::into);
    let config = match ViewerConfig::from_args(std::env::args().skip(1), env_assets) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: duskview [shadow|raycast] [asset-dir]");
            std::process::exit(-1);
        }
    };

    init_logging(&config.logging);
    log::info!(
        "technique {}, assets in {}",
        config.technique.name(),
        config.asset_dir.display()
    );

    if let Err(err) = run(config) {
        log::error!("{err}");
        std::process::exit(-1);
    }
}
