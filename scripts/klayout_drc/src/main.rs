use klayout_drc::{run, Args};
use precheck::config::DrcConfig;
use precheck::log::{self, LogConfig};

pub fn main() {
    let args = Args::parse_normalized();

    let config = args
        .config
        .as_ref()
        .map(|path| DrcConfig::from_toml_file(path))
        .transpose();
    let (config, config_err) = match config {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (DrcConfig::default(), Some(err)),
    };
    let settings = args.settings(&config);

    if let Err(err) = log::init(LogConfig::default().with_level(settings.log_level)) {
        eprintln!("{err}");
    }
    if let Some(err) = config_err {
        log::error!("{}", err.summary());
        return;
    }

    // Pass/fail is reported through the log only; the exit status stays zero.
    run(&args, &settings);
}
