use std::io::Write;

use chrono::Local;
use env_logger::Env;
use log::info;

/// Process-wide logger setup shared by the GUI and the CLI.
pub struct PanelLogger;

impl PanelLogger {
    /// Installs `env_logger` with a timestamped format. `RUST_LOG` wins over
    /// `default_level` when both are set.
    pub fn init(default_level: &str) -> Result<(), log::SetLoggerError> {
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] [{}] [{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .try_init()?;

        info!("Gimbal panel logger initialized");
        Ok(())
    }
}
