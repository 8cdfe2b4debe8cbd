//! Binary entry point: resolve the data location, start file logging, load the
//! saved records and drive the terminal UI until the user quits.
use log::warn;
use student_grades::logging::{default_log_level, init_logging};
use student_grades::{run_app, App, Config, CsvFile, RecordStore};

/// Only terminal setup problems are fatal. A missing logger or an unreadable
/// data file is reported in the footer and the session starts empty; a file
/// that failed to parse is moved aside before anything can overwrite it.
fn main() -> anyhow::Result<()> {
    let config = Config::resolve()?;
    let logger = init_logging(default_log_level(), &config.log_dir);

    let (store, load_error) = RecordStore::open_or_set_aside(CsvFile::new(&config.data_file));

    let mut app = App::new(store);
    if let Err(message) = &logger {
        app.report_error(format!("Logging disabled: {message}"));
    }
    if let Some(message) = load_error {
        warn!("event=session_start module=main status=degraded records=0");
        app.report_error(message);
    }

    run_app(&mut app)
}
