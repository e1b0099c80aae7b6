/// `log` facade wiring.
///
/// In the browser records go to the developer console, one `console` method
/// per level. Native hosts install their own logger (`env_logger` in tests),
/// so `init` does nothing there.

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use wasm_bindgen::JsValue;

    pub struct ConsoleLogger;

    pub static LOGGER: ConsoleLogger = ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
            match record.level() {
                Level::Error => web_sys::console::error_1(&line),
                Level::Warn => web_sys::console::warn_1(&line),
                Level::Info => web_sys::console::info_1(&line),
                Level::Debug => web_sys::console::log_1(&line),
                Level::Trace => web_sys::console::debug_1(&line),
            }
        }

        fn flush(&self) {}
    }

    pub fn install(level: LevelFilter) {
        // a second call keeps the first logger
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

/// Route `log` records to the browser console at `info` and above.
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console::install(log::LevelFilter::Info);
}

/// Test-only sink; safe to call from every test.
#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("mathviz_wasm=debug"))
        .is_test(true)
        .try_init();
}
