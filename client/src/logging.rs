use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Console method a record of `level` is written with.
pub(crate) fn console_method(level: Level) -> &'static str {
    match level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "log",
    }
}

/// Install the global subscriber. Later calls are ignored.
pub(crate) fn init(level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .try_init();
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

/// Routes each formatted record to the browser console method for its level.
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one record; emitted on drop.
struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::with_capacity(128),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if !line.is_empty() {
            emit(self.level, line);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    use web_sys::console;

    let value = wasm_bindgen::JsValue::from_str(line);
    match console_method(level) {
        "error" => console::error_1(&value),
        "warn" => console::warn_1(&value),
        "info" => console::info_1(&value),
        "debug" => console::debug_1(&value),
        _ => console::log_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(level: Level, line: &str) {
    eprintln!("[{}] {line}", console_method(level));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(console_method(Level::ERROR), "error");
        assert_eq!(console_method(Level::WARN), "warn");
        assert_eq!(console_method(Level::INFO), "info");
        assert_eq!(console_method(Level::DEBUG), "debug");
        assert_eq!(console_method(Level::TRACE), "log");
    }

    #[test]
    fn writer_buffers_whole_record() {
        let mut writer = ConsoleWriter::new(Level::WARN);
        write!(writer, "config ").unwrap();
        writeln!(writer, "fallback").unwrap();
        assert_eq!(writer.buf, b"config fallback\n");
    }
}
