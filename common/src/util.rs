use std::ffi::CString;
use std::io::Write;

#[cfg(windows)]
use windows::{
    core::PCSTR,
    Win32::{
        System::Diagnostics::Debug::OutputDebugStringA,
        UI::WindowsAndMessaging::{MessageBoxA, MB_ICONERROR, MB_OK},
    },
};

pub trait AsCString {
    fn as_c_string(&self) -> CString;
}

impl AsCString for String {
    fn as_c_string(&self) -> CString {
        self.as_str().as_c_string()
    }
}

impl AsCString for &str {
    fn as_c_string(&self) -> CString {
        // Interior NULs would make CString::new fail; drop them instead of the whole text.
        CString::new(self.replace('\0', "")).unwrap_or_default()
    }
}

/// Writes `s` to the attached debugger, or stderr where there is none.
pub fn print_debug_string(s: &str) {
    #[cfg(windows)]
    {
        let message = s.as_c_string();
        unsafe {
            OutputDebugStringA(PCSTR(message.as_ptr() as _));
        }
    }

    #[cfg(not(windows))]
    eprint!("{s}");
}

/// `io::Write` sink that forwards log records to [`print_debug_string`].
///
/// GUI-subsystem binaries have no console, so this is where `env_logger`
/// output goes.
#[derive(Debug, Default)]
pub struct DebugOutput;

impl Write for DebugOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        print_debug_string(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global logger. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(default_log_filter());
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(DebugOutput)))
        .format_timestamp_millis()
        .try_init();
}

/// Shows a blocking error dialog.
pub fn show_error_box(caption: &str, text: &str) {
    #[cfg(windows)]
    {
        let caption = caption.as_c_string();
        let text = text.as_c_string();
        unsafe {
            MessageBoxA(
                None,
                PCSTR(text.as_ptr() as _),
                PCSTR(caption.as_ptr() as _),
                MB_ICONERROR | MB_OK,
            );
        }
    }

    #[cfg(not(windows))]
    eprintln!("{caption}: {text}");
}
