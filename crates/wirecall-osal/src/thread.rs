use std::io;
use std::thread::JoinHandle;

/// Spawn a named OS thread.
///
/// The name shows up in debuggers and panic messages, which matters in a
/// stack that runs four-plus long-lived threads.
pub fn spawn<F>(name: &str, f: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new().name(name.to_string()).spawn(f)
}
