use std::io::{self, Write};

/// Writes to stdout, swallowing broken pipes so `bankrank ... | head` exits
/// cleanly instead of panicking.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| {
        stdout.write_all(b"\n")?;
        stdout.flush()
    }) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(error) => Err(error),
    }
}
