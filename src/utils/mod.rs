pub(crate) fn other_io_error(
    e: impl std::error::Error + Send + Sync + 'static,
) -> std::io::Error {
    use std::io::*;

    Error::new(ErrorKind::Other, e)
}

/// Hex dump of a binary path payload for log output, `[00 11 22]` style.
pub(crate) fn hex_bytes(buf: &[u8]) -> String {
    use core::fmt::Write;

    let mut out = String::with_capacity(buf.len() * 3);
    for (idx, b) in buf.iter().enumerate() {
        if idx != 0 {
            out.push(' ');
        }
        // writing into a String can't fail
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
