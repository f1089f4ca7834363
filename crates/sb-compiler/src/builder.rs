use std::io::{self, BufWriter, Write};

use sb_core::directive::DirectiveLine;

use crate::collector::CollectedOutput;

/// Write the servers file to `out`. Returns the number of directives written.
pub fn write_servers_file<W: Write>(output: &CollectedOutput, out: W) -> io::Result<usize> {
    let mut writer = BufWriter::new(out);
    let mut written = 0usize;

    for entry in output.entries() {
        writeln!(writer, "{}", DirectiveLine(&entry))?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Render the servers file into memory.
pub fn build_servers_file(output: &CollectedOutput) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(output.len() * 32);
    // Writing into a Vec cannot fail.
    let _ = write_servers_file(output, &mut bytes);
    bytes
}
