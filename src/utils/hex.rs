// src/utils/hex.rs

/// Format a plain-text hex dump of binary data, four bytes per line,
/// with a printable-ASCII gutter. Used by diagnostics and tests.
pub fn hex_dump(data: &[u8], title: Option<&str>) -> String {
    const CHUNK: usize = 4;
    let mut dump = Vec::new();

    if let Some(title) = title {
        dump.push(format!("--- {title} ---"));
    }

    dump.push(format!("   {:<6}    {:<15} {}", "line", "data", "text"));
    let width = dump.last().map(|l| l.len()).unwrap_or(0);
    dump.push("-".repeat(width));

    for (line, chunk) in data.chunks(CHUNK).enumerate() {
        let (sub1, sub2) = chunk.split_at(chunk.len().min(CHUNK / 2));
        let hex1: Vec<String> = sub1.iter().map(|b| format!("{b:02x}")).collect();
        let hex2: Vec<String> = sub2.iter().map(|b| format!("{b:02x}")).collect();
        let hex_part = format!("{}  {}", hex1.join(" "), hex2.join(" "));
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if (32..127).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        dump.push(format!(
            "{:>4}[{:04x}]   {:<15}    {}",
            line,
            line * CHUNK,
            hex_part,
            ascii
        ));
    }

    dump.join("\n")
}
