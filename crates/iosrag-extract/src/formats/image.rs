//! Images carry no text; they are described by metadata only.

/// Pixel dimensions from the PNG or GIF header, when recognizable.
fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
    if bytes.starts_with(PNG_MAGIC) && bytes.len() >= 24 {
        let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
        let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
        return Some((width, height));
    }
    if (bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")) && bytes.len() >= 10 {
        let width = u16::from_le_bytes(bytes[6..8].try_into().ok()?);
        let height = u16::from_le_bytes(bytes[8..10].try_into().ok()?);
        return Some((u32::from(width), u32::from(height)));
    }
    None
}

pub fn describe(bytes: &[u8], name: &str) -> String {
    match dimensions(bytes) {
        Some((w, h)) => format!("Image {name}: {w}x{h} pixels, {} bytes", bytes.len()),
        None => format!("Image {name}: {} bytes", bytes.len()),
    }
}
