/// Fixed colour palette for category markers.
pub const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// Maps a category to a palette colour. The same string always yields the same colour;
/// different categories may collide.
pub fn category_color(category: &str) -> &'static str {
    let hash = category
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as u32));
    PALETTE[hash as usize % PALETTE.len()]
}
