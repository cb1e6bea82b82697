//! Exposure items and pools.

use asnforge_core::Item;

/// An exposure with the given instrument and filter.
///
/// The program is fixed to `01234` and the exposure type to `nrc_image`
/// unless overridden with [`Item::with_value`].
pub fn exposure(instrument: &str, filter: &str) -> Item {
    Item::new()
        .with("program", "01234")
        .with("instrument", instrument)
        .with("filter", filter)
        .with("exp_type", "nrc_image")
}

/// Tags each item with its position, as a pool reader does.
pub fn pool(items: impl IntoIterator<Item = Item>) -> Vec<Item> {
    items
        .into_iter()
        .enumerate()
        .map(|(row, item)| item.with_origin(row))
        .collect()
}

/// Two identical NIRCAM F200W rows, one NIRCAM F444W row and one MIRI row.
pub fn nircam_miri_pool() -> Vec<Item> {
    pool([
        exposure("NIRCAM", "F200W"),
        exposure("NIRCAM", "F200W"),
        exposure("NIRCAM", "F444W"),
        exposure("MIRI", "F770W").with_value("exp_type", "mir_image"),
    ])
}
