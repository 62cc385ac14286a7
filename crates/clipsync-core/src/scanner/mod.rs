pub mod walk;

pub use walk::{build_inventory, scan_media_folder};
