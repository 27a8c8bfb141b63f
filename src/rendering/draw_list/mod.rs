mod cache;
mod draw_item;
mod enumerator;
mod error;
mod indirect;
mod merged_geometry;
mod transforms;

pub use cache::DrawListCache;
pub use draw_item::{build_draw_constants, DrawConstants, DrawItem, DrawSource};
pub use enumerator::{draw_item_count, enumerate_draw_items, validate_rigid};
pub use error::DrawListError;
pub use indirect::{build_indirect_args, IndirectDrawArgs};
pub use merged_geometry::{DrawRange, MergedGeometry};
pub use transforms::{inverse_transpose_3x4, ItemTransforms};
