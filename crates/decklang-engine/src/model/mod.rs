pub mod attrs;
pub mod block;
pub mod ordered;
pub mod phase;
pub mod slide;
pub mod style;

pub use attrs::{AttrMap, AttrValue};
pub use block::Block;
pub use ordered::OrderedMap;
pub use phase::{Phase, PhaseList, Transition};
pub use slide::{ContentFragment, Frontmatter, FrontmatterEntry, Note, SlideIr};
pub use style::{StyleMap, parse_style};
