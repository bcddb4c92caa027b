pub mod display;
pub mod hit;
pub mod outline;

pub use display::{DrawItem, Theme, build_display_list};
pub use hit::{bubbles_near, hit_test, hit_test_id};
