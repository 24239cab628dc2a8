// PDF export of already-assembled document HTML.

pub mod handlers;
pub mod renderer;
