//! Text and URL helpers shared by the renderer and site artifacts

mod html;
mod url;

pub use html::*;
pub use url::*;
