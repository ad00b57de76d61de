pub mod render;

use rust_embed::RustEmbed;

/// Dashboard page and stylesheet, compiled into the binary
#[derive(RustEmbed)]
#[folder = "src/interface/web/static/"]
pub struct Assets;
