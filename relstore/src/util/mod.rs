pub mod safemap;
pub mod safeset;
pub use safemap::SafeMap;
pub use safeset::SafeSet;
