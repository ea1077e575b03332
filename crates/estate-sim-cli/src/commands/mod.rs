pub mod presets;
pub mod profile;
pub mod simulate;
