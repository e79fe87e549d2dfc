pub mod app;
pub mod items;
pub mod license;
pub mod list;
pub mod refresh;
