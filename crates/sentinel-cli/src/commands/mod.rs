pub mod plan;
pub mod resource;
pub mod state;
