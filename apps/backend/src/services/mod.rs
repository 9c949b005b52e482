pub mod collaborators;
pub mod rewards;
