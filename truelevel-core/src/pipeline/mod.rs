pub mod builder;
pub mod status_board;
