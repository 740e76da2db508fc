pub mod chainstate;
pub mod name;
