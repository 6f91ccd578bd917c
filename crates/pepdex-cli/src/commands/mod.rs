pub mod index;
pub mod read_index;
