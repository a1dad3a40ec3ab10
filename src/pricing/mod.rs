pub mod generator;

pub use generator::next_price;
