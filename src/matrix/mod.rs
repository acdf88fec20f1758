pub mod kernel;
pub mod store;

pub use kernel::{multiply, multiply_accumulate, reference_multiply, validate_product_shapes};
pub use store::{Element, Matrix, FILL_BOUND, SAMPLE_COLS, SAMPLE_ROWS};
