pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, seed_batches, SeedBatch, BATCHES_PER_THREAD};
pub use pool::WorkerPool;
