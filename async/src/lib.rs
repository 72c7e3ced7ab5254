//! Task pools for listeners that run one cancellable task per connection.
//!
//! ```no_run
//! use bpwire_async::TaskPool;
//!
//! # async fn serve() {
//! let pool = TaskPool::new();
//! let cancel = pool.cancel_token().clone();
//!
//! bpwire_async::spawn!(pool, "worker", async move {
//!     tokio::select! {
//!         _ = do_work() => {}
//!         _ = cancel.cancelled() => {}
//!     }
//! });
//!
//! pool.shutdown().await;
//! # }
//! # async fn do_work() {}
//! ```

mod spawn;

pub mod bounded_task_pool;
pub mod task_pool;

pub use bounded_task_pool::BoundedTaskPool;
pub use task_pool::TaskPool;
pub use tokio_util::sync::CancellationToken;

#[doc(hidden)]
pub use tracing as __tracing;
